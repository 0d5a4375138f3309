//! End-to-end scenarios and universal invariants (spec §8). S2-S4 live as
//! unit tests in `debug.rs` alongside the controls they exercise; this file
//! covers the remaining scenarios plus the cross-cutting invariants that
//! need more than one program to demonstrate.

use std::rc::Rc;
use wisp_runtime::Value;
use wisp_runtime::Vm;

fn load(vm: &mut Vm, source: &str) {
    let ast = wisp_parser::parse(source).expect("source must parse");
    vm.load(Rc::new(ast));
}

#[test]
fn s1_basic_stepping() {
    let mut vm = Vm::new();
    load(&mut vm, "let a = 1\nlet b = 2\nlet c = 3\n");
    assert_eq!(vm.current_line(), 1);
    assert!(!vm.is_finished());

    for _ in 0..3 {
        vm.step().unwrap();
    }

    assert!(vm.is_finished());
    assert!(matches!(vm.global_scope().lookup("a"), Some(Value::Int(1))));
    assert!(matches!(vm.global_scope().lookup("b"), Some(Value::Int(2))));
    assert!(matches!(vm.global_scope().lookup("c"), Some(Value::Int(3))));
}

#[test]
fn s5_for_loop_accumulation() {
    let mut vm = Vm::new();
    load(&mut vm, "var sum = 0\nfor i in 1..3:\n  sum = sum + i\nlet done = true\n");

    let mut body_line_hits = 0;
    while !vm.is_finished() {
        if vm.current_line() == 3 {
            body_line_hits += 1;
        }
        vm.step().unwrap();
    }

    assert_eq!(body_line_hits, 3);
    assert!(matches!(vm.global_scope().lookup("sum"), Some(Value::Int(6))));
    assert!(matches!(vm.global_scope().lookup("done"), Some(Value::Bool(true))));
}

#[test]
fn s6_interactive_does_not_perturb_state() {
    let mut vm = Vm::new();
    load(&mut vm, "let a = 1\nlet b = 2\nlet c = 3\n");
    vm.step().unwrap();
    assert_eq!(vm.current_line(), 2);

    let result = vm.run_interactive("a + 100");
    assert!(result.success);
    assert!(matches!(result.value, Some(Value::Int(101))));
    assert_eq!(vm.current_line(), 2);
    assert!(!vm.is_finished());

    vm.step().unwrap();
    assert_eq!(vm.current_line(), 3);
}

#[test]
fn invariant_step_driven_and_eager_eval_agree_on_final_bindings() {
    let source = "let a = 1\nlet b = a + 1\nlet c = b * 2\n";

    let mut stepped = Vm::new();
    load(&mut stepped, source);
    while !stepped.is_finished() {
        stepped.step().unwrap();
    }

    let mut eager = Vm::new();
    let ast = wisp_parser::parse(source).unwrap();
    eager.eval_program(Rc::new(ast)).unwrap();

    for name in ["a", "b", "c"] {
        assert!(stepped.global_scope().lookup(name).unwrap().equals(&eager.global_scope().lookup(name).unwrap()));
    }
}

#[test]
fn invariant_no_user_calls_line_sequence_matches_source_order() {
    let mut vm = Vm::new();
    load(&mut vm, "let a = 1\nlet b = 2\nlet c = 3\nlet d = 4\n");

    let mut lines = Vec::new();
    while !vm.is_finished() {
        lines.push(vm.current_line());
        vm.step().unwrap();
    }

    assert_eq!(lines, vec![1, 2, 3, 4]);
}

#[test]
fn invariant_step_over_on_plain_statement_is_one_depth_zero_step() {
    let mut vm = Vm::new();
    load(&mut vm, "let a = 1\nlet b = 2\n");
    assert_eq!(vm.call_depth(), 0);
    vm.step_over().unwrap();
    assert_eq!(vm.call_depth(), 0);
    assert_eq!(vm.current_line(), 2);
}

#[test]
fn invariant_call_depth_rises_and_falls_with_function_calls() {
    let mut vm = Vm::new();
    load(&mut vm, "proc add(a, b) =\n  return a + b\n\nlet result = add(3, 4)\n");
    assert_eq!(vm.call_depth(), 0);
    vm.step_into().unwrap(); // past proc def
    assert_eq!(vm.call_depth(), 0);
    vm.step_into().unwrap(); // enters add's body
    assert_eq!(vm.call_depth(), 1);
    vm.step_into().unwrap(); // returns, retires the function frame
    assert_eq!(vm.call_depth(), 0);
    assert!(vm.is_finished());
}

#[test]
fn invariant_breakpoints_survive_reload() {
    let mut vm = Vm::new();
    let source = "let a = 1\nlet b = 2\nlet c = 3\n";
    load(&mut vm, source);
    vm.add_breakpoint(2);
    vm.continue_().unwrap();
    assert_eq!(vm.current_line(), 2);

    load(&mut vm, source);
    assert!(vm.has_breakpoint(2));
    vm.continue_().unwrap();
    assert_eq!(vm.current_line(), 2);
}

#[test]
fn invariant_interactive_runtime_error_leaves_state_untouched() {
    let mut vm = Vm::new();
    load(&mut vm, "let a = 1\nlet b = 2\nlet c = 3\n");
    vm.step().unwrap();
    let line_before = vm.current_line();

    let result = vm.run_interactive("1 / 0");
    assert!(!result.success);
    assert_eq!(vm.current_line(), line_before);
    assert!(!vm.is_finished());

    vm.step().unwrap();
    assert_eq!(vm.current_line(), line_before + 1);
}
