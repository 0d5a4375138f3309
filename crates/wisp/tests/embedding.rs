//! Integration tests for the `Wisp` embedding facade, exercising the
//! surface a host program actually uses: running a file, registering
//! natives and globals, and driving the debugger end to end (spec §6, §8).

use std::fs;
use wisp::Value;
use wisp::Wisp;

#[test]
fn run_file_reads_and_executes_a_script() {
    let path = std::env::temp_dir().join("wisp_embedding_test_run_file.wisp");
    fs::write(&path, "echo \"from file\"\n").unwrap();

    let mut wisp = Wisp::new();
    let output = wisp.run_file(&path).unwrap();
    assert_eq!(output, vec!["from file".to_string()]);

    fs::remove_file(&path).ok();
}

#[test]
fn stdlib_functions_are_callable_from_scripts() {
    let mut wisp = Wisp::new();
    let output = wisp.run("let a = [1, 2, 3]\npush(a, 4)\necho len(a)\necho typeof(a)\n").unwrap();
    assert_eq!(output, vec!["4".to_string(), "array".to_string()]);
}

#[test]
fn s4_continue_to_breakpoint_inside_function() {
    let mut wisp = Wisp::new();
    wisp.load("proc compute(n) =\n  let a = n * 2\n  let b = a + 1\n  return b\n\nlet result = compute(5)\n").unwrap();
    wisp.add_breakpoint(3);
    wisp.continue_().unwrap();
    assert_eq!(wisp.current_line(), 3);
    assert!(matches!(wisp.current_scope().lookup("a"), Some(Value::Int(10))));

    wisp.continue_().unwrap();
    assert!(wisp.is_finished());
    assert!(matches!(wisp.global_scope().lookup("result"), Some(Value::Int(11))));
}

#[test]
fn eval_matches_stepped_execution() {
    let source = "let a = 2\nlet b = a * 3\n";

    let mut stepped = Wisp::new();
    stepped.load(source).unwrap();
    while !stepped.is_finished() {
        stepped.step().unwrap();
    }

    let mut eager = Wisp::new();
    eager.eval(source).unwrap();

    assert!(matches!(stepped.global_scope().lookup("b"), Some(Value::Int(6))));
    assert!(matches!(eager.global_scope().lookup("b"), Some(Value::Int(6))));
}

#[test]
fn run_interactive_is_exposed_from_the_facade() {
    let mut wisp = Wisp::new();
    wisp.load("let a = 1\n").unwrap();
    let result = wisp.run_interactive("a + 41");
    assert!(result.success);
    assert!(matches!(result.value, Some(Value::Int(42))));
}
