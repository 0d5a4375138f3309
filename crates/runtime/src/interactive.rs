//! The interactive evaluator (§4.4): evaluating a source fragment against a
//! paused VM's live state without disturbing that state.

use crate::value::Value;
use crate::vm::{ControlFlow, Vm};

/// The outcome of evaluating one fragment through [`Vm::run_interactive`].
pub struct InteractiveResult {
    pub success: bool,
    pub value: Option<Value>,
    pub error: Option<String>,
    /// Output produced by `echo` while the fragment ran, separate from the
    /// program's own accumulated output.
    pub output: Vec<String>,
}

impl Vm {
    /// Evaluates `source` as a standalone fragment against the current
    /// paused state: same global scope, same `current_scope`, so a name
    /// visible at the breakpoint is visible here too. Mutations the
    /// fragment makes to existing bindings or containers persist; a `let`
    /// in the fragment defines a binding in `current_scope` that outlives
    /// the call, matching a REPL's usual behaviour.
    ///
    /// Does not touch `current_line`, `frames`, or whether the VM is
    /// finished — stepping afterward continues exactly where it would have.
    pub fn run_interactive(&mut self, source: &str) -> InteractiveResult {
        if source.trim().is_empty() {
            return InteractiveResult { success: true, value: Some(Value::Nil), error: None, output: Vec::new() };
        }

        let ast = match wisp_parser::parse(source) {
            Ok(ast) => ast,
            Err(e) => {
                return InteractiveResult {
                    success: false,
                    value: None,
                    error: Some(e.to_string()),
                    output: Vec::new(),
                };
            }
        };
        let ast = std::rc::Rc::new(ast);
        let root = ast.root();

        let main_output = std::mem::take(&mut self.output);
        self.control_flow = ControlFlow::None;
        self.return_value = None;
        let program_ast = self.swap_ast(Some(ast));

        let result = self.eval(root);

        self.swap_ast(program_ast);
        let fragment_output = std::mem::replace(&mut self.output, main_output);
        self.control_flow = ControlFlow::None;
        self.return_value = None;

        match result {
            Ok(value) => InteractiveResult { success: true, value: Some(value), error: None, output: fragment_output },
            Err(e) => InteractiveResult { success: false, value: None, error: Some(e.to_string()), output: fragment_output },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::value::Value;
    use crate::vm::Vm;
    use std::rc::Rc;

    #[test]
    fn evaluates_expression_against_live_scope() {
        let mut vm = Vm::new();
        let ast = wisp_parser::parse("let x = 10\n").expect("source must parse");
        vm.load(Rc::new(ast));
        vm.step_into().unwrap();
        assert!(vm.is_finished());

        let result = vm.run_interactive("x + 5");
        assert!(result.success);
        assert!(matches!(result.value, Some(Value::Int(15))));
    }

    #[test]
    fn fragment_let_persists_in_current_scope() {
        let mut vm = Vm::new();
        let ast = wisp_parser::parse("let x = 1\n").expect("source must parse");
        vm.load(Rc::new(ast));
        vm.step_into().unwrap();

        vm.run_interactive("let y = 41");
        let result = vm.run_interactive("y + 1");
        assert!(result.success);
        assert!(matches!(result.value, Some(Value::Int(42))));
    }

    #[test]
    fn fragment_echo_is_isolated_from_program_output() {
        let mut vm = Vm::new();
        let ast = wisp_parser::parse("echo \"hello\"\n").expect("source must parse");
        vm.load(Rc::new(ast));
        vm.step_into().unwrap();
        assert_eq!(vm.output(), &["hello".to_string()]);

        let result = vm.run_interactive("echo \"debug\"");
        assert_eq!(result.output, vec!["debug".to_string()]);
        assert_eq!(vm.output(), &["hello".to_string()]);
    }

    #[test]
    fn fragment_error_does_not_corrupt_vm_state() {
        let mut vm = Vm::new();
        let ast = wisp_parser::parse("let x = 1\n").expect("source must parse");
        vm.load(Rc::new(ast));
        vm.step_into().unwrap();

        let result = vm.run_interactive("undefined_name");
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Undefined variable"));

        let result = vm.run_interactive("x");
        assert!(result.success);
        assert!(matches!(result.value, Some(Value::Int(1))));
    }

    #[test]
    fn blank_fragment_is_a_no_op() {
        let mut vm = Vm::new();
        let ast = wisp_parser::parse("let x = 1\n").expect("source must parse");
        vm.load(Rc::new(ast));
        let result = vm.run_interactive("   \n");
        assert!(result.success);
        assert!(matches!(result.value, Some(Value::Nil)));
    }
}
