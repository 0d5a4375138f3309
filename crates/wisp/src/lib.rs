//! The embedding surface for Wisp (§6.1): a single [`Wisp`] struct wrapping
//! a [`wisp_runtime::Vm`] with the convenience a host program actually
//! wants — loading source from a string or a file, running to completion,
//! and registering native functions and globals before execution begins.
//!
//! One struct, a handful of inherent methods, no builder ceremony for the
//! common case.

pub mod prelude;

use std::fs;
use std::path::Path;
use std::rc::Rc;
pub use wisp_runtime::{Error, InteractiveResult, Result, ScopeRef, Value, Vm};
use wisp_runtime::native_fn;

/// An embeddable Wisp virtual machine.
pub struct Wisp {
    vm: Vm,
}

impl Default for Wisp {
    fn default() -> Self {
        Self::new()
    }
}

impl Wisp {
    /// Creates a new VM with the standard library already installed.
    pub fn new() -> Self {
        Wisp { vm: Vm::new() }
    }

    /// Registers a native function under `name` in the global scope.
    pub fn add_native(&mut self, name: impl Into<String>, func: impl Fn(&[Value]) -> Result<Value> + 'static) {
        let name = name.into();
        self.vm.global_scope().define(name.clone(), native_fn(name, func), true);
    }

    /// Binds `value` as a global, visible to every script this VM loads.
    pub fn set_global(&mut self, name: impl AsRef<str>, value: Value) {
        self.vm.global_scope().define(name.as_ref(), value, false);
    }

    /// Reads a global binding, if one exists under `name`.
    pub fn get_global(&self, name: impl AsRef<str>) -> Option<Value> {
        self.vm.global_scope().lookup(name.as_ref())
    }

    /// Parses `source` and loads it for execution, without running it.
    pub fn load(&mut self, source: &str) -> Result<()> {
        let ast = wisp_parser::parse(source)?;
        self.vm.load(Rc::new(ast));
        Ok(())
    }

    /// Parses and runs `source` to completion, returning the output lines
    /// collected from `echo`.
    pub fn run(&mut self, source: &str) -> Result<Vec<String>> {
        let ast = wisp_parser::parse(source)?;
        self.vm.eval_to_end(Rc::new(ast))?;
        Ok(self.vm.take_output())
    }

    /// Reads `path`, then behaves like [`Wisp::run`]. A missing or
    /// unreadable file surfaces as a runtime error so callers don't need a
    /// second error type just for the CLI's file-handling path.
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| Error::runtime(format!("Cannot read {}: {e}", path.display()), 0, 0))?;
        self.run(&source)
    }

    /// Parses and evaluates `source` eagerly against the global scope,
    /// bypassing the frame stack. Equivalent in its final bindings to
    /// loading and stepping the same source to completion.
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        let ast = wisp_parser::parse(source)?;
        self.vm.eval_program(Rc::new(ast))
    }

    /// Evaluates a standalone fragment against the VM's current paused
    /// state, without disturbing `current_line`, the frame stack, or
    /// whether the VM has finished. See [`wisp_runtime::Vm::run_interactive`].
    pub fn run_interactive(&mut self, source: &str) -> InteractiveResult {
        self.vm.run_interactive(source)
    }

    /// Steps exactly one statement.
    pub fn step(&mut self) -> Result<()> {
        self.vm.step()
    }

    /// Steps into the next statement, entering any call/branch/loop it begins.
    pub fn step_into(&mut self) -> Result<()> {
        self.vm.step_into()
    }

    /// Steps over the next statement, running any call/branch/loop it
    /// begins to completion before returning.
    pub fn step_over(&mut self) -> Result<()> {
        self.vm.step_over()
    }

    /// Steps until control returns to the caller of the current function.
    pub fn step_out(&mut self) -> Result<()> {
        self.vm.step_out()
    }

    /// Runs until the next breakpoint or program end.
    pub fn continue_(&mut self) -> Result<()> {
        self.vm.continue_()
    }

    pub fn add_breakpoint(&mut self, line: u32) {
        self.vm.add_breakpoint(line);
    }

    pub fn remove_breakpoint(&mut self, line: u32) {
        self.vm.remove_breakpoint(line);
    }

    pub fn clear_breakpoints(&mut self) {
        self.vm.clear_breakpoints();
    }

    /// The 1-based source line the VM is paused on.
    pub fn current_line(&self) -> u32 {
        self.vm.current_line()
    }

    /// Whether the loaded program has run to completion.
    pub fn is_finished(&self) -> bool {
        self.vm.is_finished()
    }

    /// The number of function activations currently on the frame stack.
    pub fn call_depth(&self) -> usize {
        self.vm.call_depth()
    }

    /// The scope active at the VM's current suspension point.
    pub fn current_scope(&self) -> &ScopeRef {
        self.vm.current_scope()
    }

    /// The outermost scope, open to pre-run native/global registration.
    pub fn global_scope(&self) -> &ScopeRef {
        self.vm.global_scope()
    }

    /// Output lines collected so far by `echo`, without clearing them.
    pub fn output(&self) -> &[String] {
        self.vm.output()
    }

    /// Access to the underlying VM, for callers that need the full
    /// `wisp_runtime` surface rather than this facade's subset of it.
    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_collects_echo_output() {
        let mut wisp = Wisp::new();
        let output = wisp.run("echo \"hello\"\necho 1 + 2\n").unwrap();
        assert_eq!(output, vec!["hello".to_string(), "3".to_string()]);
    }

    #[test]
    fn add_native_is_callable_from_script() {
        let mut wisp = Wisp::new();
        wisp.add_native("double", |args| match args {
            [Value::Int(n)] => Ok(Value::Int(n * 2)),
            _ => Ok(Value::Nil),
        });
        let output = wisp.run("echo double(21)\n").unwrap();
        assert_eq!(output, vec!["42".to_string()]);
    }

    #[test]
    fn set_global_is_visible_to_script() {
        let mut wisp = Wisp::new();
        wisp.set_global("greeting", Value::str("hi"));
        let output = wisp.run("echo greeting\n").unwrap();
        assert_eq!(output, vec!["hi".to_string()]);
    }

    #[test]
    fn stepping_pauses_mid_program() {
        let mut wisp = Wisp::new();
        wisp.load("let x = 1\nlet y = 2\n").unwrap();
        assert_eq!(wisp.current_line(), 1);
        wisp.step_into().unwrap();
        assert_eq!(wisp.current_line(), 2);
        wisp.step_into().unwrap();
        assert!(wisp.is_finished());
    }

    #[test]
    fn run_file_reports_missing_file() {
        let mut wisp = Wisp::new();
        let result = wisp.run_file("/no/such/file.wisp");
        assert!(result.is_err());
    }
}
