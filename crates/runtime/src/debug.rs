//! Debug controls (§4.3): the derived stepping modes built on top of the
//! single `step` primitive, plus breakpoint management.

use crate::error::Result;
use crate::vm::Vm;
use tracing::debug;

impl Vm {
    /// Exactly `step`: after a call statement executes, the next call to
    /// `step_into` (or `step`) lands inside the callee.
    pub fn step_into(&mut self) -> Result<()> {
        self.step()
    }

    /// Runs `step` once, then continues stepping while the frame stack is
    /// deeper than it was beforehand. A statement whose dispatch doesn't
    /// push a frame (or whose pushed frame retires within that one step)
    /// produces exactly one step; a statement that enters a call, branch,
    /// or loop runs that nested work to completion before returning.
    pub fn step_over(&mut self) -> Result<()> {
        let depth = self.frame_depth();
        self.step()?;
        while !self.is_finished() && self.frame_depth() > depth {
            self.step()?;
        }
        Ok(())
    }

    /// Steps until the frame stack unwinds below its depth at the time of
    /// the call, or the program finishes — whichever comes first.
    pub fn step_out(&mut self) -> Result<()> {
        let depth = self.frame_depth();
        while !self.is_finished() && self.frame_depth() >= depth {
            self.step()?;
        }
        Ok(())
    }

    /// Steps once unconditionally, then keeps stepping until the current
    /// line is a breakpoint or the program finishes. Breakpoints fire
    /// before the statement on that line executes.
    pub fn continue_(&mut self) -> Result<()> {
        self.step()?;
        loop {
            if self.is_finished() {
                break;
            }
            if self.has_breakpoint(self.current_line()) {
                debug!(line = self.current_line(), "breakpoint hit");
                break;
            }
            self.step()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::vm::Vm;
    use std::rc::Rc;

    fn load_source(vm: &mut Vm, source: &str) {
        let ast = wisp_parser::parse(source).expect("source must parse");
        vm.load(Rc::new(ast));
    }

    #[test]
    fn step_into_enters_function_body() {
        let mut vm = Vm::new();
        load_source(
            &mut vm,
            "proc add(a, b) =\n  return a + b\n\nlet result = add(3, 4)\n",
        );
        let mut lines = vec![vm.current_line()];
        while !vm.is_finished() {
            vm.step_into().unwrap();
            if !vm.is_finished() {
                lines.push(vm.current_line());
            }
        }
        assert_eq!(lines, vec![1, 4, 2]);
        assert!(matches!(vm.global_scope().lookup("result"), Some(crate::value::Value::Int(7))));
    }

    #[test]
    fn step_over_skips_call_body() {
        let mut vm = Vm::new();
        load_source(
            &mut vm,
            "proc add(a, b) =\n  return a + b\n\nlet result = add(3, 4)\n\nlet y = 10\n",
        );
        vm.step_over().unwrap(); // past the proc definition
        vm.step_over().unwrap(); // runs add() to completion
        assert_eq!(vm.current_line(), 6);
        assert!(matches!(vm.global_scope().lookup("result"), Some(crate::value::Value::Int(7))));
        vm.step_over().unwrap();
        assert!(vm.is_finished());
        assert!(matches!(vm.global_scope().lookup("y"), Some(crate::value::Value::Int(10))));
    }

    #[test]
    fn continue_stops_at_breakpoint_inside_function() {
        let mut vm = Vm::new();
        load_source(
            &mut vm,
            "proc compute(n) =\n  let a = n * 2\n  let b = a + 1\n  return b\n\nlet result = compute(5)\n",
        );
        vm.add_breakpoint(3);
        vm.continue_().unwrap();
        assert_eq!(vm.current_line(), 3);
        assert!(matches!(vm.current_scope().lookup("a"), Some(crate::value::Value::Int(10))));
        vm.continue_().unwrap();
        assert!(vm.is_finished());
        assert!(matches!(vm.global_scope().lookup("result"), Some(crate::value::Value::Int(11))));
    }
}
