//! The frame stack and stepper (§4.2): the heart of the runtime.
//!
//! `Vm` owns the global scope, the current execution frame stack, and all
//! the bookkeeping `step` needs to suspend and resume between statements.
//! Everything here deals in statement granularity; expression evaluation
//! within one step is delegated to `eval.rs`.

use crate::error::{Result, RuntimeError};
use crate::frame::{Frame, ReturnSink};
use crate::scope::ScopeRef;
use crate::value::{FunctionValue, TypeDescriptor, Value};
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, trace};
use wisp_parser::{Ast, AstFor, AstIf, AstIndex, Node};

/// The reason the innermost statement sequence stopped running normally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ControlFlow {
    None,
    Break,
    Continue,
    Return,
}

/// The tree-walking virtual machine.
///
/// A `Vm` is created once and `load`ed with successive ASTs; the global
/// scope and breakpoint set persist across `load` calls so a host can
/// re-run a modified script while keeping breakpoints and globals in place.
pub struct Vm {
    ast: Option<Rc<Ast>>,
    global: ScopeRef,
    pub(crate) current_scope: ScopeRef,
    pub(crate) output: Vec<String>,
    pub(crate) return_value: Option<Value>,
    pub(crate) control_flow: ControlFlow,
    frames: Vec<Frame>,
    current_line: u32,
    finished: bool,
    breakpoints: HashSet<u32>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// Creates a fresh VM with the standard library bound into its global
    /// scope and no loaded program.
    pub fn new() -> Self {
        let global = ScopeRef::new_global();
        crate::stdlib::install(&global);
        Vm {
            ast: None,
            current_scope: global.clone(),
            global,
            output: Vec::new(),
            return_value: None,
            control_flow: ControlFlow::None,
            frames: Vec::new(),
            current_line: 0,
            finished: true,
            breakpoints: HashSet::new(),
        }
    }

    /// The global scope, open to embedding code for registering natives and
    /// globals before execution begins.
    pub fn global_scope(&self) -> &ScopeRef {
        &self.global
    }

    /// The scope active at the current pause point.
    pub fn current_scope(&self) -> &ScopeRef {
        &self.current_scope
    }

    /// The output lines collected so far via `echo`.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Drains and returns the collected output lines.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub fn current_line(&self) -> u32 {
        self.current_line
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The number of function activations currently on the stack.
    pub fn call_depth(&self) -> usize {
        self.frames.iter().filter(|f| f.is_function()).count()
    }

    /// The total number of frames on the stack, used by the `step-over`/
    /// `step-out` debug controls to detect when a statement's nested work
    /// (whether a call, a branch, or a loop) has fully unwound.
    pub(crate) fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn add_breakpoint(&mut self, line: u32) {
        self.breakpoints.insert(line);
    }

    pub fn remove_breakpoint(&mut self, line: u32) {
        self.breakpoints.remove(&line);
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn has_breakpoint(&self, line: u32) -> bool {
        self.breakpoints.contains(&line)
    }

    pub(crate) fn is_breakpoint_line(&self, line: u32) -> bool {
        self.breakpoints.contains(&line)
    }

    fn ast(&self) -> &Ast {
        self.ast.as_ref().expect("ast must be loaded before stepping")
    }

    /// Swaps in a different AST for the duration of an out-of-band
    /// evaluation (the interactive evaluator), returning the previous one
    /// so the caller can restore it with a second call once done.
    pub(crate) fn swap_ast(&mut self, ast: Option<Rc<Ast>>) -> Option<Rc<Ast>> {
        std::mem::replace(&mut self.ast, ast)
    }

    /// Resets frames and control state and pushes a block frame over the
    /// program's top-level statements. The global scope and breakpoint set
    /// survive the reset; `current_scope` is reset to global.
    pub fn load(&mut self, ast: Rc<Ast>) {
        let top_level = match &ast.node(ast.root()).node {
            Node::Program(stmts) => stmts.clone(),
            _ => vec![ast.root()],
        };
        debug!(statements = top_level.len(), "loading program");
        self.ast = Some(ast);
        self.frames.clear();
        self.output.clear();
        self.return_value = None;
        self.control_flow = ControlFlow::None;
        self.current_scope = self.global.clone();
        if top_level.is_empty() {
            self.finished = true;
            self.current_line = 0;
            return;
        }
        self.current_line = self.ast().node(top_level[0]).span.start.line;
        self.frames.push(Frame::Block { stmts: top_level, index: 0, scope: self.global.clone() });
        self.finished = false;
    }

    /// Updates `current_line` from the innermost frame's next statement,
    /// or runs `advance` (cascading through as many exhausted frames as
    /// necessary) when the innermost frame has none left (§4.2).
    fn settle(&mut self) -> Result<()> {
        if self.frames.is_empty() {
            self.finished = true;
            return Ok(());
        }
        let top = self.frames.len() - 1;
        if let Some(stmt) = self.frames[top].current_statement() {
            self.current_line = self.ast().node(stmt).span.start.line;
            Ok(())
        } else {
            self.advance()
        }
    }

    /// Executes exactly one source statement in the innermost frame (§4.2).
    pub fn step(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        if self.frames.is_empty() {
            self.finished = true;
            return Ok(());
        }
        let top = self.frames.len() - 1;
        if self.frames[top].is_exhausted() {
            return self.advance();
        }

        let stmt_idx = self.frames[top].current_statement().expect("checked not exhausted");
        let scope = self.frames[top].scope().clone();
        self.current_scope = scope.clone();
        let ast_node = self.ast().node(stmt_idx).clone();
        let line = ast_node.span.start.line;
        let column = ast_node.span.start.column;
        trace!(line, column, "step");

        match ast_node.node {
            Node::Let { name, value } => self.step_binding(top, scope, name, value, true, line, column)?,
            Node::Var { name, value } => self.step_binding(top, scope, name, value, false, line, column)?,
            Node::Assign { target, value } => {
                if let Some((func, args)) = self.try_statement_call(value)? {
                    self.enter_call(func, args, scope, ReturnSink::Assign(target), line, column)?;
                } else {
                    let v = self.eval(value)?;
                    self.apply_assign(&target, v, line, column)?;
                }
                self.frames[top].advance_index();
            }
            Node::FunctionDef(func) => {
                let value = Value::Function(Rc::new(FunctionValue {
                    name: func.name.clone(),
                    params: func.params,
                    body: func.body,
                    captured_scope: scope.clone(),
                }));
                scope.define(func.name, value, true);
                self.frames[top].advance_index();
            }
            Node::TypeDef { name, fields } => {
                let value = Value::Type(Rc::new(TypeDescriptor { name: name.clone(), fields }));
                scope.define(name, value, true);
                self.frames[top].advance_index();
            }
            Node::Echo(args) => {
                let mut parts = Vec::with_capacity(args.len());
                for a in &args {
                    parts.push(self.eval(*a)?.display_string());
                }
                self.output.push(parts.join(" "));
                self.frames[top].advance_index();
            }
            Node::If(ast_if) => {
                self.frames[top].advance_index();
                self.step_if(&ast_if, scope)?;
            }
            Node::For(ast_for) => {
                self.frames[top].advance_index();
                self.step_for(&ast_for, scope, line, column)?;
            }
            Node::While { condition, body } => {
                self.frames[top].advance_index();
                self.step_while(condition, body, scope)?;
            }
            Node::Return(expr) => {
                let value = match expr {
                    Some(e) => self.eval(e)?,
                    None => Value::Nil,
                };
                self.return_value = Some(value);
                self.unwind_to_function()?;
            }
            Node::Break => self.unwind_break(),
            Node::Continue => self.unwind_continue(),
            Node::Call { callee, args } => {
                if let Some((func, arg_values)) = self.resolve_user_call(callee, &args)? {
                    self.enter_call(func, arg_values, scope, ReturnSink::Discard, line, column)?;
                } else {
                    self.eval(stmt_idx)?;
                }
                self.frames[top].advance_index();
            }
            _ => {
                self.eval(stmt_idx)?;
                self.frames[top].advance_index();
            }
        }

        self.settle()?;
        Ok(())
    }

    fn step_binding(
        &mut self,
        top: usize,
        scope: ScopeRef,
        name: String,
        value: AstIndex,
        is_const: bool,
        line: u32,
        column: u32,
    ) -> Result<()> {
        if let Some((func, args)) = self.try_statement_call(value)? {
            self.enter_call(func, args, scope, ReturnSink::Binding { name, is_const }, line, column)?;
        } else {
            let v = self.eval(value)?;
            scope.define(name, v, is_const);
        }
        self.frames[top].advance_index();
        Ok(())
    }

    fn step_if(&mut self, ast_if: &AstIf, scope: ScopeRef) -> Result<()> {
        self.current_scope = scope.clone();
        if self.eval(ast_if.condition)?.is_truthy() {
            self.push_block_frame(ast_if.then_block.clone(), scope);
            return Ok(());
        }
        for (cond, block) in &ast_if.elif_blocks {
            if self.eval(*cond)?.is_truthy() {
                self.push_block_frame(block.clone(), scope);
                return Ok(());
            }
        }
        if let Some(block) = &ast_if.else_block {
            self.push_block_frame(block.clone(), scope);
        }
        Ok(())
    }

    fn step_for(&mut self, ast_for: &AstFor, scope: ScopeRef, line: u32, column: u32) -> Result<()> {
        self.current_scope = scope.clone();
        let iterable = self.eval(ast_for.iterable)?;
        let values = self.materialize_iterable(&iterable, line, column)?;
        if values.is_empty() {
            return Ok(());
        }
        let child = scope.child();
        child.define(ast_for.var_name.clone(), values[0].clone(), false);
        self.frames.push(Frame::ForLoop {
            values,
            iter_index: 0,
            var_name: ast_for.var_name.clone(),
            body: ast_for.body.clone(),
            stmt_index: 0,
            scope: child,
        });
        Ok(())
    }

    fn step_while(&mut self, condition: AstIndex, body: Vec<AstIndex>, scope: ScopeRef) -> Result<()> {
        self.current_scope = scope.clone();
        if self.eval(condition)?.is_truthy() {
            let child = scope.child();
            self.frames.push(Frame::WhileLoop { condition, body, stmt_index: 0, scope: child });
        }
        Ok(())
    }

    fn push_block_frame(&mut self, stmts: Vec<AstIndex>, parent_scope: ScopeRef) {
        let child = parent_scope.child();
        self.frames.push(Frame::Block { stmts, index: 0, scope: child });
    }

    /// If `value` is a bare call to a user-defined function bound by
    /// identifier, evaluates its arguments and returns the function to call
    /// — letting the caller push a frame instead of calling it eagerly.
    /// Anything else (native call, non-call expression) is left for the
    /// caller to evaluate through the ordinary evaluator.
    fn try_statement_call(&mut self, expr_idx: AstIndex) -> Result<Option<(Rc<FunctionValue>, Vec<Value>)>> {
        let node = self.ast().node(expr_idx).node.clone();
        if let Node::Call { callee, args } = node {
            self.resolve_user_call(callee, &args)
        } else {
            Ok(None)
        }
    }

    fn resolve_user_call(&mut self, callee: AstIndex, args: &[AstIndex]) -> Result<Option<(Rc<FunctionValue>, Vec<Value>)>> {
        if let Node::Id(name) = self.ast().node(callee).node.clone() {
            if let Some(Value::Function(func)) = self.current_scope.lookup(&name) {
                let mut arg_values = Vec::with_capacity(args.len());
                for a in args {
                    arg_values.push(self.eval(*a)?);
                }
                return Ok(Some((func, arg_values)));
            }
        }
        Ok(None)
    }

    fn enter_call(
        &mut self,
        func: Rc<FunctionValue>,
        args: Vec<Value>,
        calling_scope: ScopeRef,
        sink: ReturnSink,
        line: u32,
        column: u32,
    ) -> Result<()> {
        if args.len() != func.params.len() {
            return Err(RuntimeError::arity_mismatch(func.params.len(), args.len(), line, column).into());
        }
        let activation = func.captured_scope.child();
        for (param, arg) in func.params.iter().zip(args) {
            activation.define(param.clone(), arg, false);
        }
        trace!(name = %func.name, depth = self.frames.len() + 1, "entering function frame");
        self.frames.push(Frame::Function {
            name: func.name.clone(),
            body: func.body.clone(),
            stmt_index: 0,
            scope: activation,
            calling_scope,
            sink,
            line,
            column,
        });
        Ok(())
    }

    fn unwind_break(&mut self) {
        while let Some(frame) = self.frames.last() {
            if frame.is_loop() {
                self.frames.pop();
                return;
            }
            self.frames.pop();
        }
    }

    fn unwind_continue(&mut self) {
        while let Some(frame) = self.frames.last_mut() {
            if frame.is_loop() {
                frame.force_exhausted();
                return;
            }
            self.frames.pop();
        }
    }

    fn unwind_to_function(&mut self) -> Result<()> {
        loop {
            match self.frames.last() {
                Some(frame) if frame.is_function() => break,
                Some(_) => {
                    self.frames.pop();
                }
                None => return Ok(()),
            }
        }
        let frame = self.frames.pop().expect("checked above");
        self.retire_function(frame)
    }

    /// Retires a frame whose statement index has reached the end of its
    /// statement list (§4.2, "Advance").
    fn advance(&mut self) -> Result<()> {
        if self.frames.is_empty() {
            self.finished = true;
            return Ok(());
        }
        let top = self.frames.len() - 1;

        enum Peek {
            Block,
            ForDone,
            ForNext,
            WhileLoop { condition: AstIndex, scope: ScopeRef },
            Function,
        }

        let peek = match &self.frames[top] {
            Frame::Block { .. } => Peek::Block,
            Frame::ForLoop { values, iter_index, .. } => {
                if iter_index + 1 >= values.len() {
                    Peek::ForDone
                } else {
                    Peek::ForNext
                }
            }
            Frame::WhileLoop { condition, scope, .. } => Peek::WhileLoop { condition: *condition, scope: scope.clone() },
            Frame::Function { .. } => Peek::Function,
        };

        match peek {
            Peek::Block | Peek::ForDone => {
                self.frames.pop();
            }
            Peek::ForNext => {
                if let Frame::ForLoop { values, iter_index, var_name, scope, stmt_index, .. } = &mut self.frames[top] {
                    *iter_index += 1;
                    let next_value = values[*iter_index].clone();
                    let parent = scope.parent().expect("for-loop scope always has a parent");
                    let fresh = parent.child();
                    fresh.define(var_name.clone(), next_value, false);
                    *scope = fresh;
                    *stmt_index = 0;
                }
            }
            Peek::WhileLoop { condition, scope } => {
                let prev = std::mem::replace(&mut self.current_scope, scope);
                let truthy = self.eval(condition)?.is_truthy();
                self.current_scope = prev;
                if truthy {
                    if let Frame::WhileLoop { stmt_index, .. } = &mut self.frames[top] {
                        *stmt_index = 0;
                    }
                } else {
                    self.frames.pop();
                }
            }
            Peek::Function => {
                let frame = self.frames.pop().expect("top is Function");
                self.retire_function(frame)?;
            }
        }

        self.settle()
    }

    fn retire_function(&mut self, frame: Frame) -> Result<()> {
        let Frame::Function { name, calling_scope, sink, line, column, .. } = frame else {
            unreachable!("retire_function called with non-function frame")
        };
        trace!(name = %name, depth = self.frames.len(), "retiring function frame");
        let value = self.return_value.take().unwrap_or(Value::Nil);
        self.control_flow = ControlFlow::None;
        self.current_scope = calling_scope.clone();
        match sink {
            ReturnSink::Binding { name, is_const } => {
                calling_scope.define(name, value, is_const);
            }
            ReturnSink::Assign(target) => {
                self.apply_assign(&target, value, line, column)?;
            }
            ReturnSink::Discard => {}
        }
        Ok(())
    }

    /// Evaluates an entire program eagerly against the global scope,
    /// bypassing the frame stack entirely. Produces the same final scope
    /// bindings as `load` followed by stepping to completion, and returns
    /// the value of the program's last top-level statement; used to check
    /// the stepper against the eager evaluator, and as the embedding
    /// surface's non-stepped `eval`.
    pub fn eval_program(&mut self, ast: Rc<Ast>) -> Result<Value> {
        let top_level = match &ast.node(ast.root()).node {
            Node::Program(stmts) => stmts.clone(),
            _ => vec![ast.root()],
        };
        let previous_ast = self.swap_ast(Some(ast));
        self.current_scope = self.global.clone();
        let result = self.eval_block(&top_level);
        self.swap_ast(previous_ast);
        result
    }

    /// Runs `load(ast)` followed by repeated `step` until finished.
    pub fn eval_to_end(&mut self, ast: Rc<Ast>) -> Result<()> {
        self.load(ast);
        while !self.is_finished() {
            self.step()?;
        }
        Ok(())
    }
}
