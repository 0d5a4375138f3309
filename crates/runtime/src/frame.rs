//! The execution frame stack.
//!
//! A frame is a suspended point of control flow: a block of statements, a
//! loop iteration, or a function activation. The VM's `step` always acts on
//! the innermost (top) frame; pushing and popping frames is how calls,
//! loops, and branches are entered and left without reaching for host
//! recursion, which is what lets a host suspend between any two statements.

use crate::scope::ScopeRef;
use crate::value::Value;
use wisp_parser::{AssignTarget, AstIndex};

/// Where a function's return value goes when its frame retires.
pub enum ReturnSink {
    /// `let name = f(...)` / `var name = f(...)`
    Binding { name: String, is_const: bool },
    /// `target = f(...)`, where `target` is an index or field assignment
    /// evaluated in the caller's scope once the call completes.
    Assign(AssignTarget),
    /// The call appeared as a bare statement or inside a larger expression;
    /// its result is discarded.
    Discard,
}

/// One entry on the VM's execution stack.
pub enum Frame {
    /// A straight-line sequence of statements: the body of the program, an
    /// `if`/`elif`/`else` branch, or a function body.
    Block { stmts: Vec<AstIndex>, index: usize, scope: ScopeRef },

    /// One iteration of a `for` loop over a materialised value list.
    ForLoop {
        values: Vec<Value>,
        iter_index: usize,
        var_name: String,
        body: Vec<AstIndex>,
        stmt_index: usize,
        scope: ScopeRef,
    },

    /// A `while` loop, re-testing its condition each time the body is exhausted.
    WhileLoop {
        condition: AstIndex,
        body: Vec<AstIndex>,
        stmt_index: usize,
        scope: ScopeRef,
    },

    /// A user-defined function activation.
    Function {
        name: String,
        body: Vec<AstIndex>,
        stmt_index: usize,
        /// The scope the function body executes in (parameters + locals).
        scope: ScopeRef,
        /// The scope active at the call site, restored when this frame retires.
        calling_scope: ScopeRef,
        sink: ReturnSink,
        /// The call statement's source position, used to attribute errors
        /// raised while delivering the return value to an assignment target.
        line: u32,
        column: u32,
    },
}

impl Frame {
    /// The scope `step` should make current while executing this frame.
    pub fn scope(&self) -> &ScopeRef {
        match self {
            Frame::Block { scope, .. } => scope,
            Frame::ForLoop { scope, .. } => scope,
            Frame::WhileLoop { scope, .. } => scope,
            Frame::Function { scope, .. } => scope,
        }
    }

    /// The statement list currently being executed.
    pub fn stmts(&self) -> &[AstIndex] {
        match self {
            Frame::Block { stmts, .. } => stmts,
            Frame::ForLoop { body, .. } => body,
            Frame::WhileLoop { body, .. } => body,
            Frame::Function { body, .. } => body,
        }
    }

    /// The index of the next statement to execute within [`Frame::stmts`].
    pub fn index(&self) -> usize {
        match self {
            Frame::Block { index, .. } => *index,
            Frame::ForLoop { stmt_index, .. } => *stmt_index,
            Frame::WhileLoop { stmt_index, .. } => *stmt_index,
            Frame::Function { stmt_index, .. } => *stmt_index,
        }
    }

    /// True once `index()` has moved past the end of `stmts()`.
    pub fn is_exhausted(&self) -> bool {
        self.index() >= self.stmts().len()
    }

    /// Advances past the current statement without retiring the frame.
    pub fn advance_index(&mut self) {
        match self {
            Frame::Block { index, .. } => *index += 1,
            Frame::ForLoop { stmt_index, .. } => *stmt_index += 1,
            Frame::WhileLoop { stmt_index, .. } => *stmt_index += 1,
            Frame::Function { stmt_index, .. } => *stmt_index += 1,
        }
    }

    /// Forces the index past the end, so the next `advance` retires or
    /// re-iterates this frame. Used by `break`/`continue`.
    pub fn force_exhausted(&mut self) {
        let len = self.stmts().len();
        match self {
            Frame::Block { index, .. } => *index = len,
            Frame::ForLoop { stmt_index, .. } => *stmt_index = len,
            Frame::WhileLoop { stmt_index, .. } => *stmt_index = len,
            Frame::Function { stmt_index, .. } => *stmt_index = len,
        }
    }

    /// True for frame kinds that `break`/`continue` act on.
    pub fn is_loop(&self) -> bool {
        matches!(self, Frame::ForLoop { .. } | Frame::WhileLoop { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Frame::Function { .. })
    }

    /// The source line to report while paused inside this frame, given the
    /// AST to resolve statement indices against. `None` if this frame has
    /// no more statements (its line comes from retiring instead).
    pub fn current_statement(&self) -> Option<AstIndex> {
        self.stmts().get(self.index()).copied()
    }
}
