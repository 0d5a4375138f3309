//! The AST and recursive-descent parser for the Wisp language.
//!
//! This crate is an external collaborator to the VM at the heart of this
//! workspace (`wisp_runtime`): it turns source text into an [`Ast`], and the
//! VM never looks back at tokens or source text again. See [`parse`] for the
//! entry point.

mod ast;
mod error;
mod node;
mod parser;

pub use ast::{Ast, AstIndex, AstNode};
pub use error::ParseError;
pub use node::{
    AssignTarget, AstFor, AstIf, BinaryOp, FunctionNode, Node, UnaryOp,
};
pub use parser::parse;

pub use wisp_lexer::{Position, Span};
