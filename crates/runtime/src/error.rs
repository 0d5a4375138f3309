//! The unified error type shared by lexing, parsing, and evaluation.
//!
//! Every public entry point in the Wisp stack returns `Result<T, Error>`, so
//! an embedder never needs to match on three different error types: `Error`
//! is the base category, with `Lex`, `Parse`, and `Runtime` as its three
//! members. `Display` always renders the form
//! `<category> at line L, column C: <detail>`.

use wisp_lexer::LexError;
use wisp_parser::ParseError;

/// The result type returned by every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A runtime error: something that went wrong while a statement or
/// expression was being evaluated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("runtime error at line {line}, column {column}: {detail}")]
pub struct RuntimeError {
    pub detail: String,
    pub line: u32,
    pub column: u32,
}

impl RuntimeError {
    pub fn new(detail: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            detail: detail.into(),
            line,
            column,
        }
    }

    pub fn undefined_variable(name: &str, line: u32, column: u32) -> Self {
        Self::new(format!("Undefined variable '{name}'"), line, column)
    }

    pub fn division_by_zero(line: u32, column: u32) -> Self {
        Self::new("Division by zero", line, column)
    }

    pub fn modulo_by_zero(line: u32, column: u32) -> Self {
        Self::new("Modulo by zero", line, column)
    }

    pub fn assign_to_constant(name: &str, line: u32, column: u32) -> Self {
        Self::new(format!("Cannot assign to constant '{name}'"), line, column)
    }

    pub fn index_out_of_bounds(index: i64, line: u32, column: u32) -> Self {
        Self::new(format!("Array index {index} out of bounds"), line, column)
    }

    pub fn cannot_index(type_name: &str, line: u32, column: u32) -> Self {
        Self::new(format!("Cannot index {type_name}"), line, column)
    }

    pub fn table_key_must_be_string(line: u32, column: u32) -> Self {
        Self::new("Table key must be a string", line, column)
    }

    pub fn arity_mismatch(expected: usize, got: usize, line: u32, column: u32) -> Self {
        Self::new(format!("Expected {expected} arguments, got {got}"), line, column)
    }

    pub fn cannot_iterate(type_name: &str, line: u32, column: u32) -> Self {
        Self::new(format!("Cannot iterate over {type_name}"), line, column)
    }

    pub fn cannot_call(type_name: &str, line: u32, column: u32) -> Self {
        Self::new(format!("Cannot call {type_name}"), line, column)
    }
}

/// The shared error type returned from lexing, parsing, and evaluation.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// An error raised while scanning source into tokens
    #[error(transparent)]
    Lex(#[from] LexError),
    /// An error raised while parsing tokens into an AST
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// An error raised while evaluating a loaded AST
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn runtime(detail: impl Into<String>, line: u32, column: u32) -> Self {
        Self::Runtime(RuntimeError::new(detail, line, column))
    }

    /// The 1-based line the error occurred on.
    pub fn line(&self) -> u32 {
        match self {
            Self::Lex(e) => e.line,
            Self::Parse(e) => e.line(),
            Self::Runtime(e) => e.line,
        }
    }

    /// The 1-based column the error occurred on.
    pub fn column(&self) -> u32 {
        match self {
            Self::Lex(e) => e.column,
            Self::Parse(e) => e.column(),
            Self::Runtime(e) => e.column,
        }
    }

    /// The human-readable detail message, without the `<category> at ...` prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::Lex(e) => e.detail.clone(),
            Self::Parse(e) => e.detail(),
            Self::Runtime(e) => e.detail.clone(),
        }
    }
}
