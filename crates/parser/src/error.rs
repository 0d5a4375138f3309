use wisp_lexer::LexError;

/// An error raised while parsing a token stream into an [`Ast`](crate::Ast).
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// A syntax error detected by the parser itself
    #[error("parse error at line {line}, column {column}: {detail}")]
    Syntax {
        detail: String,
        line: u32,
        column: u32,
    },
    /// An error surfaced from the lexer while tokenizing the source
    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    pub fn syntax(detail: impl Into<String>, line: u32, column: u32) -> Self {
        Self::Syntax {
            detail: detail.into(),
            line,
            column,
        }
    }

    /// The 1-based line the error occurred on.
    pub fn line(&self) -> u32 {
        match self {
            Self::Syntax { line, .. } => *line,
            Self::Lex(e) => e.line,
        }
    }

    /// The 1-based column the error occurred on.
    pub fn column(&self) -> u32 {
        match self {
            Self::Syntax { column, .. } => *column,
            Self::Lex(e) => e.column,
        }
    }

    /// The human-readable detail message, without the `parse error at ...` prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::Syntax { detail, .. } => detail.clone(),
            Self::Lex(e) => e.detail.clone(),
        }
    }

    /// True if this error originated in the lexer rather than the parser proper.
    pub fn is_lex_error(&self) -> bool {
        matches!(self, Self::Lex(_))
    }
}
