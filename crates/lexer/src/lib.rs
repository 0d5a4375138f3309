//! The character-by-character lexer for the Wisp language.
//!
//! The lexer is a thin, stateless-between-calls scanner: [`Lexer::new`] wraps
//! a source string and [`Iterator::next`] pulls one [`Token`] at a time,
//! alongside its [`Span`]. Indentation is not modelled as synthetic
//! `Indent`/`Dedent` tokens; instead each token carries the 1-based column of
//! the first non-whitespace character on its line, and the parser (which
//! knows where blocks start) compares columns directly. This keeps the
//! lexer free of any parsing state.

use std::{iter::Peekable, str::CharIndices};
use unicode_width::UnicodeWidthChar;
use unicode_xid::UnicodeXID;

/// A 1-based line/column position in the source.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// A start/end pair of [`Position`]s.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// The tokens that can emerge from the lexer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Token {
    Error,
    Whitespace,
    NewLine,
    CommentSingle,

    Int,
    Float,
    Id,
    StringLiteral,

    // Symbols
    Colon,
    Comma,
    Dollar,
    Dot,
    Ampersand,
    RoundOpen,
    RoundClose,
    SquareOpen,
    SquareClose,
    CurlyOpen,
    CurlyClose,
    RangeInclusive,
    RangeExclusive,

    // Operators
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Assign,

    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,

    // Keywords
    And,
    Or,
    Not,
    In,
    Div,
    Mod,
    True,
    False,
    Nil,
    Let,
    Var,
    If,
    Elif,
    Else,
    For,
    While,
    Break,
    Continue,
    Return,
    Proc,
    Type,
    Set,
    Echo,

    Eof,
}

impl Token {
    /// Returns true if the token should be skipped by the parser.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace | Token::CommentSingle)
    }
}

/// A single scanned token: its kind, source span, and the slice of source it covers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LexedToken<'a> {
    pub token: Token,
    pub span: Span,
    pub slice: &'a str,
    /// The column of the first non-whitespace token on this token's line.
    pub line_indent: u32,
}

const KEYWORDS: &[(&str, Token)] = &[
    ("and", Token::And),
    ("or", Token::Or),
    ("not", Token::Not),
    ("in", Token::In),
    ("div", Token::Div),
    ("mod", Token::Mod),
    ("true", Token::True),
    ("false", Token::False),
    ("nil", Token::Nil),
    ("let", Token::Let),
    ("var", Token::Var),
    ("if", Token::If),
    ("elif", Token::Elif),
    ("else", Token::Else),
    ("for", Token::For),
    ("while", Token::While),
    ("break", Token::Break),
    ("continue", Token::Continue),
    ("return", Token::Return),
    ("proc", Token::Proc),
    ("type", Token::Type),
    ("set", Token::Set),
    ("echo", Token::Echo),
];

/// Scans a Wisp source string into a stream of [`LexedToken`]s.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    position: Position,
    line_indent: u32,
    at_line_start: bool,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: Position { line: 1, column: 1 },
            line_indent: 1,
            at_line_start: true,
            done: false,
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += c.width().unwrap_or(1) as u32;
            }
        }
        next
    }

    fn make(&self, token: Token, start: Position, start_byte: usize, slice_end: usize) -> LexedToken<'a> {
        LexedToken {
            token,
            span: Span {
                start,
                end: self.position,
            },
            slice: &self.source[start_byte..slice_end],
            line_indent: self.line_indent,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexedToken<'a>;

    fn next(&mut self) -> Option<LexedToken<'a>> {
        if self.done {
            return None;
        }

        let Some(&(start_byte, c)) = self.chars.peek() else {
            self.done = true;
            let pos = self.position;
            return Some(LexedToken {
                token: Token::Eof,
                span: Span { start: pos, end: pos },
                slice: "",
                line_indent: self.line_indent,
            });
        };
        let start = self.position;

        // whitespace (not newline)
        if c == ' ' || c == '\t' {
            while matches!(self.peek_char(), Some(' ') | Some('\t')) {
                self.bump();
            }
            if self.at_line_start {
                self.line_indent = self.position.column;
            }
            let (_, end_byte) = self
                .chars
                .peek()
                .map(|&(i, _)| (i, i))
                .unwrap_or((self.source.len(), self.source.len()));
            return Some(self.make(Token::Whitespace, start, start_byte, end_byte));
        }

        if c == '\r' || c == '\n' {
            if c == '\r' {
                self.bump();
                if self.peek_char() != Some('\n') {
                    return Some(self.make(Token::Error, start, start_byte, start_byte + 1));
                }
            }
            self.bump();
            self.at_line_start = true;
            self.line_indent = 1;
            let end_byte = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len());
            let tok = self.make(Token::NewLine, start, start_byte, end_byte);
            return Some(tok);
        }

        self.at_line_start = false;

        if c == '#' {
            while !matches!(self.peek_char(), Some('\n') | Some('\r') | None) {
                self.bump();
            }
            let end_byte = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len());
            return Some(self.make(Token::CommentSingle, start, start_byte, end_byte));
        }

        if c == '"' {
            return Some(self.scan_string(start, start_byte));
        }

        if c.is_ascii_digit() {
            return Some(self.scan_number(start, start_byte));
        }

        if c.is_xid_start() || c == '_' {
            return Some(self.scan_identifier(start, start_byte));
        }

        self.scan_symbol(start, start_byte)
    }
}

impl<'a> Lexer<'a> {
    fn scan_string(&mut self, start: Position, start_byte: usize) -> LexedToken<'a> {
        self.bump(); // opening quote
        loop {
            match self.bump() {
                Some((_, '"')) => {
                    let end_byte = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len());
                    return self.make(Token::StringLiteral, start, start_byte, end_byte);
                }
                Some((_, '\\')) => {
                    self.bump();
                }
                Some((_, '\n')) | None => {
                    let end_byte = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len());
                    return self.make(Token::Error, start, start_byte, end_byte);
                }
                Some(_) => {}
            }
        }
    }

    fn scan_number(&mut self, start: Position, start_byte: usize) -> LexedToken<'a> {
        let mut is_float = false;
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek_char() == Some('.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some((_, c)) if c.is_ascii_digit()) {
                is_float = true;
                self.bump();
                while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        let end_byte = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len());
        let token = if is_float { Token::Float } else { Token::Int };
        self.make(token, start, start_byte, end_byte)
    }

    fn scan_identifier(&mut self, start: Position, start_byte: usize) -> LexedToken<'a> {
        while matches!(self.peek_char(), Some(c) if c.is_xid_continue() || c == '_') {
            self.bump();
        }
        let end_byte = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len());
        let slice = &self.source[start_byte..end_byte];
        let token = KEYWORDS
            .iter()
            .find(|(kw, _)| *kw == slice)
            .map(|(_, tok)| *tok)
            .unwrap_or(Token::Id);
        self.make(token, start, start_byte, end_byte)
    }

    fn scan_symbol(&mut self, start: Position, start_byte: usize) -> Option<LexedToken<'a>> {
        let (_, c) = self.bump().unwrap();
        let two_char = |lexer: &mut Self, expect: char, one: Token, two: Token| {
            if lexer.peek_char() == Some(expect) {
                lexer.bump();
                two
            } else {
                one
            }
        };

        let token = match c {
            ':' => Token::Colon,
            ',' => Token::Comma,
            '$' => Token::Dollar,
            '&' => Token::Ampersand,
            '(' => Token::RoundOpen,
            ')' => Token::RoundClose,
            '[' => Token::SquareOpen,
            ']' => Token::SquareClose,
            '{' => Token::CurlyOpen,
            '}' => Token::CurlyClose,
            '+' => Token::Add,
            '-' => Token::Subtract,
            '*' => Token::Multiply,
            '/' => Token::Divide,
            '%' => Token::Remainder,
            '=' => two_char(self, '=', Token::Assign, Token::Equal),
            '!' => {
                if self.peek_char() == Some('=') {
                    self.bump();
                    Token::NotEqual
                } else {
                    Token::Error
                }
            }
            '<' => two_char(self, '=', Token::Less, Token::LessOrEqual),
            '>' => two_char(self, '=', Token::Greater, Token::GreaterOrEqual),
            '.' => {
                if self.peek_char() == Some('.') {
                    self.bump();
                    if self.peek_char() == Some('<') {
                        self.bump();
                        Token::RangeExclusive
                    } else {
                        Token::RangeInclusive
                    }
                } else {
                    Token::Dot
                }
            }
            _ => Token::Error,
        };

        let end_byte = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len());
        Some(self.make(token, start, start_byte, end_byte))
    }
}

/// An error raised while scanning source into tokens.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("lex error at line {line}, column {column}: {detail}")]
pub struct LexError {
    pub detail: String,
    pub line: u32,
    pub column: u32,
}

/// Scans `source` into a flat token list, or the first [`LexError`] encountered.
///
/// Whitespace and comment tokens are retained; callers that don't need them
/// (the parser) filter with [`Token::is_whitespace`].
pub fn tokenize(source: &str) -> Result<Vec<LexedToken<'_>>, LexError> {
    let mut tokens = Vec::new();
    for lexed in Lexer::new(source) {
        if lexed.token == Token::Error {
            let detail = if lexed.slice.starts_with('"') {
                "Unterminated string".to_string()
            } else {
                format!("Unexpected character near '{}'", lexed.slice)
            };
            return Err(LexError {
                detail,
                line: lexed.span.start.line,
                column: lexed.span.start.column,
            });
        }
        tokens.push(lexed);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .map(|t| t.token)
            .filter(|t| !t.is_whitespace())
            .collect()
    }

    #[test]
    fn basic_assignment() {
        let toks = tokens("let a = 1\n");
        assert_eq!(
            toks,
            vec![
                Token::Let,
                Token::Id,
                Token::Assign,
                Token::Int,
                Token::NewLine,
                Token::Eof
            ]
        );
    }

    #[test]
    fn range_tokens() {
        assert_eq!(
            tokens("1..3"),
            vec![Token::Int, Token::RangeInclusive, Token::Int, Token::Eof]
        );
        assert_eq!(
            tokens("1..<3"),
            vec![Token::Int, Token::RangeExclusive, Token::Int, Token::Eof]
        );
    }

    #[test]
    fn unterminated_string_errors() {
        let toks: Vec<_> = Lexer::new("\"abc").collect();
        assert!(toks.iter().any(|t| t.token == Token::Error));
    }

    #[test]
    fn float_vs_int() {
        assert_eq!(tokens("42"), vec![Token::Int, Token::Eof]);
        assert_eq!(tokens("4.5"), vec![Token::Float, Token::Eof]);
    }

    #[test]
    fn line_indent_tracks_first_non_whitespace_column() {
        let toks: Vec<_> = Lexer::new("  let a = 1\n").collect();
        let id_tok = toks.iter().find(|t| t.token == Token::Let).unwrap();
        assert_eq!(id_tok.line_indent, 3);
    }
}
