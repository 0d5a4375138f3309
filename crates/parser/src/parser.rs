use crate::{
    ast::{Ast, AstIndex},
    error::ParseError,
    node::{AssignTarget, AstFor, AstIf, BinaryOp, FunctionNode, Node, UnaryOp},
};
use wisp_lexer::{tokenize, LexedToken, Position, Span, Token};

/// Parses `source` into an [`Ast`].
///
/// A straightforward recursive-descent parser with precedence-climbing for
/// binary operators, and indentation tracked by comparing each token's
/// line-leading column rather than synthetic indent tokens.
pub fn parse(source: &str) -> Result<Ast, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        ast: Ast::new(),
    };
    parser.parse_program()
}

struct Parser<'a> {
    tokens: Vec<LexedToken<'a>>,
    pos: usize,
    ast: Ast,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &LexedToken<'a> {
        // Whitespace/comments were filtered out before tokens reached the
        // parser in `parse_program`'s initial pass; see `significant_tokens`.
        &self.tokens[self.pos]
    }

    fn peek_token(&self) -> Token {
        self.peek().token
    }

    fn bump(&mut self) -> LexedToken<'a> {
        let tok = self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        self.peek_token() == Token::Eof
    }

    fn position(&self) -> Position {
        self.peek().span.start
    }

    fn err(&self, detail: impl Into<String>) -> ParseError {
        let pos = self.position();
        ParseError::syntax(detail, pos.line, pos.column)
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<LexedToken<'a>, ParseError> {
        if self.peek_token() == token {
            Ok(self.bump())
        } else {
            Err(self.err(format!("Expected {what}")))
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek_token() == Token::NewLine {
            self.bump();
        }
    }

    fn end_statement(&mut self) -> Result<(), ParseError> {
        match self.peek_token() {
            Token::NewLine => {
                self.bump();
                Ok(())
            }
            Token::Eof => Ok(()),
            _ => Err(self.err("Expected end of statement")),
        }
    }

    fn push(&mut self, node: Node, span: Span) -> AstIndex {
        self.ast.push(node, span)
    }

    // Strip whitespace/comment tokens up front; the parser never needs them.
    fn retain_significant(tokens: Vec<LexedToken<'a>>) -> Vec<LexedToken<'a>> {
        tokens.into_iter().filter(|t| !t.token.is_whitespace()).collect()
    }

    fn parse_program(mut self) -> Result<Ast, ParseError> {
        self.tokens = Self::retain_significant(std::mem::take(&mut self.tokens));
        self.skip_newlines();
        let start = self.position();
        let mut stmts = Vec::new();
        let mut top_indent = None;
        while !self.at_eof() {
            let indent = self.peek().line_indent;
            match top_indent {
                None => top_indent = Some(indent),
                Some(expected) if expected != indent => {
                    return Err(self.err("Inconsistent indentation"))
                }
                _ => {}
            }
            stmts.push(self.parse_statement(indent)?);
            self.skip_newlines();
        }
        let root = self.push(Node::Program(stmts), Span { start, end: self.position() });
        self.ast.set_root(root);
        Ok(self.ast)
    }

    /// Parses an indented block whose statements must sit strictly to the
    /// right of `parent_indent`, and all share the same indent as each
    /// other.
    fn parse_block(&mut self, parent_indent: u32) -> Result<Vec<AstIndex>, ParseError> {
        self.skip_newlines();
        if self.at_eof() {
            return Err(self.err("Expected an indented block"));
        }
        let block_indent = self.peek().line_indent;
        if block_indent <= parent_indent {
            return Err(self.err("Expected an indented block"));
        }

        let mut stmts = Vec::new();
        loop {
            let indent = self.peek().line_indent;
            if indent < block_indent {
                break;
            }
            if indent > block_indent {
                return Err(self.err("Inconsistent indentation"));
            }
            stmts.push(self.parse_statement(block_indent)?);
            self.skip_newlines();
            if self.at_eof() {
                break;
            }
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self, own_indent: u32) -> Result<AstIndex, ParseError> {
        let start = self.position();
        match self.peek_token() {
            Token::Let => self.parse_let(start),
            Token::Var => self.parse_var(start),
            Token::Echo => self.parse_echo(start),
            Token::If => self.parse_if(start, own_indent),
            Token::For => self.parse_for(start, own_indent),
            Token::While => self.parse_while(start, own_indent),
            Token::Break => {
                self.bump();
                let idx = self.push(Node::Break, self.span_from(start));
                self.end_statement()?;
                Ok(idx)
            }
            Token::Continue => {
                self.bump();
                let idx = self.push(Node::Continue, self.span_from(start));
                self.end_statement()?;
                Ok(idx)
            }
            Token::Return => self.parse_return(start),
            Token::Proc => self.parse_proc(start, own_indent),
            Token::Type => self.parse_type(start, own_indent),
            _ => self.parse_expr_statement(start),
        }
    }

    fn span_from(&self, start: Position) -> Span {
        Span {
            start,
            end: self.position(),
        }
    }

    fn parse_let(&mut self, start: Position) -> Result<AstIndex, ParseError> {
        self.bump(); // let
        let name = self.parse_id("a variable name")?;
        self.expect(Token::Assign, "'='")?;
        let value = self.parse_expr()?;
        let idx = self.push(Node::Let { name, value }, self.span_from(start));
        self.end_statement()?;
        Ok(idx)
    }

    fn parse_var(&mut self, start: Position) -> Result<AstIndex, ParseError> {
        self.bump(); // var
        let name = self.parse_id("a variable name")?;
        self.expect(Token::Assign, "'='")?;
        let value = self.parse_expr()?;
        let idx = self.push(Node::Var { name, value }, self.span_from(start));
        self.end_statement()?;
        Ok(idx)
    }

    fn parse_echo(&mut self, start: Position) -> Result<AstIndex, ParseError> {
        self.bump(); // echo
        let mut args = vec![self.parse_expr()?];
        while self.peek_token() == Token::Comma {
            self.bump();
            args.push(self.parse_expr()?);
        }
        let idx = self.push(Node::Echo(args), self.span_from(start));
        self.end_statement()?;
        Ok(idx)
    }

    fn parse_return(&mut self, start: Position) -> Result<AstIndex, ParseError> {
        self.bump(); // return
        let value = match self.peek_token() {
            Token::NewLine | Token::Eof => None,
            _ => Some(self.parse_expr()?),
        };
        let idx = self.push(Node::Return(value), self.span_from(start));
        self.end_statement()?;
        Ok(idx)
    }

    fn parse_if(&mut self, start: Position, own_indent: u32) -> Result<AstIndex, ParseError> {
        self.bump(); // if
        let condition = self.parse_expr()?;
        self.expect(Token::Colon, "':'")?;
        self.end_statement()?;
        let then_block = self.parse_block(own_indent)?;

        let mut elif_blocks = Vec::new();
        let mut else_block = None;
        loop {
            if self.peek().line_indent != own_indent {
                break;
            }
            match self.peek_token() {
                Token::Elif => {
                    self.bump();
                    let cond = self.parse_expr()?;
                    self.expect(Token::Colon, "':'")?;
                    self.end_statement()?;
                    let body = self.parse_block(own_indent)?;
                    elif_blocks.push((cond, body));
                }
                Token::Else => {
                    self.bump();
                    self.expect(Token::Colon, "':'")?;
                    self.end_statement()?;
                    else_block = Some(self.parse_block(own_indent)?);
                    break;
                }
                _ => break,
            }
        }

        let idx = self.push(
            Node::If(AstIf {
                condition,
                then_block,
                elif_blocks,
                else_block,
            }),
            self.span_from(start),
        );
        Ok(idx)
    }

    fn parse_for(&mut self, start: Position, own_indent: u32) -> Result<AstIndex, ParseError> {
        self.bump(); // for
        let var_name = self.parse_id("a loop variable")?;
        self.expect(Token::In, "'in'")?;
        let iterable = self.parse_expr()?;
        self.expect(Token::Colon, "':'")?;
        self.end_statement()?;
        let body = self.parse_block(own_indent)?;
        let idx = self.push(
            Node::For(AstFor {
                var_name,
                iterable,
                body,
            }),
            self.span_from(start),
        );
        Ok(idx)
    }

    fn parse_while(&mut self, start: Position, own_indent: u32) -> Result<AstIndex, ParseError> {
        self.bump(); // while
        let condition = self.parse_expr()?;
        self.expect(Token::Colon, "':'")?;
        self.end_statement()?;
        let body = self.parse_block(own_indent)?;
        let idx = self.push(Node::While { condition, body }, self.span_from(start));
        Ok(idx)
    }

    fn parse_proc(&mut self, start: Position, own_indent: u32) -> Result<AstIndex, ParseError> {
        self.bump(); // proc
        let name = self.parse_id("a function name")?;
        self.expect(Token::RoundOpen, "'('")?;
        let mut params = Vec::new();
        if self.peek_token() != Token::RoundClose {
            params.push(self.parse_id("a parameter name")?);
            while self.peek_token() == Token::Comma {
                self.bump();
                params.push(self.parse_id("a parameter name")?);
            }
        }
        self.expect(Token::RoundClose, "')'")?;
        self.expect(Token::Assign, "'='")?;
        self.end_statement()?;
        let body = self.parse_block(own_indent)?;
        let idx = self.push(
            Node::FunctionDef(FunctionNode { name, params, body }),
            self.span_from(start),
        );
        Ok(idx)
    }

    fn parse_type(&mut self, start: Position, own_indent: u32) -> Result<AstIndex, ParseError> {
        self.bump(); // type
        let name = self.parse_id("a type name")?;
        self.expect(Token::Colon, "':'")?;
        self.end_statement()?;

        self.skip_newlines();
        let block_indent = self.peek().line_indent;
        if block_indent <= own_indent {
            return Err(self.err("Expected an indented block"));
        }
        let mut fields = Vec::new();
        loop {
            let indent = self.peek().line_indent;
            if indent < block_indent {
                break;
            }
            if indent > block_indent {
                return Err(self.err("Inconsistent indentation"));
            }
            fields.push(self.parse_id("a field name")?);
            self.end_statement()?;
            self.skip_newlines();
            if self.at_eof() {
                break;
            }
        }

        let idx = self.push(Node::TypeDef { name, fields }, self.span_from(start));
        Ok(idx)
    }

    fn parse_expr_statement(&mut self, start: Position) -> Result<AstIndex, ParseError> {
        let expr = self.parse_expr()?;
        let idx = if self.peek_token() == Token::Assign {
            self.bump();
            let target = self.to_assign_target(expr)?;
            let value = self.parse_expr()?;
            self.push(Node::Assign { target, value }, self.span_from(start))
        } else {
            expr
        };
        self.end_statement()?;
        Ok(idx)
    }

    fn to_assign_target(&self, expr: AstIndex) -> Result<AssignTarget, ParseError> {
        match &self.ast.node(expr).node {
            Node::Id(name) => Ok(AssignTarget::Id(name.clone())),
            Node::Index { container, index } => Ok(AssignTarget::Index {
                container: *container,
                index: *index,
            }),
            Node::Field { object, name } => Ok(AssignTarget::Field {
                object: *object,
                name: name.clone(),
            }),
            _ => Err(self.err("Invalid assignment target")),
        }
    }

    fn parse_id(&mut self, what: &str) -> Result<String, ParseError> {
        if self.peek_token() == Token::Id {
            Ok(self.bump().slice.to_string())
        } else {
            Err(self.err(format!("Expected {what}")))
        }
    }

    // ---- expressions ----

    fn parse_expr(&mut self) -> Result<AstIndex, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<AstIndex, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.peek_token() == Token::Or {
            let start = self.ast.node(lhs).span.start;
            self.bump();
            let rhs = self.parse_and()?;
            lhs = self.push(
                Node::Binary {
                    op: BinaryOp::Or,
                    lhs,
                    rhs,
                },
                self.span_from(start),
            );
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<AstIndex, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.peek_token() == Token::And {
            let start = self.ast.node(lhs).span.start;
            self.bump();
            let rhs = self.parse_equality()?;
            lhs = self.push(
                Node::Binary {
                    op: BinaryOp::And,
                    lhs,
                    rhs,
                },
                self.span_from(start),
            );
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<AstIndex, ParseError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek_token() {
                Token::Equal => BinaryOp::Equal,
                Token::NotEqual => BinaryOp::NotEqual,
                _ => break,
            };
            let start = self.ast.node(lhs).span.start;
            self.bump();
            let rhs = self.parse_comparison()?;
            lhs = self.push(Node::Binary { op, lhs, rhs }, self.span_from(start));
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<AstIndex, ParseError> {
        let mut lhs = self.parse_range()?;
        loop {
            let op = match self.peek_token() {
                Token::Less => BinaryOp::Less,
                Token::LessOrEqual => BinaryOp::LessOrEqual,
                Token::Greater => BinaryOp::Greater,
                Token::GreaterOrEqual => BinaryOp::GreaterOrEqual,
                Token::In => BinaryOp::In,
                _ => break,
            };
            let start = self.ast.node(lhs).span.start;
            self.bump();
            let rhs = self.parse_range()?;
            lhs = self.push(Node::Binary { op, lhs, rhs }, self.span_from(start));
        }
        Ok(lhs)
    }

    fn parse_range(&mut self) -> Result<AstIndex, ParseError> {
        let lhs = self.parse_additive()?;
        let inclusive = match self.peek_token() {
            Token::RangeInclusive => true,
            Token::RangeExclusive => false,
            _ => return Ok(lhs),
        };
        let start = self.ast.node(lhs).span.start;
        self.bump();
        let rhs = self.parse_additive()?;
        Ok(self.push(
            Node::Range {
                start: lhs,
                end: rhs,
                inclusive,
            },
            self.span_from(start),
        ))
    }

    fn parse_additive(&mut self) -> Result<AstIndex, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_token() {
                Token::Add => BinaryOp::Add,
                Token::Subtract => BinaryOp::Subtract,
                Token::Ampersand => BinaryOp::Concat,
                _ => break,
            };
            let start = self.ast.node(lhs).span.start;
            self.bump();
            let rhs = self.parse_multiplicative()?;
            lhs = self.push(Node::Binary { op, lhs, rhs }, self.span_from(start));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<AstIndex, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_token() {
                Token::Multiply => BinaryOp::Multiply,
                Token::Divide => BinaryOp::Divide,
                Token::Div => BinaryOp::IntDivide,
                Token::Mod | Token::Remainder => BinaryOp::Modulo,
                _ => break,
            };
            let start = self.ast.node(lhs).span.start;
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = self.push(Node::Binary { op, lhs, rhs }, self.span_from(start));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<AstIndex, ParseError> {
        let start = self.position();
        let op = match self.peek_token() {
            Token::Subtract => UnaryOp::Negate,
            Token::Not => UnaryOp::Not,
            Token::Dollar => UnaryOp::ToString,
            _ => return self.parse_postfix(),
        };
        self.bump();
        let value = self.parse_unary()?;
        Ok(self.push(Node::Unary { op, value }, self.span_from(start)))
    }

    fn parse_postfix(&mut self) -> Result<AstIndex, ParseError> {
        let start = self.position();
        let mut node = self.parse_primary()?;
        loop {
            match self.peek_token() {
                Token::Dot => {
                    self.bump();
                    let name = self.parse_id("a field name")?;
                    node = self.push(Node::Field { object: node, name }, self.span_from(start));
                }
                Token::SquareOpen => {
                    self.bump();
                    let index = self.parse_expr()?;
                    self.expect(Token::SquareClose, "']'")?;
                    node = self.push(
                        Node::Index {
                            container: node,
                            index,
                        },
                        self.span_from(start),
                    );
                }
                Token::RoundOpen => {
                    self.bump();
                    let mut args = Vec::new();
                    if self.peek_token() != Token::RoundClose {
                        args.push(self.parse_expr()?);
                        while self.peek_token() == Token::Comma {
                            self.bump();
                            args.push(self.parse_expr()?);
                        }
                    }
                    self.expect(Token::RoundClose, "')'")?;
                    node = self.push(Node::Call { callee: node, args }, self.span_from(start));
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<AstIndex, ParseError> {
        let start = self.position();
        match self.peek_token() {
            Token::Int => {
                let slice = self.bump().slice;
                let value: i64 = slice
                    .parse()
                    .map_err(|_| ParseError::syntax("Invalid integer literal", start.line, start.column))?;
                Ok(self.push(Node::Int(value), self.span_from(start)))
            }
            Token::Float => {
                let slice = self.bump().slice;
                let value: f64 = slice
                    .parse()
                    .map_err(|_| ParseError::syntax("Invalid float literal", start.line, start.column))?;
                Ok(self.push(Node::Float(value), self.span_from(start)))
            }
            Token::StringLiteral => {
                let slice = self.bump().slice;
                let value = decode_string_literal(slice)
                    .map_err(|_| ParseError::syntax("Unterminated string", start.line, start.column))?;
                Ok(self.push(Node::Str(value), self.span_from(start)))
            }
            Token::True => {
                self.bump();
                Ok(self.push(Node::Bool(true), self.span_from(start)))
            }
            Token::False => {
                self.bump();
                Ok(self.push(Node::Bool(false), self.span_from(start)))
            }
            Token::Nil => {
                self.bump();
                Ok(self.push(Node::Nil, self.span_from(start)))
            }
            Token::Id => {
                let name = self.bump().slice.to_string();
                Ok(self.push(Node::Id(name), self.span_from(start)))
            }
            Token::RoundOpen => {
                self.bump();
                let expr = self.parse_expr()?;
                self.expect(Token::RoundClose, "')'")?;
                Ok(expr)
            }
            Token::SquareOpen => {
                self.bump();
                let mut items = Vec::new();
                if self.peek_token() != Token::SquareClose {
                    items.push(self.parse_expr()?);
                    while self.peek_token() == Token::Comma {
                        self.bump();
                        items.push(self.parse_expr()?);
                    }
                }
                self.expect(Token::SquareClose, "']'")?;
                Ok(self.push(Node::Array(items), self.span_from(start)))
            }
            Token::CurlyOpen => self.parse_table(start),
            Token::Set => {
                self.bump();
                self.expect(Token::CurlyOpen, "'{'")?;
                let mut items = Vec::new();
                if self.peek_token() != Token::CurlyClose {
                    items.push(self.parse_expr()?);
                    while self.peek_token() == Token::Comma {
                        self.bump();
                        items.push(self.parse_expr()?);
                    }
                }
                self.expect(Token::CurlyClose, "'}'")?;
                Ok(self.push(Node::Set(items), self.span_from(start)))
            }
            _ => Err(self.err("Expected an expression")),
        }
    }

    fn parse_table(&mut self, start: Position) -> Result<AstIndex, ParseError> {
        self.bump(); // {
        let mut entries = Vec::new();
        if self.peek_token() != Token::CurlyClose {
            entries.push(self.parse_table_entry()?);
            while self.peek_token() == Token::Comma {
                self.bump();
                entries.push(self.parse_table_entry()?);
            }
        }
        self.expect(Token::CurlyClose, "'}'")?;
        Ok(self.push(Node::Table(entries), self.span_from(start)))
    }

    fn parse_table_entry(&mut self) -> Result<(String, AstIndex), ParseError> {
        let key = match self.peek_token() {
            Token::Id => self.bump().slice.to_string(),
            Token::StringLiteral => {
                let slice = self.bump().slice;
                decode_string_literal(slice)
                    .map_err(|_| self.err("Unterminated string"))?
            }
            _ => return Err(self.err("Expected a table key")),
        };
        self.expect(Token::Colon, "':'")?;
        let value = self.parse_expr()?;
        Ok((key, value))
    }
}

/// Decodes a lexed string literal's slice (including its surrounding quotes)
/// into its runtime string value, processing backslash escapes.
fn decode_string_literal(slice: &str) -> Result<String, ()> {
    let inner = slice.strip_prefix('"').and_then(|s| s.strip_suffix('"')).ok_or(())?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('$') => out.push('$'),
                Some(other) => out.push(other),
                None => return Err(()),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn program_stmts(source: &str) -> Vec<Node> {
        let ast = parse(source).unwrap();
        match &ast.node(ast.root()).node {
            Node::Program(stmts) => stmts.iter().map(|&i| ast.node(i).node.clone()).collect(),
            other => panic!("expected Program, found {other:?}"),
        }
    }

    #[test]
    fn parses_let_statements() {
        let stmts = program_stmts("let a = 1\nlet b = 2\nlet c = 3\n");
        assert_eq!(stmts.len(), 3);
        assert!(matches!(&stmts[0], Node::Let { name, .. } if name == "a"));
    }

    #[test]
    fn parses_function_and_call() {
        let source = "proc add(a, b) =\n  return a + b\n\nlet result = add(3, 4)\n";
        let ast = parse(source).unwrap();
        let Node::Program(stmts) = &ast.node(ast.root()).node else {
            panic!()
        };
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&ast.node(stmts[0]).node, Node::FunctionDef(f) if f.name == "add" && f.params.len() == 2));
    }

    #[test]
    fn parses_for_loop_with_inclusive_range() {
        let source = "var sum = 0\nfor i in 1..3:\n  sum = sum + i\nlet done = true\n";
        let stmts = program_stmts(source);
        assert_eq!(stmts.len(), 3);
        let Node::For(f) = &stmts[1] else { panic!() };
        assert_eq!(f.var_name, "i");
        assert_eq!(f.body.len(), 1);
    }

    #[test]
    fn parses_if_elif_else() {
        let source = "if a:\n  let x = 1\nelif b:\n  let x = 2\nelse:\n  let x = 3\n";
        let stmts = program_stmts(source);
        let Node::If(if_node) = &stmts[0] else { panic!() };
        assert_eq!(if_node.elif_blocks.len(), 1);
        assert!(if_node.else_block.is_some());
    }

    #[test]
    fn rejects_inconsistent_indentation() {
        let source = "let a = 1\n  let b = 2\n";
        let err = parse(source).unwrap_err();
        assert_eq!(err.detail(), "Inconsistent indentation");
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = parse("let a = \"oops\n").unwrap_err();
        assert_eq!(err.detail(), "Unterminated string");
    }

    #[test]
    fn parses_table_array_set_and_range_literals() {
        let source = "let a = [1, 2, 3]\nlet t = {x: 1, y: 2}\nlet s = set{1, 2, 2}\nlet r = 1..<5\n";
        let ast = parse(source).unwrap();
        let Node::Program(stmts) = &ast.node(ast.root()).node else {
            panic!()
        };
        assert_eq!(stmts.len(), 4);
        let Node::Let { value, .. } = &ast.node(stmts[0]).node else { panic!() };
        assert!(matches!(&ast.node(*value).node, Node::Array(items) if items.len() == 3));
        let Node::Let { value, .. } = &ast.node(stmts[1]).node else { panic!() };
        assert!(matches!(&ast.node(*value).node, Node::Table(entries) if entries.len() == 2));
        let Node::Let { value, .. } = &ast.node(stmts[2]).node else { panic!() };
        assert!(matches!(&ast.node(*value).node, Node::Set(items) if items.len() == 3));
        let Node::Let { value, .. } = &ast.node(stmts[3]).node else { panic!() };
        assert!(matches!(&ast.node(*value).node, Node::Range { inclusive, .. } if !inclusive));
    }

    #[test]
    fn parses_ufcs_style_dot_call() {
        let stmts = program_stmts("foo.bar(1, 2)\n");
        assert!(matches!(&stmts[0], Node::Call { .. }));
    }
}
