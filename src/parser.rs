use std::fmt;

use tracing::debug;

use crate::{
    ast::{
        BinOp, Binding, BoolOp, CmpOp, Comprehension, Constant, DictItem, Expr, Keyword, Module,
        Param, ParamKind, Scalar, Statement, Token, UnaryOp,
    },
    lexer::{LexError, Lexer, Position, SpannedToken},
};

/// Invalid source text.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub message: String,
    pub position: Position,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.position)
    }
}

impl std::error::Error for SyntaxError {}

impl From<LexError> for SyntaxError {
    fn from(e: LexError) -> Self {
        SyntaxError {
            message: e.message,
            position: e.position,
        }
    }
}

/// Hard keywords: never a binding target, never an expression name.
const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

const BITOR_OPS: &[(Token, BinOp)] = &[(Token::Pipe, BinOp::BitOr)];
const BITXOR_OPS: &[(Token, BinOp)] = &[(Token::Caret, BinOp::BitXor)];
const BITAND_OPS: &[(Token, BinOp)] = &[(Token::Ampersand, BinOp::BitAnd)];
const SHIFT_OPS: &[(Token, BinOp)] = &[
    (Token::LeftShift, BinOp::LShift),
    (Token::RightShift, BinOp::RShift),
];
const SUM_OPS: &[(Token, BinOp)] = &[(Token::Plus, BinOp::Add), (Token::Minus, BinOp::Sub)];
const TERM_OPS: &[(Token, BinOp)] = &[
    (Token::Star, BinOp::Mult),
    (Token::Slash, BinOp::Div),
    (Token::DoubleSlash, BinOp::FloorDiv),
    (Token::Percent, BinOp::Mod),
    (Token::At, BinOp::MatMult),
];

/// Parses a whole module.
pub fn parse(source: &str) -> Result<Module, SyntaxError> {
    Parser::new(source)?.parse_module()
}

/// Parses a single expression such as `{'a': [1, 2]}`.
pub fn parse_expression(source: &str) -> Result<Expr, SyntaxError> {
    Parser::new(source)?.parse()
}

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<SpannedToken>,
    current: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, SyntaxError> {
        let tokens: Vec<SpannedToken> = Lexer::new(source)
            .tokenize()?
            .into_iter()
            .filter(|t| t.token.is_significant())
            .collect();

        Ok(Parser {
            source,
            tokens,
            current: 0,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current].token
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let index = (self.current + offset).min(self.tokens.len() - 1);
        &self.tokens[index].token
    }

    fn advance(&mut self) {
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        self.peek().is_keyword(keyword)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), SyntaxError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}, found {}", expected, self.peek())))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), SyntaxError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}', found {}", keyword, self.peek())))
        }
    }

    fn expect_name(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Token::Name(name) if !is_keyword(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            token => Err(self.error(format!("expected name, found {}", token))),
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            position: self.tokens[self.current].position,
        }
    }

    fn unexpected(&self) -> SyntaxError {
        self.error(format!("invalid syntax: unexpected {}", self.peek()))
    }

    fn start_offset(&self) -> usize {
        self.tokens[self.current].span.start
    }

    fn previous_end(&self) -> usize {
        self.tokens[self.current.saturating_sub(1)].span.end
    }

    fn line_start(&self, offset: usize) -> usize {
        self.source[..offset].rfind('\n').map_or(0, |i| i + 1)
    }

    /// Parse a standalone expression; the whole input must be consumed.
    pub fn parse(&mut self) -> Result<Expr, SyntaxError> {
        let expr = if self.check_keyword("yield") {
            self.parse_yield()?
        } else {
            self.parse_star_expressions()?
        };
        self.eat(&Token::Newline);
        if !self.check(&Token::Eof) {
            return Err(self.unexpected());
        }
        Ok(expr)
    }
}

// ============================================================================
// Module level
// ============================================================================

impl Parser<'_> {
    /// Split the source into top-level statements in document order.
    ///
    /// Text between statements (blank lines, comments) becomes its own
    /// verbatim statement so the statements always cover the whole input.
    pub fn parse_module(&mut self) -> Result<Module, SyntaxError> {
        let mut statements = Vec::new();
        let mut cursor = 0;

        while !self.check(&Token::Eof) {
            match self.peek() {
                Token::Indent => return Err(self.error("unexpected indent")),
                Token::Newline | Token::Dedent => {
                    self.advance();
                    continue;
                }
                _ => {}
            }

            let first = self.current;
            let line_start = self.line_start(self.start_offset());
            if line_start > cursor {
                statements.push(Statement::Verbatim(self.source[cursor..line_start].to_string()));
            }

            match self.parse_binding(line_start)? {
                Some(binding) => {
                    cursor = self.previous_end();
                    statements.push(Statement::Binding(binding));
                }
                None => {
                    self.current = first;
                    let end = self.skip_statement();
                    statements.push(Statement::Verbatim(self.source[line_start..end].to_string()));
                    cursor = end;
                }
            }
        }

        if cursor < self.source.len() {
            statements.push(Statement::Verbatim(self.source[cursor..].to_string()));
        }

        let module = Module { statements };
        debug!(
            statements = module.statements.len(),
            bindings = module.bindings().count(),
            "parsed module"
        );
        Ok(module)
    }

    /// Try to read `name = value` or `name: annotation = value` as one logical
    /// line. Returns `None` for any other statement shape; the caller rewinds.
    fn parse_binding(&mut self, line_start: usize) -> Result<Option<Binding>, SyntaxError> {
        let name = match self.peek() {
            Token::Name(name) if !is_keyword(name) => name.clone(),
            _ => return Ok(None),
        };
        let position = self.tokens[self.current].position;
        self.advance();

        let annotation = match self.peek() {
            Token::Equal => None,
            Token::Colon => {
                self.advance();
                let start = self.start_offset();
                self.parse_expression()?;
                let end = self.previous_end();
                if !self.check(&Token::Equal) {
                    return Ok(None);
                }
                Some(self.source[start..end].to_string())
            }
            _ => return Ok(None),
        };
        self.advance(); // consume '='

        let value_start = self.start_offset();
        let value = if self.check_keyword("yield") {
            self.parse_yield()?
        } else {
            self.parse_star_expressions()?
        };
        let value_end = self.previous_end();

        match self.peek() {
            Token::Newline => {}
            // `x = [1];` is still a single statement
            Token::Semicolon if self.peek_at(1) == &Token::Newline => self.advance(),
            // chained assignment or several statements on one line
            Token::Equal | Token::Semicolon => return Ok(None),
            _ => return Err(self.unexpected()),
        }
        let end = self.tokens[self.current].span.end;
        self.advance();

        Ok(Some(Binding {
            name,
            annotation,
            value,
            position,
            leading: self.source[line_start..value_start].to_string(),
            original: self.source[value_start..value_end].to_string(),
            trailing: self.source[value_end..end].to_string(),
            edited: false,
        }))
    }

    /// Skip one logical line and the indented block attached to it.
    /// Returns the byte offset where the statement ends.
    fn skip_statement(&mut self) -> usize {
        while !matches!(self.peek(), Token::Newline | Token::Eof) {
            self.advance();
        }
        let mut end = self.tokens[self.current].span.end;
        self.eat(&Token::Newline);

        if self.check(&Token::Indent) {
            let mut depth = 0usize;
            loop {
                match self.peek() {
                    Token::Indent => depth += 1,
                    Token::Dedent => {
                        depth -= 1;
                        if depth == 0 {
                            self.advance();
                            break;
                        }
                    }
                    Token::Newline => end = self.tokens[self.current].span.end,
                    Token::Eof => break,
                    _ => {}
                }
                self.advance();
            }
        }

        end
    }
}

// ============================================================================
// Expressions
// ============================================================================

impl Parser<'_> {
    fn at_expression_start(&self) -> bool {
        match self.peek() {
            Token::Name(name) => {
                !is_keyword(name)
                    || matches!(
                        name.as_str(),
                        "not" | "lambda" | "await" | "None" | "True" | "False"
                    )
            }
            Token::Number(_)
            | Token::String(_)
            | Token::LParen
            | Token::LBracket
            | Token::LBrace
            | Token::Minus
            | Token::Plus
            | Token::Tilde
            | Token::Star
            | Token::Ellipsis => true,
            _ => false,
        }
    }

    fn at_comprehension(&self) -> bool {
        self.check_keyword("for")
            || (self.check_keyword("async") && self.peek_at(1).is_keyword("for"))
    }

    /// Comma-separated expressions forming an unparenthesized tuple.
    fn parse_star_expressions(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_star_expression()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            if !self.at_expression_start() {
                break;
            }
            elements.push(self.parse_star_expression()?);
        }
        Ok(Expr::Tuple(elements))
    }

    fn parse_star_expression(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat(&Token::Star) {
            Ok(Expr::Starred(Box::new(self.parse_bitor()?)))
        } else {
            self.parse_expression()
        }
    }

    fn parse_star_named_expression(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat(&Token::Star) {
            Ok(Expr::Starred(Box::new(self.parse_bitor()?)))
        } else {
            self.parse_named_expression()
        }
    }

    fn parse_named_expression(&mut self) -> Result<Expr, SyntaxError> {
        if let Token::Name(name) = self.peek()
            && !is_keyword(name)
            && self.peek_at(1) == &Token::ColonEqual
        {
            let target = name.clone();
            self.advance();
            self.advance();
            let value = self.parse_expression()?;
            return Ok(Expr::NamedExpr {
                target,
                value: Box::new(value),
            });
        }
        self.parse_expression()
    }

    /// Conditional expression, lambda, or anything of higher precedence.
    pub fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        if self.check_keyword("lambda") {
            return self.parse_lambda();
        }

        let body = self.parse_disjunction()?;
        if self.eat_keyword("if") {
            let test = self.parse_disjunction()?;
            self.expect_keyword("else")?;
            let orelse = self.parse_expression()?;
            return Ok(Expr::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            });
        }
        Ok(body)
    }

    fn parse_disjunction(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_conjunction()?;
        if !self.check_keyword("or") {
            return Ok(first);
        }

        let mut values = vec![first];
        while self.eat_keyword("or") {
            values.push(self.parse_conjunction()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::Or,
            values,
        })
    }

    fn parse_conjunction(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_inversion()?;
        if !self.check_keyword("and") {
            return Ok(first);
        }

        let mut values = vec![first];
        while self.eat_keyword("and") {
            values.push(self.parse_inversion()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::And,
            values,
        })
    }

    fn parse_inversion(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat_keyword("not") {
            let operand = self.parse_inversion()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    /// The comparison operator at the cursor and how many tokens it spans.
    fn comparison_operator(&self) -> Option<(CmpOp, usize)> {
        let op = match self.peek() {
            Token::EqEq => (CmpOp::Eq, 1),
            Token::NotEq => (CmpOp::NotEq, 1),
            Token::Lt => (CmpOp::Lt, 1),
            Token::LtEq => (CmpOp::LtE, 1),
            Token::Gt => (CmpOp::Gt, 1),
            Token::GtEq => (CmpOp::GtE, 1),
            Token::Name(name) if name == "in" => (CmpOp::In, 1),
            Token::Name(name) if name == "not" && self.peek_at(1).is_keyword("in") => {
                (CmpOp::NotIn, 2)
            }
            Token::Name(name) if name == "is" => {
                if self.peek_at(1).is_keyword("not") {
                    (CmpOp::IsNot, 2)
                } else {
                    (CmpOp::Is, 1)
                }
            }
            _ => return None,
        };
        Some(op)
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.parse_bitor()?;

        let mut comparisons = Vec::new();
        while let Some((op, width)) = self.comparison_operator() {
            for _ in 0..width {
                self.advance();
            }
            comparisons.push((op, self.parse_bitor()?));
        }

        if comparisons.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                comparisons,
            })
        }
    }

    /// Left-associative binary operator level.
    fn parse_binary(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, SyntaxError>,
        operators: &[(Token, BinOp)],
    ) -> Result<Expr, SyntaxError> {
        let mut left = next(self)?;

        while let Some(op) = operators
            .iter()
            .find(|(token, _)| self.check(token))
            .map(|(_, op)| *op)
        {
            self.advance();
            let right = next(self)?;
            left = Expr::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_bitor(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary(Self::parse_bitxor, BITOR_OPS)
    }

    fn parse_bitxor(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary(Self::parse_bitand, BITXOR_OPS)
    }

    fn parse_bitand(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary(Self::parse_shift, BITAND_OPS)
    }

    fn parse_shift(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary(Self::parse_sum, SHIFT_OPS)
    }

    fn parse_sum(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary(Self::parse_term, SUM_OPS)
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary(Self::parse_factor, TERM_OPS)
    }

    fn parse_factor(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek() {
            Token::Plus => UnaryOp::UAdd,
            Token::Minus => UnaryOp::USub,
            Token::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.advance();

        let operand = self.parse_factor()?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.parse_await_primary()?;
        if self.eat(&Token::DoubleStar) {
            // Right-associative, and binds tighter than a unary operator on its left
            let exponent = self.parse_factor()?;
            return Ok(Expr::BinOp {
                left: Box::new(base),
                op: BinOp::Pow,
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_await_primary(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat_keyword("await") {
            return Ok(Expr::Await(Box::new(self.parse_primary()?)));
        }
        self.parse_primary()
    }

    /// Atom followed by any number of `.attr`, `(args)` and `[slices]`.
    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_atom()?;

        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let attr = self.expect_name()?;
                    expr = Expr::Attribute {
                        value: Box::new(expr),
                        attr,
                    };
                }
                Token::LParen => {
                    self.advance();
                    let (args, keywords) = self.parse_arguments()?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                        keywords,
                    };
                }
                Token::LBracket => {
                    self.advance();
                    let slice = self.parse_slices()?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        slice: Box::new(slice),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.tokens[self.current].clone();

        match token.token {
            Token::Name(name) => {
                let scalar = match name.as_str() {
                    "None" => Scalar::None,
                    "True" => Scalar::Bool(true),
                    "False" => Scalar::Bool(false),
                    n if is_keyword(n) => {
                        return Err(self.error(format!("expected expression, found '{}'", n)));
                    }
                    _ => {
                        self.advance();
                        return Ok(Expr::Name(name));
                    }
                };
                self.advance();
                Ok(Expr::Constant(Constant::with_raw(scalar, name)))
            }
            Token::Number(raw) => {
                let value = parse_number(&raw).map_err(|message| SyntaxError {
                    message,
                    position: token.position,
                })?;
                self.advance();
                Ok(Expr::Constant(Constant::with_raw(value, raw)))
            }
            Token::String(_) => self.parse_strings(),
            Token::Ellipsis => {
                self.advance();
                Ok(Expr::Constant(Constant::with_raw(Scalar::Ellipsis, "...")))
            }
            Token::LParen => self.parse_parenthesized(),
            Token::LBracket => self.parse_list(),
            Token::LBrace => self.parse_brace(),
            other => Err(self.error(format!("expected expression, found {}", other))),
        }
    }

    /// Adjacent string literals form one constant (`'a' "b"` is `'ab'`).
    fn parse_strings(&mut self) -> Result<Expr, SyntaxError> {
        let position = self.tokens[self.current].position;
        let mut pieces = Vec::new();
        while let Token::String(raw) = self.peek() {
            pieces.push(raw.clone());
            self.advance();
        }
        let raw = pieces.join(" ");

        if pieces.iter().any(|piece| string_prefix(piece).contains('f')) {
            return Ok(Expr::FString(raw));
        }

        let mut text = String::new();
        let mut bytes = Vec::new();
        let mut is_bytes = None;
        for piece in &pieces {
            let literal = decode_string(piece).map_err(|message| SyntaxError {
                message,
                position,
            })?;
            let piece_is_bytes = matches!(literal, Scalar::Bytes(_));
            if is_bytes.is_some_and(|b| b != piece_is_bytes) {
                return Err(SyntaxError {
                    message: "cannot mix bytes and nonbytes literals".to_string(),
                    position,
                });
            }
            is_bytes = Some(piece_is_bytes);
            match literal {
                Scalar::Bytes(b) => bytes.extend(b),
                Scalar::Str(s) => text.push_str(&s),
                _ => {}
            }
        }

        let value = if is_bytes == Some(true) {
            Scalar::Bytes(bytes)
        } else {
            Scalar::Str(text)
        };
        Ok(Expr::Constant(Constant::with_raw(value, raw)))
    }

    /// `()`, `(x)`, `(x,)`, `(x, y)`, `(x for ...)`, `(yield x)`
    fn parse_parenthesized(&mut self) -> Result<Expr, SyntaxError> {
        self.advance(); // consume '('

        if self.eat(&Token::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }
        if self.check_keyword("yield") {
            let expr = self.parse_yield()?;
            self.expect(Token::RParen)?;
            return Ok(expr);
        }

        let first = self.parse_star_named_expression()?;
        if self.at_comprehension() {
            let generators = self.parse_comprehensions()?;
            self.expect(Token::RParen)?;
            return Ok(Expr::GeneratorExp {
                elt: Box::new(first),
                generators,
            });
        }
        if self.eat(&Token::RParen) {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            if self.check(&Token::RParen) {
                break;
            }
            elements.push(self.parse_star_named_expression()?);
        }
        self.expect(Token::RParen)?;
        Ok(Expr::Tuple(elements))
    }

    fn parse_list(&mut self) -> Result<Expr, SyntaxError> {
        self.advance(); // consume '['

        if self.eat(&Token::RBracket) {
            return Ok(Expr::List(Vec::new()));
        }

        let first = self.parse_star_named_expression()?;
        if self.at_comprehension() {
            let generators = self.parse_comprehensions()?;
            self.expect(Token::RBracket)?;
            return Ok(Expr::ListComp {
                elt: Box::new(first),
                generators,
            });
        }

        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            if self.check(&Token::RBracket) {
                break;
            }
            elements.push(self.parse_star_named_expression()?);
        }
        self.expect(Token::RBracket)?;
        Ok(Expr::List(elements))
    }

    /// Dict or set display, or one of their comprehensions.
    fn parse_brace(&mut self) -> Result<Expr, SyntaxError> {
        self.advance(); // consume '{'

        if self.eat(&Token::RBrace) {
            return Ok(Expr::Dict(Vec::new()));
        }

        if self.eat(&Token::DoubleStar) {
            let value = self.parse_bitor()?;
            return self.finish_dict(DictItem { key: None, value });
        }

        let first = self.parse_star_named_expression()?;
        if self.eat(&Token::Colon) {
            let value = self.parse_expression()?;
            if self.at_comprehension() {
                let generators = self.parse_comprehensions()?;
                self.expect(Token::RBrace)?;
                return Ok(Expr::DictComp {
                    key: Box::new(first),
                    value: Box::new(value),
                    generators,
                });
            }
            return self.finish_dict(DictItem {
                key: Some(first),
                value,
            });
        }

        if self.at_comprehension() {
            let generators = self.parse_comprehensions()?;
            self.expect(Token::RBrace)?;
            return Ok(Expr::SetComp {
                elt: Box::new(first),
                generators,
            });
        }

        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            if self.check(&Token::RBrace) {
                break;
            }
            elements.push(self.parse_star_named_expression()?);
        }
        self.expect(Token::RBrace)?;
        Ok(Expr::Set(elements))
    }

    fn finish_dict(&mut self, first: DictItem) -> Result<Expr, SyntaxError> {
        let mut items = vec![first];

        while self.eat(&Token::Comma) {
            if self.check(&Token::RBrace) {
                break;
            }
            if self.eat(&Token::DoubleStar) {
                let value = self.parse_bitor()?;
                items.push(DictItem { key: None, value });
            } else {
                let key = self.parse_expression()?;
                self.expect(Token::Colon)?;
                let value = self.parse_expression()?;
                items.push(DictItem {
                    key: Some(key),
                    value,
                });
            }
        }

        self.expect(Token::RBrace)?;
        Ok(Expr::Dict(items))
    }

    fn parse_comprehensions(&mut self) -> Result<Vec<Comprehension>, SyntaxError> {
        let mut generators = Vec::new();

        while self.at_comprehension() {
            let is_async = self.eat_keyword("async");
            self.expect_keyword("for")?;
            let target = self.parse_target_list()?;
            self.expect_keyword("in")?;
            let iter = self.parse_disjunction()?;

            let mut ifs = Vec::new();
            while self.eat_keyword("if") {
                ifs.push(self.parse_disjunction()?);
            }

            generators.push(Comprehension {
                target,
                iter,
                ifs,
                is_async,
            });
        }
        Ok(generators)
    }

    fn parse_target_list(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_target()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            if self.check_keyword("in") {
                break;
            }
            elements.push(self.parse_target()?);
        }
        Ok(Expr::Tuple(elements))
    }

    fn parse_target(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat(&Token::Star) {
            return Ok(Expr::Starred(Box::new(self.parse_bitor()?)));
        }
        self.parse_bitor()
    }

    /// Call arguments up to and including the closing `)`.
    fn parse_arguments(&mut self) -> Result<(Vec<Expr>, Vec<Keyword>), SyntaxError> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        let mut saw_keyword = false;
        let mut saw_unpacking = false;

        while !self.check(&Token::RParen) {
            if self.eat(&Token::DoubleStar) {
                let value = self.parse_expression()?;
                keywords.push(Keyword { arg: None, value });
                saw_unpacking = true;
            } else if self.eat(&Token::Star) {
                if saw_unpacking {
                    return Err(self.error(
                        "iterable argument unpacking follows keyword argument unpacking",
                    ));
                }
                let value = self.parse_expression()?;
                args.push(Expr::Starred(Box::new(value)));
            } else if let Token::Name(name) = self.peek()
                && !is_keyword(name)
                && self.peek_at(1) == &Token::Equal
            {
                let arg = name.clone();
                self.advance();
                self.advance();
                let value = self.parse_expression()?;
                keywords.push(Keyword {
                    arg: Some(arg),
                    value,
                });
                saw_keyword = true;
            } else {
                let position = self.tokens[self.current].position;
                let arg = self.parse_named_expression()?;
                if self.at_comprehension() {
                    let generators = self.parse_comprehensions()?;
                    args.push(Expr::GeneratorExp {
                        elt: Box::new(arg),
                        generators,
                    });
                } else {
                    if saw_keyword || saw_unpacking {
                        return Err(SyntaxError {
                            message: "positional argument follows keyword argument".to_string(),
                            position,
                        });
                    }
                    args.push(arg);
                }
            }

            if !self.eat(&Token::Comma) {
                break;
            }
        }

        self.expect(Token::RParen)?;
        Ok((args, keywords))
    }

    fn parse_slices(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_slice()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            if self.check(&Token::RBracket) {
                break;
            }
            elements.push(self.parse_slice()?);
        }
        Ok(Expr::Tuple(elements))
    }

    fn parse_slice(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat(&Token::Star) {
            return Ok(Expr::Starred(Box::new(self.parse_bitor()?)));
        }

        let lower = if self.check(&Token::Colon) {
            None
        } else {
            let expr = self.parse_named_expression()?;
            if !self.check(&Token::Colon) {
                return Ok(expr);
            }
            Some(Box::new(expr))
        };
        self.expect(Token::Colon)?;

        let bound_ends = |token: &Token| matches!(token, Token::Colon | Token::Comma | Token::RBracket);
        let upper = if bound_ends(self.peek()) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        let step = if self.eat(&Token::Colon) && !bound_ends(self.peek()) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        Ok(Expr::Slice { lower, upper, step })
    }

    fn parse_lambda(&mut self) -> Result<Expr, SyntaxError> {
        self.advance(); // consume 'lambda'

        let mut params = Vec::new();
        while !self.check(&Token::Colon) {
            let param = if self.eat(&Token::DoubleStar) {
                Param {
                    kind: ParamKind::KwArgs,
                    name: Some(self.expect_name()?),
                    default: None,
                }
            } else if self.eat(&Token::Star) {
                if matches!(self.peek(), Token::Name(_)) {
                    Param {
                        kind: ParamKind::VarArgs,
                        name: Some(self.expect_name()?),
                        default: None,
                    }
                } else {
                    Param {
                        kind: ParamKind::KeywordOnlyMarker,
                        name: None,
                        default: None,
                    }
                }
            } else if self.eat(&Token::Slash) {
                Param {
                    kind: ParamKind::PositionalOnlyMarker,
                    name: None,
                    default: None,
                }
            } else {
                let name = self.expect_name()?;
                let default = if self.eat(&Token::Equal) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                Param {
                    kind: ParamKind::Plain,
                    name: Some(name),
                    default,
                }
            };
            params.push(param);

            if !self.eat(&Token::Comma) {
                break;
            }
        }

        self.expect(Token::Colon)?;
        let body = self.parse_expression()?;
        Ok(Expr::Lambda {
            params,
            body: Box::new(body),
        })
    }

    fn parse_yield(&mut self) -> Result<Expr, SyntaxError> {
        self.advance(); // consume 'yield'

        if self.eat_keyword("from") {
            return Ok(Expr::YieldFrom(Box::new(self.parse_expression()?)));
        }
        if self.at_expression_start() {
            return Ok(Expr::Yield(Some(Box::new(self.parse_star_expressions()?))));
        }
        Ok(Expr::Yield(None))
    }
}

// ============================================================================
// Literal decoding
// ============================================================================

/// Lowercased prefix letters of a string literal (`rb`, `f`, ...).
fn string_prefix(raw: &str) -> String {
    raw.chars()
        .take_while(|c| *c != '\'' && *c != '"')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Decode one string or bytes literal token into its value.
pub(crate) fn decode_string(raw: &str) -> Result<Scalar, String> {
    let prefix = string_prefix(raw);
    let quoted = &raw[prefix.len()..];
    let delimiter = if quoted.starts_with("'''") || quoted.starts_with("\"\"\"") {
        3
    } else {
        1
    };
    let body = &quoted[delimiter..quoted.len() - delimiter];
    let is_raw = prefix.contains('r');
    let is_bytes = prefix.contains('b');

    if is_bytes && !body.is_ascii() {
        return Err("bytes can only contain ASCII literal characters".to_string());
    }

    let text = if is_raw {
        body.to_string()
    } else {
        unescape(body, is_bytes)?
    };

    if is_bytes {
        let bytes = text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).map_err(|_| "invalid octal escape".to_string()))
            .collect::<Result<Vec<u8>, String>>()?;
        Ok(Scalar::Bytes(bytes))
    } else {
        Ok(Scalar::Str(text))
    }
}

fn unescape(body: &str, is_bytes: bool) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };

        match next {
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\\' | '\'' | '"' => out.push(next),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut value = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).ok_or("invalid octal escape")?);
            }
            'x' => {
                let value = read_hex(&mut chars, 2).ok_or("truncated \\xXX escape")?;
                out.push(char::from_u32(value).ok_or("truncated \\xXX escape")?);
            }
            'u' if !is_bytes => {
                let value = read_hex(&mut chars, 4).ok_or("truncated \\uXXXX escape")?;
                out.push(char::from_u32(value).ok_or("illegal Unicode character")?);
            }
            'U' if !is_bytes => {
                let value = read_hex(&mut chars, 8).ok_or("truncated \\UXXXXXXXX escape")?;
                out.push(char::from_u32(value).ok_or("illegal Unicode character")?);
            }
            // Unknown escapes, and \N{...} whose name table we do not carry,
            // keep their backslash.
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Ok(out)
}

fn read_hex(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, count: usize) -> Option<u32> {
    let mut value = 0;
    for _ in 0..count {
        let digit = chars.next()?.to_digit(16)?;
        value = value * 16 + digit;
    }
    Some(value)
}

/// Decode a numeric literal token.
pub(crate) fn parse_number(raw: &str) -> Result<Scalar, String> {
    let text: String = raw
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();

    if let Some(imaginary) = text.strip_suffix('j') {
        return imaginary
            .parse::<f64>()
            .map(Scalar::Complex)
            .map_err(|_| format!("invalid imaginary literal '{}'", raw));
    }

    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return Ok(i64::from_str_radix(digits, radix)
                .map(Scalar::Int)
                .unwrap_or_else(|_| Scalar::BigInt(text.clone())));
        }
    }

    if text.contains(['.', 'e']) {
        return text
            .parse::<f64>()
            .map(Scalar::Float)
            .map_err(|_| format!("invalid decimal literal '{}'", raw));
    }

    if text.len() > 1 && text.starts_with('0') && text.chars().any(|c| c != '0') {
        return Err("leading zeros in decimal integer literals are not permitted".to_string());
    }

    Ok(text
        .parse::<i64>()
        .map(Scalar::Int)
        .unwrap_or_else(|_| Scalar::BigInt(text.clone())))
}
