use std::fmt;

use crate::ast::Token;

/// 1-based line and column of a character in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Byte range of a token in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A token together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
    pub position: Position,
}

/// Tokenization failure.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub position: Position,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.position)
    }
}

impl std::error::Error for LexError {}

const OPERATORS: &[(&str, Token)] = &[
    ("**=", Token::AugAssign("**=")),
    ("//=", Token::AugAssign("//=")),
    (">>=", Token::AugAssign(">>=")),
    ("<<=", Token::AugAssign("<<=")),
    ("...", Token::Ellipsis),
    ("**", Token::DoubleStar),
    ("//", Token::DoubleSlash),
    (">>", Token::RightShift),
    ("<<", Token::LeftShift),
    ("<=", Token::LtEq),
    (">=", Token::GtEq),
    ("==", Token::EqEq),
    ("!=", Token::NotEq),
    ("->", Token::Arrow),
    (":=", Token::ColonEqual),
    ("+=", Token::AugAssign("+=")),
    ("-=", Token::AugAssign("-=")),
    ("*=", Token::AugAssign("*=")),
    ("/=", Token::AugAssign("/=")),
    ("%=", Token::AugAssign("%=")),
    ("&=", Token::AugAssign("&=")),
    ("|=", Token::AugAssign("|=")),
    ("^=", Token::AugAssign("^=")),
    ("@=", Token::AugAssign("@=")),
    ("+", Token::Plus),
    ("-", Token::Minus),
    ("*", Token::Star),
    ("/", Token::Slash),
    ("%", Token::Percent),
    ("@", Token::At),
    ("|", Token::Pipe),
    ("^", Token::Caret),
    ("&", Token::Ampersand),
    ("~", Token::Tilde),
    ("<", Token::Lt),
    (">", Token::Gt),
    ("(", Token::LParen),
    (")", Token::RParen),
    ("[", Token::LBracket),
    ("]", Token::RBracket),
    ("{", Token::LBrace),
    ("}", Token::RBrace),
    (",", Token::Comma),
    (":", Token::Colon),
    (";", Token::Semicolon),
    (".", Token::Dot),
    ("=", Token::Equal),
];

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Python tokenizer.
///
/// Produces significant tokens, comments, logical-line ends and indentation
/// changes. Line breaks inside brackets and after a `\` continuation do not end
/// the logical line.
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    line_start: usize,
    brackets: Vec<(char, Position)>,
    /// Open indentation levels, measured with tab stops of 8 and of 1.
    indents: Vec<(usize, usize)>,
    at_line_start: bool,
    tokens: Vec<SpannedToken>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        // a leading byte-order mark is not part of the first line
        let start = if input.starts_with(BYTE_ORDER_MARK) {
            BYTE_ORDER_MARK.len_utf8()
        } else {
            0
        };
        Lexer {
            input,
            position: start,
            line: 1,
            line_start: start,
            brackets: Vec::new(),
            indents: vec![(0, 0)],
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input[self.position..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.line_start = self.position;
            }
        }
    }

    fn current_position(&self) -> Position {
        Position {
            line: self.line,
            column: self.input[self.line_start..self.position].chars().count() + 1,
        }
    }

    fn error(&self, message: impl Into<String>, position: Position) -> LexError {
        LexError {
            message: message.into(),
            position,
        }
    }

    fn push(&mut self, token: Token, start: usize, position: Position) {
        self.tokens.push(SpannedToken {
            token,
            span: Span {
                start,
                end: self.position,
            },
            position,
        });
    }

    /// Tokenizes the whole input.
    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, LexError> {
        loop {
            if self.at_line_start && self.brackets.is_empty() {
                if !self.read_indentation()? {
                    break;
                }
                continue;
            }

            let Some(ch) = self.current_char() else {
                break;
            };
            let start = self.position;
            let position = self.current_position();

            match ch {
                ' ' | '\t' | '\x0c' | '\r' => self.advance(),
                '\n' => {
                    self.advance();
                    if self.brackets.is_empty() {
                        self.push(Token::Newline, start, position);
                        self.at_line_start = true;
                    }
                }
                '\\' => self.read_continuation(position)?,
                '#' => {
                    let text = self.read_comment();
                    self.push(Token::Comment(text), start, position);
                }
                '\'' | '"' => {
                    self.read_string(ch, position)?;
                    let text = self.input[start..self.position].to_string();
                    self.push(Token::String(text), start, position);
                }
                c if c.is_ascii_digit() => {
                    let text = self.read_number(position)?;
                    self.push(Token::Number(text), start, position);
                }
                '.' if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                    let text = self.read_number(position)?;
                    self.push(Token::Number(text), start, position);
                }
                c if is_identifier_start(c) => {
                    let ident = self.read_identifier();
                    match self.current_char() {
                        Some(quote @ ('\'' | '"')) if is_string_prefix(&ident) => {
                            self.read_string(quote, position)?;
                            let text = self.input[start..self.position].to_string();
                            self.push(Token::String(text), start, position);
                        }
                        _ => self.push(Token::Name(ident), start, position),
                    }
                }
                _ => self.read_operator(start, position)?,
            }
        }

        self.finish()
    }

    /// Measures indentation at the start of a physical line and emits
    /// indentation changes. Blank and comment-only lines do not count.
    ///
    /// Returns false at end of input.
    fn read_indentation(&mut self) -> Result<bool, LexError> {
        // `alt` counts a tab as one column; both measures must agree on
        // the ordering of levels or the indentation depends on tab size.
        let (mut column, mut alt) = (0, 0);
        loop {
            match self.current_char() {
                Some(' ') => {
                    column += 1;
                    alt += 1;
                }
                Some('\t') => {
                    column = (column / 8 + 1) * 8;
                    alt += 1;
                }
                Some('\x0c') => (column, alt) = (0, 0),
                Some('\r') => {}
                _ => break,
            }
            self.advance();
        }

        let start = self.position;
        let position = self.current_position();
        match self.current_char() {
            None => return Ok(false),
            Some('\n') => {
                self.advance();
                return Ok(true);
            }
            Some('#') => {
                let text = self.read_comment();
                self.push(Token::Comment(text), start, position);
                return Ok(true);
            }
            Some(_) => {}
        }

        let inconsistent = "inconsistent use of tabs and spaces in indentation";
        let (top, alt_top) = self.indents.last().copied().unwrap_or((0, 0));
        if column > top {
            if alt <= alt_top {
                return Err(self.error(inconsistent, position));
            }
            self.indents.push((column, alt));
            self.push(Token::Indent, start, position);
        } else if column < top {
            while self.indents.last().is_some_and(|&(level, _)| column < level) {
                self.indents.pop();
                self.push(Token::Dedent, start, position);
            }
            let (level, alt_level) = self.indents.last().copied().unwrap_or((0, 0));
            if level != column {
                return Err(self.error(
                    "unindent does not match any outer indentation level",
                    position,
                ));
            }
            if alt_level != alt {
                return Err(self.error(inconsistent, position));
            }
        } else if alt != alt_top {
            return Err(self.error(inconsistent, position));
        }

        self.at_line_start = false;
        Ok(true)
    }

    fn read_continuation(&mut self, position: Position) -> Result<(), LexError> {
        self.advance(); // consume '\'
        if self.current_char() == Some('\r') {
            self.advance();
        }
        match self.current_char() {
            Some('\n') => {
                self.advance();
                Ok(())
            }
            None => Err(self.error("unexpected end of input after line continuation", position)),
            Some(_) => Err(self.error(
                "unexpected character after line continuation character",
                position,
            )),
        }
    }

    fn read_comment(&mut self) -> String {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            self.advance();
        }
        self.input[start..self.position].to_string()
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if is_identifier_continue(ch) {
                self.advance();
            } else {
                break;
            }
        }
        self.input[start..self.position].to_string()
    }

    /// Scans a string body starting at the opening quote. Escapes are skipped,
    /// not decoded.
    fn read_string(&mut self, quote: char, position: Position) -> Result<(), LexError> {
        let triple = self.peek_char(1) == Some(quote) && self.peek_char(2) == Some(quote);
        self.advance();
        if triple {
            self.advance();
            self.advance();
        }

        loop {
            match self.current_char() {
                None if triple => {
                    return Err(self.error("unterminated triple-quoted string literal", position));
                }
                None => return Err(self.error("unterminated string literal", position)),
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('\n') if !triple => {
                    return Err(self.error("unterminated string literal", position));
                }
                Some(c) if c == quote => {
                    self.advance();
                    if !triple {
                        return Ok(());
                    }
                    if self.current_char() == Some(quote) && self.peek_char(1) == Some(quote) {
                        self.advance();
                        self.advance();
                        return Ok(());
                    }
                }
                Some(_) => self.advance(),
            }
        }
    }

    fn read_number(&mut self, position: Position) -> Result<String, LexError> {
        let start = self.position;

        let radix = match (self.current_char(), self.peek_char(1)) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('o' | 'O')) => Some(8),
            (Some('0'), Some('b' | 'B')) => Some(2),
            _ => None,
        };

        if let Some(radix) = radix {
            self.advance();
            self.advance();
            let digits_start = self.position;
            self.consume_digits(|c| c.is_digit(radix));
            if self.position == digits_start {
                return Err(self.error("invalid numeric literal", position));
            }
        } else {
            self.consume_digits(|c| c.is_ascii_digit());
            if self.current_char() == Some('.') {
                self.advance();
                self.consume_digits(|c| c.is_ascii_digit());
            }
            if matches!(self.current_char(), Some('e' | 'E')) {
                let has_exponent = match self.peek_char(1) {
                    Some(c) if c.is_ascii_digit() => true,
                    Some('+' | '-') => self.peek_char(2).is_some_and(|c| c.is_ascii_digit()),
                    _ => false,
                };
                if has_exponent {
                    self.advance();
                    if matches!(self.current_char(), Some('+' | '-')) {
                        self.advance();
                    }
                    self.consume_digits(|c| c.is_ascii_digit());
                }
            }
            if matches!(self.current_char(), Some('j' | 'J')) {
                self.advance();
            }
        }

        let text = &self.input[start..self.position];
        if text.ends_with('_') || text.contains("__") || text.contains("_.") || text.contains("._") {
            return Err(self.error("invalid decimal literal", position));
        }
        Ok(text.to_string())
    }

    fn consume_digits(&mut self, is_digit: impl Fn(char) -> bool) {
        while let Some(ch) = self.current_char() {
            if is_digit(ch) || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_operator(&mut self, start: usize, position: Position) -> Result<(), LexError> {
        let rest = &self.input[self.position..];
        let Some((symbol, token)) = OPERATORS.iter().find(|(symbol, _)| rest.starts_with(symbol))
        else {
            let ch = self.current_char().unwrap_or_default();
            return Err(self.error(format!("invalid character '{}'", ch), position));
        };

        for _ in 0..symbol.len() {
            self.advance();
        }

        match token {
            Token::LParen => self.brackets.push(('(', position)),
            Token::LBracket => self.brackets.push(('[', position)),
            Token::LBrace => self.brackets.push(('{', position)),
            Token::RParen | Token::RBracket | Token::RBrace => {
                let close = symbol.chars().next().unwrap_or_default();
                match self.brackets.pop() {
                    None => {
                        return Err(self.error(format!("unmatched '{}'", close), position));
                    }
                    Some((open, _)) if closing_for(open) != close => {
                        return Err(self.error(
                            format!(
                                "closing parenthesis '{}' does not match opening parenthesis '{}'",
                                close, open
                            ),
                            position,
                        ));
                    }
                    Some(_) => {}
                }
            }
            _ => {}
        }

        self.push(token.clone(), start, position);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<SpannedToken>, LexError> {
        if let Some((open, position)) = self.brackets.last() {
            return Err(self.error(format!("'{}' was never closed", open), *position));
        }

        let end = self.input.len();
        let position = self.current_position();
        let needs_newline = self
            .tokens
            .iter()
            .rev()
            .find(|t| t.token.is_significant())
            .is_some_and(|t| t.token != Token::Newline);
        if needs_newline {
            self.push(Token::Newline, end, position);
        }

        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(Token::Dedent, end, position);
        }
        self.push(Token::Eof, end, position);

        Ok(self.tokens)
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

fn is_identifier_continue(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

/// String prefixes accepted before a quote, compared case-insensitively.
fn is_string_prefix(ident: &str) -> bool {
    matches!(
        ident.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "br" | "rb" | "f" | "fr" | "rf"
    )
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

#[cfg(test)]
fn kinds(source: &str) -> Vec<Token> {
    Lexer::new(source)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.token)
        .collect()
}

#[test]
fn test_binding_line() {
    assert_eq!(
        kinds("x = [1, 'a']\n"),
        vec![
            Token::Name("x".into()),
            Token::Equal,
            Token::LBracket,
            Token::Number("1".into()),
            Token::Comma,
            Token::String("'a'".into()),
            Token::RBracket,
            Token::Newline,
            Token::Eof,
        ]
    );
}

#[test]
fn test_newlines_inside_brackets_are_joined() {
    let tokens = kinds("x = {\n    1,\n    2,\n}\n");
    let newlines = tokens.iter().filter(|t| **t == Token::Newline).count();
    assert_eq!(newlines, 1);
    assert!(!tokens.contains(&Token::Indent));
}

#[test]
fn test_indent_and_dedent() {
    let tokens = kinds("def f():\n    return 1\ny = 2\n");
    assert!(tokens.contains(&Token::Indent));
    assert!(tokens.contains(&Token::Dedent));
}

#[test]
fn test_bad_dedent() {
    let err = Lexer::new("if x:\n        a = 1\n    b = 2\n").tokenize().unwrap_err();
    assert!(err.message.contains("unindent"));
    assert_eq!(err.position.line, 3);
}

#[test]
fn test_leading_byte_order_mark_is_skipped() {
    let tokens = Lexer::new("\u{feff}x = [1]\n").tokenize().unwrap();
    assert_eq!(tokens[0].token, Token::Name("x".into()));
    assert_eq!(tokens[0].span.start, 3);
    assert_eq!(tokens[0].position, Position { line: 1, column: 1 });

    let err = Lexer::new("x = \u{feff}1\n").tokenize().unwrap_err();
    assert!(err.message.starts_with("invalid character"));
}

#[test]
fn test_tabs_and_spaces_must_agree() {
    let err = Lexer::new("if a:\n\tb\n        c\n").tokenize().unwrap_err();
    assert_eq!(err.message, "inconsistent use of tabs and spaces in indentation");
    assert_eq!(err.position.line, 3);

    let err = Lexer::new("if a:\n        b\n\tif c:\n\t        d\n").tokenize().unwrap_err();
    assert_eq!(err.message, "inconsistent use of tabs and spaces in indentation");

    assert!(Lexer::new("if a:\n\tb\n\tc\nd\n").tokenize().is_ok());
}
