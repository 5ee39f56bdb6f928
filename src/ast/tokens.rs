use std::fmt;

/// Lexical token produced by the [`Lexer`](crate::lexer::Lexer).
///
/// Literal tokens keep their exact source spelling so that untouched code can be
/// reproduced byte for byte; decoding happens in the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals and names
    /// Identifier or keyword
    ///
    /// Keywords are not split out at the lexical level; the parser decides
    /// whether `if`, `lambda`, `match` and friends are keywords in context.
    ///
    /// # Examples
    /// ```text
    /// my_dict
    /// lambda
    /// _private
    /// ```
    Name(String),

    /// Numeric literal, exactly as written
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 1_000
    /// 0xFF
    /// 3.14e-2
    /// 2j
    /// ```
    Number(String),

    /// String or bytes literal including prefix and quotes, exactly as written
    ///
    /// # Examples
    /// ```text
    /// 'value'
    /// b"\x00"
    /// r'''raw'''
    /// f"{name}"
    /// ```
    String(String),

    /// Comment text including the leading `#`
    Comment(String),

    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `.`
    Dot,
    /// `...`
    Ellipsis,
    /// `=`
    Equal,
    /// `:=`
    ColonEqual,
    /// `->`
    Arrow,
    /// Augmented assignment such as `+=` or `**=`
    AugAssign(&'static str),

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    DoubleStar,
    /// `/`
    Slash,
    /// `//`
    DoubleSlash,
    /// `%`
    Percent,
    /// `@`
    At,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `&`
    Ampersand,
    /// `~`
    Tilde,
    /// `<<`
    LeftShift,
    /// `>>`
    RightShift,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,

    // Layout
    /// End of a logical line
    Newline,
    /// Indentation increased
    Indent,
    /// Indentation decreased
    Dedent,
    /// End of input
    Eof,
}

impl Token {
    /// True for tokens the parser acts on; comments are layout-only.
    pub fn is_significant(&self) -> bool {
        !matches!(self, Token::Comment(_))
    }

    /// Returns the identifier text when this is a `Name` token.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Token::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Returns true when this is the given keyword or soft keyword.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.as_name() == Some(keyword)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Name(s) | Token::Number(s) | Token::String(s) | Token::Comment(s) => {
                return write!(f, "'{}'", s);
            }
            Token::AugAssign(op) => return write!(f, "'{}'", op),
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::Dot => ".",
            Token::Ellipsis => "...",
            Token::Equal => "=",
            Token::ColonEqual => ":=",
            Token::Arrow => "->",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::DoubleStar => "**",
            Token::Slash => "/",
            Token::DoubleSlash => "//",
            Token::Percent => "%",
            Token::At => "@",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Ampersand => "&",
            Token::Tilde => "~",
            Token::LeftShift => "<<",
            Token::RightShift => ">>",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::Newline => return f.write_str("end of line"),
            Token::Indent => return f.write_str("indent"),
            Token::Dedent => return f.write_str("dedent"),
            Token::Eof => return f.write_str("end of input"),
        };
        write!(f, "'{}'", text)
    }
}
