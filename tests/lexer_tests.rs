// tests/lexer_tests.rs

use pycraft::ast::Token;
use pycraft::lexer::{Lexer, Position};

fn tokens(source: &str) -> Vec<Token> {
    Lexer::new(source)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.token)
        .collect()
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_string_prefixes_and_quotes() {
    let toks = tokens(r#"x = [rb'\d', f"{y}", U'u', '''a'b''', "\"q\""]"#);
    let strings: Vec<&str> = toks
        .iter()
        .filter_map(|t| match t {
            Token::String(raw) => Some(raw.as_str()),
            _ => None,
        })
        .collect();

    assert_eq!(
        strings,
        vec![r"rb'\d'", r#"f"{y}""#, "U'u'", "'''a'b'''", r#""\"q\"""#]
    );
}

#[test]
fn test_triple_quoted_string_spans_lines() {
    let toks = tokens("doc = \"\"\"first\nsecond\"\"\"\nx = 1\n");
    assert_eq!(toks[2], Token::String("\"\"\"first\nsecond\"\"\"".to_string()));
    assert_eq!(toks[3], Token::Newline);
    assert_eq!(toks[4], Token::Name("x".to_string()));
}

#[test]
fn test_numbers() {
    let toks = tokens("0x_ff 1_000 3.14 .5 1e-3 2j 0o17 0b101");
    let numbers: Vec<Token> = toks
        .into_iter()
        .filter(|t| matches!(t, Token::Number(_)))
        .collect();

    let expected: Vec<Token> = ["0x_ff", "1_000", "3.14", ".5", "1e-3", "2j", "0o17", "0b101"]
        .iter()
        .map(|s| Token::Number(s.to_string()))
        .collect();
    assert_eq!(numbers, expected);
}

#[test]
fn test_bad_underscore_in_number() {
    let err = Lexer::new("x = 1__0\n").tokenize().unwrap_err();
    assert_eq!(err.message, "invalid decimal literal");
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_comments_are_tokens() {
    let toks = tokens("x = 1  # one\n");
    assert_eq!(
        toks,
        vec![
            Token::Name("x".to_string()),
            Token::Equal,
            Token::Number("1".to_string()),
            Token::Comment("# one".to_string()),
            Token::Newline,
            Token::Eof,
        ]
    );
}

#[test]
fn test_backslash_continuation_joins_lines() {
    let toks = tokens("x = 1 + \\\n    2\n");
    let newlines = toks.iter().filter(|t| **t == Token::Newline).count();
    assert_eq!(newlines, 1);
    assert!(!toks.contains(&Token::Indent));
}

#[test]
fn test_missing_final_newline_is_supplied() {
    let toks = tokens("x = [1]");
    assert_eq!(&toks[toks.len() - 2..], &[Token::Newline, Token::Eof]);
}

#[test]
fn test_comment_lines_do_not_indent() {
    let toks = tokens("x = 1\n    # indented comment\ny = 2\n");
    assert!(!toks.contains(&Token::Indent));
}

#[test]
fn test_operators_longest_match() {
    let toks = tokens("a **= b // c ** d -> e := f != g\n");
    assert!(toks.contains(&Token::AugAssign("**=")));
    assert!(toks.contains(&Token::DoubleSlash));
    assert!(toks.contains(&Token::DoubleStar));
    assert!(toks.contains(&Token::Arrow));
    assert!(toks.contains(&Token::ColonEqual));
    assert!(toks.contains(&Token::NotEq));
}

// ============================================================================
// Errors and positions
// ============================================================================

#[test]
fn test_unterminated_string() {
    let err = Lexer::new("x = 'abc\n").tokenize().unwrap_err();
    assert_eq!(err.message, "unterminated string literal");
    assert_eq!(err.position, Position { line: 1, column: 5 });
}

#[test]
fn test_unclosed_bracket() {
    let err = Lexer::new("x = [1, 2\ny = 3\n").tokenize().unwrap_err();
    assert_eq!(err.message, "'[' was never closed");
    assert_eq!(err.position.line, 1);
}

#[test]
fn test_mismatched_bracket() {
    let err = Lexer::new("x = (1]\n").tokenize().unwrap_err();
    assert!(err.message.contains("does not match"));
}

#[test]
fn test_token_positions() {
    let spanned = Lexer::new("a = 1\nbb = {2}\n").tokenize().unwrap();
    let brace = spanned
        .iter()
        .find(|t| t.token == Token::LBrace)
        .unwrap();
    assert_eq!(brace.position, Position { line: 2, column: 6 });
    assert_eq!(brace.span.start, 11);
    assert_eq!(brace.span.end, 12);
}
