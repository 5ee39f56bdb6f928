// tests/parser_tests.rs

use pycraft::ast::{BinOp, Expr, Scalar, Statement, UnaryOp};
use pycraft::parser::{parse, parse_expression};

fn constant(source: &str) -> Scalar {
    match parse_expression(source).unwrap() {
        Expr::Constant(c) => c.value,
        other => panic!("expected constant, got {:?}", other),
    }
}

// ============================================================================
// Bindings
// ============================================================================

#[test]
fn test_bindings_in_document_order() {
    let module = parse("a = [1]\nb = {'k': 1}\nc = set()\n").unwrap();
    let names: Vec<&str> = module.bindings().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_binding_keeps_annotation_and_comment() {
    let source = "config: dict[str, int] = {'a': 1}  # defaults\n";
    let module = parse(source).unwrap();
    let binding = module.bindings().next().unwrap();

    assert_eq!(binding.name, "config");
    assert_eq!(binding.annotation.as_deref(), Some("dict[str, int]"));
    assert_eq!(binding.original_value(), "{'a': 1}");
    assert_eq!(module.to_source(), source);
}

#[test]
fn test_binding_position() {
    let module = parse("import os\n\nx = [1]\n").unwrap();
    let binding = module.bindings().next().unwrap();
    assert_eq!(binding.position.line, 3);
    assert_eq!(binding.position.column, 1);
}

#[test]
fn test_non_bindings_are_verbatim() {
    let source = "\
import os
x += 1
y.attr = 2
z[0] = 3
a, b = 1, 2
p = q = []
r = 1; s = 2
print(x)
";
    let module = parse(source).unwrap();
    assert_eq!(module.bindings().count(), 0);
    assert_eq!(module.to_source(), source);
}

#[test]
fn test_nested_bindings_are_not_top_level() {
    let source = "\
def f():
    inner = [1, 2]
    if inner:
        deeper = {}
    return inner

class C:
    attr = {'a': 1}

top = [3]
";
    let module = parse(source).unwrap();
    let names: Vec<&str> = module.bindings().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["top"]);
    assert_eq!(module.to_source(), source);
}

#[test]
fn test_conditional_block_is_skipped() {
    let module = parse("if DEBUG:\n    x = [1]\nelse:\n    x = [2]\nx = [3]\n").unwrap();
    let values: Vec<&str> = module.bindings().map(|b| b.original_value()).collect();
    assert_eq!(values, vec!["[3]"]);
}

#[test]
fn test_statements_cover_whole_source() {
    let source = "# header\n\nx = [\n    1,  # one\n    2,\n]\n\n\n# footer";
    let module = parse(source).unwrap();
    assert!(matches!(module.statements.first(), Some(Statement::Verbatim(_))));
    assert_eq!(module.to_source(), source);
}

#[test]
fn test_trailing_semicolon_binding() {
    let source = "x = [1];  # one\ny = {}; z = 1\n";
    let module = parse(source).unwrap();
    let bindings: Vec<_> = module.bindings().collect();

    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].name, "x");
    assert_eq!(bindings[0].original_value(), "[1]");
    assert_eq!(module.to_source(), source);
}

#[test]
fn test_byte_order_mark_stays_in_source() {
    let source = "\u{feff}x = [1]\n";
    let module = parse(source).unwrap();
    let binding = module.bindings().next().unwrap();

    assert_eq!(binding.name, "x");
    assert_eq!(binding.position.column, 1);
    assert_eq!(module.to_source(), source);
}

#[test]
fn test_windows_line_endings_survive() {
    let source = "x = [1]\r\ny = {2}\r\n";
    let module = parse(source).unwrap();
    assert_eq!(module.bindings().count(), 2);
    assert_eq!(module.to_source(), source);
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_scalar_constants() {
    assert_eq!(constant("42"), Scalar::Int(42));
    assert_eq!(constant("0x_ff"), Scalar::Int(255));
    assert_eq!(constant("1_000.5"), Scalar::Float(1000.5));
    assert_eq!(constant("1e3"), Scalar::Float(1000.0));
    assert_eq!(constant("2j"), Scalar::Complex(2.0));
    assert_eq!(constant("None"), Scalar::None);
    assert_eq!(constant("True"), Scalar::Bool(true));
    assert_eq!(constant("..."), Scalar::Ellipsis);
    assert_eq!(
        constant("123456789012345678901234567890"),
        Scalar::BigInt("123456789012345678901234567890".to_string())
    );
}

#[test]
fn test_string_constants() {
    assert_eq!(constant(r"'a\nb'"), Scalar::Str("a\nb".to_string()));
    assert_eq!(constant(r"r'a\nb'"), Scalar::Str(r"a\nb".to_string()));
    assert_eq!(constant(r"'\x41é'"), Scalar::Str("Aé".to_string()));
    assert_eq!(constant("'a' \"b\""), Scalar::Str("ab".to_string()));
    assert_eq!(constant(r"b'\x00a'"), Scalar::Bytes(vec![0, b'a']));
}

#[test]
fn test_fstring_is_opaque() {
    assert!(matches!(
        parse_expression("f'{x}!'").unwrap(),
        Expr::FString(raw) if raw == "f'{x}!'"
    ));
}

#[test]
fn test_negative_number_is_unary() {
    match parse_expression("-1").unwrap() {
        Expr::UnaryOp { op, operand } => {
            assert_eq!(op, UnaryOp::USub);
            assert_eq!(operand.as_constant(), Some(&Scalar::Int(1)));
        }
        other => panic!("expected unary op, got {:?}", other),
    }
}

#[test]
fn test_operator_precedence() {
    match parse_expression("1 + 2 * 3").unwrap() {
        Expr::BinOp { op, right, .. } => {
            assert_eq!(op, BinOp::Add);
            assert!(matches!(*right, Expr::BinOp { op: BinOp::Mult, .. }));
        }
        other => panic!("expected binop, got {:?}", other),
    }
}

#[test]
fn test_calls_and_keywords() {
    match parse_expression("dict(a=1, *rest, **extra)").unwrap() {
        Expr::Call {
            func,
            args,
            keywords,
        } => {
            assert!(func.is_name("dict"));
            assert!(matches!(args.as_slice(), [Expr::Starred(_)]));
            assert_eq!(keywords.len(), 2);
            assert_eq!(keywords[0].arg.as_deref(), Some("a"));
            assert_eq!(keywords[1].arg, None);
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn test_comprehensions() {
    assert!(matches!(
        parse_expression("[x for x in range(3) if x]").unwrap(),
        Expr::ListComp { .. }
    ));
    assert!(matches!(
        parse_expression("{k: v for k, v in items}").unwrap(),
        Expr::DictComp { .. }
    ));
    assert!(matches!(
        parse_expression("{x async for x in aiter()}").unwrap(),
        Expr::SetComp { .. }
    ));
    assert!(matches!(
        parse_expression("sum(x for x in y)").unwrap(),
        Expr::Call { args, .. } if matches!(args.as_slice(), [Expr::GeneratorExp { .. }])
    ));
}

#[test]
fn test_displays() {
    assert!(matches!(parse_expression("{}").unwrap(), Expr::Dict(items) if items.is_empty()));
    assert!(matches!(parse_expression("{1}").unwrap(), Expr::Set(items) if items.len() == 1));
    assert!(matches!(parse_expression("(1,)").unwrap(), Expr::Tuple(items) if items.len() == 1));
    assert!(matches!(parse_expression("()").unwrap(), Expr::Tuple(items) if items.is_empty()));
    assert!(matches!(parse_expression("(1)").unwrap(), Expr::Constant(_)));
    assert!(matches!(
        parse_expression("{**a, 'b': 2}").unwrap(),
        Expr::Dict(items) if items[0].key.is_none()
    ));
}

#[test]
fn test_other_expression_forms() {
    for source in [
        "lambda x, *args, y=1, **kw: x",
        "a if b else c",
        "not a or b and c",
        "a < b <= c is not d not in e",
        "obj.attr[1:2, ::3]",
        "(y := 10)",
        "await fetch()",
        "[*a, *b]",
        "a @ b | c ^ d & e << 2",
        "x ** -y",
    ] {
        assert!(parse_expression(source).is_ok(), "failed to parse {}", source);
    }
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_trailing_garbage_is_error() {
    let err = parse("x = [1, 2] 3\n").unwrap_err();
    assert!(err.message.starts_with("invalid syntax"), "{}", err.message);
    assert_eq!(err.position.line, 1);
}

#[test]
fn test_unexpected_indent() {
    let err = parse("x = 1\n    y = 2\n").unwrap_err();
    assert_eq!(err.message, "unexpected indent");
    assert_eq!(err.position.line, 2);
}

#[test]
fn test_lex_errors_become_syntax_errors() {
    let err = parse("x = {1, 2\n").unwrap_err();
    assert_eq!(err.message, "'{' was never closed");
}

#[test]
fn test_inconsistent_tabs_are_syntax_errors() {
    let err = parse("if a:\n\tb = 1\n        c = 2\n").unwrap_err();
    assert_eq!(err.message, "inconsistent use of tabs and spaces in indentation");
    assert_eq!(err.position.line, 3);
}

#[test]
fn test_positional_after_keyword() {
    let err = parse_expression("f(a=1, 2)").unwrap_err();
    assert_eq!(err.message, "positional argument follows keyword argument");
}

#[test]
fn test_leading_zero_integer() {
    assert!(parse_expression("0123").is_err());
    assert_eq!(constant("000"), Scalar::Int(0));
}

#[test]
fn test_mixed_bytes_and_str() {
    let err = parse_expression("b'a' 'b'").unwrap_err();
    assert_eq!(err.message, "cannot mix bytes and nonbytes literals");
}

#[test]
fn test_error_display_has_location() {
    let err = parse("x = ]\n").unwrap_err();
    assert!(err.to_string().contains("line 1"));
}
