use pycraft::{
    ContainerKind, Document, EditError, Expr, MappingOps, Representation, Scalar, SequenceOps,
    SetOps, Value,
};

const LITERALS: &str = "
my_list = [1, 2, 3, 'a']
my_dict = {'key': 'value', 'my': 'val', 'num': 42}
my_set = {1, 2, 3}
";

const CALLS: &str = "
my_list = list(1, 2, 3, 'a')
my_dict = dict(key='value', my='val', num=42)
my_set = set(1, 2, 3)
";

fn literals() -> Document {
    Document::parse(LITERALS).unwrap()
}

fn calls() -> Document {
    Document::parse(CALLS).unwrap()
}

fn str_constant(expr: &Expr) -> Option<&str> {
    match expr.as_constant() {
        Some(Scalar::Str(s)) => Some(s),
        _ => None,
    }
}

// ============================================================================
// Mappings
// ============================================================================

#[test]
fn test_dict_pop() {
    for mut doc in [literals(), calls()] {
        let popped = doc.find_mapping("my_dict").unwrap().pop("key").unwrap();
        assert_eq!(str_constant(&popped), Some("value"));
        assert!(!doc.to_source().contains("key"));
    }
}

#[test]
fn test_dict_pop_missing_key() {
    let mut doc = literals();
    assert_eq!(doc.find_mapping("my_dict").unwrap().pop("missing"), None);
    assert!(!doc.is_modified());
    assert_eq!(doc.to_source(), LITERALS);
}

#[test]
fn test_dict_update_literal() {
    let mut doc = literals();
    doc.find_mapping("my_dict")
        .unwrap()
        .update([("new_key", 123)])
        .unwrap();
    assert!(doc.to_source().contains(
        "my_dict = {'key': 'value', 'my': 'val', 'num': 42, 'new_key': 123}\n"
    ));
}

#[test]
fn test_dict_update_call() {
    let mut doc = calls();
    doc.find_mapping("my_dict")
        .unwrap()
        .update([("new_key", 456)])
        .unwrap();
    assert!(
        doc.to_source()
            .contains("my_dict = dict(key='value', my='val', num=42, new_key=456)\n")
    );
}

#[test]
fn test_dict_update_existing_key_in_place() {
    let mut doc = literals();
    doc.find_mapping("my_dict")
        .unwrap()
        .update([("new_key2", 456), ("num", 43)])
        .unwrap();
    assert!(doc.to_source().contains(
        "{'key': 'value', 'my': 'val', 'num': 43, 'new_key2': 456}"
    ));

    let mut doc = calls();
    doc.find_mapping("my_dict")
        .unwrap()
        .update([("new_key2", 456), ("num", 43)])
        .unwrap();
    assert!(
        doc.to_source()
            .contains("dict(key='value', my='val', num=43, new_key2=456)")
    );
}

#[test]
fn test_dict_clear() {
    let mut doc = literals();
    doc.find_mapping("my_dict").unwrap().clear();
    assert!(doc.to_source().contains("my_dict = {}\n"));

    let mut doc = calls();
    doc.find_mapping("my_dict").unwrap().clear();
    assert!(doc.to_source().contains("my_dict = dict()\n"));
}

#[test]
fn test_dict_clear_drops_positional_arguments() {
    let mut doc = Document::parse("d = dict({'a': 1}, b=2)\n").unwrap();
    let mut mapping = doc.find_mapping("d").unwrap();
    assert_eq!(mapping.len(), 1);

    mapping.clear();
    assert!(mapping.is_empty());
    assert_eq!(doc.to_source(), "d = dict()\n");

    let mut doc = Document::parse("d = dict(pairs)\n").unwrap();
    doc.find_mapping("d").unwrap().clear();
    assert_eq!(doc.to_source(), "d = dict()\n");
}

#[test]
fn test_dict_tuple_key_is_replaced_in_place() {
    let mut doc = Document::parse("m = {(1, 2): 'a'}\n").unwrap();
    let mut mapping = doc.find_mapping("m").unwrap();
    let key = Value::Tuple(vec![Value::Int(1), Value::Int(2)]);

    assert!(mapping.contains_key(key.clone()));
    mapping.set(key.clone(), "b").unwrap();
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.get(key).and_then(str_constant), Some("b"));
    assert_eq!(doc.to_source(), "m = {(1, 2): 'b'}\n");
}

#[test]
fn test_dict_rejects_unhashable_key() {
    let mut doc = literals();
    let mut mapping = doc.find_mapping("my_dict").unwrap();

    let err = mapping.set(Value::from(vec![1, 2]), "x").unwrap_err();
    assert_eq!(err, EditError::UnhashableKey("[1, 2]".to_string()));
    assert_eq!(err.to_string(), "unhashable key: [1, 2]");
    assert_eq!(mapping.len(), 3);

    assert!(!doc.is_modified());
    assert_eq!(doc.to_source(), LITERALS);
}

#[test]
fn test_dict_get() {
    for mut doc in [literals(), calls()] {
        let mapping = doc.find_mapping("my_dict").unwrap();
        assert_eq!(mapping.get("key").and_then(str_constant), Some("value"));
        assert_eq!(mapping.get("nonexistent"), None);

        let fallback = mapping.get_or("nonexistent", "default");
        assert_eq!(str_constant(&fallback), Some("default"));
        assert_eq!(mapping.len(), 3);
        assert!(mapping.contains_key("num"));
    }
}

#[test]
fn test_dict_keys() {
    let mut doc = calls();
    let keys: Vec<String> = doc
        .find_mapping("my_dict")
        .unwrap()
        .keys()
        .iter()
        .filter_map(|k| str_constant(k).map(str::to_string))
        .collect();
    assert_eq!(keys, vec!["key", "my", "num"]);
}

#[test]
fn test_dict_numeric_keys_match_across_types() {
    let mut doc = Document::parse("codes = {1: 'one', 2.0: 'two'}\n").unwrap();
    let mut codes = doc.find_mapping("codes").unwrap();
    assert!(codes.contains_key(1.0));
    codes.set(2, "deux").unwrap();
    assert_eq!(doc.to_source(), "codes = {1: 'one', 2.0: 'deux'}\n");
}

#[test]
fn test_call_mapping_rejects_non_identifier_keys() {
    let mut doc = calls();
    let mut mapping = doc.find_mapping("my_dict").unwrap();

    assert_eq!(
        mapping.set("not valid", 1),
        Err(EditError::InvalidKeyword("'not valid'".to_string()))
    );
    assert_eq!(
        mapping.set(1, "x"),
        Err(EditError::InvalidKeyword("1".to_string()))
    );
    assert!(mapping.set("class", 1).is_err());

    assert!(!doc.is_modified());
    assert_eq!(doc.to_source(), CALLS);
}

#[test]
fn test_dict_set_nested_values() {
    let mut doc = Document::parse("settings = {}\n").unwrap();
    let mut settings = doc.find_mapping("settings").unwrap();
    settings
        .set("paths", Value::from(vec!["a", "b"]))
        .unwrap();
    settings
        .set("limits", Value::dict([("max", Value::Int(3)), ("ratio", Value::Float(0.5))]))
        .unwrap();
    settings.set("debug", Value::None).unwrap();

    assert_eq!(
        doc.to_source(),
        "settings = {'paths': ['a', 'b'], 'limits': {'max': 3, 'ratio': 0.5}, 'debug': None}\n"
    );
}

// ============================================================================
// Sequences
// ============================================================================

#[test]
fn test_list_pop() {
    let mut doc = literals();
    let popped = doc.find_sequence("my_list").unwrap().pop(0).unwrap();
    assert_eq!(popped.as_constant(), Some(&Scalar::Int(1)));
    assert!(doc.to_source().contains("my_list = [2, 3, 'a']\n"));

    let mut doc = calls();
    let popped = doc.find_sequence("my_list").unwrap().pop_last().unwrap();
    assert_eq!(str_constant(&popped), Some("a"));
    assert!(doc.to_source().contains("my_list = list(1, 2, 3)\n"));
}

#[test]
fn test_list_pop_out_of_range() {
    let mut doc = literals();
    let mut list = doc.find_sequence("my_list").unwrap();
    assert_eq!(
        list.pop(10),
        Err(EditError::IndexOutOfRange { index: 10, len: 4 })
    );
    assert_eq!(
        list.pop(-5),
        Err(EditError::IndexOutOfRange { index: -5, len: 4 })
    );
    let popped = list.pop(-4).unwrap();
    assert_eq!(popped.as_constant(), Some(&Scalar::Int(1)));
}

#[test]
fn test_list_append() {
    for mut doc in [literals(), calls()] {
        doc.find_sequence("my_list").unwrap().append("b");
        assert!(doc.to_source().contains("'b'"));
    }
}

#[test]
fn test_list_remove() {
    let mut doc = literals();
    doc.find_sequence("my_list").unwrap().remove(2).unwrap();
    assert!(doc.to_source().contains("my_list = [1, 3, 'a']\n"));

    let mut doc = calls();
    doc.find_sequence("my_list").unwrap().remove(2).unwrap();
    assert!(doc.to_source().contains("my_list = list(1, 3, 'a')\n"));
}

#[test]
fn test_list_remove_missing_element() {
    for mut doc in [literals(), calls()] {
        let result = doc.find_sequence("my_list").unwrap().remove(4);
        assert_eq!(result, Err(EditError::ValueNotFound("4".to_string())));
        assert!(!doc.is_modified());
    }
}

#[test]
fn test_list_remove_first_equal_only() {
    let mut doc = Document::parse("xs = [1, 1.0, True, 2]\n").unwrap();
    doc.find_sequence("xs").unwrap().remove(true).unwrap();
    assert_eq!(doc.to_source(), "xs = [1.0, True, 2]\n");
}

#[test]
fn test_list_clear() {
    let mut doc = literals();
    doc.find_sequence("my_list").unwrap().clear();
    assert!(doc.to_source().contains("my_list = []\n"));

    let mut doc = calls();
    doc.find_sequence("my_list").unwrap().clear();
    assert!(doc.to_source().contains("my_list = list()\n"));
}

#[test]
fn test_list_reverse() {
    let mut doc = literals();
    doc.find_sequence("my_list").unwrap().reverse();
    assert!(doc.to_source().contains("my_list = ['a', 3, 2, 1]\n"));

    let mut doc = calls();
    doc.find_sequence("my_list").unwrap().reverse();
    assert!(doc.to_source().contains("my_list = list('a', 3, 2, 1)\n"));
}

#[test]
fn test_list_extend() {
    let mut doc = literals();
    doc.find_sequence("my_list").unwrap().extend(["b", "c"]);
    assert!(doc.to_source().contains("my_list = [1, 2, 3, 'a', 'b', 'c']\n"));

    let mut doc = calls();
    doc.find_sequence("my_list").unwrap().extend(["b", "c"]);
    assert!(doc.to_source().contains("my_list = list(1, 2, 3, 'a', 'b', 'c')\n"));
}

#[test]
fn test_list_insert() {
    let mut doc = literals();
    doc.find_sequence("my_list").unwrap().insert(1, "b");
    assert!(doc.to_source().contains("my_list = [1, 'b', 2, 3, 'a']\n"));

    let mut doc = calls();
    doc.find_sequence("my_list").unwrap().insert(1, "b");
    assert!(doc.to_source().contains("my_list = list(1, 'b', 2, 3, 'a')\n"));
}

#[test]
fn test_list_insert_clamps_like_python() {
    let mut doc = Document::parse("xs = [1, 2]\n").unwrap();
    let mut xs = doc.find_sequence("xs").unwrap();
    xs.insert(-1, "before_last");
    xs.insert(100, "end");
    xs.insert(-100, "start");
    assert_eq!(
        doc.to_source(),
        "xs = ['start', 1, 'before_last', 2, 'end']\n"
    );
}

// ============================================================================
// Sets
// ============================================================================

#[test]
fn test_set_add() {
    let mut doc = literals();
    doc.find_set("my_set").unwrap().add(4);
    assert!(doc.to_source().contains("my_set = {1, 2, 3, 4}\n"));

    let mut doc = calls();
    doc.find_set("my_set").unwrap().add(4);
    assert!(doc.to_source().contains("my_set = set(1, 2, 3, 4)\n"));
}

#[test]
fn test_set_add_existing_is_noop() {
    for (mut doc, source) in [(literals(), LITERALS), (calls(), CALLS)] {
        doc.find_set("my_set").unwrap().add(3);
        doc.find_set("my_set").unwrap().add(3.0);
        assert!(!doc.is_modified());
        assert_eq!(doc.to_source(), source);
    }
}

#[test]
fn test_set_remove() {
    let mut doc = literals();
    doc.find_set("my_set").unwrap().remove(3).unwrap();
    assert!(doc.to_source().contains("my_set = {1, 2}\n"));

    let mut doc = calls();
    doc.find_set("my_set").unwrap().remove(3).unwrap();
    assert!(doc.to_source().contains("my_set = set(1, 2)\n"));
}

#[test]
fn test_set_remove_missing_element() {
    for mut doc in [literals(), calls()] {
        let result = doc.find_set("my_set").unwrap().remove(10);
        assert_eq!(result, Err(EditError::KeyNotFound("10".to_string())));
    }
}

#[test]
fn test_set_discard() {
    let mut doc = literals();
    doc.find_set("my_set").unwrap().discard(3);
    assert!(doc.to_source().contains("my_set = {1, 2}\n"));

    let mut doc = calls();
    doc.find_set("my_set").unwrap().discard(10);
    assert!(doc.to_source().contains("my_set = set(1, 2, 3)\n"));
    assert!(!doc.is_modified());
}

#[test]
fn test_set_update() {
    let mut doc = literals();
    doc.find_set("my_set").unwrap().update([4, 5, 1]);
    assert!(doc.to_source().contains("my_set = {1, 2, 3, 4, 5}\n"));

    let mut doc = calls();
    doc.find_set("my_set").unwrap().update([4, 5]);
    assert!(doc.to_source().contains("my_set = set(1, 2, 3, 4, 5)\n"));
}

#[test]
fn test_emptied_literal_set_renders_as_call() {
    let mut doc = Document::parse("s = {1}\n").unwrap();
    doc.find_set("s").unwrap().remove(1).unwrap();
    assert_eq!(doc.to_source(), "s = set()\n");
}

// ============================================================================
// Locating
// ============================================================================

#[test]
fn test_wrong_kind_is_not_found() {
    let mut doc = literals();
    assert!(doc.find_mapping("my_list").is_none());
    assert!(doc.find_sequence("my_set").is_none());
    assert!(doc.find_set("my_dict").is_none());
    assert!(doc.find_sequence("missing").is_none());
}

#[test]
fn test_first_matching_binding_wins() {
    let source = "items = 'not a list'\nitems = [1]\nitems = [2]\n";
    let mut doc = Document::parse(source).unwrap();
    doc.find_sequence("items").unwrap().append(9);
    assert_eq!(
        doc.to_source(),
        "items = 'not a list'\nitems = [1, 9]\nitems = [2]\n"
    );
}

#[test]
fn test_other_calls_are_not_containers() {
    let mut doc = Document::parse("a = OrderedDict(x=1)\nb = frozenset({1})\nc = [x for x in y]\n")
        .unwrap();
    assert!(doc.find_mapping("a").is_none());
    assert!(doc.find_set("b").is_none());
    assert!(doc.find_sequence("c").is_none());
}

#[test]
fn test_binding_summary() {
    let doc = Document::parse("import os\n\nA = [1]\nB = dict()\nC = 3\n").unwrap();
    let info = doc.bindings();

    assert_eq!(info.len(), 3);
    assert_eq!(info[0].name, "A");
    assert_eq!(info[0].line, 3);
    assert_eq!(info[0].kind, Some(ContainerKind::Sequence));
    assert_eq!(info[0].representation, Some(Representation::Literal));
    assert_eq!(info[1].kind, Some(ContainerKind::Mapping));
    assert_eq!(info[1].representation, Some(Representation::Call));
    assert_eq!(info[2].kind, None);
    assert_eq!(doc.get("C").and_then(Expr::as_constant), Some(&Scalar::Int(3)));
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_unedited_source_round_trips() {
    let source = "\
#!/usr/bin/env python
\"\"\"Module docstring.\"\"\"
import os

DEBUG = True
HOSTS = [  # comment inside
    \"example.com\",
    'localhost',
]
OPTIONS: dict = dict(a=1,   b=0x10)   # spacing kept

def handler(event):
    return {**event, 'ok': True}
";
    let mut doc = Document::parse(source).unwrap();
    let _ = doc.find_sequence("HOSTS").unwrap().len();
    assert_eq!(doc.to_source(), source);
    assert_eq!(doc.to_string(), source);
}

#[test]
fn test_only_edited_binding_is_reprinted() {
    let source = "a = [1,2]  # keep\nb = {'x':1}\n";
    let mut doc = Document::parse(source).unwrap();
    doc.find_mapping("b").unwrap().set("y", 2).unwrap();
    assert_eq!(doc.to_source(), "a = [1,2]  # keep\nb = {'x': 1, 'y': 2}\n");
}

#[test]
fn test_edit_keeps_trailing_comment_and_annotation() {
    let mut doc = Document::parse("apps: list[str] = ['a']  # installed\n").unwrap();
    doc.find_sequence("apps").unwrap().append("b");
    assert_eq!(doc.to_source(), "apps: list[str] = ['a', 'b']  # installed\n");
}

#[test]
fn test_edit_keeps_trailing_semicolon() {
    let mut doc = Document::parse("x = [1];\n").unwrap();
    doc.find_sequence("x").unwrap().append(2);
    assert_eq!(doc.to_source(), "x = [1, 2];\n");
}

#[test]
fn test_edit_keeps_byte_order_mark() {
    let source = "\u{feff}x = [1]\n";
    let mut doc = Document::parse(source).unwrap();
    assert_eq!(doc.to_source(), source);

    doc.find_sequence("x").unwrap().append(2);
    assert_eq!(doc.to_source(), "\u{feff}x = [1, 2]\n");
}

#[test]
fn test_multiline_value_stays_multiline() {
    let source = "CONFIG = {\n    'a': 1,\n    \"b\": [1, 2],\n}\nOTHER = 1\n";
    let mut doc = Document::parse(source).unwrap();
    doc.find_mapping("CONFIG").unwrap().set("c", 3).unwrap();
    assert_eq!(
        doc.to_source(),
        "CONFIG = {\n    'a': 1,\n    \"b\": [1, 2],\n    'c': 3,\n}\nOTHER = 1\n"
    );
}

#[test]
fn test_multiline_call_stays_multiline() {
    let source = "deps = list(\n    'a',\n)\n";
    let mut doc = Document::parse(source).unwrap();
    doc.find_sequence("deps").unwrap().append("b");
    assert_eq!(doc.to_source(), "deps = list(\n    'a',\n    'b',\n)\n");
}

#[test]
fn test_untouched_elements_keep_spelling() {
    let mut doc = Document::parse("xs = [0x10, 1_000, \"dq\", r'\\d', 1e3]\n").unwrap();
    doc.find_sequence("xs").unwrap().append(1e16);
    assert_eq!(
        doc.to_source(),
        "xs = [0x10, 1_000, \"dq\", r'\\d', 1e3, 1e+16]\n"
    );
}

#[test]
fn test_new_strings_use_python_quoting() {
    let mut doc = Document::parse("xs = []\n").unwrap();
    let mut xs = doc.find_sequence("xs").unwrap();
    xs.append("it's");
    xs.append("line\nbreak");
    assert_eq!(doc.to_source(), "xs = [\"it's\", 'line\\nbreak']\n");
}

#[test]
fn test_document_from_str() {
    let doc: Document = "x = {1}\n".parse().unwrap();
    assert_eq!(doc.bindings()[0].kind, Some(ContainerKind::Set));
    assert!("x = {1\n".parse::<Document>().is_err());
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_append_then_pop_returns_value() {
    let values = [
        Value::from("text"),
        Value::Int(-7),
        Value::Float(0.1),
        Value::None,
        Value::from(vec![1, 2]),
        Value::Tuple(vec![Value::Int(1)]),
        Value::set([1, 2]),
        Value::dict([("k", Value::from(vec!["v"]))]),
    ];

    for value in values {
        let mut doc = Document::parse("xs = [0]\n").unwrap();
        let mut xs = doc.find_sequence("xs").unwrap();
        xs.append(value.clone());
        let popped = xs.pop(-1).unwrap();
        assert_eq!(popped.to_value(), Some(value));
    }
}

#[test]
fn test_update_then_get() {
    for mut doc in [literals(), calls()] {
        let mut mapping = doc.find_mapping("my_dict").unwrap();
        mapping.update([("fresh", 1)]).unwrap();
        mapping.update([("fresh", 2)]).unwrap();

        assert_eq!(mapping.len(), 4);
        assert_eq!(mapping.get("fresh").and_then(Expr::to_value), Some(Value::Int(2)));

        let popped = mapping.pop("fresh").unwrap();
        assert_eq!(popped.to_value(), Some(Value::Int(2)));
        let fallback = mapping.get_or("fresh", "gone");
        assert_eq!(fallback.to_value(), Some(Value::from("gone")));
    }
}

#[test]
fn test_reverse_twice_restores_order() {
    let mut doc = literals();
    doc.find_sequence("my_list").unwrap().reverse();
    doc.find_sequence("my_list").unwrap().reverse();
    assert!(doc.to_source().contains("my_list = [1, 2, 3, 'a']\n"));
}

#[test]
fn test_non_constant_elements_never_match() {
    let mut doc = Document::parse("xs = [x, 1 + 1, 2]\n").unwrap();
    let mut xs = doc.find_sequence("xs").unwrap();
    xs.remove(2).unwrap();
    assert!(xs.remove(2).is_err());
    assert_eq!(doc.to_source(), "xs = [x, 1 + 1]\n");
}
