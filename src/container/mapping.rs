use regex::Regex;

use crate::{
    ast::{DictItem, Expr, Keyword, Scalar},
    container::{
        EditError,
        elements::constant_matches,
    },
    convert::value_to_expr,
    locator::Representation,
    parser::is_keyword,
    value::Value,
};

const IDENTIFIER_PATTERN: &str = r"^[\p{XID_Start}_]\p{XID_Continue}*$";

/// Mutation contract of a dict.
pub trait MappingOps {
    /// Value node of the first entry whose key is a constant equal to `key`.
    fn get(&self, key: impl Into<Value>) -> Option<&Expr>;

    /// Like [`get`](MappingOps::get), falling back to `default`.
    fn get_or(&self, key: impl Into<Value>, default: impl Into<Value>) -> Expr {
        match self.get(key) {
            Some(value) => value.clone(),
            None => value_to_expr(&default.into()),
        }
    }

    /// Replace the value of an existing key in place, or append a new entry.
    fn set(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<(), EditError>;

    /// [`set`](MappingOps::set) for each pair in order.
    fn update<I, K, V>(&mut self, entries: I) -> Result<(), EditError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove an entry and return its value node. A missing key is not an error.
    fn pop(&mut self, key: impl Into<Value>) -> Option<Expr>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_key(&self, key: impl Into<Value>) -> bool {
        self.get(key).is_some()
    }

    /// Key nodes in order; `**` entries are skipped.
    fn keys(&self) -> Vec<Expr>;
}

/// `{'key': value}`
#[derive(Debug)]
pub struct LiteralMapping<'a> {
    items: &'a mut Vec<DictItem>,
    edited: &'a mut bool,
}

impl<'a> LiteralMapping<'a> {
    pub fn new(items: &'a mut Vec<DictItem>, edited: &'a mut bool) -> Self {
        LiteralMapping { items, edited }
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.items.iter().position(|item| {
            item.key
                .as_ref()
                .is_some_and(|k| constant_matches(k, key))
        })
    }
}

impl MappingOps for LiteralMapping<'_> {
    fn get(&self, key: impl Into<Value>) -> Option<&Expr> {
        let position = self.position(&key.into())?;
        Some(&self.items[position].value)
    }

    fn set(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<(), EditError> {
        let key = key.into();
        if !key.is_hashable() {
            return Err(EditError::UnhashableKey(key.to_string()));
        }
        let value = value_to_expr(&value.into());

        match self.position(&key) {
            Some(position) => self.items[position].value = value,
            None => self.items.push(DictItem {
                key: Some(value_to_expr(&key)),
                value,
            }),
        }
        *self.edited = true;
        Ok(())
    }

    fn pop(&mut self, key: impl Into<Value>) -> Option<Expr> {
        let position = self.position(&key.into())?;
        *self.edited = true;
        Some(self.items.remove(position).value)
    }

    fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            *self.edited = true;
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn keys(&self) -> Vec<Expr> {
        self.items.iter().filter_map(|item| item.key.clone()).collect()
    }
}

/// `dict(key=value)`
///
/// Keyword arguments are the entries. Positional arguments and `**kwargs`
/// are kept as written and never match a key; only `clear` drops them.
#[derive(Debug)]
pub struct CallMapping<'a> {
    args: &'a mut Vec<Expr>,
    keywords: &'a mut Vec<Keyword>,
    edited: &'a mut bool,
}

impl<'a> CallMapping<'a> {
    pub fn new(
        args: &'a mut Vec<Expr>,
        keywords: &'a mut Vec<Keyword>,
        edited: &'a mut bool,
    ) -> Self {
        CallMapping {
            args,
            keywords,
            edited,
        }
    }

    fn position(&self, key: &Value) -> Option<usize> {
        let Value::Str(name) = key else {
            return None;
        };
        self.keywords
            .iter()
            .position(|keyword| keyword.arg.as_deref() == Some(name.as_str()))
    }
}

/// The keyword argument name for `key`, if it can be one.
fn keyword_name(key: &Value) -> Result<&str, EditError> {
    let invalid = || EditError::InvalidKeyword(key.to_string());

    let Value::Str(name) = key else {
        return Err(invalid());
    };
    let re = Regex::new(IDENTIFIER_PATTERN)
        .map_err(|e| EditError::InvalidKeyword(format!("{}: {e}", key)))?;
    if !re.is_match(name) || is_keyword(name) {
        return Err(invalid());
    }
    Ok(name)
}

impl MappingOps for CallMapping<'_> {
    fn get(&self, key: impl Into<Value>) -> Option<&Expr> {
        let position = self.position(&key.into())?;
        Some(&self.keywords[position].value)
    }

    fn set(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<(), EditError> {
        let key = key.into();
        let value = value_to_expr(&value.into());

        match self.position(&key) {
            Some(position) => self.keywords[position].value = value,
            None => {
                let arg = keyword_name(&key)?.to_string();
                self.keywords.push(Keyword {
                    arg: Some(arg),
                    value,
                });
            }
        }
        *self.edited = true;
        Ok(())
    }

    fn pop(&mut self, key: impl Into<Value>) -> Option<Expr> {
        let position = self.position(&key.into())?;
        *self.edited = true;
        Some(self.keywords.remove(position).value)
    }

    fn clear(&mut self) {
        if !self.args.is_empty() || !self.keywords.is_empty() {
            self.args.clear();
            self.keywords.clear();
            *self.edited = true;
        }
    }

    fn len(&self) -> usize {
        self.keywords.len()
    }

    fn keys(&self) -> Vec<Expr> {
        self.keywords
            .iter()
            .filter_map(|keyword| keyword.arg.clone())
            .map(|arg| Expr::constant(Scalar::Str(arg)))
            .collect()
    }
}

/// A mapping handle of either representation.
#[derive(Debug)]
pub enum Mapping<'a> {
    Literal(LiteralMapping<'a>),
    Call(CallMapping<'a>),
}

impl Mapping<'_> {
    pub fn representation(&self) -> Representation {
        match self {
            Mapping::Literal(_) => Representation::Literal,
            Mapping::Call(_) => Representation::Call,
        }
    }
}

impl MappingOps for Mapping<'_> {
    fn get(&self, key: impl Into<Value>) -> Option<&Expr> {
        match self {
            Mapping::Literal(m) => m.get(key),
            Mapping::Call(m) => m.get(key),
        }
    }

    fn set(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<(), EditError> {
        match self {
            Mapping::Literal(m) => m.set(key, value),
            Mapping::Call(m) => m.set(key, value),
        }
    }

    fn pop(&mut self, key: impl Into<Value>) -> Option<Expr> {
        match self {
            Mapping::Literal(m) => m.pop(key),
            Mapping::Call(m) => m.pop(key),
        }
    }

    fn clear(&mut self) {
        match self {
            Mapping::Literal(m) => m.clear(),
            Mapping::Call(m) => m.clear(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Mapping::Literal(m) => m.len(),
            Mapping::Call(m) => m.len(),
        }
    }

    fn keys(&self) -> Vec<Expr> {
        match self {
            Mapping::Literal(m) => m.keys(),
            Mapping::Call(m) => m.keys(),
        }
    }
}

#[test]
fn test_literal_mapping_keys_compare_by_value() {
    let mut items = vec![DictItem {
        key: Some(Expr::constant(Scalar::Int(1))),
        value: Expr::constant(Scalar::Str("one".into())),
    }];
    let mut edited = false;
    let mut mapping = LiteralMapping::new(&mut items, &mut edited);

    assert!(mapping.get(1.0).is_some());
    assert!(mapping.get(true).is_some());
    assert!(mapping.get("1").is_none());
    mapping.set(1.0, "uno").unwrap();
    assert_eq!(mapping.len(), 1);
    assert!(edited);
}

#[test]
fn test_literal_mapping_tuple_keys() {
    let mut items = vec![DictItem {
        key: Some(Expr::Tuple(vec![
            Expr::constant(Scalar::Int(1)),
            Expr::constant(Scalar::Int(2)),
        ])),
        value: Expr::constant(Scalar::Str("a".into())),
    }];
    let mut edited = false;
    let mut mapping = LiteralMapping::new(&mut items, &mut edited);
    let key = Value::Tuple(vec![1.into(), 2.into()]);

    assert!(mapping.get(key.clone()).is_some());
    assert!(mapping.get(Value::Tuple(vec![1.into()])).is_none());
    mapping.set(key, "b").unwrap();
    assert_eq!(mapping.len(), 1);
    assert_eq!(
        mapping.set(vec![Value::from(1)], "c"),
        Err(EditError::UnhashableKey("[1]".to_string()))
    );
    assert_eq!(mapping.len(), 1);
}

#[test]
fn test_call_mapping_rejects_bad_keywords() {
    let mut args = Vec::new();
    let mut keywords = Vec::new();
    let mut edited = false;
    let mut mapping = CallMapping::new(&mut args, &mut keywords, &mut edited);

    assert!(mapping.set("valid_name", 1).is_ok());
    assert_eq!(
        mapping.set("not valid", 1),
        Err(EditError::InvalidKeyword("'not valid'".to_string()))
    );
    assert!(matches!(mapping.set("class", 1), Err(EditError::InvalidKeyword(_))));
    assert!(matches!(mapping.set(3, 1), Err(EditError::InvalidKeyword(_))));
    assert_eq!(mapping.len(), 1);
    assert!(mapping.get(3).is_none());
}
