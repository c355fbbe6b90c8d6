//! Emitted record types: keys, values and rows.

use crate::streaming::parsing::{classify_number, NumberLiteral};
use std::fmt;
use std::sync::Arc;

/// A mapping key taken from the resolved header.
///
/// Symbol keys are interned once per session and shared by every row, text
/// keys are plain owned strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Symbol(Arc<str>),
    Text(String),
}

impl Key {
    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            Key::Symbol(s) => s,
            Key::Text(s) => s,
        }
    }

    /// Returns true if this key is an interned symbol.
    #[inline]
    pub fn is_symbol(&self) -> bool {
        matches!(self, Key::Symbol(_))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// A single field value after the transform pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Position missing from a short data row.
    Null,
    Text(String),
    Int(i64),
    Float(f64),
}

impl Value {
    /// Convert a text value holding an integer or decimal literal into a number.
    ///
    /// `[+-]digits.digits` becomes a float and `[+-]digits` an integer. Any other
    /// value, including an already numeric one, is returned unchanged. Integer
    /// literals that do not fit an `i64` stay text.
    pub fn coerce_numeric(self) -> Value {
        let Value::Text(text) = self else {
            return self;
        };
        match classify_number(&text) {
            Some(NumberLiteral::Decimal) => match text.parse::<f64>() {
                Ok(f) => Value::Float(f),
                Err(_) => Value::Text(text),
            },
            Some(NumberLiteral::Integer) => match text.parse::<i64>() {
                Ok(n) => Value::Int(n),
                Err(_) => Value::Text(text),
            },
            None => Value::Text(text),
        }
    }

    /// Returns the text if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

/// One emitted record.
///
/// The shape is fixed once the row leaves the pipeline: values sit in boxed
/// slices and are only reachable through shared references.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Values by position, used when rows are parsed to arrays.
    Positional(Box<[Value]>),
    /// Key/value pairs in header order.
    Mapping(Box<[(Key, Value)]>),
}

impl Row {
    /// Look up a value by key. Always `None` for positional rows.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Row::Mapping(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Row::Positional(_) => None,
        }
    }

    /// Look up a value by position (in emission order for mapping rows).
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Row::Positional(values) => values.get(index),
            Row::Mapping(pairs) => pairs.get(index).map(|(_, v)| v),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Row::Positional(values) => values.len(),
            Row::Mapping(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Row::Mapping(_))
    }

    /// Iterate keys of a mapping row. Empty for positional rows.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        let pairs: &[(Key, Value)] = match self {
            Row::Mapping(pairs) => pairs,
            Row::Positional(_) => &[],
        };
        pairs.iter().map(|(k, _)| k)
    }

    /// Iterate values in emission order.
    pub fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Row::Positional(values) => Box::new(values.iter()),
            Row::Mapping(pairs) => Box::new(pairs.iter().map(|(_, v)| v)),
        }
    }
}
