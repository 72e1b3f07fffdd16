use crate::scalar::Scalar;
use crate::types::DType;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Value of a single op attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Ints(Vec<i64>),
    Shape(Vec<usize>),
    DType(DType),
}

impl AttrValue {
    /// Name of the variant, used in schema error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::Str(_) => "string",
            AttrValue::Ints(_) => "int list",
            AttrValue::Shape(_) => "shape",
            AttrValue::DType(_) => "dtype",
        }
    }

    /// Numeric attributes as a [`Scalar`]. Bools are not treated as numbers.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match *self {
            AttrValue::Int(v) => Some(Scalar::Int(v)),
            AttrValue::Float(v) => Some(Scalar::Float(v)),
            _ => None,
        }
    }

    pub fn as_shape(&self) -> Option<&[usize]> {
        match self {
            AttrValue::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_dtype(&self) -> Option<DType> {
        match self {
            AttrValue::DType(dtype) => Some(*dtype),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<DType> for AttrValue {
    fn from(v: DType) -> Self {
        AttrValue::DType(v)
    }
}

/// Immutable key/value map of op configuration.
///
/// Cloning shares the underlying map, so an `AttrMap` can be handed to every
/// capture of the same op expression without copying.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrMap {
    entries: Arc<BTreeMap<String, AttrValue>>,
}

impl AttrMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for AttrMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        AttrMap {
            entries: Arc::new(entries),
        }
    }
}
