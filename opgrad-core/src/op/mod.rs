//! Op identifiers and op expressions.
//!
//! An [`OpType`] names a forward primitive (`"depend"`, `"mul"`, ...). An
//! [`OpExpr`] is one instantiation of that primitive in a graph: its declared
//! arity plus an immutable [`AttrMap`].

mod attr;

pub use attr::{AttrMap, AttrValue};

use std::borrow::{Borrow, Cow};
use std::fmt;

/// Immutable identifier of a forward primitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpType(Cow<'static, str>);

impl OpType {
    /// Usable in `const` position for built-in op types.
    pub const fn from_static(name: &'static str) -> Self {
        OpType(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        OpType(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for OpType {
    fn from(name: &'static str) -> Self {
        OpType::from_static(name)
    }
}

impl From<String> for OpType {
    fn from(name: String) -> Self {
        OpType::new(name)
    }
}

impl Borrow<str> for OpType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One op invocation site in the forward graph.
#[derive(Debug, Clone, PartialEq)]
pub struct OpExpr {
    op_type: OpType,
    num_inputs: usize,
    num_outputs: usize,
    attrs: AttrMap,
}

impl OpExpr {
    pub fn new(op_type: impl Into<OpType>, num_inputs: usize, num_outputs: usize) -> Self {
        OpExpr {
            op_type: op_type.into(),
            num_inputs,
            num_outputs,
            attrs: AttrMap::default(),
        }
    }

    pub fn with_attrs(mut self, attrs: AttrMap) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn op_type(&self) -> &OpType {
        &self.op_type
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    pub fn attrs(&self) -> &AttrMap {
        &self.attrs
    }
}
