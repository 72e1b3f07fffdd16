use crate::device::StorageDevice;
use crate::op::OpType;
use crate::types::DType;
use std::fmt;
use thiserror::Error;

/// Which tensor list an arity check was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArityKind {
    /// Forward inputs seen by `capture` (or declared by the op expression at `init`).
    Inputs,
    /// Forward outputs seen by `capture` (or declared by the op expression at `init`).
    Outputs,
    /// Output gradients handed to `apply`.
    OutputGrads,
}

impl fmt::Display for ArityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArityKind::Inputs => "inputs",
            ArityKind::Outputs => "outputs",
            ArityKind::OutputGrads => "output gradients",
        };
        f.write_str(name)
    }
}

/// Error type for gradient rules, the rule registry and the reference tensor runtime.
#[derive(Error, Debug, PartialEq, Clone)] // PartialEq for easier testing
pub enum OpGradError {
    #[error("Arity mismatch for op '{op_type}': expected {expected} {kind}, got {actual}")]
    ArityMismatch {
        op_type: OpType,
        kind: ArityKind,
        expected: usize,
        actual: usize,
    },

    #[error("No gradient function registered for op '{op_type}'")]
    UnregisteredOp { op_type: OpType },

    #[error("Invalid attribute '{attr}' for op '{op_type}': {reason}")]
    InvalidAttrSchema {
        op_type: OpType,
        attr: String,
        reason: String,
    },

    #[error("A gradient function is already registered for op '{op_type}'")]
    DuplicateRegistration { op_type: OpType },

    #[error("Gradient function registry is frozen; cannot register op '{op_type}'")]
    RegistryFrozen { op_type: OpType },

    #[error("Op '{op_type}' has an input that requires grad, but no gradient function is registered for it")]
    GradientRequired { op_type: OpType },

    #[error("Cannot {operation} node for op '{op_type}' while it is {state}")]
    InvalidState {
        op_type: OpType,
        state: String,
        operation: String,
    },

    #[error("Capture state handed to op '{op_type}' was produced by a different gradient function")]
    StateTypeMismatch { op_type: OpType },

    #[error("Gradient function for op '{op_type}' returned {actual} input gradient slots, expected {expected}")]
    InvalidGradientSlots {
        op_type: OpType,
        expected: usize,
        actual: usize,
    },

    #[error("Gradient function for op '{op_type}' produced a gradient for input {index}, which does not require grad")]
    UnexpectedGradient { op_type: OpType, index: usize },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Data type mismatch for operation '{operation}': expected {expected:?}, got {actual:?}")]
    DataTypeMismatch {
        expected: DType,
        actual: DType,
        operation: String,
    },

    #[error("Device mismatch for operation '{operation}': expected {expected:?}, got {actual:?}")]
    DeviceMismatch {
        expected: StorageDevice,
        actual: StorageDevice,
        operation: String,
    },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl OpGradError {
    /// Returns the op type the error is attributed to, if any.
    pub fn op_type(&self) -> Option<&OpType> {
        match self {
            OpGradError::ArityMismatch { op_type, .. }
            | OpGradError::UnregisteredOp { op_type }
            | OpGradError::InvalidAttrSchema { op_type, .. }
            | OpGradError::DuplicateRegistration { op_type }
            | OpGradError::RegistryFrozen { op_type }
            | OpGradError::GradientRequired { op_type }
            | OpGradError::InvalidState { op_type, .. }
            | OpGradError::StateTypeMismatch { op_type }
            | OpGradError::InvalidGradientSlots { op_type, .. }
            | OpGradError::UnexpectedGradient { op_type, .. } => Some(op_type),
            _ => None,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, OpGradError>;
