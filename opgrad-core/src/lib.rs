//! Backward-rule registry and Capture/Apply protocol of a reverse-mode autodiff engine.
//!
//! Gradient rules live in [`autograd`]; the small tensor runtime they run
//! against lives in [`tensor`] and [`ops`].

pub mod autograd;
pub mod buffer;
pub mod device;
pub mod error;
pub mod op;
pub mod ops;
pub mod scalar;
pub mod tensor;
pub mod tensor_data;
pub mod types;

#[cfg(test)]
pub(crate) mod utils;

pub use autograd::{
    global_registry, lookup_grad_function, register_op_expr_grad_function, GradFunction,
    GradFunctionRegistry, GradNode, NodeState, OpExprGradFunction,
};
pub use device::StorageDevice;
pub use error::{OpGradError, Result};
pub use op::{AttrMap, AttrValue, OpExpr, OpType};
pub use scalar::Scalar;
pub use tensor::Tensor;
pub use types::DType;
