//! # Backward-rule layer
//!
//! - [`capture_state`]: the per-op record written by `capture` and read by `apply`.
//! - [`grad_function`]: the typed [`OpExprGradFunction`] contract and its
//!   object-safe form [`GradFunction`].
//! - [`registry`]: op type to rule factory, with a process-wide instance.
//! - [`node`]: [`GradNode`], which drives one rule through Init, Capture and Apply.
//! - [`rules`]: the built-in rules (`depend` and friends).

pub mod capture_state;
pub mod grad_function;
pub mod node;
pub mod registry;
pub mod rules;

pub use capture_state::{AnyCaptureState, BoxedCaptureState, CaptureState};
pub use grad_function::{
    check_arity, check_capture_arity, check_op_arity, ErasedGradFunction, GradFunction,
    InputGrads, OpExprGradFunction,
};
pub use node::{GradNode, NodeState};
pub use registry::{
    freeze_global_registry, global_registry, is_registered, lookup_grad_function,
    register_grad_function, register_op_expr_grad_function, registered_op_types,
    GradFunctionFactory, GradFunctionRegistry,
};
