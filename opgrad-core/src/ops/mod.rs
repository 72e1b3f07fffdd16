//! # Runtime primitives (`ops`)
//!
//! The small set of tensor functions that gradient rules call from `apply`.
//! They stand in for the functional API of a full tensor runtime:
//!
//! - [`fill`]: `constant` (MakeConstant) and `zeros_like`.
//! - [`arithmetic`]: element-wise `mul` and `mul_scalar`.
//! - [`view`]: `reshape`, sharing the element buffer.
//! - [`dtype`]: `cast`.
//!
//! Every function returns a fresh tensor with `requires_grad == false`;
//! gradients produced by rules are never themselves tracked.

pub mod arithmetic;
pub mod dtype;
pub mod fill;
pub mod view;

pub use arithmetic::{mul, mul_scalar};
pub use dtype::cast;
pub use fill::{constant, zeros_like};
pub use view::reshape;
