use crate::error::OpGradError;
use crate::tensor::Tensor;
use std::sync::Arc;

/// Returns a tensor with the same elements and a new shape.
///
/// The result shares `tensor`'s buffer. Fails with `ShapeMismatch` when the
/// element counts differ.
pub fn reshape(tensor: &Tensor, new_shape: &[usize]) -> Result<Tensor, OpGradError> {
    let guard = tensor.read_data();
    let new_numel: usize = new_shape.iter().product();
    if new_numel != guard.numel() {
        return Err(OpGradError::ShapeMismatch {
            expected: guard.shape.clone(),
            actual: new_shape.to_vec(),
            operation: format!("reshape ({} elements into {})", guard.numel(), new_numel),
        });
    }
    Tensor::from_shared_buffer(Arc::clone(&guard.buffer), new_shape.to_vec(), guard.device)
}
