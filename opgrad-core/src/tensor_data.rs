use std::sync::Arc;

use crate::buffer::Buffer;
use crate::device::StorageDevice;
use crate::error::OpGradError;
use crate::types::DType;

/// Internal storage and metadata for a Tensor.
///
/// Wrapped in `Arc<RwLock<TensorData>>` by `Tensor` so that handles are cheap
/// to clone and `requires_grad` can be toggled through a shared handle.
/// Elements are always laid out contiguously in row-major order.
#[derive(Debug)]
pub struct TensorData {
    /// Shared element storage. Views such as `reshape` reuse the same `Arc`.
    pub(crate) buffer: Arc<Buffer>,
    pub(crate) device: StorageDevice,
    pub(crate) dtype: DType,
    pub(crate) shape: Vec<usize>,
    /// Whether gradient computation is needed for this tensor.
    pub(crate) requires_grad: bool,
}

impl TensorData {
    /// Creates tensor metadata over `buffer`.
    ///
    /// # Errors
    /// Returns `OpGradError::TensorCreationError` if the buffer length does not
    /// match the number of elements implied by `shape`.
    pub fn new(
        buffer: Arc<Buffer>,
        shape: Vec<usize>,
        device: StorageDevice,
    ) -> Result<Self, OpGradError> {
        let numel: usize = shape.iter().product();
        let data_len = buffer.len();
        if data_len != numel {
            return Err(OpGradError::TensorCreationError { data_len, shape });
        }
        Ok(TensorData {
            dtype: buffer.dtype(),
            buffer,
            device,
            shape,
            requires_grad: false,
        })
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}
