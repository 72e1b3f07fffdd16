// src/tensor/mod.rs

use crate::buffer::Buffer;
use crate::device::StorageDevice;
use crate::error::OpGradError;
use crate::tensor_data::TensorData;
use crate::types::DType;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod create;
mod debug;

// Re-export creation functions to make them public
pub use create::{from_vec_f32, from_vec_f64, from_vec_i64, full, ones, zeros};

/// Handle to a tensor of the reference runtime.
///
/// `Tensor` uses `Arc<RwLock<TensorData>>` internally:
/// 1.  **Shared Ownership:** cloning a `Tensor` clones the handle, not the elements.
///     Capture states that save a tensor therefore extend its lifetime, which is
///     why rules save as little as possible.
/// 2.  **Interior Mutability:** `requires_grad` can be set through a shared handle.
///
/// Gradient rules only rely on `requires_grad()`, `shape()`, `dtype()` and
/// `device()`; everything else exists so that tests can inspect values.
pub struct Tensor {
    pub(crate) data: Arc<RwLock<TensorData>>,
}

impl Tensor {
    /// Creates a new CPU tensor from f32 data and a shape.
    pub fn new(data_vec: Vec<f32>, shape: Vec<usize>) -> Result<Self, OpGradError> {
        Self::from_buffer(Buffer::F32(Arc::new(data_vec)), shape, StorageDevice::CPU)
    }

    /// Creates a new CPU tensor from f64 data and a shape.
    pub fn new_f64(data_vec: Vec<f64>, shape: Vec<usize>) -> Result<Self, OpGradError> {
        Self::from_buffer(Buffer::F64(Arc::new(data_vec)), shape, StorageDevice::CPU)
    }

    /// Creates a new CPU tensor from i64 data and a shape.
    pub fn new_i64(data_vec: Vec<i64>, shape: Vec<usize>) -> Result<Self, OpGradError> {
        Self::from_buffer(Buffer::I64(Arc::new(data_vec)), shape, StorageDevice::CPU)
    }

    pub(crate) fn from_buffer(
        buffer: Buffer,
        shape: Vec<usize>,
        device: StorageDevice,
    ) -> Result<Self, OpGradError> {
        Self::from_shared_buffer(Arc::new(buffer), shape, device)
    }

    pub(crate) fn from_shared_buffer(
        buffer: Arc<Buffer>,
        shape: Vec<usize>,
        device: StorageDevice,
    ) -> Result<Self, OpGradError> {
        let tensor_data = TensorData::new(buffer, shape, device)?;
        Ok(Tensor {
            data: Arc::new(RwLock::new(tensor_data)),
        })
    }

    /// Acquires a read lock on the tensor's data, recovering from poisoning.
    pub fn read_data(&self) -> RwLockReadGuard<'_, TensorData> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("RwLock for tensor data was poisoned. Recovering read guard.");
                poisoned.into_inner()
            }
        }
    }

    /// Acquires a write lock on the tensor's data, recovering from poisoning.
    pub fn write_data(&self) -> RwLockWriteGuard<'_, TensorData> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("RwLock for tensor data was poisoned. Recovering write guard.");
                poisoned.into_inner()
            }
        }
    }

    /// Checks if the tensor requires gradient computation.
    pub fn requires_grad(&self) -> bool {
        self.read_data().requires_grad
    }

    /// Sets the `requires_grad` flag **in-place**.
    ///
    /// Only floating-point tensors can require gradients.
    pub fn requires_grad_(&self, requires_grad: bool) -> Result<(), OpGradError> {
        let mut guard = self.write_data();
        if requires_grad && !guard.dtype.is_floating_point() {
            return Err(OpGradError::UnsupportedOperation(format!(
                "only floating point tensors can require gradients, got {:?}",
                guard.dtype
            )));
        }
        guard.requires_grad = requires_grad;
        Ok(())
    }

    /// Builder-style variant of [`Tensor::requires_grad_`].
    pub fn with_requires_grad(self, requires_grad: bool) -> Result<Self, OpGradError> {
        self.requires_grad_(requires_grad)?;
        Ok(self)
    }

    /// Returns a clone of the tensor's shape.
    pub fn shape(&self) -> Vec<usize> {
        self.read_data().shape.clone()
    }

    /// Returns the data type (`DType`) of the tensor elements.
    pub fn dtype(&self) -> DType {
        self.read_data().dtype
    }

    /// Returns the device (`StorageDevice`) where the tensor's data resides.
    pub fn device(&self) -> StorageDevice {
        self.read_data().device
    }

    pub fn rank(&self) -> usize {
        self.read_data().shape.len()
    }

    pub fn numel(&self) -> usize {
        self.read_data().numel()
    }

    /// Returns the shared element buffer.
    pub fn buffer(&self) -> Arc<Buffer> {
        Arc::clone(&self.read_data().buffer)
    }

    /// New handle over the same elements, placed on `device` and detached from autograd.
    pub fn to_device(&self, device: StorageDevice) -> Result<Tensor, OpGradError> {
        let guard = self.read_data();
        Tensor::from_shared_buffer(Arc::clone(&guard.buffer), guard.shape.clone(), device)
    }

    /// New handle sharing the elements, with `requires_grad == false`.
    pub fn detach(&self) -> Tensor {
        let guard = self.read_data();
        Tensor {
            data: Arc::new(RwLock::new(TensorData {
                buffer: Arc::clone(&guard.buffer),
                device: guard.device,
                dtype: guard.dtype,
                shape: guard.shape.clone(),
                requires_grad: false,
            })),
        }
    }

    /// Whether both handles point to the same tensor.
    pub fn ptr_eq(&self, other: &Tensor) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Same shape, dtype, device and bit-identical elements.
    pub fn bitwise_eq(&self, other: &Tensor) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let a = self.read_data();
        let b = other.read_data();
        a.shape == b.shape && a.dtype == b.dtype && a.device == b.device && a.buffer.bits_eq(&b.buffer)
    }

    /// Copies the elements out as `Vec<f32>`. Fails for any other dtype.
    pub fn get_f32_data(&self) -> Result<Vec<f32>, OpGradError> {
        Ok(self.read_data().buffer.try_get_f32()?.to_vec())
    }

    /// Copies the elements out as `Vec<f64>`. Fails for any other dtype.
    pub fn get_f64_data(&self) -> Result<Vec<f64>, OpGradError> {
        Ok(self.read_data().buffer.try_get_f64()?.to_vec())
    }

    /// Copies the elements out as `Vec<i64>`. Fails for any other dtype.
    pub fn get_i64_data(&self) -> Result<Vec<i64>, OpGradError> {
        Ok(self.read_data().buffer.try_get_i64()?.to_vec())
    }
}

impl Clone for Tensor {
    fn clone(&self) -> Self {
        Tensor {
            data: Arc::clone(&self.data), // Clone the Arc, not the TensorData
        }
    }
}
