use crate::buffer::Buffer;
use crate::device::StorageDevice;
use crate::error::OpGradError;
use crate::scalar::Scalar;
use crate::tensor::Tensor;
use crate::types::DType;

/// Creates a tensor of `shape` where every element is `value`, converted to `dtype`,
/// placed on `device`.
///
/// Order-only dependency rules use this to synthesize zero gradients without
/// touching the values of the tensor they depend on.
///
/// # Errors
/// `UnsupportedOperation` if `value` cannot be represented in `dtype`.
pub fn constant(
    shape: &[usize],
    value: Scalar,
    dtype: DType,
    device: StorageDevice,
) -> Result<Tensor, OpGradError> {
    let numel = shape.iter().product();
    let buffer = Buffer::filled(dtype, numel, value)?;
    Tensor::from_buffer(buffer, shape.to_vec(), device)
}

/// Zeros with the same shape, dtype and device as `tensor`.
pub fn zeros_like(tensor: &Tensor) -> Result<Tensor, OpGradError> {
    constant(&tensor.shape(), Scalar::Int(0), tensor.dtype(), tensor.device())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_f64_on_gpu() {
        let t = constant(&[2, 3], Scalar::Float(0.5), DType::F64, StorageDevice::GPU(0)).unwrap();
        assert_eq!(t.shape(), vec![2, 3]);
        assert_eq!(t.dtype(), DType::F64);
        assert_eq!(t.device(), StorageDevice::GPU(0));
        assert!(!t.requires_grad());
        assert_eq!(t.get_f64_data().unwrap(), vec![0.5; 6]);
    }

    #[test]
    fn test_constant_scalar_shape() {
        let t = constant(&[], Scalar::Int(0), DType::F32, StorageDevice::CPU).unwrap();
        assert_eq!(t.numel(), 1);
        assert_eq!(t.get_f32_data().unwrap(), vec![0.0]);
    }

    #[test]
    fn test_zeros_like_keeps_metadata() {
        let src = Tensor::new_i64(vec![4, 5, 6], vec![3])
            .unwrap()
            .to_device(StorageDevice::GPU(2))
            .unwrap();
        let z = zeros_like(&src).unwrap();
        assert_eq!(z.shape(), vec![3]);
        assert_eq!(z.dtype(), DType::I64);
        assert_eq!(z.device(), StorageDevice::GPU(2));
        assert_eq!(z.get_i64_data().unwrap(), vec![0, 0, 0]);
    }
}
