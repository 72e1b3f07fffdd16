use crate::error::OpGradError;
use crate::tensor::Tensor;
use crate::types::DType;
use std::sync::Arc;

/// Converts `tensor` to `dtype`. Casting to the current dtype shares the buffer.
pub fn cast(tensor: &Tensor, dtype: DType) -> Result<Tensor, OpGradError> {
    let guard = tensor.read_data();
    if guard.dtype == dtype {
        return Tensor::from_shared_buffer(Arc::clone(&guard.buffer), guard.shape.clone(), guard.device);
    }
    let buffer = guard.buffer.cast(dtype)?;
    Tensor::from_buffer(buffer, guard.shape.clone(), guard.device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::StorageDevice;

    #[test]
    fn test_cast_f32_to_f64_keeps_device() {
        let t = Tensor::new(vec![1.5, -2.0], vec![2])
            .unwrap()
            .to_device(StorageDevice::GPU(0))
            .unwrap();
        let c = cast(&t, DType::F64).unwrap();
        assert_eq!(c.dtype(), DType::F64);
        assert_eq!(c.device(), StorageDevice::GPU(0));
        assert_eq!(c.get_f64_data().unwrap(), vec![1.5, -2.0]);
    }

    #[test]
    fn test_cast_same_dtype_is_new_handle() {
        let t = Tensor::new(vec![1.0], vec![1]).unwrap().with_requires_grad(true).unwrap();
        let c = cast(&t, DType::F32).unwrap();
        assert!(!c.ptr_eq(&t));
        assert!(!c.requires_grad());
        assert!(c.bitwise_eq(&t));
    }
}
