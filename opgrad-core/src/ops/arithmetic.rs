use crate::buffer::Buffer;
use crate::error::OpGradError;
use crate::scalar::Scalar;
use crate::tensor::Tensor;
use num_traits::CheckedMul;
use std::fmt::Debug;
use std::ops::Mul;
use std::sync::Arc;

/// Element-wise product of two tensors with identical shape, dtype and device.
///
/// No broadcasting: gradient rules always multiply tensors whose shapes were
/// already checked in the forward pass.
pub fn mul(a: &Tensor, b: &Tensor) -> Result<Tensor, OpGradError> {
    // Locks are taken one at a time so that `mul(x, x)` does not re-enter the same RwLock.
    let (a_shape, a_dtype, a_device, a_buffer) = (a.shape(), a.dtype(), a.device(), a.buffer());
    let (b_shape, b_dtype, b_device, b_buffer) = (b.shape(), b.dtype(), b.device(), b.buffer());

    if a_shape != b_shape {
        return Err(OpGradError::ShapeMismatch {
            expected: a_shape,
            actual: b_shape,
            operation: "mul".to_string(),
        });
    }
    if a_dtype != b_dtype {
        return Err(OpGradError::DataTypeMismatch {
            expected: a_dtype,
            actual: b_dtype,
            operation: "mul".to_string(),
        });
    }
    if a_device != b_device {
        return Err(OpGradError::DeviceMismatch {
            expected: a_device,
            actual: b_device,
            operation: "mul".to_string(),
        });
    }

    let buffer = match (&*a_buffer, &*b_buffer) {
        (Buffer::F32(x), Buffer::F32(y)) => Buffer::F32(Arc::new(mul_kernel(x, y))),
        (Buffer::F64(x), Buffer::F64(y)) => Buffer::F64(Arc::new(mul_kernel(x, y))),
        (Buffer::I32(x), Buffer::I32(y)) => Buffer::I32(Arc::new(checked_mul_kernel(x, y, "mul")?)),
        (Buffer::I64(x), Buffer::I64(y)) => Buffer::I64(Arc::new(checked_mul_kernel(x, y, "mul")?)),
        _ => {
            return Err(OpGradError::UnsupportedOperation(format!(
                "mul is not defined for {:?} tensors",
                a_dtype
            )))
        }
    };
    Tensor::from_buffer(buffer, a_shape, a_device)
}

/// Multiplies every element of `a` by `scalar`, keeping `a`'s dtype.
pub fn mul_scalar(a: &Tensor, scalar: Scalar) -> Result<Tensor, OpGradError> {
    let guard = a.read_data();
    let not_representable = || {
        OpGradError::UnsupportedOperation(format!(
            "mul_scalar: {} is not representable as {:?}",
            scalar, guard.dtype
        ))
    };
    if let Scalar::Float(v) = scalar {
        if !guard.dtype.is_floating_point() && v.fract() != 0.0 {
            return Err(not_representable());
        }
    }

    let buffer = match &*guard.buffer {
        Buffer::F32(x) => {
            let s: f32 = scalar.to_num().ok_or_else(not_representable)?;
            Buffer::F32(Arc::new(x.iter().map(|&v| v * s).collect()))
        }
        Buffer::F64(x) => {
            let s: f64 = scalar.to_num().ok_or_else(not_representable)?;
            Buffer::F64(Arc::new(x.iter().map(|&v| v * s).collect()))
        }
        Buffer::I32(x) => {
            let s: i32 = scalar.to_num().ok_or_else(not_representable)?;
            Buffer::I32(Arc::new(checked_scale_kernel(x, s)?))
        }
        Buffer::I64(x) => {
            let s: i64 = scalar.to_num().ok_or_else(not_representable)?;
            Buffer::I64(Arc::new(checked_scale_kernel(x, s)?))
        }
        Buffer::Bool(_) => {
            return Err(OpGradError::UnsupportedOperation(
                "mul_scalar is not defined for Bool tensors".to_string(),
            ))
        }
    };
    Tensor::from_buffer(buffer, guard.shape.clone(), guard.device)
}

fn mul_kernel<T: Mul<Output = T> + Copy>(a: &[T], b: &[T]) -> Vec<T> {
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).collect()
}

/// Integer product that fails instead of wrapping.
fn checked_mul_kernel<T: CheckedMul + Copy + Debug>(
    a: &[T],
    b: &[T],
    operation: &str,
) -> Result<Vec<T>, OpGradError> {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            x.checked_mul(y).ok_or_else(|| {
                OpGradError::UnsupportedOperation(format!(
                    "{}: {:?} * {:?} overflows",
                    operation, x, y
                ))
            })
        })
        .collect()
}

fn checked_scale_kernel<T: CheckedMul + Copy + Debug>(x: &[T], s: T) -> Result<Vec<T>, OpGradError> {
    x.iter()
        .map(|v| {
            v.checked_mul(&s).ok_or_else(|| {
                OpGradError::UnsupportedOperation(format!(
                    "mul_scalar: {:?} * {:?} overflows",
                    v, s
                ))
            })
        })
        .collect()
}
