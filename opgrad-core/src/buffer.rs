use std::fmt::Debug;
use std::sync::Arc;

use crate::error::OpGradError;
use crate::scalar::Scalar;
use crate::types::DType;
use num_traits::{NumCast, ToPrimitive};

/// Typed element storage for a tensor.
///
/// Every variant lives in host memory. The `Arc` lets views (e.g. `reshape`)
/// share the same elements without copying.
#[derive(Debug, Clone)]
pub enum Buffer {
    F32(Arc<Vec<f32>>),
    F64(Arc<Vec<f64>>),
    I32(Arc<Vec<i32>>),
    I64(Arc<Vec<i64>>),
    Bool(Arc<Vec<bool>>),
}

impl Buffer {
    /// Allocates `numel` elements of `dtype`, all set to `value`.
    pub fn filled(dtype: DType, numel: usize, value: Scalar) -> Result<Self, OpGradError> {
        let out_of_range = || {
            OpGradError::UnsupportedOperation(format!(
                "fill value {} is not representable as {:?}",
                value, dtype
            ))
        };
        let buffer = match dtype {
            DType::F32 => Buffer::F32(Arc::new(vec![value.to_num().ok_or_else(out_of_range)?; numel])),
            DType::F64 => Buffer::F64(Arc::new(vec![value.to_num().ok_or_else(out_of_range)?; numel])),
            DType::I32 => Buffer::I32(Arc::new(vec![value.to_num().ok_or_else(out_of_range)?; numel])),
            DType::I64 => Buffer::I64(Arc::new(vec![value.to_num().ok_or_else(out_of_range)?; numel])),
            DType::Bool => Buffer::Bool(Arc::new(vec![value.to_bool(); numel])),
        };
        Ok(buffer)
    }

    pub fn dtype(&self) -> DType {
        match self {
            Buffer::F32(_) => DType::F32,
            Buffer::F64(_) => DType::F64,
            Buffer::I32(_) => DType::I32,
            Buffer::I64(_) => DType::I64,
            Buffer::Bool(_) => DType::Bool,
        }
    }

    /// Returns the number of elements in the buffer.
    pub fn len(&self) -> usize {
        match self {
            Buffer::F32(v) => v.len(),
            Buffer::F64(v) => v.len(),
            Buffer::I32(v) => v.len(),
            Buffer::I64(v) => v.len(),
            Buffer::Bool(v) => v.len(),
        }
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attempts to get the underlying `Arc<Vec<f32>>`.
    pub fn try_get_f32(&self) -> Result<&Arc<Vec<f32>>, OpGradError> {
        match self {
            Buffer::F32(data) => Ok(data),
            other => Err(OpGradError::DataTypeMismatch {
                expected: DType::F32,
                actual: other.dtype(),
                operation: "try_get_f32".to_string(),
            }),
        }
    }

    /// Attempts to get the underlying `Arc<Vec<f64>>`.
    pub fn try_get_f64(&self) -> Result<&Arc<Vec<f64>>, OpGradError> {
        match self {
            Buffer::F64(data) => Ok(data),
            other => Err(OpGradError::DataTypeMismatch {
                expected: DType::F64,
                actual: other.dtype(),
                operation: "try_get_f64".to_string(),
            }),
        }
    }

    /// Attempts to get the underlying `Arc<Vec<i64>>`.
    pub fn try_get_i64(&self) -> Result<&Arc<Vec<i64>>, OpGradError> {
        match self {
            Buffer::I64(data) => Ok(data),
            other => Err(OpGradError::DataTypeMismatch {
                expected: DType::I64,
                actual: other.dtype(),
                operation: "try_get_i64".to_string(),
            }),
        }
    }

    /// Element-wise bit equality. `0.0` and `-0.0` differ, NaNs with the same payload match.
    pub fn bits_eq(&self, other: &Buffer) -> bool {
        match (self, other) {
            (Buffer::F32(a), Buffer::F32(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (Buffer::F64(a), Buffer::F64(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (Buffer::I32(a), Buffer::I32(b)) => a == b,
            (Buffer::I64(a), Buffer::I64(b)) => a == b,
            (Buffer::Bool(a), Buffer::Bool(b)) => a == b,
            _ => false,
        }
    }

    /// Converts every element to `dtype`, allocating a new buffer.
    pub fn cast(&self, dtype: DType) -> Result<Buffer, OpGradError> {
        if self.dtype() == dtype {
            return Ok(self.clone());
        }
        let buffer = match dtype {
            DType::F32 => Buffer::F32(Arc::new(self.convert_elements()?)),
            DType::F64 => Buffer::F64(Arc::new(self.convert_elements()?)),
            DType::I32 => Buffer::I32(Arc::new(self.convert_elements()?)),
            DType::I64 => Buffer::I64(Arc::new(self.convert_elements()?)),
            DType::Bool => Buffer::Bool(Arc::new(self.to_bool_vec())),
        };
        Ok(buffer)
    }

    fn convert_elements<T: NumCast>(&self) -> Result<Vec<T>, OpGradError> {
        match self {
            Buffer::F32(v) => convert_slice(v),
            Buffer::F64(v) => convert_slice(v),
            Buffer::I32(v) => convert_slice(v),
            Buffer::I64(v) => convert_slice(v),
            Buffer::Bool(v) => v
                .iter()
                .map(|&b| {
                    T::from(b as u8).ok_or_else(|| {
                        OpGradError::UnsupportedOperation("cast of bool element failed".to_string())
                    })
                })
                .collect(),
        }
    }

    fn to_bool_vec(&self) -> Vec<bool> {
        match self {
            Buffer::F32(v) => v.iter().map(|&x| x != 0.0).collect(),
            Buffer::F64(v) => v.iter().map(|&x| x != 0.0).collect(),
            Buffer::I32(v) => v.iter().map(|&x| x != 0).collect(),
            Buffer::I64(v) => v.iter().map(|&x| x != 0).collect(),
            Buffer::Bool(v) => v.to_vec(),
        }
    }
}

fn convert_slice<S, T>(src: &[S]) -> Result<Vec<T>, OpGradError>
where
    S: ToPrimitive + Copy + Debug,
    T: NumCast,
{
    src.iter()
        .map(|&x| {
            T::from(x).ok_or_else(|| {
                OpGradError::UnsupportedOperation(format!("cast of element {:?} is out of range", x))
            })
        })
        .collect()
}
