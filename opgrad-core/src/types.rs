/// Defines the possible data types for Tensor elements.
///
/// Gradient rules capture a `DType` when their backward needs to restore the
/// input's element type (e.g. `cast`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DType {
    /// 32-bit floating-point type. This is the default dtype.
    #[default]
    F32,
    /// 64-bit floating-point type.
    F64,
    /// 32-bit integer type.
    I32,
    /// 64-bit integer type.
    I64,
    /// Boolean type (true/false values).
    Bool,
}

impl DType {
    /// Whether tensors of this type can carry gradients.
    pub fn is_floating_point(&self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }
}
