// src/tensor/create.rs

use crate::error::OpGradError;
use crate::tensor::Tensor;

/// Creates a new tensor filled with zeros with the specified shape.
/// Currently creates an f32 tensor on the CPU.
pub fn zeros(shape: &[usize]) -> Result<Tensor, OpGradError> {
    full(shape, 0.0)
}

/// Creates a new tensor filled with ones with the specified shape.
/// Currently creates an f32 tensor on the CPU.
pub fn ones(shape: &[usize]) -> Result<Tensor, OpGradError> {
    full(shape, 1.0)
}

/// Creates a new f32 CPU tensor filled with `value`.
pub fn full(shape: &[usize], value: f32) -> Result<Tensor, OpGradError> {
    let numel = shape.iter().product();
    Tensor::new(vec![value; numel], shape.to_vec())
}

pub fn from_vec_f32(data_vec: Vec<f32>, shape: Vec<usize>) -> Result<Tensor, OpGradError> {
    Tensor::new(data_vec, shape)
}

pub fn from_vec_f64(data_vec: Vec<f64>, shape: Vec<usize>) -> Result<Tensor, OpGradError> {
    Tensor::new_f64(data_vec, shape)
}

pub fn from_vec_i64(data_vec: Vec<i64>, shape: Vec<usize>) -> Result<Tensor, OpGradError> {
    Tensor::new_i64(data_vec, shape)
}
