use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

/// Checks that a tensor has the expected shape and f32 data within `tolerance`.
/// Panics if shapes differ or data differs significantly.
pub(crate) fn check_tensor_near(
    actual: &Tensor,
    expected_shape: &[usize],
    expected_data: &[f32],
    tolerance: f32,
) {
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");

    let actual_data_vec = actual
        .get_f32_data()
        .expect("Failed to get F32 data in check_tensor_near");

    assert_eq!(actual_data_vec.len(), expected_data.len(), "Data length mismatch");

    for (i, (a, e)) in actual_data_vec.iter().zip(expected_data.iter()).enumerate() {
        let diff = (*a - *e).abs();
        if diff > tolerance {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

/// Helper to create a simple f32 tensor for testing purposes.
pub(crate) fn create_test_tensor(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
    Tensor::new(data, shape).expect("Failed to create test tensor")
}

/// Helper to create a simple f32 tensor that requires gradient for testing.
pub(crate) fn create_test_tensor_with_grad(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
    create_test_tensor(data, shape)
        .with_requires_grad(true)
        .expect("Failed to set requires_grad on test tensor")
}

/// Standard-normal f32 tensor, reproducible from `seed`.
pub(crate) fn randn_test_tensor(shape: &[usize], seed: u64) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    let numel = shape.iter().product();
    let data: Vec<f32> = (0..numel).map(|_| StandardNormal.sample(&mut rng)).collect();
    create_test_tensor(data, shape.to_vec())
}
