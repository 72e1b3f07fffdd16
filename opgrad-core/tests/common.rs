use opgrad_core::Tensor;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use std::sync::Once;

static LOGGER_INIT: Once = Once::new();

// Shared by several test binaries; not every binary uses every helper.
#[allow(dead_code)]
pub(crate) fn setup_logger() {
    LOGGER_INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

#[allow(dead_code)]
pub(crate) fn create_test_tensor(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
    Tensor::new(data, shape).expect("Test tensor creation failed")
}

#[allow(dead_code)]
pub(crate) fn create_grad_tensor(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
    create_test_tensor(data, shape)
        .with_requires_grad(true)
        .expect("Failed to set requires_grad")
}

#[allow(dead_code)]
pub(crate) fn randn(shape: &[usize], seed: u64) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    let numel = shape.iter().product();
    let data: Vec<f32> = (0..numel).map(|_| StandardNormal.sample(&mut rng)).collect();
    create_test_tensor(data, shape.to_vec())
}
