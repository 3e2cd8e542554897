//! Random tensor construction.
//!
//! Tensors drawn without an explicit RNG use a process-wide generator, which
//! [`set_seed`] makes reproducible.

use lazy_static::lazy_static;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::core::Tensor;
use super::dim::DimVector;
use super::dtype::Element;

lazy_static! {
    static ref GLOBAL_RNG: Mutex<StdRng> = Mutex::new(StdRng::from_entropy());
}

/// Reseed the process-wide generator
pub fn set_seed(seed: u64) {
    *GLOBAL_RNG.lock() = StdRng::seed_from_u64(seed);
}

/// Standard normal sample via the Box-Muller transform
fn sample_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

impl<T: Element> Tensor<T> {
    /// Uniform values in `[0, 1)`
    pub fn rand(shape: impl Into<DimVector>) -> Self {
        Self::rand_with_rng(shape, &mut *GLOBAL_RNG.lock())
    }

    pub fn rand_with_rng<R: Rng + ?Sized>(shape: impl Into<DimVector>, rng: &mut R) -> Self {
        Self::uniform_with_rng(shape, 0.0, 1.0, rng)
    }

    /// Uniform values in `[low, high)`
    pub fn uniform(shape: impl Into<DimVector>, low: f64, high: f64) -> Self {
        Self::uniform_with_rng(shape, low, high, &mut *GLOBAL_RNG.lock())
    }

    pub fn uniform_with_rng<R: Rng + ?Sized>(
        shape: impl Into<DimVector>,
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Self {
        let tensor = Self::new(shape);
        {
            let mut data = tensor.storage.write();
            for v in data.iter_mut() {
                *v = T::from_f64(low + (high - low) * rng.gen::<f64>());
            }
        }
        tensor
    }

    /// Standard normal values
    pub fn randn(shape: impl Into<DimVector>) -> Self {
        Self::randn_with_rng(shape, &mut *GLOBAL_RNG.lock())
    }

    pub fn randn_with_rng<R: Rng + ?Sized>(shape: impl Into<DimVector>, rng: &mut R) -> Self {
        let tensor = Self::new(shape);
        {
            let mut data = tensor.storage.write();
            for v in data.iter_mut() {
                *v = T::from_f64(sample_normal(rng));
            }
        }
        tensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rand_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let t = Tensor::<f64>::rand_with_rng([4, 5], &mut rng);
        assert_eq!(t.shape(), &[4, 5]);
        assert!(t.to_vec().iter().all(|&v| (0.0..1.0).contains(&v)));

        let u = Tensor::<f32>::uniform_with_rng([10], -2.0, 2.0, &mut rng);
        assert!(u.to_vec().iter().all(|&v| (-2.0..2.0).contains(&v)));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = Tensor::<f64>::randn_with_rng([3, 3], &mut StdRng::seed_from_u64(42));
        let b = Tensor::<f64>::randn_with_rng([3, 3], &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_randn_moments() {
        let mut rng = StdRng::seed_from_u64(1);
        let t = Tensor::<f64>::randn_with_rng([10_000], &mut rng);
        let mean = t.mean().unwrap().item().unwrap();
        let var = t.map(|v| (v - mean) * (v - mean)).mean().unwrap().item().unwrap();
        assert!(mean.abs() < 0.05);
        assert!((var - 1.0).abs() < 0.1);
    }
}
