//! Finite difference utilities for gradient verification.

use crate::error::{TensorError, TensorResult};
use crate::tensor::{Element, Tensor};

/// Gradient of a scalar function of `x` by central differences.
///
/// `f` receives a perturbed copy of `x` for every element; `x` itself is
/// never written. The result has `x`'s shape in row-major order.
pub fn numerical_gradient<T, F>(f: F, x: &Tensor<T>, eps: f64) -> TensorResult<Tensor<T>>
where
    T: Element,
    F: Fn(&Tensor<T>) -> TensorResult<f64>,
{
    let point = x.contiguous();
    let base = point.to_vec();
    let mut grads = Vec::with_capacity(base.len());

    for (i, &value) in base.iter().enumerate() {
        let center = value.to_f64();

        point.storage().write()[i] = T::from_f64(center + eps);
        let f_plus = f(&point)?;

        point.storage().write()[i] = T::from_f64(center - eps);
        let f_minus = f(&point)?;

        point.storage().write()[i] = value;
        grads.push(T::from_f64((f_plus - f_minus) / (2.0 * eps)));
    }

    Tensor::from_vec(grads, x.shape().clone())
}

/// Largest absolute elementwise difference between two same-shaped tensors
pub fn max_abs_diff<T: Element>(a: &Tensor<T>, b: &Tensor<T>) -> TensorResult<f64> {
    if a.shape() != b.shape() {
        return Err(TensorError::shape_error(
            &format!("{}", a.shape()),
            &format!("{}", b.shape()),
            None,
        ));
    }
    Ok(a.to_vec()
        .into_iter()
        .zip(b.to_vec())
        .map(|(x, y)| (x.to_f64() - y.to_f64()).abs())
        .fold(0.0, f64::max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic() {
        // f(x) = sum(x^2), df/dx = 2x
        let x = Tensor::from_vec(vec![1.0f64, -2.0, 3.0], [3]).unwrap();
        let g = numerical_gradient(|t: &Tensor<f64>| Ok(t.map(|v| v * v).sum()?.item()?.to_f64()), &x, 1e-6).unwrap();
        let expected = Tensor::from_vec(vec![2.0, -4.0, 6.0], [3]).unwrap();
        assert!(max_abs_diff(&g, &expected).unwrap() < 1e-6);
        assert_eq!(x.to_vec(), vec![1.0, -2.0, 3.0]);
    }

    #[test]
    fn test_max_abs_diff() {
        let a = Tensor::from_vec(vec![1.0f64, 2.0, 3.0], [3]).unwrap();
        let b = Tensor::from_vec(vec![1.1f64, 2.0, 2.8], [3]).unwrap();
        assert!((max_abs_diff(&a, &b).unwrap() - 0.2).abs() < 1e-10);
        assert!(max_abs_diff(&a, &Tensor::zeros([2])).is_err());
    }
}
