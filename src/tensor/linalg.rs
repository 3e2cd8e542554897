//! Dense linear algebra behind `matmul` and `inverse`

use super::core::Tensor;
use super::dim::DimVector;
use super::dtype::Element;
use crate::error::{ErrorContext, TensorError, TensorResult, WithContext};

/// Kernel provider for matrix products and inverses.
///
/// Operands reaching a backend are already validated as 2-D with matching
/// inner dimensions (or square, for `inverse`).
pub trait LinalgBackend<T: Element>: Send + Sync {
    fn name(&self) -> &str;

    fn matmul(&self, a: &Tensor<T>, b: &Tensor<T>) -> TensorResult<Tensor<T>>;

    fn inverse(&self, a: &Tensor<T>) -> TensorResult<Tensor<T>>;
}

/// Reference kernels over strided storage
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl<T: Element> LinalgBackend<T> for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn matmul(&self, a: &Tensor<T>, b: &Tensor<T>) -> TensorResult<Tensor<T>> {
        let (m, k) = (a.shape[0], a.shape[1]);
        let n = b.shape[1];
        let (as0, as1) = (a.strides[0], a.strides[1]);
        let (bs0, bs1) = (b.strides[0], b.strides[1]);

        let mut out = vec![T::zero(); m * n];
        {
            let lhs = a.storage.read();
            let rhs = b.storage.read();
            for i in 0..m {
                for p in 0..k {
                    let av = lhs[a.offset + i * as0 + p * as1];
                    for j in 0..n {
                        let bv = rhs[b.offset + p * bs0 + j * bs1];
                        out[i * n + j] = av
                            .checked_mul(bv)
                            .and_then(|prod| out[i * n + j].checked_add(prod))
                            .ok_or_else(|| TensorError::overflow("matmul", T::DTYPE))?;
                    }
                }
            }
        }

        Tensor::from_vec(out, [m, n])
    }

    /// Gauss-Jordan elimination with partial pivoting
    fn inverse(&self, a: &Tensor<T>) -> TensorResult<Tensor<T>> {
        if !T::DTYPE.is_float() {
            return Err(TensorError::unsupported("inverse", T::DTYPE));
        }

        let n = a.shape[0];
        let mut lhs: Vec<f64> = a.to_vec().into_iter().map(T::to_f64).collect();
        let mut rhs = vec![0.0f64; n * n];
        for i in 0..n {
            rhs[i * n + i] = 1.0;
        }

        for col in 0..n {
            let pivot = (col..n)
                .max_by(|&x, &y| lhs[x * n + col].abs().total_cmp(&lhs[y * n + col].abs()))
                .unwrap_or(col);
            if lhs[pivot * n + col].abs() < f64::EPSILON {
                return Err(TensorError::InvalidState("Matrix is singular".to_string()));
            }
            if pivot != col {
                for j in 0..n {
                    lhs.swap(pivot * n + j, col * n + j);
                    rhs.swap(pivot * n + j, col * n + j);
                }
            }

            let scale = lhs[col * n + col];
            for j in 0..n {
                lhs[col * n + j] /= scale;
                rhs[col * n + j] /= scale;
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = lhs[row * n + col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    lhs[row * n + j] -= factor * lhs[col * n + j];
                    rhs[row * n + j] -= factor * rhs[col * n + j];
                }
            }
        }

        Tensor::from_vec(rhs.into_iter().map(T::from_f64).collect(), [n, n])
    }
}

impl<T: Element> Tensor<T> {
    /// 2-D view of a matmul operand; rank-1 operands become a row (left) or
    /// a column (right)
    pub(crate) fn as_matrix(&self, left: bool) -> TensorResult<Tensor<T>> {
        match self.rank() {
            2 => Ok(self.alias()),
            1 => {
                let n = self.shape[0];
                let shape = if left { DimVector::from([1, n]) } else { DimVector::from([n, 1]) };
                self.reshape(shape)
            }
            rank => Err(TensorError::ShapeError(format!(
                "matmul needs rank 1 or 2 operands, got rank {}",
                rank
            ))),
        }
    }

    fn matmul_operands(&self, other: &Tensor<T>) -> TensorResult<(Tensor<T>, Tensor<T>)> {
        let a = self.as_matrix(true)?;
        let b = other.as_matrix(false)?;
        if a.shape[1] != b.shape[0] {
            return Err(TensorError::shape_error(
                &format!("{} rows on the right operand", a.shape[1]),
                &format!("{}", b.shape[0]),
                Some("Check the inner dimensions of both operands"),
            ));
        }
        Ok((a, b))
    }

    /// Matrix product computed by `backend`
    pub fn matmul_with<B>(&self, other: &Tensor<T>, backend: &B) -> TensorResult<Tensor<T>>
    where
        B: LinalgBackend<T> + ?Sized,
    {
        let (a, b) = self.matmul_operands(other).with_context(|| {
            ErrorContext::new("matmul")
                .with_shape(&self.shape.to_string())
                .with_shape(&other.shape.to_string())
        })?;

        tracing::trace!(backend = backend.name(), "matmul {} x {}", a.shape, b.shape);
        backend.matmul(&a, &b)
    }

    /// Inverse of a square matrix computed by `backend`
    pub fn inverse_with<B>(&self, backend: &B) -> TensorResult<Tensor<T>>
    where
        B: LinalgBackend<T> + ?Sized,
    {
        if self.rank() != 2 || self.shape[0] != self.shape[1] {
            return Err(TensorError::shape_error(
                "a square 2-D matrix",
                &format!("shape {}", self.shape),
                None,
            ));
        }
        backend.inverse(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_matmul() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]).unwrap();
        let b = Tensor::from_vec(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], [3, 2]).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c.to_vec(), vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_matmul_on_transposed_view() {
        let a = Tensor::from_vec(vec![1i32, 2, 3, 4], [2, 2]).unwrap();
        let at = a.transpose(0, 1).unwrap();
        assert_eq!(at.matmul(&a).unwrap().to_vec(), vec![10, 14, 14, 20]);
    }

    #[test]
    fn test_matmul_promotes_vectors() {
        let v = Tensor::from_vec(vec![1.0f32, 2.0], [2]).unwrap();
        let m = Tensor::from_vec(vec![1.0f32, 0.0, 0.0, 1.0], [2, 2]).unwrap();
        assert_eq!(v.matmul(&m).unwrap().shape(), &[1, 2]);
        assert_eq!(m.matmul(&v).unwrap().shape(), &[2, 1]);
        assert_eq!(v.matmul(&v).unwrap().item().unwrap(), 5.0);
    }

    #[test]
    fn test_integer_matmul_overflow_is_an_error() {
        let a = Tensor::<u8>::full([1, 2], 16);
        let b = Tensor::<u8>::full([2, 1], 8);
        assert!(matches!(a.matmul(&b), Err(TensorError::InvalidState(_))));

        let small = Tensor::<u8>::full([2, 1], 7);
        assert_eq!(a.matmul(&small).unwrap().item().unwrap(), 224);
    }

    #[test]
    fn test_matmul_validation() {
        let a = Tensor::<f64>::zeros([2, 3]);
        let err = a.matmul(&Tensor::zeros([2, 3])).unwrap_err();
        assert!(err.to_string().contains("Operation: matmul"));
        assert!(a.matmul(&Tensor::zeros([3, 2, 1])).is_err());
    }

    #[test]
    fn test_inverse() {
        let a = Tensor::from_vec(vec![0.0, 2.0, 1.0, 1.0], [2, 2]).unwrap();
        let inv = a.inverse().unwrap();
        assert!(close(&inv.to_vec(), &[-0.5, 1.0, 0.5, 0.0]));
        assert!(close(&a.matmul(&inv).unwrap().to_vec(), &[1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_inverse_errors() {
        let singular = Tensor::from_vec(vec![1.0, 2.0, 2.0, 4.0], [2, 2]).unwrap();
        assert!(matches!(singular.inverse(), Err(TensorError::InvalidState(_))));
        assert!(Tensor::<f64>::zeros([2, 3]).inverse().is_err());
        assert!(matches!(
            Tensor::<i32>::ones([1, 1]).inverse(),
            Err(TensorError::UnsupportedOperation(_))
        ));
    }
}
