//! Type-erased tensors tagged by element type

use super::core::Tensor;
use super::dim::DimVector;
use super::dtype::{DType, Element};
use crate::error::{TensorError, TensorResult};

/// A tensor of any supported element type
#[derive(Debug, Clone, PartialEq)]
pub enum AnyTensor {
    U8(Tensor<u8>),
    I8(Tensor<i8>),
    I16(Tensor<i16>),
    I32(Tensor<i32>),
    I64(Tensor<i64>),
    F32(Tensor<f32>),
    F64(Tensor<f64>),
}

/// Conversion between a typed tensor and its `AnyTensor` variant
pub trait AnyElement: Element {
    fn wrap(tensor: Tensor<Self>) -> AnyTensor;

    fn unwrap_ref(any: &AnyTensor) -> Option<&Tensor<Self>>;
}

macro_rules! any_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl AnyElement for $t {
                fn wrap(tensor: Tensor<Self>) -> AnyTensor {
                    AnyTensor::$variant(tensor)
                }

                fn unwrap_ref(any: &AnyTensor) -> Option<&Tensor<Self>> {
                    match any {
                        AnyTensor::$variant(t) => Some(t),
                        _ => None,
                    }
                }
            }

            impl From<Tensor<$t>> for AnyTensor {
                fn from(tensor: Tensor<$t>) -> Self {
                    AnyTensor::$variant(tensor)
                }
            }
        )*

        /// Run `$body` with `$t` bound to the typed tensor inside `$any`
        macro_rules! dispatch {
            ($any:expr, $bound:ident => $body:expr) => {
                match $any {
                    $(AnyTensor::$variant($bound) => $body,)*
                }
            };
        }

        /// Run `$body` on two tensors of the same variant, or fail with a type mismatch
        macro_rules! dispatch_pair {
            ($lhs:expr, $rhs:expr, $a:ident, $b:ident => $body:expr) => {
                match ($lhs, $rhs) {
                    $((AnyTensor::$variant($a), AnyTensor::$variant($b)) => $body,)*
                    (lhs, rhs) => Err(TensorError::TypeMismatch {
                        expected: lhs.dtype(),
                        got: rhs.dtype(),
                    }),
                }
            };
        }
    };
}

any_element!(
    u8 => U8,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
);

impl AnyTensor {
    /// Zero-filled tensor of a runtime-chosen element type
    pub fn zeros(dtype: DType, shape: impl Into<DimVector>) -> Self {
        let shape = shape.into();
        match dtype {
            DType::U8 => Tensor::<u8>::zeros(shape).into(),
            DType::I8 => Tensor::<i8>::zeros(shape).into(),
            DType::I16 => Tensor::<i16>::zeros(shape).into(),
            DType::I32 => Tensor::<i32>::zeros(shape).into(),
            DType::I64 => Tensor::<i64>::zeros(shape).into(),
            DType::F32 => Tensor::<f32>::zeros(shape).into(),
            DType::F64 => Tensor::<f64>::zeros(shape).into(),
        }
    }

    pub fn dtype(&self) -> DType {
        dispatch!(self, t => t.dtype())
    }

    pub fn shape(&self) -> DimVector {
        dispatch!(self, t => t.shape().clone())
    }

    pub fn flat_size(&self) -> usize {
        dispatch!(self, t => t.flat_size())
    }

    pub fn add_(&self, other: &AnyTensor) -> TensorResult<()> {
        dispatch_pair!(self, other, a, b => a.add_(b))
    }

    pub fn sub_(&self, other: &AnyTensor) -> TensorResult<()> {
        dispatch_pair!(self, other, a, b => a.sub_(b))
    }

    pub fn mul_(&self, other: &AnyTensor) -> TensorResult<()> {
        dispatch_pair!(self, other, a, b => a.mul_(b))
    }

    pub fn sin_(&self) -> TensorResult<()> {
        dispatch!(self, t => t.sin_())
    }

    pub fn cos_(&self) -> TensorResult<()> {
        dispatch!(self, t => t.cos_())
    }

    pub fn to_string_with_precision(&self, precision: usize) -> String {
        dispatch!(self, t => t.to_string_with_precision(precision))
    }

    /// Typed view of the inner tensor
    pub fn downcast_ref<T: AnyElement>(&self) -> TensorResult<&Tensor<T>> {
        T::unwrap_ref(self).ok_or(TensorError::TypeMismatch {
            expected: T::DTYPE,
            got: self.dtype(),
        })
    }

    /// Typed handle sharing the inner tensor's storage
    pub fn downcast<T: AnyElement>(&self) -> TensorResult<Tensor<T>> {
        self.downcast_ref::<T>().map(Tensor::alias)
    }
}

impl std::fmt::Display for AnyTensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        dispatch!(self, t => std::fmt::Display::fmt(t, f))
    }
}
