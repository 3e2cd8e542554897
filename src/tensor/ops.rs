//! Elementwise, broadcasting and reduction operations on tensors
//!
//! Built-in arithmetic is checked: integer overflow surfaces as
//! `InvalidState` instead of wrapping. In-place updates are rejected on
//! views where several elements share one storage cell.

use super::core::Tensor;
use super::dim::DimVector;
use super::dtype::Element;
use super::iter::{broadcast_axes, broadcast_shape, PositionIter};
use crate::error::{TensorError, TensorResult};

impl<T: Element> Tensor<T> {
    fn ensure_writable(&self, op: &str) -> TensorResult<()> {
        if self.has_overlap() {
            return Err(TensorError::InvalidState(format!(
                "{} cannot write through a broadcast view (shape {}, strides {})",
                op, self.shape, self.strides
            )));
        }
        Ok(())
    }

    fn update_<F>(&self, op: &str, f: F) -> TensorResult<()>
    where
        F: Fn(T) -> TensorResult<T>,
    {
        self.ensure_writable(op)?;
        let mut data = self.storage.write();
        // All-or-nothing: a failing element leaves the tensor untouched
        let updated = PositionIter::memory_order(&self.shape, &self.strides, self.offset)
            .map(|pos| f(data[pos]).map(|v| (pos, v)))
            .collect::<TensorResult<Vec<_>>>()?;
        for (pos, v) in updated {
            data[pos] = v;
        }
        Ok(())
    }

    /// Apply `f` to every element in place, visiting storage in memory order
    pub fn apply_<F>(&self, f: F) -> TensorResult<()>
    where
        F: Fn(T) -> T,
    {
        self.update_("apply_", |v| Ok(f(v)))
    }

    /// Fallible variant of `apply_`; stops at the first error
    pub fn try_apply_<F>(&self, f: F) -> TensorResult<()>
    where
        F: Fn(T) -> TensorResult<T>,
    {
        self.update_("try_apply_", f)
    }

    /// New row-major tensor holding `f` of every element
    pub fn map<F>(&self, f: F) -> Tensor<T>
    where
        F: Fn(T) -> T,
    {
        Tensor::from_logical(self.to_vec().into_iter().map(f).collect(), self.shape.clone())
    }

    /// Fold every element into one value, starting from zero
    pub fn reduce<F>(&self, f: F) -> T
    where
        F: Fn(T, T) -> T,
    {
        let data = self.storage.read();
        PositionIter::memory_order(&self.shape, &self.strides, self.offset)
            .fold(T::zero(), |acc, pos| f(acc, data[pos]))
    }

    /// Fallible variant of `reduce`; stops at the first error
    pub fn try_reduce<F>(&self, f: F) -> TensorResult<T>
    where
        F: Fn(T, T) -> TensorResult<T>,
    {
        let data = self.storage.read();
        PositionIter::memory_order(&self.shape, &self.strides, self.offset)
            .try_fold(T::zero(), |acc, pos| f(acc, data[pos]))
    }

    /// Fold along `dim`, removing it from the shape. A rank-1 input gives `[1]`.
    pub fn reduce_dim<F>(&self, dim: isize, f: F) -> TensorResult<Tensor<T>>
    where
        F: Fn(T, T) -> T,
    {
        self.try_reduce_dim(dim, |a, b| Ok(f(a, b)))
    }

    pub fn try_reduce_dim<F>(&self, dim: isize, f: F) -> TensorResult<Tensor<T>>
    where
        F: Fn(T, T) -> TensorResult<T>,
    {
        let d = self.dim_index(dim)?;
        let mut out_shape = self.shape.clone();
        out_shape.erase(d as isize)?;
        if out_shape.is_empty() {
            out_shape.push_back(1);
        }

        let mut outer_shape = self.shape.clone();
        outer_shape[d] = 1;
        let reduce_len = self.shape[d];
        let reduce_stride = self.strides[d];

        let data = self.storage.read();
        let values = PositionIter::new(&outer_shape, &self.strides, self.offset)
            .map(|base| {
                (0..reduce_len).try_fold(T::zero(), |acc, i| f(acc, data[base + i * reduce_stride]))
            })
            .collect::<TensorResult<Vec<T>>>()?;
        drop(data);

        Tensor::from_vec(values, out_shape)
    }

    /// Set every element to `value`. Allowed on broadcast views, since every
    /// element sharing a cell receives the same value.
    pub fn fill_(&self, value: T) {
        let mut data = self.storage.write();
        for pos in PositionIter::memory_order(&self.shape, &self.strides, self.offset) {
            data[pos] = value;
        }
    }

    pub fn neg_(&self) -> TensorResult<()> {
        self.update_("neg_", |v| v.neg().ok_or_else(|| TensorError::unsupported("neg_", T::DTYPE)))
    }

    pub fn sin_(&self) -> TensorResult<()> {
        self.update_("sin_", |v| v.sin().ok_or_else(|| TensorError::unsupported("sin_", T::DTYPE)))
    }

    pub fn cos_(&self) -> TensorResult<()> {
        self.update_("cos_", |v| v.cos().ok_or_else(|| TensorError::unsupported("cos_", T::DTYPE)))
    }

    pub fn pow_(&self, exponent: f64) -> TensorResult<()> {
        self.update_("pow_", |v| {
            v.powf(exponent)
                .ok_or_else(|| TensorError::unsupported("pow_", T::DTYPE))
        })
    }

    pub fn add_scalar_(&self, value: T) -> TensorResult<()> {
        self.update_("add_scalar_", |v| {
            v.checked_add(value)
                .ok_or_else(|| TensorError::overflow("add_scalar_", T::DTYPE))
        })
    }

    pub fn mul_scalar_(&self, value: T) -> TensorResult<()> {
        self.update_("mul_scalar_", |v| {
            v.checked_mul(value)
                .ok_or_else(|| TensorError::overflow("mul_scalar_", T::DTYPE))
        })
    }

    pub fn div_scalar_(&self, value: T) -> TensorResult<()> {
        if !T::DTYPE.is_float() && value == T::zero() {
            return Err(TensorError::InvalidState(format!(
                "Integer division by zero on {} tensor",
                T::DTYPE
            )));
        }
        self.update_("div_scalar_", |v| {
            v.checked_div(value)
                .ok_or_else(|| TensorError::overflow("div_scalar_", T::DTYPE))
        })
    }

    /// Elements of `other` read as if broadcast to this tensor's shape.
    /// This tensor's shape must already be the broadcast of both shapes.
    fn broadcast_operand(&self, other: &Tensor<T>, op: &str) -> TensorResult<Vec<T>> {
        let target = broadcast_shape(&self.shape, &other.shape)?;
        if target != self.shape {
            return Err(TensorError::ShapeError(format!(
                "{} target has shape {} but broadcast result is {}",
                op, self.shape, target
            )));
        }
        Ok(other.broadcast_to(target)?.to_vec())
    }

    fn zip_apply_<F>(&self, other: &Tensor<T>, op: &str, f: F) -> TensorResult<()>
    where
        F: Fn(T, T) -> Option<T>,
    {
        self.ensure_writable(op)?;
        // Snapshot the operand first; it may alias this tensor's storage
        let rhs = self.broadcast_operand(other, op)?;
        let mut data = self.storage.write();
        let updated = self
            .positions()
            .zip(rhs)
            .map(|(pos, r)| {
                f(data[pos], r)
                    .map(|v| (pos, v))
                    .ok_or_else(|| TensorError::overflow(op, T::DTYPE))
            })
            .collect::<TensorResult<Vec<_>>>()?;
        for (pos, v) in updated {
            data[pos] = v;
        }
        Ok(())
    }

    pub fn add_(&self, other: &Tensor<T>) -> TensorResult<()> {
        self.zip_apply_(other, "add_", T::checked_add)
    }

    pub fn sub_(&self, other: &Tensor<T>) -> TensorResult<()> {
        self.zip_apply_(other, "sub_", T::checked_sub)
    }

    pub fn mul_(&self, other: &Tensor<T>) -> TensorResult<()> {
        self.zip_apply_(other, "mul_", T::checked_mul)
    }

    fn checked_zip<F>(&self, other: &Tensor<T>, op: &str, f: F) -> TensorResult<Tensor<T>>
    where
        F: Fn(T, T) -> Option<T>,
    {
        let shape = broadcast_shape(&self.shape, &other.shape)?;
        let lhs = self.broadcast_to(shape.clone())?.to_vec();
        let rhs = other.broadcast_to(shape.clone())?.to_vec();
        let values = lhs
            .into_iter()
            .zip(rhs)
            .map(|(a, b)| f(a, b).ok_or_else(|| TensorError::overflow(op, T::DTYPE)))
            .collect::<TensorResult<Vec<T>>>()?;
        Ok(Tensor::from_logical(values, shape))
    }

    /// Broadcast `self` and `other` to a common shape and combine elementwise
    pub fn zip_with<F>(&self, other: &Tensor<T>, f: F) -> TensorResult<Tensor<T>>
    where
        F: Fn(T, T) -> T,
    {
        self.checked_zip(other, "zip_with", |a, b| Some(f(a, b)))
    }

    pub fn add(&self, other: &Tensor<T>) -> TensorResult<Tensor<T>> {
        self.checked_zip(other, "add", T::checked_add)
    }

    pub fn sub(&self, other: &Tensor<T>) -> TensorResult<Tensor<T>> {
        self.checked_zip(other, "sub", T::checked_sub)
    }

    pub fn mul(&self, other: &Tensor<T>) -> TensorResult<Tensor<T>> {
        self.checked_zip(other, "mul", T::checked_mul)
    }

    fn checked_total(&self, op: &str) -> TensorResult<T> {
        self.try_reduce(|a, b| a.checked_add(b).ok_or_else(|| TensorError::overflow(op, T::DTYPE)))
    }

    /// Sum of all elements as a `[1]` tensor
    pub fn sum(&self) -> TensorResult<Tensor<T>> {
        Ok(Tensor::scalar(self.checked_total("sum")?))
    }

    /// Mean of all elements as a `[1]` tensor; integer means truncate toward zero
    pub fn mean(&self) -> TensorResult<Tensor<T>> {
        let n = self.flat_size();
        if n == 0 {
            return Err(TensorError::InvalidState("mean() of an empty tensor".to_string()));
        }
        let total = self.checked_total("mean")?;
        Ok(Tensor::scalar(T::from_f64(total.to_f64() / n as f64)))
    }

    /// Sum over broadcast dimensions so the result has `shape`. `shape` must
    /// broadcast to this tensor's shape.
    pub fn sum_to(&self, shape: &DimVector) -> TensorResult<Tensor<T>> {
        if *shape == self.shape {
            return Ok(self.alias());
        }
        if broadcast_shape(shape, &self.shape)? != self.shape {
            return Err(TensorError::ShapeError(format!(
                "Cannot reduce gradient of shape {} to {}",
                self.shape, shape
            )));
        }

        let add = |a: T, b: T| a.checked_add(b).ok_or_else(|| TensorError::overflow("sum_to", T::DTYPE));
        let mut reduced = self.alias();
        for axis in broadcast_axes(shape, &self.shape).into_iter().rev() {
            let mut kept = reduced.shape.clone();
            kept[axis] = 1;
            reduced = reduced.try_reduce_dim(axis as isize, add)?.reshape(kept)?;
        }
        reduced.reshape(shape.clone())
    }

    pub fn matmul(&self, other: &Tensor<T>) -> TensorResult<Tensor<T>> {
        self.matmul_with(other, &super::linalg::CpuBackend)
    }

    pub fn inverse(&self) -> TensorResult<Tensor<T>> {
        self.inverse_with(&super::linalg::CpuBackend)
    }
}
