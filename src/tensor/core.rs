//! Core tensor type: a strided view over shared storage

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};

use super::dim::{normalize_index, DimVector};
use super::dtype::{DType, Element};
use super::iter::{broadcast_strides, position_of, PositionIter};
use super::slice::Slice;
use super::storage::Storage;
use crate::config;
use crate::error::{TensorError, TensorResult};

/// Order in which default strides are derived from a shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    /// Last dimension varies fastest
    #[default]
    RowMajor,
    /// First dimension varies fastest
    ColumnMajor,
}

impl Layout {
    /// Dense strides for `shape`, with no gaps between elements
    pub fn strides_for(&self, shape: &DimVector) -> DimVector {
        let mut strides = DimVector::new(shape.len());
        let mut step = 1;
        match self {
            Layout::RowMajor => {
                for d in (0..shape.len()).rev() {
                    strides[d] = step;
                    step *= shape[d].max(1);
                }
            }
            Layout::ColumnMajor => {
                for d in 0..shape.len() {
                    strides[d] = step;
                    step *= shape[d].max(1);
                }
            }
        }
        strides
    }
}

/// N-dimensional strided tensor.
///
/// Element `idx` lives at `offset + Σ idx[d] * strides[d]` in the storage.
/// `select`, `transpose`, `permute`, `broadcast_to` and contiguous `reshape`
/// return views over the same storage; writes through a view are visible
/// through its parent. `clone()` copies the storage.
pub struct Tensor<T: Element> {
    pub(crate) storage: Storage<T>,
    pub(crate) shape: DimVector,
    pub(crate) strides: DimVector,
    pub(crate) offset: usize,
    pub(crate) layout: Layout,
}

impl<T: Element> Tensor<T> {
    /// Zero-filled tensor using the configured default layout
    pub fn new(shape: impl Into<DimVector>) -> Self {
        Self::with_layout(shape, config::get_config().tensor.default_layout)
    }

    pub fn with_layout(shape: impl Into<DimVector>, layout: Layout) -> Self {
        let shape = shape.into();
        let strides = layout.strides_for(&shape);
        Self {
            storage: Storage::new(shape.flat_size()),
            shape,
            strides,
            offset: 0,
            layout,
        }
    }

    /// Zero-filled tensor with explicit strides, backed by storage large
    /// enough for every reachable position
    pub fn with_strides(shape: impl Into<DimVector>, strides: impl Into<DimVector>) -> TensorResult<Self> {
        let shape = shape.into();
        let strides = strides.into();
        if shape.len() != strides.len() {
            return Err(TensorError::shape_error(
                &format!("{} strides", shape.len()),
                &format!("{}", strides.len()),
                None,
            ));
        }

        let len = span(&shape, &strides, 0);
        Ok(Self {
            storage: Storage::new(len),
            shape,
            strides,
            offset: 0,
            layout: Layout::RowMajor,
        })
    }

    /// View over existing storage; fails if any reachable position falls outside it
    pub fn from_storage(
        storage: Storage<T>,
        shape: impl Into<DimVector>,
        strides: impl Into<DimVector>,
        offset: usize,
    ) -> TensorResult<Self> {
        let shape = shape.into();
        let strides = strides.into();
        if shape.len() != strides.len() {
            return Err(TensorError::ShapeError(format!(
                "Shape {} and strides {} differ in rank",
                shape, strides
            )));
        }
        let needed = span(&shape, &strides, offset);
        if needed > storage.len() {
            return Err(TensorError::ShapeError(format!(
                "View of shape {} at offset {} needs {} elements, storage holds {}",
                shape,
                offset,
                needed,
                storage.len()
            )));
        }
        Ok(Self {
            storage,
            shape,
            strides,
            offset,
            layout: Layout::RowMajor,
        })
    }

    /// Row-major tensor over `data`
    pub fn from_vec(data: Vec<T>, shape: impl Into<DimVector>) -> TensorResult<Self> {
        let shape = shape.into();
        if data.len() != shape.flat_size() {
            return Err(TensorError::shape_error(
                &format!("{} elements for shape {}", shape.flat_size(), shape),
                &format!("{}", data.len()),
                None,
            ));
        }
        let strides = Layout::RowMajor.strides_for(&shape);
        Ok(Self {
            storage: Storage::from_vec(data),
            shape,
            strides,
            offset: 0,
            layout: Layout::RowMajor,
        })
    }

    /// Rank-1, length-1 tensor holding `value`
    pub fn scalar(value: T) -> Self {
        Self {
            storage: Storage::from_vec(vec![value]),
            shape: DimVector::from([1]),
            strides: DimVector::from([1]),
            offset: 0,
            layout: Layout::RowMajor,
        }
    }

    /// Rank-0 tensor with no elements
    pub fn empty() -> Self {
        Self {
            storage: Storage::new(0),
            shape: DimVector::new(0),
            strides: DimVector::new(0),
            offset: 0,
            layout: Layout::RowMajor,
        }
    }

    pub fn zeros(shape: impl Into<DimVector>) -> Self {
        Self::new(shape)
    }

    pub fn ones(shape: impl Into<DimVector>) -> Self {
        Self::full(shape, T::one())
    }

    pub fn full(shape: impl Into<DimVector>, value: T) -> Self {
        let tensor = Self::new(shape);
        tensor.storage.fill(value);
        tensor
    }

    pub fn zeros_like(other: &Tensor<T>) -> Self {
        Self::with_layout(other.shape.clone(), other.layout)
    }

    pub fn ones_like(other: &Tensor<T>) -> Self {
        let tensor = Self::zeros_like(other);
        tensor.storage.fill(T::one());
        tensor
    }

    /// Another view of the same storage with identical geometry
    pub fn alias(&self) -> Self {
        Self {
            storage: self.storage.share(),
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
            layout: self.layout,
        }
    }

    pub fn shape(&self) -> &DimVector {
        &self.shape
    }

    /// Size of one dimension; negative `dim` counts from the end
    pub fn size(&self, dim: isize) -> TensorResult<usize> {
        self.shape.get(dim)
    }

    pub fn strides(&self) -> &DimVector {
        &self.strides
    }

    pub fn stride(&self, dim: isize) -> TensorResult<usize> {
        self.strides.get(dim)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn flat_size(&self) -> usize {
        self.shape.flat_size()
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    pub fn shares_storage(&self, other: &Tensor<T>) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    /// Whether elements are laid out densely in row-major order
    pub fn is_contiguous(&self) -> bool {
        let dense = Layout::RowMajor.strides_for(&self.shape);
        self.shape
            .iter()
            .zip(self.strides.iter().zip(dense.iter()))
            .all(|(&size, (&s, &d))| size <= 1 || s == d)
    }

    /// Whether distinct elements share a storage cell through a zero stride,
    /// as in views returned by `broadcast_to`
    pub fn has_overlap(&self) -> bool {
        self.shape
            .iter()
            .zip(self.strides.iter())
            .any(|(&size, &stride)| size > 1 && stride == 0)
    }

    /// Storage positions of every element in logical order
    pub fn positions(&self) -> PositionIter {
        PositionIter::new(&self.shape, &self.strides, self.offset)
    }

    fn checked_position(&self, index: &[usize]) -> TensorResult<usize> {
        if index.len() != self.rank() {
            return Err(TensorError::shape_error(
                &format!("{} indices", self.rank()),
                &format!("{}", index.len()),
                None,
            ));
        }
        for (d, (&i, &size)) in index.iter().zip(self.shape.iter()).enumerate() {
            if i >= size {
                return Err(TensorError::ShapeError(format!(
                    "Index {} out of range for dimension {} of size {}",
                    i, d, size
                )));
            }
        }
        Ok(position_of(index, &self.strides, self.offset))
    }

    pub fn get(&self, index: &[usize]) -> TensorResult<T> {
        let pos = self.checked_position(index)?;
        Ok(self.storage.read()[pos])
    }

    pub fn set(&self, index: &[usize], value: T) -> TensorResult<()> {
        let pos = self.checked_position(index)?;
        self.storage.write()[pos] = value;
        Ok(())
    }

    /// Elements in logical order
    pub fn to_vec(&self) -> Vec<T> {
        let data = self.storage.read();
        self.positions().map(|p| data[p]).collect()
    }

    /// The single element of a one-element tensor
    pub fn item(&self) -> TensorResult<T> {
        if self.flat_size() != 1 {
            return Err(TensorError::InvalidState(format!(
                "item() needs exactly one element, tensor of shape {} has {}",
                self.shape,
                self.flat_size()
            )));
        }
        Ok(self.storage.read()[self.offset])
    }

    /// Sub-view selected by one slice per leading dimension; missing
    /// trailing slices take the whole dimension
    pub fn select(&self, slices: &[Slice]) -> TensorResult<Self> {
        if slices.len() > self.rank() {
            return Err(TensorError::ShapeError(format!(
                "{} slices given for a rank-{} tensor",
                slices.len(),
                self.rank()
            )));
        }

        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        let mut offset = self.offset;
        for (d, slice) in slices.iter().enumerate() {
            let resolved = slice.resolve(self.shape[d])?;
            shape[d] = resolved.len;
            strides[d] = self.strides[d] * resolved.step;
            offset += self.strides[d] * resolved.start;
        }

        Ok(Self {
            storage: self.storage.share(),
            shape,
            strides,
            offset,
            layout: self.layout,
        })
    }

    /// Swap two dimensions of this view in place
    pub fn transpose_(&mut self, dim0: isize, dim1: isize) -> TensorResult<()> {
        let d0 = self.shape.normalize(dim0)?;
        let d1 = self.shape.normalize(dim1)?;
        self.shape.swap(d0, d1);
        self.strides.swap(d0, d1);
        Ok(())
    }

    /// View with two dimensions swapped
    pub fn transpose(&self, dim0: isize, dim1: isize) -> TensorResult<Self> {
        let mut view = self.alias();
        view.transpose_(dim0, dim1)?;
        Ok(view)
    }

    /// View with dimensions reordered; `dims` must be a permutation of `0..rank`
    pub fn permute(&self, dims: &[usize]) -> TensorResult<Self> {
        let rank = self.rank();
        let mut seen = vec![false; rank];
        let valid = dims.len() == rank
            && dims.iter().all(|&d| d < rank && !std::mem::replace(&mut seen[d], true));
        if !valid {
            return Err(TensorError::ShapeError(format!(
                "{:?} is not a permutation of the {} dimensions",
                dims, rank
            )));
        }

        let mut view = self.alias();
        view.shape = dims.iter().map(|&d| self.shape[d]).collect();
        view.strides = dims.iter().map(|&d| self.strides[d]).collect();
        Ok(view)
    }

    /// View stretched to `shape` under broadcasting. Stretched dimensions
    /// get stride 0, so in-place arithmetic through the view is rejected.
    pub fn broadcast_to(&self, shape: impl Into<DimVector>) -> TensorResult<Self> {
        let shape = shape.into();
        let strides = broadcast_strides(&self.shape, &self.strides, &shape)?;
        let mut view = self.alias();
        view.shape = shape;
        view.strides = strides;
        Ok(view)
    }

    /// Dense row-major copy
    pub fn contiguous(&self) -> Self {
        Self::from_logical(self.to_vec(), self.shape.clone())
    }

    /// Row-major tensor over `values`, which must hold `shape.flat_size()` elements
    pub(crate) fn from_logical(values: Vec<T>, shape: DimVector) -> Self {
        debug_assert_eq!(values.len(), shape.flat_size());
        let strides = Layout::RowMajor.strides_for(&shape);
        Self {
            storage: Storage::from_vec(values),
            shape,
            strides,
            offset: 0,
            layout: Layout::RowMajor,
        }
    }

    /// Same elements under a new shape. Contiguous tensors are reshaped as a
    /// view; others are copied first.
    pub fn reshape(&self, shape: impl Into<DimVector>) -> TensorResult<Self> {
        let shape = shape.into();
        if shape.flat_size() != self.flat_size() {
            return Err(TensorError::shape_error(
                &format!("{} elements", self.flat_size()),
                &format!("shape {} with {}", shape, shape.flat_size()),
                None,
            ));
        }

        let mut view = if self.is_contiguous() { self.alias() } else { self.contiguous() };
        view.strides = Layout::RowMajor.strides_for(&shape);
        view.shape = shape;
        view.layout = Layout::RowMajor;
        Ok(view)
    }

    /// Change shape in place, keeping the leading elements in layout order
    /// and zero-filling the rest. Strides are re-derived from the layout.
    ///
    /// A dense tensor that is the only handle to its storage resizes that
    /// storage. Any other tensor moves to fresh storage, leaving the
    /// buffer it shared with other views untouched.
    pub fn resize_(&mut self, shape: impl Into<DimVector>) {
        let shape = shape.into();
        let exclusive = self.storage.handle_count() == 1
            && self.offset == 0
            && self.strides == self.layout.strides_for(&self.shape)
            && self.storage.len() == self.flat_size();

        if exclusive {
            self.storage.resize(shape.flat_size());
        } else {
            let mut values = self.layout_order_values();
            values.resize(shape.flat_size(), T::zero());
            self.storage = Storage::from_vec(values);
        }
        self.strides = self.layout.strides_for(&shape);
        self.shape = shape;
        self.offset = 0;
    }

    /// Elements in the order the layout stores them densely
    fn layout_order_values(&self) -> Vec<T> {
        match self.layout {
            Layout::RowMajor => self.to_vec(),
            Layout::ColumnMajor => {
                let shape: DimVector = self.shape.iter().rev().copied().collect();
                let strides: DimVector = self.strides.iter().rev().copied().collect();
                let data = self.storage.read();
                PositionIter::new(&shape, &strides, self.offset)
                    .map(|p| data[p])
                    .collect()
            }
        }
    }

    /// Shape and element equality
    pub fn equal(&self, other: &Tensor<T>) -> bool {
        self.shape == other.shape && self.to_vec() == other.to_vec()
    }

    /// Nested bracketed rendering with `precision` digits for floats
    pub fn to_string_with_precision(&self, precision: usize) -> String {
        if self.flat_size() == 0 {
            return "[]".to_string();
        }
        let data = self.storage.read();
        let mut out = String::from("[");
        self.render(&data, 0, self.offset, precision, &mut out);
        out.push(']');
        out
    }

    fn render(&self, data: &[T], dim: usize, pos: usize, precision: usize, out: &mut String) {
        let last = dim + 1 == self.rank();
        for i in 0..self.shape[dim] {
            let p = pos + i * self.strides[dim];
            if last {
                if i != 0 {
                    out.push(',');
                }
                out.push_str(&data[p].format(precision));
            } else {
                if i != 0 {
                    out.push_str(",\n");
                }
                out.push('[');
                self.render(data, dim + 1, p, precision, out);
                out.push(']');
            }
        }
    }

    /// Resolve a possibly negative dimension index
    pub(crate) fn dim_index(&self, dim: isize) -> TensorResult<usize> {
        normalize_index(dim, self.rank())
    }
}

/// Storage length needed to reach the last element of a strided view
fn span(shape: &DimVector, strides: &DimVector, offset: usize) -> usize {
    if shape.flat_size() == 0 {
        return 0;
    }
    offset
        + 1
        + shape
            .iter()
            .zip(strides.iter())
            .map(|(&size, &stride)| (size - 1) * stride)
            .sum::<usize>()
}

impl<T: Element> Clone for Tensor<T> {
    /// Deep copy of the storage; shape, strides and offset are kept as is
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
            layout: self.layout,
        }
    }
}

impl<T: Element> Default for Tensor<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Element> PartialEq for Tensor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl<T: Element> Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = config::get_config().tensor.display_precision;
        f.write_str(&self.to_string_with_precision(precision))
    }
}

impl<T: Element> Debug for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("dtype", &T::DTYPE)
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arange(shape: &[usize]) -> Tensor<f32> {
        let n: usize = shape.iter().product();
        Tensor::from_vec((0..n).map(|v| v as f32).collect(), shape).unwrap()
    }

    #[test]
    fn test_default_strides() {
        let shape = DimVector::from([2, 3, 4]);
        assert_eq!(Layout::RowMajor.strides_for(&shape), [12, 4, 1]);
        assert_eq!(Layout::ColumnMajor.strides_for(&shape), [1, 2, 6]);

        let t = Tensor::<f64>::with_layout([2, 3], Layout::ColumnMajor);
        assert_eq!(t.strides(), &[1, 2]);
        assert_eq!(t.storage().len(), 6);
    }

    #[test]
    fn test_constructors() {
        let t = Tensor::<i32>::ones([2, 2]);
        assert_eq!(t.to_vec(), vec![1, 1, 1, 1]);

        let s = Tensor::scalar(3.5f64);
        assert_eq!(s.shape(), &[1]);
        assert_eq!(s.item().unwrap(), 3.5);

        let e = Tensor::<f32>::empty();
        assert_eq!(e.rank(), 0);
        assert_eq!(e.flat_size(), 0);

        assert!(Tensor::from_vec(vec![1.0f32, 2.0], [3]).is_err());
    }

    #[test]
    fn test_custom_strides() {
        let t = Tensor::<f32>::with_strides([2, 2], [4, 1]).unwrap();
        assert_eq!(t.storage().len(), 6);
        assert!(Tensor::<f32>::with_strides([2, 2], [1]).is_err());

        let storage = Storage::from_vec(vec![0.0f32; 4]);
        assert!(Tensor::from_storage(storage.share(), [2, 2], [2, 1], 0).is_ok());
        assert!(Tensor::from_storage(storage, [2, 2], [2, 1], 1).is_err());
    }

    #[test]
    fn test_item_requires_single_element() {
        let t = Tensor::<f32>::zeros([2]);
        assert_eq!(t.item().unwrap_err().code(), crate::error::ErrorCode::InvalidState);
    }

    #[test]
    fn test_get_set() {
        let t = arange(&[2, 3]);
        assert_eq!(t.get(&[1, 2]).unwrap(), 5.0);
        t.set(&[0, 1], 10.0).unwrap();
        assert_eq!(t.get(&[0, 1]).unwrap(), 10.0);
        assert!(t.get(&[2, 0]).is_err());
        assert!(t.get(&[0]).is_err());
    }

    #[test]
    fn test_select_view_aliases_parent() {
        let t = arange(&[4, 4]);
        let view = t.select(&[Slice::range(1, 3), Slice::range(0, 4).with_step(2)]).unwrap();
        assert_eq!(view.shape(), &[2, 2]);
        assert_eq!(view.strides(), &[4, 2]);
        assert_eq!(view.offset(), 4);
        assert_eq!(view.to_vec(), vec![4.0, 6.0, 8.0, 10.0]);

        view.set(&[0, 0], -1.0).unwrap();
        assert_eq!(t.get(&[1, 0]).unwrap(), -1.0);
        assert!(view.shares_storage(&t));
    }

    #[test]
    fn test_select_fills_missing_dims() {
        let t = arange(&[2, 3]);
        let view = t.select(&[Slice::index(1)]).unwrap();
        assert_eq!(view.shape(), &[1, 3]);
        assert_eq!(view.to_vec(), vec![3.0, 4.0, 5.0]);
        assert!(t.select(&[Slice::full(), Slice::full(), Slice::full()]).is_err());
    }

    #[test]
    fn test_clone_is_isolated() {
        let t = arange(&[2, 2]);
        let copy = t.clone();
        copy.set(&[0, 0], 42.0).unwrap();
        assert_eq!(t.get(&[0, 0]).unwrap(), 0.0);
        assert!(!copy.shares_storage(&t));
    }

    #[test]
    fn test_transpose() {
        let t = arange(&[2, 3]);
        let tt = t.transpose(0, 1).unwrap();
        assert_eq!(tt.shape(), &[3, 2]);
        assert_eq!(tt.to_vec(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
        assert!(tt.shares_storage(&t));
        assert!(!tt.is_contiguous());

        assert_eq!(t.transpose(0, 0).unwrap(), t);
        assert_eq!(t.transpose(-1, -2).unwrap(), tt);
        assert!(t.transpose(0, 2).is_err());
    }

    #[test]
    fn test_permute() {
        let t = arange(&[2, 3, 4]);
        let p = t.permute(&[2, 0, 1]).unwrap();
        assert_eq!(p.shape(), &[4, 2, 3]);
        assert_eq!(p.get(&[3, 1, 2]).unwrap(), t.get(&[1, 2, 3]).unwrap());

        assert!(t.permute(&[0, 1]).is_err());
        assert!(t.permute(&[0, 1, 1]).is_err());
        assert!(t.permute(&[0, 1, 3]).is_err());
    }

    #[test]
    fn test_reshape_and_contiguous() {
        let t = arange(&[2, 3]);
        let r = t.reshape([3, 2]).unwrap();
        assert!(r.shares_storage(&t));
        assert_eq!(r.get(&[2, 1]).unwrap(), 5.0);

        let tt = t.transpose(0, 1).unwrap();
        let r = tt.reshape([6]).unwrap();
        assert!(!r.shares_storage(&t));
        assert_eq!(r.to_vec(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);

        assert!(t.reshape([4]).is_err());
    }

    #[test]
    fn test_broadcast_to() {
        let t = Tensor::from_vec(vec![1i32, 2, 3], [1, 3]).unwrap();
        let b = t.broadcast_to([2, 3]).unwrap();
        assert_eq!(b.to_vec(), vec![1, 2, 3, 1, 2, 3]);
        assert!(t.broadcast_to([2, 4]).is_err());
    }

    #[test]
    fn test_resize_preserves_prefix() {
        let mut t = Tensor::from_vec(vec![1i64, 2, 3, 4], [2, 2]).unwrap();
        t.resize_([3, 2]);
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.to_vec(), vec![1, 2, 3, 4, 0, 0]);
        t.resize_([3]);
        assert_eq!(t.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_resize_view_leaves_parent_intact() {
        let t = arange(&[4, 4]);
        let mut row = t.select(&[Slice::range(0, 1)]).unwrap();
        row.resize_([2]);
        assert_eq!(row.to_vec(), vec![0.0, 1.0]);
        assert!(!row.shares_storage(&t));
        assert_eq!(t.storage().len(), 16);
        assert_eq!(t.to_vec(), arange(&[4, 4]).to_vec());

        let mut col = t.select(&[Slice::full(), Slice::index(1)]).unwrap();
        col.resize_([6]);
        assert_eq!(col.to_vec(), vec![1.0, 5.0, 9.0, 13.0, 0.0, 0.0]);
    }

    #[test]
    fn test_resize_alias_keeps_other_handle() {
        let t = Tensor::from_vec(vec![1i32, 2, 3, 4], [2, 2]).unwrap();
        let mut handle = t.alias();
        handle.resize_([1]);
        assert_eq!(handle.to_vec(), vec![1]);
        assert_eq!(t.to_vec(), vec![1, 2, 3, 4]);

        let mut cm = Tensor::<i32>::with_layout([2, 2], Layout::ColumnMajor);
        cm.set(&[1, 0], 7).unwrap();
        let keep = cm.alias();
        cm.resize_([3]);
        assert_eq!(cm.to_vec(), vec![0, 7, 0]);
        assert_eq!(keep.get(&[1, 0]).unwrap(), 7);
    }

    #[test]
    fn test_render() {
        let t = arange(&[2, 3]);
        assert_eq!(
            t.to_string_with_precision(1),
            "[[0.0,1.0,2.0],\n[3.0,4.0,5.0]]"
        );

        let ints = Tensor::from_vec(vec![1i32, 2, 3, 4, 5, 6, 7, 8], [2, 2, 2]).unwrap();
        assert_eq!(
            ints.to_string_with_precision(4),
            "[[[1,2],\n[3,4]],\n[[5,6],\n[7,8]]]"
        );

        assert_eq!(Tensor::<f32>::empty().to_string_with_precision(2), "[]");
        assert_eq!(Tensor::<i8>::zeros([2, 0]).to_string_with_precision(2), "[]");
        assert_eq!(Tensor::from_vec(vec![7u8], [1]).unwrap().to_string_with_precision(2), "[7]");
    }
}
