//! Small integer sequences used for shapes and strides

use smallvec::SmallVec;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::error::{TensorError, TensorResult};

/// Most tensors have 4 or fewer dimensions, so up to 4 entries live inline
const STACK_DIMS: usize = 4;

/// Dimension sizes or per-dimension strides.
///
/// Indexing through [`DimVector::get`] and [`DimVector::set`] accepts negative
/// positions, which count from the end (`-1` is the last entry).
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct DimVector {
    dims: SmallVec<[usize; STACK_DIMS]>,
}

impl DimVector {
    /// Zero-filled vector of the given length
    pub fn new(len: usize) -> Self {
        Self {
            dims: SmallVec::from_elem(0, len),
        }
    }

    pub fn from_slice(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.dims
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.dims.to_vec()
    }

    /// Resolve a possibly negative index to a position in `[0, len)`
    pub fn normalize(&self, index: isize) -> TensorResult<usize> {
        normalize_index(index, self.dims.len())
    }

    /// Whether `index` resolves to a valid position
    pub fn in_range(&self, index: isize) -> bool {
        self.normalize(index).is_ok()
    }

    pub fn get(&self, index: isize) -> TensorResult<usize> {
        let i = self.normalize(index)?;
        Ok(self.dims[i])
    }

    pub fn set(&mut self, index: isize, value: usize) -> TensorResult<()> {
        let i = self.normalize(index)?;
        self.dims[i] = value;
        Ok(())
    }

    pub fn push_back(&mut self, value: usize) {
        self.dims.push(value);
    }

    /// Remove the entry at `index`, shifting the rest left
    pub fn erase(&mut self, index: isize) -> TensorResult<usize> {
        let i = self.normalize(index)?;
        Ok(self.dims.remove(i))
    }

    /// Grow with zeros or truncate, keeping the overlapping prefix
    pub fn resize(&mut self, len: usize) {
        self.dims.resize(len, 0);
    }

    /// Product of all entries; 0 for an empty vector or any zero entry
    pub fn flat_size(&self) -> usize {
        if self.dims.is_empty() {
            return 0;
        }
        self.dims.iter().product()
    }
}

/// Resolve an index against a length; negative values count from the end
pub(crate) fn normalize_index(index: isize, len: usize) -> TensorResult<usize> {
    let resolved = if index < 0 { index + len as isize } else { index };
    if resolved < 0 || resolved as usize >= len {
        return Err(TensorError::index_error("Dimension", index, len));
    }
    Ok(resolved as usize)
}

impl Deref for DimVector {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.dims
    }
}

impl DerefMut for DimVector {
    fn deref_mut(&mut self) -> &mut [usize] {
        &mut self.dims
    }
}

impl From<&[usize]> for DimVector {
    fn from(dims: &[usize]) -> Self {
        Self::from_slice(dims)
    }
}

impl From<Vec<usize>> for DimVector {
    fn from(dims: Vec<usize>) -> Self {
        Self {
            dims: SmallVec::from_vec(dims),
        }
    }
}

impl<const N: usize> From<[usize; N]> for DimVector {
    fn from(dims: [usize; N]) -> Self {
        Self::from_slice(&dims)
    }
}

impl From<&DimVector> for DimVector {
    fn from(dims: &DimVector) -> Self {
        dims.clone()
    }
}

impl FromIterator<usize> for DimVector {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            dims: iter.into_iter().collect(),
        }
    }
}

impl PartialEq<[usize]> for DimVector {
    fn eq(&self, other: &[usize]) -> bool {
        self.dims.as_slice() == other
    }
}

impl<const N: usize> PartialEq<[usize; N]> for DimVector {
    fn eq(&self, other: &[usize; N]) -> bool {
        self.dims.as_slice() == other.as_slice()
    }
}

impl fmt::Debug for DimVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.dims.as_slice())
    }
}

impl fmt::Display for DimVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.dims.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let dims = DimVector::new(3);
        assert_eq!(dims, [0, 0, 0]);
        assert_eq!(dims.len(), 3);
    }

    #[test]
    fn test_negative_indexing() {
        let mut dims = DimVector::from([2, 3, 4]);
        assert_eq!(dims.get(-1).unwrap(), 4);
        assert_eq!(dims.get(-3).unwrap(), 2);
        dims.set(-2, 7).unwrap();
        assert_eq!(dims, [2, 7, 4]);

        assert!(dims.get(3).is_err());
        assert!(dims.get(-4).is_err());
        assert!(dims.in_range(-3));
        assert!(!dims.in_range(-4));
    }

    #[test]
    fn test_push_erase_resize() {
        let mut dims = DimVector::from([1, 2, 3]);
        dims.push_back(4);
        assert_eq!(dims, [1, 2, 3, 4]);

        assert_eq!(dims.erase(1).unwrap(), 2);
        assert_eq!(dims, [1, 3, 4]);
        assert!(dims.erase(5).is_err());

        dims.resize(5);
        assert_eq!(dims, [1, 3, 4, 0, 0]);
        dims.resize(2);
        assert_eq!(dims, [1, 3]);
    }

    #[test]
    fn test_flat_size() {
        assert_eq!(DimVector::from([2, 3, 4]).flat_size(), 24);
        assert_eq!(DimVector::from([2, 0, 4]).flat_size(), 0);
        assert_eq!(DimVector::new(0).flat_size(), 0);
        assert_eq!(DimVector::from([1]).flat_size(), 1);
    }

    #[test]
    fn test_spills_past_inline_capacity() {
        let dims: DimVector = (1..=6).collect();
        assert_eq!(dims.flat_size(), 720);
        assert_eq!(format!("{}", dims), "[1, 2, 3, 4, 5, 6]");
    }
}
