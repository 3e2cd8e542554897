//! Strided position traversal and broadcasting arithmetic

use super::dim::DimVector;
use crate::error::{TensorError, TensorResult};

/// Yields the storage position of every element of a strided view in
/// logical (last dimension fastest) order
#[derive(Debug, Clone)]
pub struct PositionIter {
    shape: DimVector,
    strides: DimVector,
    index: DimVector,
    position: usize,
    remaining: usize,
}

impl PositionIter {
    pub fn new(shape: &DimVector, strides: &DimVector, offset: usize) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        Self {
            shape: shape.clone(),
            strides: strides.clone(),
            index: DimVector::new(shape.len()),
            position: offset,
            remaining: shape.flat_size(),
        }
    }

    /// Same positions, with dimensions reordered so the smallest stride is
    /// innermost. Visits every position exactly once, in memory order for
    /// permuted views.
    pub fn memory_order(shape: &DimVector, strides: &DimVector, offset: usize) -> Self {
        let mut order: Vec<usize> = (0..shape.len()).collect();
        order.sort_by(|&a, &b| strides[b].cmp(&strides[a]));

        let shape: DimVector = order.iter().map(|&d| shape[d]).collect();
        let strides: DimVector = order.iter().map(|&d| strides[d]).collect();
        Self::new(&shape, &strides, offset)
    }
}

impl Iterator for PositionIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.position;
        self.remaining -= 1;

        if self.remaining > 0 {
            for d in (0..self.shape.len()).rev() {
                self.index[d] += 1;
                self.position += self.strides[d];
                if self.index[d] < self.shape[d] {
                    break;
                }
                self.position -= self.strides[d] * self.index[d];
                self.index[d] = 0;
            }
        }

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PositionIter {}

/// Flat storage position of a multi-index
pub fn position_of(index: &[usize], strides: &DimVector, offset: usize) -> usize {
    offset
        + index
            .iter()
            .zip(strides.iter())
            .map(|(i, s)| i * s)
            .sum::<usize>()
}

/// Shape produced by broadcasting `a` against `b`
pub fn broadcast_shape(a: &DimVector, b: &DimVector) -> TensorResult<DimVector> {
    let rank = a.len().max(b.len());
    let mut out = DimVector::new(rank);

    for i in 0..rank {
        let da = if i < a.len() { a[a.len() - 1 - i] } else { 1 };
        let db = if i < b.len() { b[b.len() - 1 - i] } else { 1 };

        out[rank - 1 - i] = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return Err(TensorError::ShapeError(format!(
                "Cannot broadcast shapes {} and {}",
                a, b
            )));
        };
    }

    Ok(out)
}

/// Strides that read a `shape`/`strides` view as if it had `target` shape.
/// Broadcast dimensions get stride 0.
pub fn broadcast_strides(
    shape: &DimVector,
    strides: &DimVector,
    target: &DimVector,
) -> TensorResult<DimVector> {
    if shape.len() > target.len() {
        return Err(TensorError::ShapeError(format!(
            "Cannot broadcast shape {} to lower-rank shape {}",
            shape, target
        )));
    }

    let lead = target.len() - shape.len();
    let mut out = DimVector::new(target.len());

    for (d, &size) in shape.iter().enumerate() {
        let t = target[lead + d];
        out[lead + d] = if size == t {
            strides[d]
        } else if size == 1 {
            0
        } else {
            return Err(TensorError::ShapeError(format!(
                "Cannot broadcast shape {} to {}",
                shape, target
            )));
        };
    }

    Ok(out)
}

/// Dimensions of `target` that were stretched from `source`, in ascending order
pub fn broadcast_axes(source: &DimVector, target: &DimVector) -> Vec<usize> {
    let lead = target.len().saturating_sub(source.len());
    (0..target.len())
        .filter(|&d| d < lead || (source[d - lead] == 1 && target[d] != 1))
        .collect()
}
