use crate::error::{TensorError, TensorResult};

/// Per-dimension `(start, end, step)` selection.
///
/// Absent bounds default to `0`, the dimension size and `1`. Negative bounds
/// count from the end of the dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<isize>,
    pub end: Option<isize>,
    pub step: Option<usize>,
}

/// Concrete bounds of a slice against one dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSlice {
    pub start: usize,
    pub len: usize,
    pub step: usize,
}

impl Slice {
    pub fn new(start: Option<isize>, end: Option<isize>, step: Option<usize>) -> Self {
        Self { start, end, step }
    }

    /// The whole dimension
    pub fn full() -> Self {
        Self::default()
    }

    pub fn range(start: isize, end: isize) -> Self {
        Self::new(Some(start), Some(end), None)
    }

    /// A single position, kept as a length-1 dimension
    pub fn index(i: isize) -> Self {
        let end = if i == -1 { None } else { Some(i + 1) };
        Self::new(Some(i), end, None)
    }

    pub fn with_step(mut self, step: usize) -> Self {
        self.step = Some(step);
        self
    }

    pub fn resolve(&self, size: usize) -> TensorResult<ResolvedSlice> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(TensorError::ShapeError("Slice step must be at least 1".to_string()));
        }

        let bound = |value: isize| -> TensorResult<usize> {
            let resolved = if value < 0 { value + size as isize } else { value };
            if resolved < 0 || resolved as usize > size {
                return Err(TensorError::index_error("Slice", value, size));
            }
            Ok(resolved as usize)
        };

        let start = self.start.map(bound).transpose()?.unwrap_or(0);
        let end = self.end.map(bound).transpose()?.unwrap_or(size);
        if start > end {
            return Err(TensorError::ShapeError(format!(
                "Slice start {} is past its end {}",
                start, end
            )));
        }

        Ok(ResolvedSlice {
            start,
            len: (end - start).div_ceil(step),
            step,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_dimension() {
        let r = Slice::full().resolve(5).unwrap();
        assert_eq!(r, ResolvedSlice { start: 0, len: 5, step: 1 });
    }

    #[test]
    fn test_stepped_length_rounds_up() {
        let r = Slice::range(1, 6).with_step(2).resolve(6).unwrap();
        assert_eq!(r, ResolvedSlice { start: 1, len: 3, step: 2 });
    }

    #[test]
    fn test_negative_bounds() {
        let r = Slice::range(-3, -1).resolve(5).unwrap();
        assert_eq!(r, ResolvedSlice { start: 2, len: 2, step: 1 });
        assert_eq!(Slice::index(-1).resolve(4).unwrap().start, 3);
        assert_eq!(Slice::index(-1).resolve(4).unwrap().len, 1);
    }

    #[test]
    fn test_invalid_slices() {
        assert!(Slice::range(0, 7).resolve(5).is_err());
        assert!(Slice::range(3, 1).resolve(5).is_err());
        assert!(Slice::full().with_step(0).resolve(5).is_err());
        assert_eq!(Slice::range(2, 2).resolve(5).unwrap().len, 0);
    }
}
