use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use super::dtype::Element;

/// Reference-counted flat element buffer.
///
/// Handles produced by [`Storage::share`] point at the same buffer, so writes
/// through one are visible through all of them. `Clone` copies the elements
/// into a fresh buffer.
#[derive(Debug)]
pub struct Storage<T: Element> {
    data: Arc<RwLock<Vec<T>>>,
}

impl<T: Element> Storage<T> {
    /// Zero-filled storage of `len` elements
    pub fn new(len: usize) -> Self {
        Self::from_vec(vec![T::zero(); len])
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Another handle to the same buffer
    pub fn share(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }

    /// Whether both handles point at the same buffer
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Number of live handles to this buffer
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.data.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.data.write()
    }

    /// Grow with zeros or truncate, keeping the overlapping prefix
    pub fn resize(&self, len: usize) {
        self.data.write().resize(len, T::zero());
    }

    pub fn fill(&self, value: T) {
        self.data.write().iter_mut().for_each(|v| *v = value);
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.data.read().clone()
    }
}

impl<T: Element> Clone for Storage<T> {
    fn clone(&self) -> Self {
        Self::from_vec(self.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_aliases_buffer() {
        let storage = Storage::<f32>::new(4);
        let alias = storage.share();
        alias.write()[2] = 5.0;

        assert!(storage.ptr_eq(&alias));
        assert_eq!(storage.handle_count(), 2);
        assert_eq!(storage.to_vec(), vec![0.0, 0.0, 5.0, 0.0]);
    }

    #[test]
    fn test_clone_is_deep() {
        let storage = Storage::from_vec(vec![1i32, 2, 3]);
        let copy = storage.clone();
        copy.fill(9);

        assert!(!storage.ptr_eq(&copy));
        assert_eq!(storage.to_vec(), vec![1, 2, 3]);
        assert_eq!(copy.to_vec(), vec![9, 9, 9]);
    }

    #[test]
    fn test_resize_preserves_prefix() {
        let storage = Storage::from_vec(vec![1u8, 2, 3]);
        storage.resize(5);
        assert_eq!(storage.to_vec(), vec![1, 2, 3, 0, 0]);
        storage.resize(2);
        assert_eq!(storage.to_vec(), vec![1, 2]);
        assert_eq!(storage.len(), 2);
    }
}
