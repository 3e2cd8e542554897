//! Strided n-dimensional tensors
//!
//! This module provides the numeric core:
//! - Shapes and strides as small inline vectors
//! - Reference-counted storage shared between zero-copy views
//! - Broadcasting arithmetic, reductions and dimension folds
//! - Select, transpose, permute and reshape views
//! - A pluggable linear-algebra backend for matmul and inverse

pub mod any;
pub mod core;
pub mod dim;
pub mod dtype;
pub mod iter;
pub mod linalg;
pub mod ops;
pub mod random;
pub mod slice;
pub mod storage;

// Re-export main types for convenience
pub use any::{AnyElement, AnyTensor};
pub use self::core::{Layout, Tensor};
pub use dim::DimVector;
pub use dtype::{DType, Element};
pub use iter::{broadcast_shape, PositionIter};
pub use linalg::{CpuBackend, LinalgBackend};
pub use random::set_seed;
pub use slice::Slice;
pub use storage::Storage;
