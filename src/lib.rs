//! tensorgrad - strided tensors with a reverse-mode autograd graph
//!
//! Features:
//! - N-dimensional tensors over shared, reference-counted storage
//! - Zero-copy select, transpose, permute and reshape views
//! - Broadcasting arithmetic and reductions
//! - Dynamic autograd graph with topological-order gradient replay
//! - Finite difference gradient checking
//!
//! ```
//! use tensorgrad::autograd::{matmul, sum, Variable};
//!
//! let x = Variable::<f64>::ones([2, 3], true);
//! let w = Variable::<f64>::ones([3, 2], true);
//! let y = sum(&matmul(&x, &w).unwrap()).unwrap();
//! y.backward().unwrap();
//! assert_eq!(x.grad().unwrap().to_vec(), vec![2.0; 6]);
//! ```

pub mod autograd;
pub mod config;
pub mod error;
pub mod tensor;

pub use autograd::{Executor, Operation, Variable};
pub use config::{ConfigBuilder, ConfigManager, EngineConfig};
pub use error::{TensorError, TensorResult};
pub use tensor::{set_seed, AnyTensor, DType, DimVector, Element, Layout, Slice, Tensor};

use tracing_subscriber::filter::LevelFilter;

/// Install a formatting subscriber at the configured log level.
///
/// Calling it again after a subscriber is installed is not an error.
pub fn init() -> TensorResult<()> {
    let level_name = config::get_config().logging.level;
    let level: LevelFilter = level_name.parse().map_err(|_| {
        TensorError::ConfigurationError(format!("Unknown log level '{}'", level_name))
    })?;

    if tracing_subscriber::fmt().with_max_level(level).try_init().is_ok() {
        tracing::info!("tensorgrad {} initialized", version());
    }
    Ok(())
}

/// Get the crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
