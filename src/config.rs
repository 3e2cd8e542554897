//! Engine configuration with JSON persistence

use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::TensorResult;
use crate::tensor::Layout;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorConfig {
    /// Layout used by shape-only constructors
    pub default_layout: Layout,
    /// Digits after the decimal point when rendering floating tensors
    pub display_precision: usize,
}

impl Default for TensorConfig {
    fn default() -> Self {
        Self {
            default_layout: Layout::RowMajor,
            display_precision: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutogradConfig {
    /// Drop operation contexts and input edges once `backward()` finishes
    pub release_graph_after_backward: bool,
    /// Sum broadcast gradients back to each operand's shape
    pub reduce_broadcast_grads: bool,
}

impl Default for AutogradConfig {
    fn default() -> Self {
        Self {
            release_graph_after_backward: false,
            reduce_broadcast_grads: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub tensor: TensorConfig,
    #[serde(default)]
    pub autograd: AutogradConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Shared configuration handle, optionally backed by a JSON file
#[derive(Debug, Default)]
pub struct ConfigManager {
    config: Arc<RwLock<EngineConfig>>,
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_file(mut self, path: PathBuf) -> Self {
        self.config_file = Some(path);
        self
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn load_from_file(&mut self, path: &Path) -> TensorResult<()> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;

        *self.config.write() = config;
        self.config_file = Some(path.to_path_buf());

        tracing::debug!("Configuration loaded from {:?}", path);
        Ok(())
    }

    pub fn save_to_file(&self, path: &Path) -> TensorResult<()> {
        let content = serde_json::to_string_pretty(&*self.config.read())?;
        std::fs::write(path, content)?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    pub fn get_config(&self) -> EngineConfig {
        self.config.read().clone()
    }

    /// Apply `f` to a copy of the configuration and install the result.
    /// `f` runs without any lock held, so it may read the configuration.
    pub fn update_config<F>(&mut self, f: F) -> TensorResult<()>
    where
        F: FnOnce(&mut EngineConfig),
    {
        let mut updated = self.get_config();
        f(&mut updated);
        *self.config.write() = updated;

        if let Some(ref path) = self.config_file {
            self.save_to_file(path)?;
        }

        Ok(())
    }

    pub fn set_config(&mut self, config: EngineConfig) -> TensorResult<()> {
        self.update_config(|current| *current = config)
    }
}

lazy_static! {
    static ref CONFIG_MANAGER: RwLock<ConfigManager> = RwLock::new(ConfigManager::new());
}

/// Get the global configuration
pub fn get_config() -> EngineConfig {
    CONFIG_MANAGER.read().get_config()
}

/// Update the global configuration. `f` runs on a copy before any lock is
/// taken, so it may build tensors or call [`get_config`].
pub fn update_config<F>(f: F) -> TensorResult<()>
where
    F: FnOnce(&mut EngineConfig),
{
    let mut updated = get_config();
    f(&mut updated);
    CONFIG_MANAGER.write().set_config(updated)
}

/// Load the global configuration from a JSON file
pub fn load_config_from_file(path: &Path) -> TensorResult<()> {
    CONFIG_MANAGER.write().load_from_file(path)
}

/// Builder for assembling a configuration section by section
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: EngineConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tensor(mut self, f: impl FnOnce(&mut TensorConfig)) -> Self {
        f(&mut self.config.tensor);
        self
    }

    pub fn autograd(mut self, f: impl FnOnce(&mut AutogradConfig)) -> Self {
        f(&mut self.config.autograd);
        self
    }

    pub fn logging(mut self, f: impl FnOnce(&mut LoggingConfig)) -> Self {
        f(&mut self.config.logging);
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }

    /// Install the built configuration as the global one
    pub fn apply(self) -> TensorResult<()> {
        update_config(|config| *config = self.config)
    }
}
