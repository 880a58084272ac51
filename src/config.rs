//! Processing configuration.
//!
//! [Config] bundles the default options of the configurable operations and
//! can be loaded from TOML:
//!
//! ```toml
//! [heal]
//! method = "leafs_roots"
//! max_dist = 2000.0
//! on_disconnected = "drop"
//!
//! [split]
//! flow_threshold = 0.9
//! flow_mode = "centrifugal"
//!
//! [batch]
//! parallel = true
//! omit_failures = true
//! ```
//!
//! Every section and field is optional and falls back to its default.
//! [ProcessingContext] carries the runtime settings of a batch run (quiet
//! flag, batch options, progress hook) explicitly instead of through
//! process-wide state.

use crate::batch::BatchOptions;
use crate::error::ConfigError;
use crate::heal::HealOptions;
use crate::polarity::SplitOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// =#========================================================================#=
// CONFIG
// =#========================================================================#=
/// Default options for healing, splitting and batch processing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Options for [`Skeleton::heal`](crate::model::Skeleton::heal)
    pub heal: HealOptions,
    /// Options for the axon/dendrite split
    pub split: SplitOptions,
    /// Options for [map_skeletons](crate::batch::map_skeletons)
    pub batch: BatchOptions,
}

impl Config {
    /// Parses and validates a TOML string.
    ///
    /// # Errors
    /// [ConfigError::Parse] for malformed TOML or unknown values,
    /// [ConfigError::Invalid] for out-of-range values.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    ///
    /// # Errors
    /// [ConfigError::Io] if the file cannot be read, otherwise as
    /// [`Config::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    /// [ConfigError::Invalid] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        let threshold = self.split.flow_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "split.flow_threshold must be in (0, 1], got {threshold}"
            )));
        }
        if let Some(max_dist) = self.heal.max_dist {
            if max_dist.is_nan() || max_dist < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "heal.max_dist must be non-negative, got {max_dist}"
                )));
            }
        }
        Ok(())
    }

    /// Serialises the configuration as TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

// =#========================================================================#=
// PROCESSING CONTEXT
// =#========================================================================#=
/// Progress callback: `(finished, total)`.
pub type ProgressHook = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Runtime settings passed explicitly to batch operations.
#[derive(Clone, Default)]
pub struct ProcessingContext {
    /// Suppress per-item logging
    pub quiet: bool,
    /// Batch behaviour
    pub batch: BatchOptions,
    /// Called after every finished item
    pub progress: Option<ProgressHook>,
}

impl ProcessingContext {
    /// Context with default batch options and no progress hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context taking its batch options and quiet flag from `config`.
    pub fn from_config(config: &Config) -> Self {
        ProcessingContext {
            quiet: config.batch.quiet,
            batch: config.batch,
            progress: None,
        }
    }

    /// Sets the batch options.
    pub fn with_batch(mut self, batch: BatchOptions) -> Self {
        self.batch = batch;
        self
    }

    /// Sets a progress hook.
    pub fn with_progress<F>(mut self, hook: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(hook));
        self
    }

    /// Silences per-item logging.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

impl fmt::Debug for ProcessingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingContext")
            .field("quiet", &self.quiet)
            .field("batch", &self.batch)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
