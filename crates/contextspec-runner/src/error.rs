//! Runner error types.

use contextspec_types::{ConstructionError, ContextPath};
use thiserror::Error;

/// The instance backing a context could not be created.
///
/// Cached by the instance graph and shared by every context built on top of
/// the failed one, so each dependent example reports the original cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to construct context {context}: {source}")]
pub struct InstanceError {
    pub context: ContextPath,
    pub source: ConstructionError,
}

/// A run configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid run configuration: {0}")]
    Json(#[from] serde_json::Error),
}
