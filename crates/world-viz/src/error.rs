//! Error types for the world facade

use std::time::Duration;

use world_core::LoadError;
use world_renderer::RenderError;

use crate::config::ConfigError;

/// Errors returned by [`crate::World`] and the render hosts
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// A request was malformed and dropped before reaching the render thread
    #[error("Invalid request: {0}")]
    Config(String),

    #[error("Render thread did not stop within {0:?}; it was abandoned")]
    TeardownTimeout(Duration),

    #[error("Render host is not running")]
    NotRunning,

    #[error("Render thread disconnected")]
    Disconnected,

    #[error("Failed to spawn render thread: {0}")]
    Spawn(String),

    #[error("Request failed on the render thread: {0}")]
    RequestFailed(String),

    #[error("Unexpected response to {0} request")]
    UnexpectedResponse(&'static str),

    #[error("Failed to write image: {0}")]
    Image(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),
}
