//! Render hosts
//!
//! A host owns the render session and decides which thread it runs on.
//! [`InlineHost`] keeps it on the caller's thread; [`ThreadedHost`] starts a
//! dedicated render thread and forwards requests over the event bridge.

mod bridge;
mod inline;
mod thread;

pub use inline::InlineHost;
pub use thread::{Phase, ThreadedHost};

use std::sync::Arc;

use world_core::WorldDescriptor;
use world_renderer::WidgetFactory;

use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::request::{PendingRequest, Response};

/// Everything needed to open a render session
#[derive(Clone)]
pub struct HostContext {
    pub descriptor: Arc<WorldDescriptor>,
    pub config: Arc<WorldConfig>,
    pub factory: Arc<dyn WidgetFactory>,
}

impl HostContext {
    pub fn new(
        descriptor: WorldDescriptor,
        config: WorldConfig,
        factory: Arc<dyn WidgetFactory>,
    ) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            config: Arc::new(config),
            factory,
        }
    }
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("world", &self.descriptor.name)
            .field("models", &self.descriptor.len())
            .finish_non_exhaustive()
    }
}

/// Runs a render session and serves requests against it
pub trait RenderHost {
    /// Start the session. Returns once it is running; a no-op if it already is.
    fn initialize(&self, context: &HostContext) -> Result<(), WorldError>;

    /// Stop the session and release the widget. A no-op when stopped.
    fn deinitialize(&self) -> Result<(), WorldError>;

    /// Block until the session has completed a processing cycle, or return
    /// at once when it is stopped.
    fn wait(&self);

    fn is_running(&self) -> bool;

    /// Run a request against the session and return its response.
    fn submit(&self, request: PendingRequest) -> Result<Response, WorldError>;
}
