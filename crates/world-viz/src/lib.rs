//! World Visualization Host
//!
//! Loads a simulation world, gives every model a visual in a render widget and
//! exposes a thread-safe [`World`] facade for joint states, transforms, camera
//! control and frame capture.
//!
//! The widget is only ever touched by the thread that runs its event loop.
//! With [`ThreadedHost`] that is a dedicated render thread; requests from
//! other threads are handed over one at a time and block until acknowledged.

pub mod config;
mod error;
mod frame;
pub mod host;
mod request;
mod session;
mod world;

pub use config::{ConfigError, ConfigManager, Scheduling, TimingConfig, WorldConfig};
pub use error::WorldError;
pub use frame::Frame;
pub use host::{HostContext, InlineHost, Phase, RenderHost, ThreadedHost};
pub use request::{PendingRequest, Response, VisualSnapshot};
pub use world::{InlineWorld, ThreadedWorld, World};
