//! World Renderer
//!
//! Renderer side of the world visualization host.
//!
//! # Architecture
//!
//! - [`widget::RenderWidget`] - scene-graph widget interface, used from one thread only
//! - [`widget::WidgetFactory`] - creates widgets on the thread that will own them
//! - [`events::EventQueue`] - pending widget events, postable from any thread
//! - [`frames::FrameTree`] - named frames placed relative to each other
//! - [`camera::Camera`] - projection and view, moved by a [`camera::CameraManipulator`]
//! - [`headless::HeadlessWidget`] - off-screen widget backed by a software rasterizer

pub mod camera;
pub mod events;
pub mod frames;
pub mod headless;
pub mod raster;
pub mod scene;
pub mod widget;

pub use camera::{Camera, CameraManipulator, CameraParams, MAX_DIMENSION};
pub use events::{EventCategory, EventFilter, EventQueue, WidgetEvent};
pub use frames::{FrameTransform, FrameTree};
pub use headless::{HeadlessFactory, HeadlessWidget};
pub use scene::{Scene, VisualObject};
pub use widget::{
    DisplayOptions, RenderError, RenderWidget, VisualDescription, WidgetConfig, WidgetFactory,
};
