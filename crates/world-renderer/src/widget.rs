//! RenderWidget trait definition.

use glam::{DQuat, DVec3};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::{CameraManipulator, CameraParams};
use crate::events::EventFilter;
use crate::frames::FrameTransform;

/// Errors raised by widgets and widget factories.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to create widget: {0}")]
    Create(String),

    #[error("Failed to add visual '{name}': {reason}")]
    Visual { name: String, reason: String },
}

/// Visibility of helper elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Ground grid on the z = 0 plane.
    pub show_grid: bool,
    /// Axes at the world origin.
    pub show_axes: bool,
    /// Per-model markers and axis triads.
    pub show_markers: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_axes: false,
            show_markers: true,
        }
    }
}

/// Settings a widget is created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WidgetConfig {
    pub title: String,
    pub camera: CameraParams,
    pub manipulator: CameraManipulator,
    pub display: DisplayOptions,
}

/// What a widget needs to build the visual for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualDescription {
    /// Plugin name of the visual, the model's unique name.
    pub name: String,
    /// Frame the visual is drawn in.
    pub frame: String,
    /// Standalone SDF document of the model.
    pub sdf: String,
    /// Joints the visual can articulate.
    pub joints: Vec<String>,
}

/// A scene-graph widget that renders models and captures images.
///
/// Widgets are not required to be `Send`: every call happens on the thread
/// that created the widget.
pub trait RenderWidget {
    /// Creates the visual for a model and parents it to the widget.
    fn add_visual(&mut self, visual: VisualDescription) -> Result<Uuid, RenderError>;

    /// Removes a visual. Returns false if the id is unknown.
    fn remove_visual(&mut self, id: Uuid) -> bool;

    /// Applies joint positions to a visual. Unknown joints are skipped.
    ///
    /// Returns the number of joints applied.
    fn update_joints(&mut self, id: Uuid, joints: &[(String, f64)]) -> usize;

    /// Places frame `source` in frame `target`.
    fn set_transformation(&mut self, target: &str, source: &str, position: DVec3, orientation: DQuat);

    /// Current transform of `frame` relative to its parent.
    fn transformation(&self, frame: &str) -> Option<FrameTransform>;

    fn set_camera_view(&mut self, eye: DVec3, look_at: DVec3, up: DVec3);

    fn set_projection(&mut self, params: &CameraParams);

    fn enable_grabbing(&mut self);

    fn disable_grabbing(&mut self);

    /// Renders the current scene into an image.
    fn grab(&mut self) -> RgbaImage;

    fn show(&mut self);

    fn hide(&mut self);

    fn is_visible(&self) -> bool;

    fn is_minimized(&self) -> bool {
        false
    }

    /// Closes any open windows.
    fn close_windows(&mut self) {
        self.hide();
    }

    /// Dispatches one batch of pending events. Returns how many were handled.
    fn process_events(&mut self, filter: EventFilter) -> usize;
}

/// Creates widgets on the thread that will own them.
pub trait WidgetFactory: Send + Sync {
    fn create(&self, config: &WidgetConfig) -> Result<Box<dyn RenderWidget>, RenderError>;
}

impl<F> WidgetFactory for F
where
    F: Fn(&WidgetConfig) -> Result<Box<dyn RenderWidget>, RenderError> + Send + Sync,
{
    fn create(&self, config: &WidgetConfig) -> Result<Box<dyn RenderWidget>, RenderError> {
        self(config)
    }
}
