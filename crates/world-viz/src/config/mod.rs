//! World host configuration module
//!
//! This module handles the settings a [`crate::World`] is built from: the
//! world file, model search paths, camera and the render host timings.

mod manager;

pub use manager::{ConfigError, ConfigManager};

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use world_renderer::{CameraManipulator, CameraParams, DisplayOptions, WidgetConfig};

/// How the renderer is scheduled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Scheduling {
    /// Renderer runs on the calling thread; suited to single-caller tools
    Inline,
    /// Renderer runs on its own thread behind the event bridge
    #[default]
    DedicatedThread,
}

/// Delays and bounds used by the render host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause after the render thread reports startup
    pub startup_settle_ms: u64,
    /// Pause after each acknowledged request
    pub request_yield_ms: u64,
    /// Event processing interval while no request is pending
    pub idle_interval_ms: u64,
    /// Upper bound for stopping the render thread
    pub teardown_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            startup_settle_ms: 100,
            request_yield_ms: 1,
            idle_interval_ms: 10,
            teardown_timeout_ms: 3000,
        }
    }
}

impl TimingConfig {
    /// Timings without the fixed settle/yield pauses
    pub fn immediate() -> Self {
        Self {
            startup_settle_ms: 0,
            request_yield_ms: 0,
            ..Self::default()
        }
    }

    pub fn startup_settle(&self) -> Duration {
        Duration::from_millis(self.startup_settle_ms)
    }

    pub fn request_yield(&self) -> Duration {
        Duration::from_millis(self.request_yield_ms)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms.max(1))
    }

    pub fn teardown_timeout(&self) -> Duration {
        Duration::from_millis(self.teardown_timeout_ms)
    }
}

/// Complete world host configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Configuration format version
    pub version: u32,
    /// World description file
    pub world_path: PathBuf,
    /// Extra roots for `model://` includes, searched first
    pub model_paths: Vec<PathBuf>,
    /// Models that get no visual
    pub ignored_models: Vec<String>,
    /// Show the render window
    pub show_gui: bool,
    pub camera: CameraParams,
    pub manipulator: CameraManipulator,
    pub display: DisplayOptions,
    pub scheduling: Scheduling,
    pub timing: TimingConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            world_path: PathBuf::new(),
            model_paths: Vec::new(),
            ignored_models: Vec::new(),
            show_gui: false,
            camera: CameraParams::default(),
            manipulator: CameraManipulator::Fixed,
            display: DisplayOptions::default(),
            scheduling: Scheduling::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Current configuration version
    pub const CURRENT_VERSION: u32 = 1;

    /// Configuration for a world file with default settings
    pub fn new(world_path: impl Into<PathBuf>) -> Self {
        Self {
            world_path: world_path.into(),
            ..Self::default()
        }
    }

    pub fn with_model_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.model_paths = paths;
        self
    }

    pub fn with_ignored_models(mut self, names: Vec<String>) -> Self {
        self.ignored_models = names;
        self
    }

    pub fn with_show_gui(mut self, show: bool) -> Self {
        self.show_gui = show;
        self
    }

    pub fn with_camera(mut self, camera: CameraParams) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Widget settings derived from this configuration
    pub fn widget_config(&self, world_name: &str) -> WidgetConfig {
        WidgetConfig {
            title: format!("world_viz: {}", world_name),
            camera: self.camera.normalized(),
            manipulator: self.manipulator,
            display: self.display,
        }
    }
}
