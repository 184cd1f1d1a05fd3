//! Requests carried to the render thread and their responses

use glam::{DQuat, DVec3};
use uuid::Uuid;
use world_core::JointSample;
use world_renderer::CameraParams;

use crate::frame::Frame;

/// One unit of work for the render session
#[derive(Debug, Clone, PartialEq)]
pub enum PendingRequest {
    /// Place frame `source` in frame `target`
    ApplyTransform {
        target: String,
        source: String,
        position: DVec3,
        orientation: DQuat,
    },
    SetCaptureEnabled(bool),
    GrabFrame,
    /// Most recently grabbed frame, without grabbing
    LastFrame,
    SetCameraView {
        eye: DVec3,
        look_at: DVec3,
        up: DVec3,
    },
    SetCameraParams(CameraParams),
    SetJointState {
        model: String,
        joints: JointSample,
    },
    SetWindowVisible(bool),
    LookupVisual(String),
    ModelNames,
}

impl PendingRequest {
    /// Short name for logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            PendingRequest::ApplyTransform { .. } => "apply-transform",
            PendingRequest::SetCaptureEnabled(_) => "set-capture",
            PendingRequest::GrabFrame => "grab-frame",
            PendingRequest::LastFrame => "last-frame",
            PendingRequest::SetCameraView { .. } => "set-camera-view",
            PendingRequest::SetCameraParams(_) => "set-camera-params",
            PendingRequest::SetJointState { .. } => "set-joint-state",
            PendingRequest::SetWindowVisible(_) => "set-window-visible",
            PendingRequest::LookupVisual(_) => "lookup-visual",
            PendingRequest::ModelNames => "model-names",
        }
    }
}

/// Result of a processed request
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Done,
    Frame(Frame),
    LastFrame(Option<Frame>),
    /// Whether the model of a joint update was known
    JointsApplied(bool),
    Visual(Option<VisualSnapshot>),
    Names(Vec<String>),
    /// Handling the request panicked; the session is still usable
    Failed(String),
}

/// Copy of a visual handle's state, safe to hand to other threads
#[derive(Debug, Clone, PartialEq)]
pub struct VisualSnapshot {
    pub id: Uuid,
    pub name: String,
    /// Frame the visual is drawn in
    pub frame: String,
    /// Parent frame and transform currently applied to `frame`
    pub parent_frame: Option<String>,
    pub position: DVec3,
    pub orientation: DQuat,
    /// Joint positions sorted by joint name
    pub joint_positions: Vec<(String, f64)>,
}
