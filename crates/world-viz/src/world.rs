//! World facade
//!
//! [`World`] owns the loaded world description and a render host. Every
//! operation that touches the renderer goes through [`RenderHost::submit`], so
//! the same facade serves the inline and the threaded host.

use std::sync::Arc;

use world_core::{
    JointSample, LoadOptions, ModelSearchPaths, RigidBodyState, WorldDescriptor, load_file,
};
use world_renderer::{Camera, CameraParams, HeadlessFactory, WidgetFactory};

use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::frame::Frame;
use crate::host::{HostContext, InlineHost, RenderHost, ThreadedHost};
use crate::request::{PendingRequest, Response, VisualSnapshot};

/// A loaded world and the host that renders it
pub struct World<H: RenderHost = ThreadedHost> {
    context: HostContext,
    search_paths: ModelSearchPaths,
    host: H,
}

/// World rendered on a dedicated thread; usable from any thread
pub type ThreadedWorld = World<ThreadedHost>;
/// World rendered on the thread that owns it
pub type InlineWorld = World<InlineHost>;

impl World<ThreadedHost> {
    /// Load the configured world for a dedicated render thread with the
    /// headless widget
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        Self::with_host(config, Arc::new(HeadlessFactory::new()), ThreadedHost::new())
    }
}

impl World<InlineHost> {
    /// Load the configured world for rendering on the calling thread
    pub fn new_inline(config: WorldConfig) -> Result<Self, WorldError> {
        Self::with_host(config, Arc::new(HeadlessFactory::new()), InlineHost::new())
    }
}

impl<H: RenderHost> World<H> {
    /// Load the configured world file. The render host is not started.
    pub fn with_host(
        config: WorldConfig,
        factory: Arc<dyn WidgetFactory>,
        host: H,
    ) -> Result<Self, WorldError> {
        let search_paths = ModelSearchPaths::from_environment(&config.model_paths);
        let options = LoadOptions::default()
            .with_search_paths(search_paths.clone())
            .with_ignored(config.ignored_models.iter().cloned());

        let descriptor = load_file(&config.world_path, &options).inspect_err(|e| {
            tracing::error!("Failed to load world {:?}: {}", config.world_path, e);
        })?;
        tracing::info!(
            "Loaded world '{}' with {} models",
            descriptor.name,
            descriptor.len()
        );

        Ok(Self {
            context: HostContext::new(descriptor, config, factory),
            search_paths,
            host,
        })
    }

    /// Use an already loaded world description
    pub fn from_descriptor(
        descriptor: WorldDescriptor,
        config: WorldConfig,
        factory: Arc<dyn WidgetFactory>,
        host: H,
    ) -> Self {
        let search_paths = ModelSearchPaths::from_environment(&config.model_paths);
        Self {
            context: HostContext::new(descriptor, config, factory),
            search_paths,
            host,
        }
    }

    pub fn initialize(&self) -> Result<(), WorldError> {
        self.host.initialize(&self.context)
    }

    pub fn deinitialize(&self) -> Result<(), WorldError> {
        self.host.deinitialize()
    }

    /// Block until the renderer has completed a processing cycle
    pub fn wait(&self) {
        self.host.wait()
    }

    pub fn is_running(&self) -> bool {
        self.host.is_running()
    }

    pub fn descriptor(&self) -> &WorldDescriptor {
        &self.context.descriptor
    }

    pub fn config(&self) -> &WorldConfig {
        &self.context.config
    }

    pub fn search_paths(&self) -> &ModelSearchPaths {
        &self.search_paths
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// State of a model's visual, `None` for unknown or ignored models
    pub fn robot_visualization(&self, name: &str) -> Result<Option<VisualSnapshot>, WorldError> {
        let request = PendingRequest::LookupVisual(name.to_string());
        match self.request(request)? {
            Response::Visual(snapshot) => Ok(snapshot),
            _ => Err(WorldError::UnexpectedResponse("lookup-visual")),
        }
    }

    /// Names of the models that have a visual, sorted
    pub fn model_names(&self) -> Result<Vec<String>, WorldError> {
        match self.request(PendingRequest::ModelNames)? {
            Response::Names(names) => Ok(names),
            _ => Err(WorldError::UnexpectedResponse("model-names")),
        }
    }

    /// Update a model's joints. Returns `false` when the model is unknown.
    pub fn set_joint_state(&self, model: &str, joints: &JointSample) -> Result<bool, WorldError> {
        let request = PendingRequest::SetJointState {
            model: model.to_string(),
            joints: joints.clone(),
        };
        match self.request(request)? {
            Response::JointsApplied(known) => Ok(known),
            _ => Err(WorldError::UnexpectedResponse("set-joint-state")),
        }
    }

    /// Place `source_frame` relative to `target_frame`
    pub fn set_transformation(&self, state: &RigidBodyState) -> Result<(), WorldError> {
        if !state.has_frames() {
            tracing::warn!("It is necessary to inform the target and source frames.");
            return Err(WorldError::Config(
                "transformation needs both a source and a target frame".into(),
            ));
        }
        self.expect_done(PendingRequest::ApplyTransform {
            target: state.target_frame.clone(),
            source: state.source_frame.clone(),
            position: state.position,
            orientation: state.orientation,
        })
    }

    /// Point the camera along the pose's X axis with its Z axis up
    pub fn set_camera_pose(&self, pose: &RigidBodyState) -> Result<(), WorldError> {
        let (eye, look_at, up) = Camera::view_from_pose(pose.position, pose.orientation);
        self.expect_done(PendingRequest::SetCameraView { eye, look_at, up })
    }

    /// Change the image size and field of view. Zero sizes fall back to
    /// the defaults; invalid clip planes, field of view or oversized images
    /// are rejected before reaching the renderer.
    pub fn set_camera_params(&self, params: CameraParams) -> Result<(), WorldError> {
        if let Err(reason) = params.validate() {
            tracing::warn!("Rejected camera parameters: {}", reason);
            return Err(WorldError::Config(reason));
        }
        self.expect_done(PendingRequest::SetCameraParams(params))
    }

    pub fn enable_grabbing(&self) -> Result<(), WorldError> {
        self.expect_done(PendingRequest::SetCaptureEnabled(true))
    }

    pub fn disable_grabbing(&self) -> Result<(), WorldError> {
        self.expect_done(PendingRequest::SetCaptureEnabled(false))
    }

    pub fn set_window_visible(&self, visible: bool) -> Result<(), WorldError> {
        self.expect_done(PendingRequest::SetWindowVisible(visible))
    }

    /// Capture the current view.
    ///
    /// While grabbing is disabled the frame is empty and not visible.
    pub fn grab_frame(&self) -> Result<Frame, WorldError> {
        match self.request(PendingRequest::GrabFrame)? {
            Response::Frame(frame) => Ok(frame),
            _ => Err(WorldError::UnexpectedResponse("grab-frame")),
        }
    }

    /// Frame returned by the latest [`grab_frame`](Self::grab_frame), if any
    pub fn last_frame(&self) -> Result<Option<Frame>, WorldError> {
        match self.request(PendingRequest::LastFrame)? {
            Response::LastFrame(frame) => Ok(frame),
            _ => Err(WorldError::UnexpectedResponse("last-frame")),
        }
    }

    fn expect_done(&self, request: PendingRequest) -> Result<(), WorldError> {
        let kind = request.kind();
        match self.request(request)? {
            Response::Done => Ok(()),
            _ => Err(WorldError::UnexpectedResponse(kind)),
        }
    }

    fn request(&self, request: PendingRequest) -> Result<Response, WorldError> {
        match self.host.submit(request)? {
            Response::Failed(reason) => Err(WorldError::RequestFailed(reason)),
            response => Ok(response),
        }
    }
}

impl<H: RenderHost> Drop for World<H> {
    fn drop(&mut self) {
        if self.host.is_running()
            && let Err(e) = self.host.deinitialize()
        {
            tracing::warn!("Failed to stop world '{}': {}", self.context.descriptor.name, e);
        }
    }
}
