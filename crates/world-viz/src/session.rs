//! Render session: the state owned by the render thread.
//!
//! A session holds the widget, the registry of visual handles and the pose
//! lookup map. It is created, used and torn down on a single thread; other
//! threads reach it only through [`crate::host::RenderHost::submit`].

use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::time::SystemTime;

use glam::{DQuat, DVec3};
use uuid::Uuid;
use world_core::{JointSample, Pose, WorldDescriptor};
use world_renderer::{EventFilter, RenderWidget, VisualDescription};

use crate::error::WorldError;
use crate::frame::Frame;
use crate::host::HostContext;
use crate::request::{PendingRequest, Response, VisualSnapshot};

/// A model's visual inside the widget
#[derive(Debug, Clone)]
pub(crate) struct VisualHandle {
    id: Uuid,
    name: String,
    frame: String,
    joint_positions: BTreeMap<String, f64>,
}

impl VisualHandle {
    fn snapshot(&self, widget: &dyn RenderWidget) -> VisualSnapshot {
        let transform = widget.transformation(&self.frame);
        VisualSnapshot {
            id: self.id,
            name: self.name.clone(),
            frame: self.frame.clone(),
            parent_frame: transform.as_ref().map(|t| t.parent.clone()),
            position: transform.as_ref().map_or(DVec3::ZERO, |t| t.position),
            orientation: transform.as_ref().map_or(DQuat::IDENTITY, |t| t.orientation),
            joint_positions: self
                .joint_positions
                .iter()
                .map(|(name, position)| (name.clone(), *position))
                .collect(),
        }
    }
}

pub(crate) struct Session {
    widget: Box<dyn RenderWidget>,
    visuals: HashMap<String, VisualHandle>,
    poses: HashMap<String, Pose>,
    world_name: String,
    capture_enabled: bool,
    last_frame: Option<Frame>,
}

impl Session {
    /// Build the widget, attach one visual per model and place every model
    /// at its initial pose.
    pub(crate) fn open(context: &HostContext) -> Result<Self, WorldError> {
        let descriptor = &context.descriptor;
        let widget = context
            .factory
            .create(&context.config.widget_config(&descriptor.name))?;

        let mut session = Self {
            widget,
            visuals: HashMap::new(),
            poses: HashMap::new(),
            world_name: descriptor.name.clone(),
            capture_enabled: false,
            last_frame: None,
        };

        session.attach_visuals(descriptor)?;
        session.apply_initial_transformations();

        if context.config.show_gui {
            session.widget.show();
        } else {
            session.widget.hide();
        }

        tracing::info!(
            "Render session for world '{}' ready with {} visuals",
            session.world_name,
            session.visuals.len()
        );
        Ok(session)
    }

    fn attach_visuals(&mut self, descriptor: &WorldDescriptor) -> Result<(), WorldError> {
        for model in descriptor.visible_models() {
            let id = self.widget.add_visual(VisualDescription {
                name: model.name.clone(),
                frame: model.name.clone(),
                sdf: model.description(&descriptor.version),
                joints: model.joints.clone(),
            })?;

            self.visuals.insert(
                model.name.clone(),
                VisualHandle {
                    id,
                    name: model.name.clone(),
                    frame: model.name.clone(),
                    joint_positions: model.joints.iter().map(|j| (j.clone(), 0.0)).collect(),
                },
            );
            self.poses.insert(model.name.clone(), model.pose);
        }
        Ok(())
    }

    fn apply_initial_transformations(&mut self) {
        let mut placements: Vec<(String, Pose)> =
            self.poses.iter().map(|(name, pose)| (name.clone(), *pose)).collect();
        placements.sort_by(|a, b| a.0.cmp(&b.0));

        let world_name = self.world_name.clone();
        for (name, pose) in placements {
            self.apply_transformation(&world_name, &name, pose.position, pose.orientation);
        }
    }

    fn apply_transformation(
        &mut self,
        target: &str,
        source: &str,
        position: DVec3,
        orientation: DQuat,
    ) -> bool {
        if target.is_empty() || source.is_empty() {
            tracing::warn!("It is necessary to inform the target and source frames.");
            return false;
        }
        self.widget
            .set_transformation(target, source, position, orientation);
        true
    }

    /// Handle a request; a panic inside the widget is reported as
    /// [`Response::Failed`] instead of unwinding through the render loop.
    pub(crate) fn dispatch(&mut self, request: PendingRequest) -> Response {
        let kind = request.kind();
        match panic::catch_unwind(AssertUnwindSafe(|| self.handle(request))) {
            Ok(response) => response,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!("Render session panicked handling {}: {}", kind, message);
                Response::Failed(format!("{}: {}", kind, message))
            }
        }
    }

    fn handle(&mut self, request: PendingRequest) -> Response {
        tracing::trace!("Handling {} request", request.kind());
        match request {
            PendingRequest::ApplyTransform {
                target,
                source,
                position,
                orientation,
            } => {
                self.apply_transformation(&target, &source, position, orientation);
                Response::Done
            }
            PendingRequest::SetCaptureEnabled(enabled) => {
                if enabled {
                    self.widget.enable_grabbing();
                } else {
                    self.widget.disable_grabbing();
                }
                self.capture_enabled = enabled;
                Response::Done
            }
            PendingRequest::GrabFrame => Response::Frame(self.grab_frame()),
            PendingRequest::LastFrame => Response::LastFrame(self.last_frame.clone()),
            PendingRequest::SetCameraView { eye, look_at, up } => {
                self.widget.set_camera_view(eye, look_at, up);
                Response::Done
            }
            PendingRequest::SetCameraParams(params) => match params.validate() {
                Ok(()) => {
                    self.widget.set_projection(&params.normalized());
                    Response::Done
                }
                Err(reason) => Response::Failed(reason),
            },
            PendingRequest::SetJointState { model, joints } => {
                Response::JointsApplied(self.set_joints(&model, &joints))
            }
            PendingRequest::SetWindowVisible(visible) => {
                if visible {
                    self.widget.show();
                } else {
                    self.widget.hide();
                }
                Response::Done
            }
            PendingRequest::LookupVisual(name) => Response::Visual(
                self.visuals
                    .get(&name)
                    .map(|handle| handle.snapshot(self.widget.as_ref())),
            ),
            PendingRequest::ModelNames => {
                let mut names: Vec<String> = self.visuals.keys().cloned().collect();
                names.sort();
                Response::Names(names)
            }
        }
    }

    fn set_joints(&mut self, model: &str, joints: &JointSample) -> bool {
        let Some(handle) = self.visuals.get_mut(model) else {
            tracing::debug!("Joint update for unknown model '{}' ignored", model);
            return false;
        };

        let pairs: Vec<(String, f64)> = joints
            .iter()
            .map(|(name, position)| (name.to_string(), position))
            .collect();
        let applied = self.widget.update_joints(handle.id, &pairs);

        for (name, position) in &pairs {
            if let Some(slot) = handle.joint_positions.get_mut(name) {
                *slot = *position;
            }
        }
        if applied < pairs.len() {
            tracing::debug!(
                "Model '{}' applied {} of {} joints",
                model,
                applied,
                pairs.len()
            );
        }
        true
    }

    fn grab_frame(&mut self) -> Frame {
        let now = SystemTime::now();
        let frame = if self.capture_enabled {
            let visible = self.widget.is_visible() && !self.widget.is_minimized();
            Frame::from_rgba(self.widget.grab(), now, visible)
        } else {
            tracing::debug!("Frame requested while grabbing is disabled");
            Frame::empty(now)
        };
        self.last_frame = Some(frame.clone());
        frame
    }

    /// Dispatch one batch of pending widget events.
    ///
    /// User input is held back while the window is hidden; socket notifier
    /// events are never dispatched here.
    pub(crate) fn process_events(&mut self) -> usize {
        let filter = EventFilter::for_window(self.widget.is_visible());
        match panic::catch_unwind(AssertUnwindSafe(|| self.widget.process_events(filter))) {
            Ok(count) => count,
            Err(payload) => {
                tracing::error!(
                    "Render session panicked processing events: {}",
                    panic_message(payload.as_ref())
                );
                0
            }
        }
    }

    /// Close windows, release the visuals and drop the widget
    pub(crate) fn close(mut self) {
        self.widget.close_windows();
        for handle in self.visuals.values() {
            self.widget.remove_visual(handle.id);
        }
        self.visuals.clear();
        self.poses.clear();
        self.last_frame = None;
        tracing::info!("Render session for world '{}' closed", self.world_name);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use world_core::{LoadOptions, load_str};
    use world_renderer::{
        CameraParams, HeadlessFactory, HeadlessWidget, RenderError, WidgetConfig, WidgetFactory,
    };

    use crate::config::WorldConfig;

    const WORLD: &str = "<sdf version='1.6'><world name='lab'>\
        <model name='robot'><pose>1 2 3 0 0 0</pose><joint name='wheel'/></model>\
        <model name='robot'><pose>-1 0 0 0 0 0</pose></model>\
        <model name='table'/>\
        </world></sdf>";

    fn context(ignored: &[&str], factory: Arc<dyn WidgetFactory>) -> HostContext {
        let options = LoadOptions::default().with_ignored(ignored.iter().copied());
        let descriptor = load_str(WORLD, &options).unwrap();
        let config = WorldConfig::default().with_camera(CameraParams {
            width: 32,
            height: 24,
            ..Default::default()
        });
        HostContext::new(descriptor, config, factory)
    }

    fn open(ignored: &[&str]) -> Session {
        Session::open(&context(ignored, Arc::new(HeadlessFactory::new()))).unwrap()
    }

    fn names(session: &mut Session) -> Vec<String> {
        match session.dispatch(PendingRequest::ModelNames) {
            Response::Names(names) => names,
            other => panic!("unexpected response {:?}", other),
        }
    }

    fn snapshot(session: &mut Session, name: &str) -> Option<VisualSnapshot> {
        match session.dispatch(PendingRequest::LookupVisual(name.into())) {
            Response::Visual(snapshot) => snapshot,
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_open_attaches_visible_models() {
        let mut session = open(&["robot_0"]);
        assert_eq!(names(&mut session), vec!["robot", "table"]);
        assert!(snapshot(&mut session, "robot_0").is_none());
    }

    #[test]
    fn test_initial_poses_are_applied_relative_to_world() {
        let mut session = open(&[]);
        let robot = snapshot(&mut session, "robot").unwrap();
        assert_eq!(robot.parent_frame.as_deref(), Some("lab"));
        assert_eq!(robot.position, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(robot.joint_positions, vec![("wheel".to_string(), 0.0)]);

        let second = snapshot(&mut session, "robot_0").unwrap();
        assert_eq!(second.position, DVec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_empty_frame_name_leaves_transform_unchanged() {
        let mut session = open(&[]);
        let before = snapshot(&mut session, "robot").unwrap();

        let response = session.dispatch(PendingRequest::ApplyTransform {
            target: "lab".into(),
            source: String::new(),
            position: DVec3::splat(9.0),
            orientation: DQuat::IDENTITY,
        });
        assert_eq!(response, Response::Done);
        assert_eq!(snapshot(&mut session, "robot").unwrap(), before);
    }

    #[test]
    fn test_grab_before_enable_is_empty_and_not_visible() {
        let mut session = open(&[]);
        let Response::Frame(frame) = session.dispatch(PendingRequest::GrabFrame) else {
            panic!("expected a frame");
        };
        assert!(frame.is_empty());
        assert!(!frame.visible);
        assert_eq!(
            session.dispatch(PendingRequest::LastFrame),
            Response::LastFrame(Some(frame))
        );
    }

    #[test]
    fn test_grab_reports_visibility() {
        let mut session = open(&[]);
        session.dispatch(PendingRequest::SetCaptureEnabled(true));

        let Response::Frame(hidden) = session.dispatch(PendingRequest::GrabFrame) else {
            panic!("expected a frame");
        };
        assert_eq!((hidden.width(), hidden.height()), (32, 24));
        assert!(!hidden.visible);

        session.dispatch(PendingRequest::SetWindowVisible(true));
        let Response::Frame(shown) = session.dispatch(PendingRequest::GrabFrame) else {
            panic!("expected a frame");
        };
        assert!(shown.visible);

        session.dispatch(PendingRequest::SetCaptureEnabled(false));
        let Response::Frame(disabled) = session.dispatch(PendingRequest::GrabFrame) else {
            panic!("expected a frame");
        };
        assert!(disabled.is_empty());
    }

    #[test]
    fn test_joint_state_for_unknown_model() {
        let mut session = open(&[]);
        let joints = JointSample::from_pairs([("wheel", 1.5), ("other", 2.0)]);

        let response = session.dispatch(PendingRequest::SetJointState {
            model: "ghost".into(),
            joints: joints.clone(),
        });
        assert_eq!(response, Response::JointsApplied(false));

        let response = session.dispatch(PendingRequest::SetJointState {
            model: "robot".into(),
            joints,
        });
        assert_eq!(response, Response::JointsApplied(true));
        let robot = snapshot(&mut session, "robot").unwrap();
        assert_eq!(robot.joint_positions, vec![("wheel".to_string(), 1.5)]);
    }

    #[test]
    fn test_camera_params_resize_frames() {
        let mut session = open(&[]);
        session.dispatch(PendingRequest::SetCaptureEnabled(true));
        session.dispatch(PendingRequest::SetCameraParams(CameraParams {
            width: 16,
            height: 8,
            ..Default::default()
        }));
        let Response::Frame(frame) = session.dispatch(PendingRequest::GrabFrame) else {
            panic!("expected a frame");
        };
        assert_eq!((frame.width(), frame.height()), (16, 8));
    }

    #[test]
    fn test_invalid_camera_params_keep_projection() {
        let mut session = open(&[]);
        session.dispatch(PendingRequest::SetCaptureEnabled(true));
        let response = session.dispatch(PendingRequest::SetCameraParams(CameraParams {
            width: 16,
            height: 8,
            z_near: 2.0,
            z_far: 1.0,
            ..Default::default()
        }));
        assert!(matches!(response, Response::Failed(ref msg) if msg.contains("clip planes")));

        let Response::Frame(frame) = session.dispatch(PendingRequest::GrabFrame) else {
            panic!("expected a frame");
        };
        assert_eq!((frame.width(), frame.height()), (32, 24));
    }

    struct PanickyWidget(HeadlessWidget);

    impl RenderWidget for PanickyWidget {
        fn add_visual(&mut self, visual: VisualDescription) -> Result<Uuid, RenderError> {
            self.0.add_visual(visual)
        }
        fn remove_visual(&mut self, id: Uuid) -> bool {
            self.0.remove_visual(id)
        }
        fn update_joints(&mut self, _id: Uuid, _joints: &[(String, f64)]) -> usize {
            panic!("joint update exploded")
        }
        fn set_transformation(&mut self, target: &str, source: &str, position: DVec3, orientation: DQuat) {
            self.0.set_transformation(target, source, position, orientation)
        }
        fn transformation(&self, frame: &str) -> Option<world_renderer::FrameTransform> {
            self.0.transformation(frame)
        }
        fn set_camera_view(&mut self, eye: DVec3, look_at: DVec3, up: DVec3) {
            self.0.set_camera_view(eye, look_at, up)
        }
        fn set_projection(&mut self, params: &CameraParams) {
            self.0.set_projection(params)
        }
        fn enable_grabbing(&mut self) {
            self.0.enable_grabbing()
        }
        fn disable_grabbing(&mut self) {
            self.0.disable_grabbing()
        }
        fn grab(&mut self) -> image::RgbaImage {
            self.0.grab()
        }
        fn show(&mut self) {
            self.0.show()
        }
        fn hide(&mut self) {
            self.0.hide()
        }
        fn is_visible(&self) -> bool {
            self.0.is_visible()
        }
        fn process_events(&mut self, filter: EventFilter) -> usize {
            self.0.process_events(filter)
        }
    }

    #[test]
    fn test_panic_in_widget_is_reported() {
        let factory = |config: &WidgetConfig| -> Result<Box<dyn RenderWidget>, RenderError> {
            Ok(Box::new(PanickyWidget(HeadlessWidget::new(
                config,
                Default::default(),
            ))))
        };
        let mut session = Session::open(&context(&[], Arc::new(factory))).unwrap();

        let response = session.dispatch(PendingRequest::SetJointState {
            model: "robot".into(),
            joints: JointSample::from_pairs([("wheel", 1.0)]),
        });
        assert!(matches!(response, Response::Failed(ref msg) if msg.contains("exploded")));
        assert_eq!(names(&mut session).len(), 3);
    }
}
