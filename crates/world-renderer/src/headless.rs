//! Headless widget.
//!
//! Keeps the scene, frame tree and camera in memory and renders with the
//! software rasterizer. "Window" state (shown, minimized, closed) is tracked
//! so callers see the same visibility semantics as with an on-screen widget.

use glam::{DQuat, DVec3};
use image::RgbaImage;
use uuid::Uuid;

use crate::camera::{Camera, CameraManipulator, CameraParams};
use crate::events::{EventFilter, EventQueue, WidgetEvent};
use crate::frames::{FrameTransform, FrameTree};
use crate::raster::{AXIS_X, AXIS_Y, AXIS_Z, Canvas, GRID_COLOR};
use crate::scene::{Scene, VisualObject};
use crate::widget::{
    DisplayOptions, RenderError, RenderWidget, VisualDescription, WidgetConfig, WidgetFactory,
};

const GRID_HALF_EXTENT: i32 = 10;
const MARKER_RADIUS_PX: f64 = 5.0;
const TRIAD_LENGTH: f64 = 0.3;

/// Widget rendering off-screen into an RGBA image.
pub struct HeadlessWidget {
    title: String,
    scene: Scene,
    frames: FrameTree,
    camera: Camera,
    manipulator: CameraManipulator,
    display: DisplayOptions,
    events: EventQueue,
    width: u32,
    height: u32,
    shown: bool,
    minimized: bool,
    grabbing: bool,
}

impl HeadlessWidget {
    pub fn new(config: &WidgetConfig, events: EventQueue) -> Self {
        let params = config.camera.normalized();
        Self {
            title: config.title.clone(),
            scene: Scene::new(),
            frames: FrameTree::new(),
            camera: Camera::new(&params),
            manipulator: config.manipulator,
            display: config.display,
            events,
            width: params.width,
            height: params.height,
            shown: false,
            minimized: false,
            grabbing: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn is_grabbing(&self) -> bool {
        self.grabbing
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Renders the scene without touching the grabbing state.
    pub fn render(&mut self) -> RgbaImage {
        let mut canvas = Canvas::new(self.width, self.height, self.camera.view_projection());

        if self.display.show_grid {
            let extent = GRID_HALF_EXTENT as f64;
            for i in -GRID_HALF_EXTENT..=GRID_HALF_EXTENT {
                let t = i as f64;
                canvas.line(DVec3::new(t, -extent, 0.0), DVec3::new(t, extent, 0.0), GRID_COLOR);
                canvas.line(DVec3::new(-extent, t, 0.0), DVec3::new(extent, t, 0.0), GRID_COLOR);
            }
        }

        if self.display.show_axes {
            canvas.line(DVec3::ZERO, DVec3::X, AXIS_X);
            canvas.line(DVec3::ZERO, DVec3::Y, AXIS_Y);
            canvas.line(DVec3::ZERO, DVec3::Z, AXIS_Z);
        }

        if self.display.show_markers {
            for object in self.scene.objects().filter(|o| o.visible) {
                let transform = self.frames.world_transform(&object.frame);
                let origin = transform.transform_point3(DVec3::ZERO);
                canvas.line(origin, transform.transform_point3(DVec3::X * TRIAD_LENGTH), AXIS_X);
                canvas.line(origin, transform.transform_point3(DVec3::Y * TRIAD_LENGTH), AXIS_Y);
                canvas.line(origin, transform.transform_point3(DVec3::Z * TRIAD_LENGTH), AXIS_Z);
                canvas.disc(origin, MARKER_RADIUS_PX, object.color);
            }
        }

        self.scene.mark_clean();
        canvas.into_image()
    }

    fn handle_event(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::Resize { width, height } => {
                self.width = width.max(1);
                self.height = height.max(1);
                self.camera.aspect = self.width as f64 / self.height as f64;
            }
            WidgetEvent::Show => self.show(),
            WidgetEvent::Hide => self.hide(),
            WidgetEvent::Minimize => self.minimized = true,
            WidgetEvent::Restore => self.minimized = false,
            WidgetEvent::Close => self.close_windows(),
            WidgetEvent::PointerDrag { dx, dy } => self.manipulator.drag(&mut self.camera, dx, dy),
            WidgetEvent::Scroll { delta } => self.manipulator.zoom(&mut self.camera, delta),
            WidgetEvent::KeyPress(_) | WidgetEvent::Timer | WidgetEvent::SocketNotifier(_) => {}
        }
    }
}

impl RenderWidget for HeadlessWidget {
    fn add_visual(&mut self, visual: VisualDescription) -> Result<Uuid, RenderError> {
        if visual.name.is_empty() {
            return Err(RenderError::Visual {
                name: visual.name,
                reason: "visual has no name".to_string(),
            });
        }
        tracing::debug!("Adding visual '{}' in frame '{}'", visual.name, visual.frame);
        Ok(self.scene.add_object(VisualObject::from_description(visual)))
    }

    fn remove_visual(&mut self, id: Uuid) -> bool {
        self.scene.remove_object(id).is_some()
    }

    fn update_joints(&mut self, id: Uuid, joints: &[(String, f64)]) -> usize {
        self.scene
            .get_object_mut(id)
            .map(|object| object.apply_joints(joints))
            .unwrap_or(0)
    }

    fn set_transformation(&mut self, target: &str, source: &str, position: DVec3, orientation: DQuat) {
        self.frames.set(target, source, position, orientation);
    }

    fn transformation(&self, frame: &str) -> Option<FrameTransform> {
        self.frames.get(frame).cloned()
    }

    fn set_camera_view(&mut self, eye: DVec3, look_at: DVec3, up: DVec3) {
        self.camera.set_view(eye, look_at, up);
    }

    fn set_projection(&mut self, params: &CameraParams) {
        if let Err(reason) = params.validate() {
            tracing::warn!("Ignoring camera parameters: {}", reason);
            return;
        }
        let params = params.normalized();
        self.width = params.width;
        self.height = params.height;
        self.camera.apply_params(&params);
    }

    fn enable_grabbing(&mut self) {
        self.grabbing = true;
    }

    fn disable_grabbing(&mut self) {
        self.grabbing = false;
    }

    fn grab(&mut self) -> RgbaImage {
        self.render()
    }

    fn show(&mut self) {
        self.shown = true;
        self.minimized = false;
    }

    fn hide(&mut self) {
        self.shown = false;
    }

    fn is_visible(&self) -> bool {
        self.shown
    }

    fn is_minimized(&self) -> bool {
        self.minimized
    }

    fn close_windows(&mut self) {
        self.shown = false;
        self.minimized = false;
    }

    fn process_events(&mut self, filter: EventFilter) -> usize {
        let batch = self.events.take_batch(filter);
        let count = batch.len();
        for event in batch {
            self.handle_event(event);
        }
        count
    }
}

/// Creates [`HeadlessWidget`]s sharing one event queue.
#[derive(Debug, Clone, Default)]
pub struct HeadlessFactory {
    events: EventQueue,
}

impl HeadlessFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue that widgets created by this factory dispatch from.
    pub fn events(&self) -> EventQueue {
        self.events.clone()
    }
}

impl WidgetFactory for HeadlessFactory {
    fn create(&self, config: &WidgetConfig) -> Result<Box<dyn RenderWidget>, RenderError> {
        config.camera.validate().map_err(RenderError::Create)?;
        Ok(Box::new(HeadlessWidget::new(config, self.events.clone())))
    }
}
