//! Threaded host driven from several caller threads

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use glam::{DQuat, DVec3};
use image::RgbaImage;
use parking_lot::Mutex;
use uuid::Uuid;
use world_core::{JointSample, RigidBodyState};
use world_renderer::{
    CameraParams, EventFilter, EventQueue, FrameTransform, HeadlessWidget, RenderError,
    RenderWidget, VisualDescription, WidgetConfig, WidgetFactory,
};
use world_viz::{Phase, ThreadedHost, TimingConfig, World, WorldConfig, WorldError};

const WORLD: &str = r#"<?xml version="1.0"?>
<sdf version="1.6">
  <world name="arena">
    <model name="robot"><pose>0 0 0 0 0 0</pose><joint name="j1"/></model>
    <model name="robot"><pose>1 0 0 0 0 0</pose></model>
    <model name="robot_0"><pose>2 0 0 0 0 0</pose></model>
    <model name="sun"/>
  </world>
</sdf>"#;

/// Widget calls observed by the test
#[derive(Default)]
struct CallTracker {
    transforms: AtomicUsize,
    in_flight: AtomicUsize,
    overlaps: AtomicUsize,
    threads: Mutex<Vec<ThreadId>>,
    slow_close: AtomicBool,
}

impl CallTracker {
    fn enter(&self) {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let id = thread::current().id();
        let mut threads = self.threads.lock();
        if !threads.contains(&id) {
            threads.push(id);
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Headless widget that reports its calls to a [`CallTracker`]
struct TrackedWidget {
    inner: HeadlessWidget,
    tracker: Arc<CallTracker>,
}

impl RenderWidget for TrackedWidget {
    fn add_visual(&mut self, visual: VisualDescription) -> Result<Uuid, RenderError> {
        self.inner.add_visual(visual)
    }

    fn remove_visual(&mut self, id: Uuid) -> bool {
        self.inner.remove_visual(id)
    }

    fn update_joints(&mut self, id: Uuid, joints: &[(String, f64)]) -> usize {
        self.inner.update_joints(id, joints)
    }

    fn set_transformation(&mut self, target: &str, source: &str, position: DVec3, orientation: DQuat) {
        self.tracker.enter();
        self.tracker.transforms.fetch_add(1, Ordering::SeqCst);
        thread::yield_now();
        self.inner.set_transformation(target, source, position, orientation);
        self.tracker.leave();
    }

    fn transformation(&self, frame: &str) -> Option<FrameTransform> {
        self.inner.transformation(frame)
    }

    fn set_camera_view(&mut self, eye: DVec3, look_at: DVec3, up: DVec3) {
        self.inner.set_camera_view(eye, look_at, up)
    }

    fn set_projection(&mut self, params: &CameraParams) {
        self.inner.set_projection(params)
    }

    fn enable_grabbing(&mut self) {
        self.inner.enable_grabbing()
    }

    fn disable_grabbing(&mut self) {
        self.inner.disable_grabbing()
    }

    fn grab(&mut self) -> RgbaImage {
        self.inner.grab()
    }

    fn show(&mut self) {
        self.inner.show()
    }

    fn hide(&mut self) {
        self.inner.hide()
    }

    fn is_visible(&self) -> bool {
        self.inner.is_visible()
    }

    fn close_windows(&mut self) {
        if self.tracker.slow_close.swap(false, Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(400));
        }
        self.inner.close_windows()
    }

    fn process_events(&mut self, filter: EventFilter) -> usize {
        self.inner.process_events(filter)
    }
}

fn tracked_factory(tracker: Arc<CallTracker>) -> Arc<dyn WidgetFactory> {
    Arc::new(
        move |config: &WidgetConfig| -> Result<Box<dyn RenderWidget>, RenderError> {
            Ok(Box::new(TrackedWidget {
                inner: HeadlessWidget::new(config, EventQueue::default()),
                tracker: Arc::clone(&tracker),
            }))
        },
    )
}

fn write_world(dir: &Path) -> PathBuf {
    let path = dir.join("arena.world");
    std::fs::write(&path, WORLD).unwrap();
    path
}

fn config(world: PathBuf) -> WorldConfig {
    WorldConfig::new(world)
        .with_ignored_models(vec!["sun".into()])
        .with_camera(CameraParams {
            width: 40,
            height: 30,
            ..Default::default()
        })
        .with_timing(TimingConfig::immediate())
}

fn tracked_world(dir: &Path, tracker: &Arc<CallTracker>) -> World<ThreadedHost> {
    World::with_host(
        config(write_world(dir)),
        tracked_factory(Arc::clone(tracker)),
        ThreadedHost::new(),
    )
    .unwrap()
}

#[test]
fn test_initialize_deinitialize_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let world = World::new(config(write_world(dir.path()))).unwrap();

    for _ in 0..3 {
        let started = Instant::now();
        world.initialize().unwrap();
        assert!(world.is_running());
        assert_eq!(world.host().phase(), Phase::Running);

        world.deinitialize().unwrap();
        assert!(!world.is_running());
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}

#[test]
fn test_requests_after_stop_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let world = World::new(config(write_world(dir.path()))).unwrap();
    world.initialize().unwrap();
    world.deinitialize().unwrap();

    assert_eq!(world.grab_frame(), Err(WorldError::NotRunning));
    assert_eq!(world.enable_grabbing(), Err(WorldError::NotRunning));
    world.wait();
}

#[test]
fn test_concurrent_transforms_are_serialized() {
    const CALLERS: usize = 8;
    const PER_CALLER: usize = 25;

    let dir = tempfile::tempdir().unwrap();
    let tracker = Arc::new(CallTracker::default());
    let world = Arc::new(tracked_world(dir.path(), &tracker));
    world.initialize().unwrap();
    let initial = tracker.transforms.load(Ordering::SeqCst);
    assert_eq!(initial, 3);

    let callers: Vec<_> = (0..CALLERS)
        .map(|caller| {
            let world = Arc::clone(&world);
            thread::spawn(move || {
                for step in 0..PER_CALLER {
                    let state = RigidBodyState::new(
                        "robot",
                        "arena",
                        DVec3::new(caller as f64, step as f64, 0.0),
                        DQuat::IDENTITY,
                    );
                    world.set_transformation(&state).unwrap();
                }
            })
        })
        .collect();
    for caller in callers {
        caller.join().unwrap();
    }

    assert_eq!(
        tracker.transforms.load(Ordering::SeqCst),
        initial + CALLERS * PER_CALLER
    );
    assert_eq!(tracker.overlaps.load(Ordering::SeqCst), 0);

    let threads = tracker.threads.lock().clone();
    assert_eq!(threads.len(), 1);
    assert_ne!(threads[0], thread::current().id());

    let robot = world.robot_visualization("robot").unwrap().unwrap();
    assert_eq!(robot.parent_frame.as_deref(), Some("arena"));
    assert_eq!(robot.position.z, 0.0);

    world.deinitialize().unwrap();
}

#[test]
fn test_grab_before_enable_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let world = World::new(config(write_world(dir.path()))).unwrap();
    world.initialize().unwrap();

    let before = std::time::SystemTime::now();
    let frame = world.grab_frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (0, 0));
    assert!(!frame.visible);
    assert!(frame.time >= before);

    world.enable_grabbing().unwrap();
    let frame = world.grab_frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (40, 30));
    assert!(!frame.visible);

    world.set_window_visible(true).unwrap();
    assert!(world.grab_frame().unwrap().visible);
}

#[test]
fn test_empty_source_frame_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = Arc::new(CallTracker::default());
    let world = tracked_world(dir.path(), &tracker);
    world.initialize().unwrap();

    let before = world.robot_visualization("robot_0_0").unwrap().unwrap();
    let sent = tracker.transforms.load(Ordering::SeqCst);

    let state = RigidBodyState::new("", "arena", DVec3::splat(7.0), DQuat::IDENTITY);
    assert!(matches!(
        world.set_transformation(&state),
        Err(WorldError::Config(_))
    ));
    let state = RigidBodyState::new("robot_0_0", "", DVec3::splat(7.0), DQuat::IDENTITY);
    assert!(world.set_transformation(&state).is_err());

    assert_eq!(tracker.transforms.load(Ordering::SeqCst), sent);
    assert_eq!(world.robot_visualization("robot_0_0").unwrap().unwrap(), before);
}

#[test]
fn test_duplicate_names_and_ignored_models() {
    let dir = tempfile::tempdir().unwrap();
    let world = World::new(config(write_world(dir.path()))).unwrap();

    let names: Vec<_> = world.descriptor().names().collect();
    assert_eq!(names, vec!["robot", "robot_0", "robot_0_0", "sun"]);
    assert_eq!(
        world.descriptor().pose_of("robot_0_0").unwrap().position,
        DVec3::new(2.0, 0.0, 0.0)
    );

    world.initialize().unwrap();
    assert_eq!(
        world.model_names().unwrap(),
        vec!["robot", "robot_0", "robot_0_0"]
    );
    assert_eq!(world.robot_visualization("sun").unwrap(), None);

    let joints = JointSample::from_pairs([("j1", 0.75)]);
    assert!(world.set_joint_state("robot", &joints).unwrap());
    assert!(!world.set_joint_state("sun", &joints).unwrap());
}

#[test]
fn test_startup_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let failing = |_: &WidgetConfig| -> Result<Box<dyn RenderWidget>, RenderError> {
        Err(RenderError::Create("display unavailable".into()))
    };
    let world = World::with_host(
        config(write_world(dir.path())),
        Arc::new(failing),
        ThreadedHost::new(),
    )
    .unwrap();

    assert_eq!(
        world.initialize(),
        Err(WorldError::Render(RenderError::Create(
            "display unavailable".into()
        )))
    );
    assert!(!world.is_running());
    assert_eq!(world.model_names(), Err(WorldError::NotRunning));
}

#[test]
fn test_stuck_teardown_times_out_and_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = Arc::new(CallTracker::default());
    let mut config = config(write_world(dir.path()));
    config.timing.teardown_timeout_ms = 50;
    let world = World::with_host(config, tracked_factory(Arc::clone(&tracker)), ThreadedHost::new())
        .unwrap();

    world.initialize().unwrap();
    tracker.slow_close.store(true, Ordering::SeqCst);
    assert_eq!(
        world.deinitialize(),
        Err(WorldError::TeardownTimeout(Duration::from_millis(50)))
    );
    assert_eq!(world.host().phase(), Phase::Stopped);

    world.initialize().unwrap();
    // Outlive the abandoned thread; it must not disturb the new one
    thread::sleep(Duration::from_millis(500));
    assert!(world.is_running());
    assert_eq!(world.model_names().unwrap().len(), 3);
    world.deinitialize().unwrap();
}

#[test]
fn test_wait_from_other_thread() {
    let dir = tempfile::tempdir().unwrap();
    let world = Arc::new(World::new(config(write_world(dir.path()))).unwrap());
    world.initialize().unwrap();

    let waiter = {
        let world = Arc::clone(&world);
        thread::spawn(move || {
            for _ in 0..5 {
                world.wait();
            }
        })
    };
    waiter.join().unwrap();
    world.deinitialize().unwrap();
}

#[test]
fn test_include_resolved_from_model_path() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = dir.path().join("models").join("crate");
    std::fs::create_dir_all(&model_dir).unwrap();
    std::fs::write(
        model_dir.join("model.config"),
        "<model><name>crate</name><sdf version='1.6'>crate.sdf</sdf></model>",
    )
    .unwrap();
    std::fs::write(
        model_dir.join("crate.sdf"),
        "<sdf version='1.6'><model name='crate'><joint name='lid'/></model></sdf>",
    )
    .unwrap();

    let world_path = dir.path().join("store.world");
    std::fs::write(
        &world_path,
        "<sdf version='1.6'><world name='store'>\
         <include><uri>model://crate</uri><pose>1 1 0 0 0 0</pose></include>\
         <include><uri>model://crate</uri><name>spare</name></include>\
         </world></sdf>",
    )
    .unwrap();

    let config = WorldConfig::new(world_path)
        .with_model_paths(vec![dir.path().join("models")])
        .with_timing(TimingConfig::immediate());
    let world = World::new(config).unwrap();
    assert_eq!(
        world.search_paths().roots().first(),
        Some(&dir.path().join("models"))
    );

    world.initialize().unwrap();
    assert_eq!(world.model_names().unwrap(), vec!["crate", "spare"]);
    let spare = world.robot_visualization("spare").unwrap().unwrap();
    assert_eq!(spare.joint_positions, vec![("lid".to_string(), 0.0)]);
}
