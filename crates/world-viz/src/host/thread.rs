//! Host running the session on a dedicated render thread.
//!
//! The lifecycle is tracked in a [`Phase`] guarded by a mutex and condition
//! variable. Every start gets a new epoch; a render thread only updates the
//! status while its epoch is current, so a thread abandoned after a teardown
//! timeout cannot disturb a later session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use parking_lot::{Condvar, Mutex};
use thread_priority::ThreadPriority;

use super::bridge::{self, BridgeEndpoint, EventBridge, Turn};
use super::{HostContext, RenderHost};
use crate::config::TimingConfig;
use crate::error::WorldError;
use crate::request::{PendingRequest, Response};
use crate::session::Session;

const RENDER_THREAD_NAME: &str = "world-render";
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Lifecycle of the render thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug)]
struct Status {
    phase: Phase,
    epoch: u64,
    /// Bumped on every phase change and every completed loop cycle
    generation: u64,
    startup_error: Option<WorldError>,
}

#[derive(Debug)]
struct Lifecycle {
    status: Mutex<Status>,
    changed: Condvar,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            status: Mutex::new(Status {
                phase: Phase::Stopped,
                epoch: 0,
                generation: 0,
                startup_error: None,
            }),
            changed: Condvar::new(),
        }
    }

    fn transition(&self, epoch: u64, phase: Phase) {
        let mut status = self.status.lock();
        if status.epoch != epoch {
            return;
        }
        status.phase = phase;
        status.generation = status.generation.wrapping_add(1);
        self.changed.notify_all();
    }

    fn startup_failed(&self, epoch: u64, error: WorldError) {
        let mut status = self.status.lock();
        if status.epoch != epoch {
            return;
        }
        status.startup_error = Some(error);
        status.phase = Phase::Stopped;
        status.generation = status.generation.wrapping_add(1);
        self.changed.notify_all();
    }

    /// Wake waiters after a loop cycle
    fn announce_ready(&self, epoch: u64) {
        let mut status = self.status.lock();
        if status.epoch != epoch {
            return;
        }
        status.generation = status.generation.wrapping_add(1);
        self.changed.notify_all();
    }

    /// Give up on the thread of `epoch`; its later updates are ignored
    fn abandon(&self, epoch: u64) {
        let mut status = self.status.lock();
        if status.epoch == epoch {
            status.epoch = status.epoch.wrapping_add(1);
            status.phase = Phase::Stopped;
            status.generation = status.generation.wrapping_add(1);
            self.changed.notify_all();
        }
    }

    fn phase(&self) -> Phase {
        self.status.lock().phase
    }
}

/// Marks the render thread stopped when it exits, including by panic
struct StopSignal {
    lifecycle: Arc<Lifecycle>,
    epoch: u64,
}

impl Drop for StopSignal {
    fn drop(&mut self) {
        self.lifecycle.transition(self.epoch, Phase::Stopped);
    }
}

struct Worker {
    handle: JoinHandle<()>,
    bridge: Arc<EventBridge>,
    quit: Arc<AtomicBool>,
    wake: Sender<()>,
    epoch: u64,
    teardown_timeout: Duration,
}

/// Render session on its own thread, reachable from any thread.
pub struct ThreadedHost {
    lifecycle: Arc<Lifecycle>,
    worker: Mutex<Option<Worker>>,
}

impl Default for ThreadedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadedHost {
    pub fn new() -> Self {
        Self {
            lifecycle: Arc::new(Lifecycle::new()),
            worker: Mutex::new(None),
        }
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    /// Claim a new epoch once no start or stop is in progress.
    /// Returns `None` when already running.
    fn begin_start(&self) -> Option<u64> {
        let mut status = self.lifecycle.status.lock();
        loop {
            match status.phase {
                Phase::Running => return None,
                Phase::Starting | Phase::Stopping => self.lifecycle.changed.wait(&mut status),
                Phase::Stopped => break,
            }
        }
        status.epoch = status.epoch.wrapping_add(1);
        status.phase = Phase::Starting;
        status.startup_error = None;
        status.generation = status.generation.wrapping_add(1);
        Some(status.epoch)
    }

    /// Block until the render thread of `epoch` has left `Starting`
    fn await_startup(&self, epoch: u64) -> Result<(), WorldError> {
        let mut status = self.lifecycle.status.lock();
        while status.epoch == epoch && status.phase == Phase::Starting {
            self.lifecycle.changed.wait(&mut status);
        }
        // A stop may already have begun; startup still succeeded.
        if status.epoch == epoch && matches!(status.phase, Phase::Running | Phase::Stopping) {
            Ok(())
        } else {
            Err(status.startup_error.take().unwrap_or(WorldError::Disconnected))
        }
    }

    /// Returns `false` when already stopped
    fn begin_stop(&self) -> bool {
        let mut status = self.lifecycle.status.lock();
        loop {
            match status.phase {
                Phase::Stopped => return false,
                Phase::Starting | Phase::Stopping => self.lifecycle.changed.wait(&mut status),
                Phase::Running => break,
            }
        }
        status.phase = Phase::Stopping;
        status.generation = status.generation.wrapping_add(1);
        self.lifecycle.changed.notify_all();
        true
    }

    fn current_bridge(&self) -> Option<Arc<EventBridge>> {
        if self.lifecycle.phase() != Phase::Running {
            return None;
        }
        self.worker
            .lock()
            .as_ref()
            .map(|worker| Arc::clone(&worker.bridge))
    }
}

impl RenderHost for ThreadedHost {
    fn initialize(&self, context: &HostContext) -> Result<(), WorldError> {
        let Some(epoch) = self.begin_start() else {
            return Ok(());
        };
        let timing: TimingConfig = context.config.timing.clone();

        let (bridge, endpoint, wake) = bridge::channel(&timing);
        let quit = Arc::new(AtomicBool::new(false));

        {
            // Held until the worker is stored: a stop that sees the thread
            // running must find its quit flag.
            let mut slot = self.worker.lock();
            let spawned = {
                let context = context.clone();
                let lifecycle = Arc::clone(&self.lifecycle);
                let quit = Arc::clone(&quit);
                thread::Builder::new()
                    .name(RENDER_THREAD_NAME.to_string())
                    .spawn(move || render_main(context, endpoint, lifecycle, quit, epoch))
            };
            let handle = match spawned {
                Ok(handle) => handle,
                Err(e) => {
                    self.lifecycle.transition(epoch, Phase::Stopped);
                    return Err(WorldError::Spawn(e.to_string()));
                }
            };

            *slot = Some(Worker {
                handle,
                bridge: Arc::new(bridge),
                quit,
                wake,
                epoch,
                teardown_timeout: timing.teardown_timeout(),
            });
        }

        if let Err(e) = self.await_startup(epoch) {
            let failed = {
                let mut slot = self.worker.lock();
                match slot.as_ref() {
                    Some(worker) if worker.epoch == epoch => slot.take(),
                    _ => None,
                }
            };
            if let Some(worker) = failed
                && worker.handle.join().is_err()
            {
                tracing::warn!("Render thread panicked during startup");
            }
            tracing::error!("Render thread failed to start: {}", e);
            return Err(e);
        }

        if !timing.startup_settle().is_zero() {
            thread::sleep(timing.startup_settle());
        }
        tracing::info!("Render thread started");
        Ok(())
    }

    fn deinitialize(&self) -> Result<(), WorldError> {
        if !self.begin_stop() {
            return Ok(());
        }
        let Some(worker) = self.worker.lock().take() else {
            let epoch = self.lifecycle.status.lock().epoch;
            self.lifecycle.transition(epoch, Phase::Stopped);
            return Ok(());
        };

        let deadline = Instant::now() + worker.teardown_timeout;
        worker.quit.store(true, Ordering::Release);
        let _ = worker.wake.try_send(());

        {
            let mut status = self.lifecycle.status.lock();
            while status.epoch == worker.epoch && status.phase != Phase::Stopped {
                if self
                    .lifecycle
                    .changed
                    .wait_until(&mut status, deadline)
                    .timed_out()
                {
                    break;
                }
            }
        }

        while !worker.handle.is_finished() && Instant::now() < deadline {
            thread::sleep(JOIN_POLL_INTERVAL);
        }

        if !worker.handle.is_finished() {
            tracing::warn!(
                "Render thread did not stop within {:?}, abandoning it",
                worker.teardown_timeout
            );
            self.lifecycle.abandon(worker.epoch);
            return Err(WorldError::TeardownTimeout(worker.teardown_timeout));
        }

        if worker.handle.join().is_err() {
            tracing::warn!("Render thread panicked");
        }
        // The stop signal has run by now unless the thread was already stale
        self.lifecycle.transition(worker.epoch, Phase::Stopped);
        tracing::info!("Render thread stopped");
        Ok(())
    }

    fn wait(&self) {
        let mut status = self.lifecycle.status.lock();
        if status.phase == Phase::Stopped {
            return;
        }
        let generation = status.generation;
        while status.generation == generation {
            self.lifecycle.changed.wait(&mut status);
        }
    }

    fn is_running(&self) -> bool {
        self.lifecycle.phase() == Phase::Running
    }

    fn submit(&self, request: PendingRequest) -> Result<Response, WorldError> {
        let bridge = self.current_bridge().ok_or(WorldError::NotRunning)?;
        bridge.request(request)
    }
}

impl Drop for ThreadedHost {
    fn drop(&mut self) {
        if self.lifecycle.phase() != Phase::Stopped
            && let Err(e) = self.deinitialize()
        {
            tracing::warn!("Failed to stop render thread: {}", e);
        }
    }
}

fn elevate_priority() {
    match thread_priority::set_current_thread_priority(ThreadPriority::Max) {
        Ok(()) => tracing::debug!("Render thread priority raised"),
        Err(e) => tracing::debug!("Could not raise render thread priority: {:?}", e),
    }
}

fn render_main(
    context: HostContext,
    endpoint: BridgeEndpoint,
    lifecycle: Arc<Lifecycle>,
    quit: Arc<AtomicBool>,
    epoch: u64,
) {
    let _stop = StopSignal {
        lifecycle: Arc::clone(&lifecycle),
        epoch,
    };
    elevate_priority();

    let mut session = match Session::open(&context) {
        Ok(session) => session,
        Err(e) => {
            lifecycle.startup_failed(epoch, e);
            return;
        }
    };
    lifecycle.transition(epoch, Phase::Running);

    while !quit.load(Ordering::Acquire) {
        lifecycle.announce_ready(epoch);
        match endpoint.next() {
            Turn::Request(envelope) => {
                let response = session.dispatch(envelope.request);
                session.process_events();
                if envelope.ack.send(response).is_err() {
                    tracing::debug!("Requester went away before its acknowledgement");
                }
            }
            Turn::Idle => {
                session.process_events();
            }
            Turn::Wake => {}
            Turn::Closed => break,
        }
    }

    session.close();
    drop(endpoint);
}
