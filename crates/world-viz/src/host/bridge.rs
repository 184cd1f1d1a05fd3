//! Event bridge between requesting threads and the render thread.
//!
//! Requests travel one at a time: a requester holds the request lock from
//! posting until its acknowledgement arrives, so the render thread never sees
//! two requests interleaved. Each request carries its own one-slot ack
//! channel.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, select};
use parking_lot::Mutex;

use crate::config::TimingConfig;
use crate::error::WorldError;
use crate::request::{PendingRequest, Response};

/// A request together with the channel its response goes back on
pub(crate) struct Envelope {
    pub request: PendingRequest,
    pub ack: Sender<Response>,
}

/// Requesting side, shared by every caller thread
pub(crate) struct EventBridge {
    request_lock: Mutex<()>,
    requests: Sender<Envelope>,
    request_yield: Duration,
}

/// What the render loop should do next
pub(crate) enum Turn {
    Request(Envelope),
    /// Nothing arrived within the idle interval
    Idle,
    /// Woken to re-check the quit flag
    Wake,
    /// Every requester is gone
    Closed,
}

/// Render-thread side of the bridge
pub(crate) struct BridgeEndpoint {
    requests: Receiver<Envelope>,
    wake: Receiver<()>,
    idle_interval: Duration,
}

/// Create both sides of a bridge plus the sender used to wake the loop
pub(crate) fn channel(timing: &TimingConfig) -> (EventBridge, BridgeEndpoint, Sender<()>) {
    let (request_tx, request_rx) = bounded(1);
    let (wake_tx, wake_rx) = bounded(1);
    (
        EventBridge {
            request_lock: Mutex::new(()),
            requests: request_tx,
            request_yield: timing.request_yield(),
        },
        BridgeEndpoint {
            requests: request_rx,
            wake: wake_rx,
            idle_interval: timing.idle_interval(),
        },
        wake_tx,
    )
}

impl EventBridge {
    /// Post a request and block until the render thread acknowledges it.
    pub(crate) fn request(&self, request: PendingRequest) -> Result<Response, WorldError> {
        let kind = request.kind();
        let response = {
            let _guard = self.request_lock.lock();
            let (ack_tx, ack_rx) = bounded(1);
            self.requests
                .send(Envelope {
                    request,
                    ack: ack_tx,
                })
                .map_err(|_| WorldError::Disconnected)?;
            ack_rx.recv().map_err(|_| WorldError::Disconnected)?
        };
        tracing::trace!("Request {} acknowledged", kind);

        if !self.request_yield.is_zero() {
            std::thread::sleep(self.request_yield);
        }
        Ok(response)
    }
}

impl BridgeEndpoint {
    /// Wait for the next request, a wake-up or the idle interval.
    pub(crate) fn next(&self) -> Turn {
        select! {
            recv(self.requests) -> msg => match msg {
                Ok(envelope) => Turn::Request(envelope),
                Err(_) => Turn::Closed,
            },
            recv(self.wake) -> _ => Turn::Wake,
            default(self.idle_interval) => Turn::Idle,
        }
    }
}
