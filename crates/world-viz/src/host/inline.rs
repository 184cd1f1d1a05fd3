//! Host running the session on the caller's thread

use std::cell::RefCell;

use super::{HostContext, RenderHost};
use crate::error::WorldError;
use crate::request::{PendingRequest, Response};
use crate::session::Session;

/// Session owned by the thread that created the host.
///
/// The host is `!Sync`, so it can never be reached from two threads.
/// Pending widget events are processed after each request and on [`wait`].
///
/// [`wait`]: RenderHost::wait
#[derive(Default)]
pub struct InlineHost {
    session: RefCell<Option<Session>>,
}

impl InlineHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderHost for InlineHost {
    fn initialize(&self, context: &HostContext) -> Result<(), WorldError> {
        let mut slot = self.session.borrow_mut();
        if slot.is_some() {
            return Ok(());
        }
        *slot = Some(Session::open(context)?);
        Ok(())
    }

    fn deinitialize(&self) -> Result<(), WorldError> {
        if let Some(session) = self.session.borrow_mut().take() {
            session.close();
        }
        Ok(())
    }

    fn wait(&self) {
        if let Some(session) = self.session.borrow_mut().as_mut() {
            session.process_events();
        }
    }

    fn is_running(&self) -> bool {
        self.session.borrow().is_some()
    }

    fn submit(&self, request: PendingRequest) -> Result<Response, WorldError> {
        let mut slot = self.session.borrow_mut();
        let session = slot.as_mut().ok_or(WorldError::NotRunning)?;
        let response = session.dispatch(request);
        session.process_events();
        Ok(response)
    }
}
