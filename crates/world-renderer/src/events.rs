//! Widget event queue.
//!
//! Events can be posted from any thread; they are only ever dispatched on the
//! thread that owns the widget, in batches selected by an [`EventFilter`].

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// An event delivered to a widget.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    Resize { width: u32, height: u32 },
    Show,
    Hide,
    Minimize,
    Restore,
    Close,
    /// Pointer drag in pixels.
    PointerDrag { dx: f64, dy: f64 },
    /// Scroll in wheel steps.
    Scroll { delta: f64 },
    KeyPress(char),
    Timer,
    /// Activity on a watched socket.
    SocketNotifier(u32),
}

/// Broad event classes used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Window,
    UserInput,
    Timer,
    SocketNotifier,
}

impl WidgetEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            WidgetEvent::Resize { .. }
            | WidgetEvent::Show
            | WidgetEvent::Hide
            | WidgetEvent::Minimize
            | WidgetEvent::Restore
            | WidgetEvent::Close => EventCategory::Window,
            WidgetEvent::PointerDrag { .. } | WidgetEvent::Scroll { .. } | WidgetEvent::KeyPress(_) => {
                EventCategory::UserInput
            }
            WidgetEvent::Timer => EventCategory::Timer,
            WidgetEvent::SocketNotifier(_) => EventCategory::SocketNotifier,
        }
    }
}

/// Selects which events a processing pass dispatches.
///
/// Excluded events stay queued for a later pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub exclude_user_input: bool,
    pub exclude_socket_notifiers: bool,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl EventFilter {
    /// Dispatch everything.
    pub fn all() -> Self {
        Self {
            exclude_user_input: false,
            exclude_socket_notifiers: false,
        }
    }

    /// Filter used by the render loop: socket notifiers are never
    /// dispatched, user input only while the window is shown.
    pub fn for_window(shown: bool) -> Self {
        Self {
            exclude_user_input: !shown,
            exclude_socket_notifiers: true,
        }
    }

    pub fn accepts(&self, event: &WidgetEvent) -> bool {
        match event.category() {
            EventCategory::UserInput => !self.exclude_user_input,
            EventCategory::SocketNotifier => !self.exclude_socket_notifiers,
            EventCategory::Window | EventCategory::Timer => true,
        }
    }
}

/// Shared FIFO of pending widget events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<WidgetEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, event: WidgetEvent) {
        self.inner.lock().push_back(event);
    }

    /// Removes and returns the events accepted by `filter`, in posting order.
    pub fn take_batch(&self, filter: EventFilter) -> Vec<WidgetEvent> {
        let mut queue = self.inner.lock();
        let mut batch = Vec::new();
        let mut deferred = VecDeque::with_capacity(queue.len());
        for event in queue.drain(..) {
            if filter.accepts(&event) {
                batch.push(event);
            } else {
                deferred.push_back(event);
            }
        }
        *queue = deferred;
        batch
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_events_stay_queued() {
        let queue = EventQueue::new();
        queue.post(WidgetEvent::PointerDrag { dx: 1.0, dy: 0.0 });
        queue.post(WidgetEvent::Resize { width: 10, height: 10 });
        queue.post(WidgetEvent::SocketNotifier(3));

        let batch = queue.take_batch(EventFilter::for_window(false));
        assert_eq!(batch, vec![WidgetEvent::Resize { width: 10, height: 10 }]);
        assert_eq!(queue.len(), 2);

        let batch = queue.take_batch(EventFilter::for_window(true));
        assert_eq!(batch, vec![WidgetEvent::PointerDrag { dx: 1.0, dy: 0.0 }]);
        assert_eq!(queue.len(), 1);

        let batch = queue.take_batch(EventFilter::all());
        assert_eq!(batch, vec![WidgetEvent::SocketNotifier(3)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_is_shared_between_clones() {
        let queue = EventQueue::new();
        let poster = queue.clone();
        std::thread::spawn(move || poster.post(WidgetEvent::Timer))
            .join()
            .unwrap();
        assert_eq!(queue.take_batch(EventFilter::all()), vec![WidgetEvent::Timer]);
    }
}
