//! Per-session event bus.
//!
//! Each [`Session`](super::session::Session) owns one [`EventBus`].  Listeners
//! are either persistent callbacks registered with [`EventBus::on`] or one-shot
//! waiters created by [`EventBus::once`].  A one-shot waiter is removed from
//! the bus *before* its event is delivered, so it can never fire twice.
//!
//! Dropping or clearing the bus drops every pending one-shot sender, which
//! wakes the corresponding receivers with a `RecvError`.  Callers map that to
//! "session closed".

use std::fmt;

use tokio::sync::oneshot;
use vmview_core::{TurnUpdate, UserRank, VmDescriptor};

use super::frame::Bitmap;

/// The kinds of event a session publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ConnectionOpened,
    Connected,
    VmInfo,
    DisplayUpdate,
    TurnUpdate,
}

/// An event together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The WebSocket finished opening.
    ConnectionOpened,
    /// The server accepted our username and assigned a rank.
    Connected(UserRank),
    /// Reply to a discovery query.
    VmInfo(VmDescriptor),
    /// A screen update was decoded and painted.
    DisplayUpdate(Bitmap),
    /// Turn ownership or queue status changed.
    TurnUpdate(TurnUpdate),
}

impl SessionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::ConnectionOpened => EventKind::ConnectionOpened,
            SessionEvent::Connected(_) => EventKind::Connected,
            SessionEvent::VmInfo(_) => EventKind::VmInfo,
            SessionEvent::DisplayUpdate(_) => EventKind::DisplayUpdate,
            SessionEvent::TurnUpdate(_) => EventKind::TurnUpdate,
        }
    }
}

/// Handle returned by [`EventBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Persistent listener callback.  Runs on the session's driver task.
pub type Callback = Box<dyn FnMut(&SessionEvent) + Send>;

enum Listener {
    Persistent(Callback),
    Once(oneshot::Sender<SessionEvent>),
}

struct Entry {
    id: SubscriptionId,
    kind: EventKind,
    listener: Listener,
}

/// Registry of listeners, keyed by [`EventKind`], in subscription order.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    entries: Vec<Entry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for every future event of `kind`.
    pub fn on(&mut self, kind: EventKind, callback: Callback) -> SubscriptionId {
        self.push(kind, Listener::Persistent(callback))
    }

    /// Registers a waiter for the next event of `kind` only.
    ///
    /// The receiver yields `Err(RecvError)` if the bus is cleared or dropped
    /// before such an event occurs.
    pub fn once(&mut self, kind: EventKind) -> oneshot::Receiver<SessionEvent> {
        let (tx, rx) = oneshot::channel();
        self.push(kind, Listener::Once(tx));
        rx
    }

    /// Removes a listener.  Returns `false` if `id` was not registered (or
    /// was a one-shot waiter that already fired).
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Delivers `event` to every listener of its kind and returns how many
    /// received it.
    pub fn emit(&mut self, event: &SessionEvent) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        let mut i = 0;

        while i < self.entries.len() {
            if self.entries[i].kind != kind {
                i += 1;
                continue;
            }

            if let Listener::Persistent(callback) = &mut self.entries[i].listener {
                callback(event);
                delivered += 1;
                i += 1;
                continue;
            }

            // One-shot: unregister first, then deliver.
            let entry = self.entries.remove(i);
            if let Listener::Once(tx) = entry.listener {
                // A dropped receiver means the caller stopped waiting.
                if tx.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }

        delivered
    }

    /// Drops every listener.  Pending one-shot receivers observe a `RecvError`.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, kind: EventKind, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, kind, listener });
        id
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.entries.len())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recording(log: &Arc<Mutex<Vec<SessionEvent>>>) -> Callback {
        let log = Arc::clone(log);
        Box::new(move |e| log.lock().unwrap().push(e.clone()))
    }

    #[test]
    fn test_emit_reaches_only_matching_kind() {
        // Arrange
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.on(EventKind::Connected, recording(&log));

        // Act
        let opened = bus.emit(&SessionEvent::ConnectionOpened);
        let connected = bus.emit(&SessionEvent::Connected(UserRank::RegularUser));

        // Assert
        assert_eq!(opened, 0);
        assert_eq!(connected, 1);
        assert_eq!(
            *log.lock().unwrap(),
            vec![SessionEvent::Connected(UserRank::RegularUser)]
        );
    }

    #[test]
    fn test_persistent_listener_fires_every_time() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.on(EventKind::TurnUpdate, recording(&log));

        bus.emit(&SessionEvent::TurnUpdate(TurnUpdate::mine(Some(30))));
        bus.emit(&SessionEvent::TurnUpdate(TurnUpdate::waiting(None, 2)));

        assert_eq!(log.lock().unwrap().len(), 2);
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_once_fires_at_most_once_and_is_removed() {
        // Arrange
        let mut bus = EventBus::new();
        let mut rx = bus.once(EventKind::ConnectionOpened);

        // Act
        let first = bus.emit(&SessionEvent::ConnectionOpened);
        let second = bus.emit(&SessionEvent::ConnectionOpened);

        // Assert
        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert!(bus.is_empty());
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::ConnectionOpened);
    }

    #[test]
    fn test_two_once_waiters_both_fire() {
        let mut bus = EventBus::new();
        let mut a = bus.once(EventKind::VmInfo);
        let mut b = bus.once(EventKind::Connected);
        let mut c = bus.once(EventKind::Connected);

        let delivered = bus.emit(&SessionEvent::Connected(UserRank::AdminUser));

        assert_eq!(delivered, 2);
        assert!(a.try_recv().is_err());
        assert!(b.try_recv().is_ok());
        assert!(c.try_recv().is_ok());
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_off_removes_listener() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        let id = bus.on(EventKind::ConnectionOpened, recording(&log));

        assert!(bus.off(id));
        assert!(!bus.off(id));
        assert_eq!(bus.emit(&SessionEvent::ConnectionOpened), 0);
    }

    #[test]
    fn test_clear_releases_pending_waiters() {
        // Arrange
        let mut bus = EventBus::new();
        let rx = bus.once(EventKind::Connected);

        // Act
        bus.clear();

        // Assert: the sender was dropped, so the waiter is woken with an error
        assert!(tokio_test::block_on(rx).is_err());
        assert!(bus.is_empty());
    }

    #[test]
    fn test_once_with_dropped_receiver_is_not_counted() {
        let mut bus = EventBus::new();
        drop(bus.once(EventKind::ConnectionOpened));

        assert_eq!(bus.emit(&SessionEvent::ConnectionOpened), 0);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        let mut bus = EventBus::new();
        let a = bus.on(EventKind::VmInfo, Box::new(|_| {}));
        let b = bus.on(EventKind::VmInfo, Box::new(|_| {}));
        assert_ne!(a, b);
    }
}
