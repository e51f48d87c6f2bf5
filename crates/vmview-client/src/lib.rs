//! vmview-client library crate.
//!
//! Connects to a shared-VM server over WebSocket, keeps the session state
//! machine (handshake, turn arbitration, ping echo), routes screen updates to
//! a frame sink and forwards local input while the viewer holds the turn.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! UI / CLI
//!     ↕  VmClient handle (commands over mpsc, status over watch)
//! [vmview-client]
//!   ├── domain/           ClientConfig
//!   ├── application/      Session state machine, event bus, frame decoder
//!   └── infrastructure/
//!         ├── client/     Driver task owning the Session
//!         ├── transport/  WebSocket writer task
//!         ├── discovery/  serverInfo queries across configured endpoints
//!         ├── display/    Headless frame sink
//!         └── storage/    TOML config persistence
//!     ↕  binary frames in, JSON text out
//! VM server
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` is synchronous and talks to the outside world only through
//!   the [`application::session::Transport`] and
//!   [`application::session::FrameSink`] traits.
//! - `infrastructure` supplies tokio, tungstenite and the file system.

/// Domain layer: configuration values.
pub mod domain;

/// Application layer: the session state machine and its collaborators.
pub mod application;

/// Infrastructure layer: WebSocket driver, discovery, display, storage.
pub mod infrastructure;

pub use application::events::{EventBus, EventKind, SessionEvent, SubscriptionId};
pub use application::frame::{Bitmap, DecodeError, FrameDecoder, JpegFrameDecoder};
pub use application::session::{
    ClientError, FrameSink, Session, SessionState, SessionStatus, Transport, TransportError,
};
pub use infrastructure::client::VmClient;
pub use infrastructure::discovery::discover;
pub use infrastructure::display::HeadlessDisplay;
