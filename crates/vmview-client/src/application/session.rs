//! Session state machine.
//!
//! One [`Session`] exists per server connection.  It is fed inbound frames and
//! UI commands by a single driver task and reacts synchronously: updating
//! its state, painting the frame sink, publishing [`SessionEvent`]s and
//! writing replies to the [`Transport`].
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ─begin_connect→ Connecting ─transport open→ Open
//!     Open ─login→ Handshaking ─connected{userRank}→ Active
//!     any state ─close / transport lost→ Closed
//! ```
//!
//! # Turn gating
//!
//! Pointer, wheel and key input is forwarded only while the viewer holds the
//! turn or is an admin.  Everything else is dropped at trace level.  A click
//! from a regular viewer without the turn asks the server for one instead.

use std::fmt;

use base64::Engine as _;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};
use vmview_core::{
    classify, encode_key, encode_text, ClientMessage, DomKeysymTable, EncodedImage,
    InboundFrame, KeyEvent, KeysymLookup, PointerEvent, PointerState, ProtocolError,
    ServerMessage, TurnState, TurnUpdate, UserRank, VmDescriptor, WheelEvent,
};

use super::events::{EventBus, EventKind, SessionEvent};
use super::frame::{Bitmap, FrameDecoder, JpegFrameDecoder};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors raised by a [`Transport`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The connection is gone; nothing more can be written.
    #[error("transport is closed")]
    Closed,

    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

/// Errors surfaced to callers of the session and of `VmClient`.
#[derive(Debug, Error, PartialEq)]
pub enum ClientError {
    /// The session closed before the awaited event arrived.
    #[error("session closed")]
    SessionClosed,

    /// The operation needs an open connection.
    #[error("connection is not open yet")]
    NotOpen,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        ClientError::Transport(e.to_string())
    }
}

// ── Ports ─────────────────────────────────────────────────────────────────────

/// Outbound half of the connection to the server.
pub trait Transport: Send {
    /// Queues one JSON text frame.  Frames are written in call order.
    fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Starts a graceful close.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Rendering surface for the VM screen.
#[cfg_attr(test, mockall::automock)]
pub trait FrameSink: Send {
    /// The VM display resolution changed.
    fn resize(&mut self, width: u32, height: u32);

    /// Draw a full-screen update.
    fn paint(&mut self, bitmap: &Bitmap);

    /// The viewer just got the turn; grab keyboard focus.
    fn focus(&mut self);

    /// The session is closing; release the surface.
    fn detach(&mut self);
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Handshaking,
    Active,
    Closed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Open => "open",
            SessionState::Handshaking => "handshaking",
            SessionState::Active => "active",
            SessionState::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot published after every step of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub state: SessionState,
    /// `None` until the handshake completes.
    pub rank: Option<UserRank>,
    pub turn: TurnState,
}

/// The per-connection state machine.
pub struct Session {
    url: String,
    state: SessionState,
    rank: Option<UserRank>,
    turn: TurnState,
    pointer: PointerState,
    transport: Option<Box<dyn Transport>>,
    sink: Option<Box<dyn FrameSink>>,
    decoder: Box<dyn FrameDecoder>,
    keymap: Box<dyn KeysymLookup + Send>,
    events: EventBus,
}

impl Session {
    /// Creates a disconnected session for `url` painting into `sink`.
    pub fn new(url: impl Into<String>, sink: Box<dyn FrameSink>) -> Self {
        Self {
            url: url.into(),
            state: SessionState::Disconnected,
            rank: None,
            turn: TurnState::Idle,
            pointer: PointerState::default(),
            transport: None,
            sink: Some(sink),
            decoder: Box::new(JpegFrameDecoder),
            keymap: Box::new(DomKeysymTable),
            events: EventBus::new(),
        }
    }

    /// Replaces the default JPEG frame decoder.
    pub fn with_decoder(mut self, decoder: Box<dyn FrameDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replaces the default DOM keysym table.
    pub fn with_keymap(mut self, keymap: Box<dyn KeysymLookup + Send>) -> Self {
        self.keymap = keymap;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn rank(&self) -> Option<UserRank> {
        self.rank
    }

    pub fn turn(&self) -> TurnState {
        self.turn
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            rank: self.rank,
            turn: self.turn,
        }
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// `true` once a transport is attached and the session has not closed.
    pub fn is_open(&self) -> bool {
        self.state != SessionState::Closed && self.transport.as_ref().is_some_and(|t| t.is_open())
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Marks the start of a connection attempt.
    pub fn begin_connect(&mut self) {
        if self.state == SessionState::Disconnected {
            self.state = SessionState::Connecting;
            debug!("connecting to {}", self.url);
        }
    }

    /// Attaches the freshly opened transport and wakes open-waiters.
    pub fn on_transport_open(&mut self, mut transport: Box<dyn Transport>) {
        if self.state == SessionState::Closed {
            // Closed while the handshake was in flight.
            transport.close();
            return;
        }

        self.transport = Some(transport);
        self.state = SessionState::Open;
        info!("connection to {} open", self.url);
        self.events.emit(&SessionEvent::ConnectionOpened);
    }

    /// The connection dropped underneath us.
    pub fn on_transport_closed(&mut self) {
        if self.state != SessionState::Closed {
            info!("connection to {} lost", self.url);
        }
        self.close();
    }

    /// Tears the session down.  Safe to call any number of times; only the
    /// first call has an effect.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        self.events.clear();
        if let Some(mut sink) = self.sink.take() {
            sink.detach();
        }
        if let Some(mut transport) = self.transport.take() {
            if transport.is_open() {
                transport.close();
            }
        }

        self.state = SessionState::Closed;
        self.turn = TurnState::Idle;
        debug!("session for {} closed", self.url);
    }

    // ── Waits ─────────────────────────────────────────────────────────────────
    //
    // Each wait installs its one-shot listener before anything is sent, so the
    // reply cannot overtake it.

    /// Resolves once the transport is open, immediately if it already is.
    pub fn wait_open(&mut self) -> Result<oneshot::Receiver<SessionEvent>, ClientError> {
        match self.state {
            SessionState::Closed => Err(ClientError::SessionClosed),
            SessionState::Disconnected | SessionState::Connecting => {
                Ok(self.events.once(EventKind::ConnectionOpened))
            }
            SessionState::Open | SessionState::Handshaking | SessionState::Active => {
                let (tx, rx) = oneshot::channel();
                // The receiver is still in hand, so this cannot fail.
                let _ = tx.send(SessionEvent::ConnectionOpened);
                Ok(rx)
            }
        }
    }

    /// Sends the username handshake; the receiver yields
    /// [`SessionEvent::Connected`].
    pub fn login(&mut self, username: &str) -> Result<oneshot::Receiver<SessionEvent>, ClientError> {
        self.ensure_open()?;
        let rx = self.events.once(EventKind::Connected);
        self.send(&ClientMessage::Connect {
            username: username.to_string(),
        })?;
        if self.state == SessionState::Open {
            self.state = SessionState::Handshaking;
        }
        Ok(rx)
    }

    /// Sends a discovery query; the receiver yields [`SessionEvent::VmInfo`].
    pub fn list_vm(&mut self) -> Result<oneshot::Receiver<SessionEvent>, ClientError> {
        self.ensure_open()?;
        let rx = self.events.once(EventKind::VmInfo);
        self.send(&ClientMessage::GetServerInfo)?;
        Ok(rx)
    }

    // ── Inbound ───────────────────────────────────────────────────────────────

    /// Handles one binary frame from the server.
    ///
    /// Malformed frames are logged and discarded; they never end the session.
    pub fn on_frame(&mut self, bytes: &[u8]) {
        if self.state == SessionState::Closed {
            return;
        }

        match classify(bytes) {
            Ok(InboundFrame::Image(payload)) => self.on_image(&payload),
            Ok(InboundFrame::Text(msg)) => self.on_message(msg),
            Err(e) => warn!("discarding frame from {}: {e}", self.url),
        }
    }

    fn on_image(&mut self, payload: &[u8]) {
        let bitmap = match self.decoder.decode(payload) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                warn!("dropping undecodable image frame ({} bytes): {e}", payload.len());
                return;
            }
        };

        debug!("image frame {}x{}", bitmap.width, bitmap.height);
        if let Some(sink) = self.sink.as_mut() {
            sink.paint(&bitmap);
        }
        self.events.emit(&SessionEvent::DisplayUpdate(bitmap));
    }

    /// Applies one control message.
    pub fn on_message(&mut self, msg: ServerMessage) {
        debug!("received {}", msg.type_name());

        match msg {
            ServerMessage::Ping { ping_number } => {
                // Echo before anything else is processed.
                if let Err(e) = self.send(&ClientMessage::Ping { ping_number }) {
                    warn!("failed to answer ping {ping_number}: {e}");
                }
            }
            ServerMessage::ServerInfo {
                server_name,
                server_description,
                thumbnail,
            } => {
                let thumbnail = match decode_thumbnail(&thumbnail) {
                    Ok(image) => image,
                    Err(e) => {
                        warn!("unreadable serverInfo thumbnail from {}: {e}", self.url);
                        EncodedImage::jpeg(Vec::new())
                    }
                };
                let vm = VmDescriptor {
                    name: server_name,
                    description: server_description,
                    url: self.url.clone(),
                    thumbnail,
                };
                self.events.emit(&SessionEvent::VmInfo(vm));
            }
            ServerMessage::VgaSizeUpdate { width, height } => {
                if let Some(sink) = self.sink.as_mut() {
                    sink.resize(width, height);
                }
            }
            ServerMessage::Connected { user_rank } => {
                self.rank = Some(user_rank);
                self.state = SessionState::Active;
                info!("logged in to {} as {user_rank} user", self.url);
                self.events.emit(&SessionEvent::Connected(user_rank));
            }
            ServerMessage::YourTurn { seconds_remaining } => {
                self.turn = TurnState::Mine;
                if let Some(sink) = self.sink.as_mut() {
                    sink.focus();
                }
                self.events
                    .emit(&SessionEvent::TurnUpdate(TurnUpdate::mine(seconds_remaining)));
            }
            ServerMessage::TurnUpdate {
                seconds_remaining,
                queue_size,
            } => {
                self.turn = TurnState::Idle;
                self.events.emit(&SessionEvent::TurnUpdate(TurnUpdate::waiting(
                    seconds_remaining,
                    queue_size,
                )));
            }
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────
    //
    // Each returns whether a message was actually sent.

    /// Pointer move, press or release.
    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        if !self.may_send_input("pointer") {
            return false;
        }
        self.pointer = self.pointer.with_pointer(event);
        let msg = self.pointer.to_message();
        self.send_input(&msg)
    }

    /// Wheel notch.
    pub fn wheel(&mut self, event: WheelEvent) -> bool {
        if !self.may_send_input("wheel") {
            return false;
        }
        self.pointer = self.pointer.with_wheel(event);
        let msg = self.pointer.to_message();
        self.send_input(&msg)
    }

    /// Key press or release.  Keys without a keysym are dropped.
    pub fn key(&mut self, event: &KeyEvent) -> bool {
        if !self.may_send_input("key") {
            return false;
        }
        let Some(input) = encode_key(self.keymap.as_ref(), event) else {
            trace!("dropping key input: no keysym");
            return false;
        };
        self.send_input(&input.to_message())
    }

    /// A click on the display.  A regular viewer without the turn joins the
    /// queue; everyone else is ignored.
    pub fn click(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        match (self.rank, self.turn) {
            (Some(UserRank::AdminUser), _) | (_, TurnState::Mine) => false,
            (Some(UserRank::RegularUser) | None, TurnState::Idle) => {
                debug!("requesting a turn on {}", self.url);
                self.send_input(&ClientMessage::Turn { taking_turn: true })
            }
        }
    }

    fn may_send_input(&self, what: &str) -> bool {
        if !self.is_open() {
            trace!("dropping {what} input: connection not open");
            return false;
        }
        let allowed = match (self.rank, self.turn) {
            (Some(UserRank::AdminUser), _) => true,
            (_, TurnState::Mine) => true,
            (Some(UserRank::RegularUser) | None, TurnState::Idle) => false,
        };
        if !allowed {
            trace!("dropping {what} input: not our turn");
        }
        allowed
    }

    fn send_input(&mut self, msg: &ClientMessage) -> bool {
        match self.send(msg) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to send {}: {e}", msg.type_name());
                false
            }
        }
    }

    // ── Outbound ──────────────────────────────────────────────────────────────

    fn ensure_open(&self) -> Result<(), ClientError> {
        match self.state {
            SessionState::Closed => Err(ClientError::SessionClosed),
            _ if self.is_open() => Ok(()),
            _ => Err(ClientError::NotOpen),
        }
    }

    /// Encodes and writes `msg`.  A transport failure closes the session.
    fn send(&mut self, msg: &ClientMessage) -> Result<(), ClientError> {
        let text = encode_text(msg)?;
        let Some(transport) = self.transport.as_mut() else {
            return Err(ClientError::NotOpen);
        };

        match transport.send_text(text) {
            Ok(()) => {
                trace!("sent {}", msg.type_name());
                Ok(())
            }
            Err(e) => {
                self.close();
                Err(e.into())
            }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.url)
            .field("state", &self.state)
            .field("rank", &self.rank)
            .field("turn", &self.turn)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

fn decode_thumbnail(encoded: &str) -> Result<EncodedImage, ProtocolError> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map(EncodedImage::jpeg)
        .map_err(|e| ProtocolError::MalformedJson(format!("thumbnail is not base64: {e}")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
