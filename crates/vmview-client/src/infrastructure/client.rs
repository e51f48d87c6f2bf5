//! `VmClient`: the async handle to one server connection.
//!
//! [`VmClient::connect`] spawns a driver task that owns the [`Session`].  The
//! handle talks to it over an unbounded command channel; session status is
//! published back through a `watch` channel.  Every inbound frame and every
//! command is processed on the driver task in arrival order, so the session
//! needs no locks.
//!
//! ```text
//! VmClient ──Command──▶ driver task ──▶ Session ──▶ WsTransport ──▶ writer task
//!     ▲                     │   ▲
//!     └──watch(status)──────┘   └── WebSocket read half
//! ```
//!
//! Waits (`wait_until_connection_open`, `login`, `list_vm`) have no internal
//! timeout.  They fail with [`ClientError::SessionClosed`] when the session
//! closes first; wrap them in `tokio::time::timeout` if a bound is needed.

use std::ops::ControlFlow;

use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vmview_core::{KeyEvent, PointerEvent, UserRank, VmDescriptor, WheelEvent};

use crate::application::events::{EventKind, SessionEvent, SubscriptionId};
use crate::application::session::{ClientError, FrameSink, Session, SessionState, SessionStatus};
use crate::infrastructure::transport::WsTransport;

type EventReply = oneshot::Sender<Result<oneshot::Receiver<SessionEvent>, ClientError>>;

/// Requests from the handle to the driver task.
enum Command {
    WaitOpen(EventReply),
    Login { username: String, reply: EventReply },
    ListVm(EventReply),
    Subscribe {
        kind: EventKind,
        callback: Box<dyn FnMut(&SessionEvent) + Send>,
        reply: oneshot::Sender<SubscriptionId>,
    },
    Unsubscribe {
        id: SubscriptionId,
        reply: oneshot::Sender<bool>,
    },
    Pointer(PointerEvent),
    Wheel(WheelEvent),
    Key(KeyEvent),
    Click,
    Close(oneshot::Sender<()>),
}

/// Handle to a viewer session.  Dropping it closes the session.
#[derive(Debug)]
pub struct VmClient {
    url: String,
    session_id: Uuid,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SessionStatus>,
}

impl VmClient {
    /// Starts connecting to `url`, painting screen updates into `sink`.
    ///
    /// Returns immediately; use [`VmClient::wait_until_connection_open`] to
    /// wait for the WebSocket.  Must be called inside a tokio runtime.
    pub fn connect(url: impl Into<String>, sink: Box<dyn FrameSink>) -> Self {
        Self::with_session(Session::new(url, sink))
    }

    /// Like [`VmClient::connect`] for a pre-configured session (custom frame
    /// decoder or keymap).
    pub fn with_session(mut session: Session) -> Self {
        let url = session.url().to_string();
        let session_id = Uuid::new_v4();
        session.begin_connect();

        let (commands, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(session.status());

        info!("session {session_id}: connecting to {url}");
        tokio::spawn(run_driver(session, command_rx, status_tx, session_id));

        Self {
            url,
            session_id,
            commands,
            status,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Latest published session status.
    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// A receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Resolves once the WebSocket is open; immediately if it already is.
    pub async fn wait_until_connection_open(&self) -> Result<(), ClientError> {
        self.await_event(Command::WaitOpen).await.map(|_| ())
    }

    /// Performs the username handshake and returns the rank the server
    /// assigned.
    pub async fn login(&self, username: &str) -> Result<UserRank, ClientError> {
        let username = username.to_string();
        let event = self
            .await_event(|reply| Command::Login { username, reply })
            .await?;
        match event {
            SessionEvent::Connected(rank) => Ok(rank),
            _ => Err(ClientError::SessionClosed),
        }
    }

    /// Queries the server for its descriptor.
    pub async fn list_vm(&self) -> Result<VmDescriptor, ClientError> {
        match self.await_event(Command::ListVm).await? {
            SessionEvent::VmInfo(vm) => Ok(vm),
            _ => Err(ClientError::SessionClosed),
        }
    }

    /// Subscribes `callback` to every event of `kind`.  The callback runs on
    /// the driver task and must not block.
    pub async fn on<F>(&self, kind: EventKind, callback: F) -> Result<SubscriptionId, ClientError>
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        let callback = Box::new(callback);
        self.request(|reply| Command::Subscribe {
            kind,
            callback,
            reply,
        })
        .await
    }

    /// Removes a subscription.  Returns `false` if it was not registered.
    pub async fn off(&self, id: SubscriptionId) -> Result<bool, ClientError> {
        self.request(|reply| Command::Unsubscribe { id, reply }).await
    }

    /// Pointer move, press or release.  Dropped unless input is allowed.
    pub fn pointer(&self, event: PointerEvent) {
        self.fire(Command::Pointer(event));
    }

    /// Wheel notch.  Dropped unless input is allowed.
    pub fn wheel(&self, event: WheelEvent) {
        self.fire(Command::Wheel(event));
    }

    /// Key press or release.  Dropped unless input is allowed.
    pub fn key(&self, event: KeyEvent) {
        self.fire(Command::Key(event));
    }

    /// A click on the display; requests the turn when we do not have it.
    pub fn click(&self) {
        self.fire(Command::Click);
    }

    /// Closes the session and waits for the driver to finish the teardown.
    /// Further calls return at once.
    pub async fn close(&self) {
        // An error here means the driver is already gone.
        let _ = self.request(Command::Close).await;
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn fire(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("session {}: input after close ignored", self.session_id);
        }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .map_err(|_| ClientError::SessionClosed)?;
        rx.await.map_err(|_| ClientError::SessionClosed)
    }

    async fn await_event(&self, make: impl FnOnce(EventReply) -> Command) -> Result<SessionEvent, ClientError> {
        let waiter = self.request(make).await??;
        waiter.await.map_err(|_| ClientError::SessionClosed)
    }
}

// ── Driver task ───────────────────────────────────────────────────────────────

async fn run_driver(
    mut session: Session,
    mut commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<SessionStatus>,
    session_id: Uuid,
) {
    let url = session.url().to_string();
    let connecting = connect_async(url.as_str());
    tokio::pin!(connecting);

    // ── Phase 1: WebSocket handshake ──────────────────────────────────────────
    let ws_stream = loop {
        tokio::select! {
            result = &mut connecting => match result {
                Ok((ws_stream, _response)) => break Some(ws_stream),
                Err(e) => {
                    warn!("session {session_id}: failed to connect to {url}: {e}");
                    break None;
                }
            },
            command = commands.recv() => {
                let flow = match command {
                    Some(command) => handle_command(&mut session, command),
                    None => ControlFlow::Break(()),
                };
                status.send_replace(session.status());
                if flow.is_break() {
                    break None;
                }
            }
        }
    };

    let Some(ws_stream) = ws_stream else {
        session.close();
        status.send_replace(session.status());
        return;
    };

    // ── Phase 2: connected ────────────────────────────────────────────────────
    let (write, mut read) = ws_stream.split();
    let (transport, writer) = WsTransport::spawn(write, session_id.to_string());
    session.on_transport_open(Box::new(transport));
    status.send_replace(session.status());

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(WsMessage::Binary(bytes))) => session.on_frame(&bytes),
                Some(Ok(WsMessage::Text(text))) => session.on_frame(text.as_bytes()),
                Some(Ok(WsMessage::Close(_))) | None => {
                    info!("session {session_id}: server closed the connection");
                    session.on_transport_closed();
                }
                // Ping/pong is answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("session {session_id}: WebSocket read failed: {e}");
                    session.on_transport_closed();
                }
            },
            command = commands.recv() => match command {
                Some(command) => {
                    // Close is the only command that breaks, and it closes the
                    // session on the way out.
                    let _ = handle_command(&mut session, command);
                }
                None => {
                    debug!("session {session_id}: handle dropped");
                    session.close();
                }
            },
        }

        status.send_replace(session.status());
        if session.state() == SessionState::Closed {
            break;
        }
    }

    // The close frame (if any) is already queued; let the writer flush it.
    drop(session);
    let _ = writer.await;
    info!("session {session_id}: finished");
}

fn handle_command(session: &mut Session, command: Command) -> ControlFlow<()> {
    match command {
        Command::WaitOpen(reply) => {
            let _ = reply.send(session.wait_open());
        }
        Command::Login { username, reply } => {
            let _ = reply.send(session.login(&username));
        }
        Command::ListVm(reply) => {
            let _ = reply.send(session.list_vm());
        }
        Command::Subscribe {
            kind,
            callback,
            reply,
        } => {
            let _ = reply.send(session.events_mut().on(kind, callback));
        }
        Command::Unsubscribe { id, reply } => {
            let _ = reply.send(session.events_mut().off(id));
        }
        Command::Pointer(event) => {
            session.pointer(event);
        }
        Command::Wheel(event) => {
            session.wheel(event);
        }
        Command::Key(event) => {
            session.key(&event);
        }
        Command::Click => {
            session.click();
        }
        Command::Close(reply) => {
            session.close();
            let _ = reply.send(());
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
