//! The plugin's WebSocket connection to the host.
//!
//! A single supervisor task owns the socket. It opens the socket, sends the
//! handshake, marks the connection ready and then runs the session: inbound
//! frames are decoded and emitted one at a time, queued outbound frames are
//! written in order. When the session ends the supervisor waits out the
//! backoff and opens a new socket.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use deck_events::{correlator, EventDispatcher, ListenerId, PendingReply, Subscription};
use deck_protocol::{codec, Command, Decoded, Handshake, InboundEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::backoff::Backoff;
use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, Result};
use crate::state::ConnectionState;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A frame waiting for a ready session.
struct Outbound {
    frame: String,
    written: oneshot::Sender<Result<()>>,
}

/// Why a session ended.
struct SessionEnd {
    /// Whether the handshake was sent before the session ended
    handshaken: bool,
    reason: String,
}

struct Inner {
    config: ConnectionConfig,
    dispatcher: EventDispatcher<InboundEvent>,
    state: watch::Sender<ConnectionState>,
    outbound_tx: mpsc::UnboundedSender<Outbound>,
    outbound_rx: AsyncMutex<mpsc::UnboundedReceiver<Outbound>>,
    supervisor: parking_lot::Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
    sockets_opened: AtomicU64,
}

impl Inner {
    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::info!("Connection state {} -> {}", previous, state);
        }
    }

    /// Decode one inbound frame and emit it. Never fails.
    fn handle_frame(&self, text: &str) {
        match codec::decode(text) {
            Ok(Decoded::Event(event)) => {
                tracing::debug!(
                    event = %event.event,
                    action = ?event.action,
                    context = ?event.context,
                    "Received event"
                );
                let delivered = self.dispatcher.emit(&event.event, &event);
                if delivered == 0 {
                    tracing::trace!("No listeners for {}", event.event);
                }
            }
            Ok(Decoded::Unrecognized(_)) => {
                tracing::warn!(frame = %text, "Dropping frame without an event tag");
            }
            Err(error) => {
                tracing::error!(
                    frame = %error.raw,
                    cause = %error.source,
                    "Dropping frame that could not be decoded"
                );
            }
        }
    }
}

/// Shared by every [`Connection`] clone. The supervisor only holds the
/// [`Inner`], so dropping the last handle stops it.
struct Owner {
    shared: Arc<Inner>,
}

impl std::ops::Deref for Owner {
    type Target = Inner;

    fn deref(&self) -> &Inner {
        &self.shared
    }
}

impl Drop for Owner {
    fn drop(&mut self) {
        if let Some(task) = self.shared.supervisor.lock().take() {
            tracing::debug!("Last connection handle dropped; stopping supervisor");
            task.abort();
        }
    }
}

/// Handle to the connection. Clones share the same socket and listeners.
///
/// Dropping every handle stops the connection as [`close`](Self::close)
/// would, without waiting for it.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Owner>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.inner.config.url())
            .field("state", &self.state())
            .finish()
    }
}

impl Connection {
    /// Create a connection in the `Disconnected` state. Nothing is opened
    /// until [`connect`](Self::connect) is called.
    pub fn new(config: ConnectionConfig) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(Owner {
                shared: Arc::new(Inner {
                    config,
                    dispatcher: EventDispatcher::new(),
                    state,
                    outbound_tx,
                    outbound_rx: AsyncMutex::new(outbound_rx),
                    supervisor: parking_lot::Mutex::new(None),
                    closed: AtomicBool::new(false),
                    sockets_opened: AtomicU64::new(0),
                }),
            }),
        }
    }

    /// A handle that does not keep the connection alive.
    pub fn downgrade(&self) -> WeakConnection {
        WeakConnection {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Start connecting. Returns immediately; the socket is opened by a
    /// background task on the current tokio runtime.
    ///
    /// Calling this while the connection is already connecting or connected
    /// does nothing.
    pub fn connect(&self) -> Result<()> {
        let mut supervisor = self.inner.supervisor.lock();
        if supervisor.as_ref().is_some_and(|task| !task.is_finished()) {
            tracing::debug!("connect() called on a live connection; ignoring");
            return Ok(());
        }

        self.inner.config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ConnectionError::NoRuntime)?;

        self.inner.closed.store(false, Ordering::SeqCst);
        self.inner.set_state(ConnectionState::Connecting);
        *supervisor = Some(runtime.spawn(supervise(Arc::clone(&self.inner.shared))));
        Ok(())
    }

    /// Stop the connection and fail every queued send with
    /// [`ConnectionError::Closed`].
    pub async fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let task = self.inner.supervisor.lock().take();
        if let Some(task) = task {
            task.abort();
            let _ = task.await;
        }

        let mut outbound = self.inner.outbound_rx.lock().await;
        while let Ok(pending) = outbound.try_recv() {
            let _ = pending.written.send(Err(ConnectionError::Closed));
        }
        self.inner.set_state(ConnectionState::Disconnected);
        tracing::info!("Connection to {} closed", self.inner.config.url());
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Wait until the handshake has been sent on a live socket.
    ///
    /// Fails with [`ConnectionError::Closed`] once the connection is closed.
    pub async fn wait_until_connected(&self) -> Result<()> {
        let mut changes = self.state_changes();
        let closed = &self.inner.closed;
        let connected = changes
            .wait_for(|state| state.is_connected() || closed.load(Ordering::SeqCst))
            .await
            .map(|state| state.is_connected())
            .map_err(|_| ConnectionError::Closed)?;

        if connected && !closed.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ConnectionError::Closed)
        }
    }

    /// Number of sockets opened since this connection was created.
    pub fn sockets_opened(&self) -> u64 {
        self.inner.sockets_opened.load(Ordering::Acquire)
    }

    /// Encode and write a command once the connection is ready.
    ///
    /// Suspends until the frame has been written. Commands issued before the
    /// handshake are written after it, in the order they were issued. If the
    /// socket fails during the write the frame is dropped, not retried.
    pub async fn send(&self, command: &Command) -> Result<()> {
        let frame = codec::encode(command)?;
        self.send_frame(frame).await
    }

    /// Like [`send`](Self::send), giving up after `timeout`.
    ///
    /// A command that timed out is never written later.
    pub async fn send_with_timeout(&self, command: &Command, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.send(command)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Timeout(timeout)),
        }
    }

    async fn send_frame(&self, frame: String) -> Result<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(ConnectionError::Closed);
        }

        let (written, ack) = oneshot::channel();
        self.inner
            .outbound_tx
            .send(Outbound { frame, written })
            .map_err(|_| ConnectionError::Closed)?;

        // close() may have drained the queue between the check and the
        // enqueue. Dropping `ack` makes the supervisor skip the frame.
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(ConnectionError::Closed);
        }

        ack.await.map_err(|_| ConnectionError::Closed)?
    }

    /// Send `command` and wait for the next `reply_event`, whoever it is for.
    ///
    /// The waiter is registered before the command is sent.
    pub async fn request_once(
        &self,
        command: &Command,
        reply_event: impl AsRef<str>,
    ) -> Result<PendingReply<InboundEvent>> {
        let pending = correlator::expect_once(&self.inner.dispatcher, reply_event.as_ref());
        self.send(command).await?;
        Ok(pending)
    }

    /// Send `command` and wait for the next `reply_event` addressed to the
    /// command's context.
    pub async fn request_for_context(
        &self,
        command: &Command,
        reply_event: impl AsRef<str>,
    ) -> Result<PendingReply<InboundEvent>> {
        let context = command
            .context
            .clone()
            .ok_or_else(|| ConnectionError::MissingContext(command.event.clone()))?;
        let pending = correlator::expect_context(&self.inner.dispatcher, reply_event.as_ref(), context);
        self.send(command).await?;
        Ok(pending)
    }

    /// The dispatcher inbound events are emitted on.
    pub fn dispatcher(&self) -> &EventDispatcher<InboundEvent> {
        &self.inner.dispatcher
    }

    pub fn on<F>(&self, event: impl AsRef<str>, listener: F) -> ListenerId
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        self.inner.dispatcher.on(event.as_ref(), listener)
    }

    pub fn once<F>(&self, event: impl AsRef<str>, listener: F) -> ListenerId
    where
        F: FnOnce(&InboundEvent) + Send + 'static,
    {
        self.inner.dispatcher.once(event.as_ref(), listener)
    }

    pub fn remove_listener(&self, event: impl AsRef<str>, id: ListenerId) -> bool {
        self.inner.dispatcher.remove_listener(event.as_ref(), id)
    }

    pub fn add_disposable_listener<F>(&self, event: impl AsRef<str>, listener: F) -> Subscription
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .add_disposable_listener(event.as_ref(), listener)
    }

    pub fn add_disposable_once<F>(&self, event: impl AsRef<str>, listener: F) -> Subscription
    where
        F: FnOnce(&InboundEvent) + Send + 'static,
    {
        self.inner
            .dispatcher
            .add_disposable_once(event.as_ref(), listener)
    }

    /// Decode and emit a frame as if it had arrived on the socket.
    pub fn dispatch_frame(&self, text: &str) {
        self.inner.handle_frame(text);
    }
}

/// Non-owning counterpart of [`Connection`], for listeners that need to
/// reach the connection they are registered on.
#[derive(Debug, Clone)]
pub struct WeakConnection {
    inner: Weak<Owner>,
}

impl WeakConnection {
    pub fn upgrade(&self) -> Option<Connection> {
        self.inner.upgrade().map(|inner| Connection { inner })
    }
}

/// Supervisor loop: one socket at a time, reconnecting until aborted.
async fn supervise(inner: Arc<Inner>) {
    let mut outbound = inner.outbound_rx.lock().await;
    let mut backoff = Backoff::new(inner.config.reconnect_delay, inner.config.max_reconnect_delay);
    let url = inner.config.url();

    loop {
        inner.set_state(ConnectionState::Connecting);

        match connect_async(url.as_str()).await {
            Ok((socket, _)) => {
                let opened = inner.sockets_opened.fetch_add(1, Ordering::AcqRel) + 1;
                tracing::debug!("Socket {} opened to {}", opened, url);

                let end = run_session(&inner, socket, &mut outbound).await;
                inner.set_state(ConnectionState::Connecting);
                if end.handshaken {
                    backoff.reset();
                }
                tracing::warn!("Connection to {} lost ({}); reconnecting", url, end.reason);
            }
            Err(error) => {
                tracing::warn!("Failed to connect to {}: {}", url, error);
            }
        }

        let delay = backoff.next_delay();
        if !delay.is_zero() {
            tracing::debug!("Waiting {:?} before reconnecting", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

/// Handshake, then pump frames both ways until the socket ends.
async fn run_session(
    inner: &Inner,
    socket: Socket,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
) -> SessionEnd {
    let (mut sink, mut stream) = socket.split();

    let handshake = Handshake::new(&inner.config.registration_event, &inner.config.token);
    let frame = match codec::encode(&handshake) {
        Ok(frame) => frame,
        Err(error) => {
            return SessionEnd {
                handshaken: false,
                reason: format!("handshake could not be encoded: {error}"),
            }
        }
    };
    if let Err(error) = sink.send(Message::text(frame)).await {
        return SessionEnd {
            handshaken: false,
            reason: format!("handshake failed: {error}"),
        };
    }
    inner.set_state(ConnectionState::Connected);

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => inner.handle_frame(text.as_str()),
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|frame| format!("closed by host: {} {}", frame.code, frame.reason.as_str()))
                        .unwrap_or_else(|| "closed by host".to_string());
                    return SessionEnd { handshaken: true, reason };
                }
                Some(Ok(_)) => tracing::debug!("Ignoring non-text frame"),
                Some(Err(error)) => {
                    return SessionEnd {
                        handshaken: true,
                        reason: error.to_string(),
                    };
                }
                None => {
                    return SessionEnd {
                        handshaken: true,
                        reason: "stream ended".to_string(),
                    };
                }
            },
            Some(pending) = outbound.recv() => {
                if pending.written.is_closed() {
                    tracing::debug!("Skipping frame whose sender gave up");
                    continue;
                }
                match sink.send(Message::text(pending.frame)).await {
                    Ok(()) => {
                        let _ = pending.written.send(Ok(()));
                    }
                    Err(error) => {
                        tracing::warn!("Dropping frame after write failure: {}", error);
                        let _ = pending
                            .written
                            .send(Err(ConnectionError::FrameDropped(error.to_string())));
                        return SessionEnd {
                            handshaken: true,
                            reason: error.to_string(),
                        };
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn connection() -> Connection {
        Connection::new(ConnectionConfig::new(28196, "token", "registerPlugin"))
    }

    #[test]
    fn test_new_connection_is_disconnected() {
        let connection = connection();
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert_eq!(connection.sockets_opened(), 0);
    }

    #[test]
    fn test_connect_requires_runtime() {
        let result = connection().connect();
        assert!(matches!(result, Err(ConnectionError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let connection = Connection::new(ConnectionConfig::new(0, "token", "registerPlugin"));
        assert!(matches!(
            connection.connect(),
            Err(ConnectionError::Configuration(_))
        ));
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_frames_are_emitted_by_event_name() {
        let connection = connection();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        connection.on("keyDown", move |event| {
            assert_eq!(event.context.as_deref(), Some("c1"));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        connection.dispatch_frame(r#"{"event":"keyDown","action":"a","context":"c1"}"#);
        connection.dispatch_frame(r#"{"event":"keyUp","action":"a","context":"c1"}"#);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_frames_are_dropped() {
        let connection = connection();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        connection.on("keyDown", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        connection.dispatch_frame("{broken");
        connection.dispatch_frame(r#"{"no_event":true}"#);
        connection.dispatch_frame(r#"{"event":"keyDown","context":5}"#);
        connection.dispatch_frame(r#"{"event":"keyDown"}"#);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_weak_connection_does_not_keep_it_alive() {
        let connection = connection();
        let weak = connection.downgrade();
        assert!(weak.upgrade().is_some());
        drop(connection);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_dropping_last_handle_stops_supervisor() {
        let connection = Connection::new(
            ConnectionConfig::new(9, "token", "registerPlugin")
                .with_reconnect_delay(Duration::from_millis(10), Duration::from_millis(10)),
        );
        connection.connect().unwrap();
        let clone = connection.clone();
        let shared = Arc::downgrade(&connection.inner.shared);

        drop(connection);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(shared.upgrade().is_some());

        drop(clone);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(shared.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_wait_until_connected_fails_after_close() {
        let connection = connection();
        connection.close().await;
        let result = connection.wait_until_connected().await;
        assert!(matches!(result, Err(ConnectionError::Closed)));
    }

    #[tokio::test]
    async fn test_close_releases_pending_waiters() {
        let connection = connection();
        let waiter = {
            let connection = connection.clone();
            tokio::spawn(async move { connection.wait_until_connected().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        connection.close().await;
        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter was not released")
            .unwrap();
        assert!(matches!(result, Err(ConnectionError::Closed)));
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let connection = connection();
        connection.close().await;
        let result = connection.send(&Command::new("showOk")).await;
        assert!(matches!(result, Err(ConnectionError::Closed)));
    }

    #[tokio::test]
    async fn test_send_times_out_while_not_ready() {
        let connection = connection();
        let result = connection
            .send_with_timeout(&Command::new("showOk"), Duration::from_millis(20))
            .await;
        assert!(matches!(result, Err(ConnectionError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_request_for_context_requires_context() {
        let connection = connection();
        let result = connection
            .request_for_context(&Command::new("getSettings"), "didReceiveSettings")
            .await;
        assert!(matches!(result, Err(ConnectionError::MissingContext(_))));
        assert_eq!(connection.dispatcher().listener_count("didReceiveSettings"), 0);
    }
}
