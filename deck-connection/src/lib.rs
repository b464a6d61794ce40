//! # deck-connection
//!
//! The plugin's single WebSocket link to the controller host.
//!
//! A [`Connection`] opens `ws://{host}:{port}`, sends the registration
//! [`Handshake`](deck_protocol::Handshake) as its first frame, and from then on
//! decodes every inbound text frame and emits it on its
//! [`EventDispatcher`](deck_events::EventDispatcher). When the socket closes or
//! fails it reconnects on its own, with the backoff configured in
//! [`ConnectionConfig`].
//!
//! Outbound commands queue until the handshake has been sent, then are
//! written in the order they were issued.
//!
//! ```rust,no_run
//! use deck_connection::{Connection, ConnectionConfig};
//! use deck_protocol::{Command, CommandKind, EventKind};
//!
//! # async fn run() -> Result<(), deck_connection::ConnectionError> {
//! let config = ConnectionConfig::new(28196, "plugin-token", "registerPlugin");
//! let connection = Connection::new(config);
//!
//! connection.on(EventKind::KeyDown, |event| {
//!     println!("key down on {:?}", event.context);
//! });
//! connection.connect()?;
//!
//! connection
//!     .send(&Command::new(CommandKind::LogMessage)
//!         .with_payload(serde_json::json!({ "message": "started" })))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod config;
pub mod connection;
pub mod error;
pub mod state;

pub use backoff::Backoff;
pub use config::ConnectionConfig;
pub use connection::{Connection, WeakConnection};
pub use error::{ConnectionError, Result};
pub use state::ConnectionState;

pub use deck_events::{ListenerId, PendingReply, Subscription};
