//! # deck-protocol
//!
//! Wire-level types for talking to the controller host over its plugin
//! WebSocket.
//!
//! Every frame exchanged with the host is a single JSON object. Outbound
//! frames are either the one-off [`Handshake`] or a [`Command`] envelope;
//! inbound frames decode into an [`InboundEvent`] tagged by its `event`
//! field (see [`EventKind`]).
//!
//! ```rust
//! use deck_protocol::{codec, Command, CommandKind, Decoded};
//!
//! let command = Command::new(CommandKind::SetTitle)
//!     .with_context("ctx-1")
//!     .with_payload(serde_json::json!({ "title": "Hi" }));
//! let frame = codec::encode(&command)?;
//!
//! match codec::decode(&frame)? {
//!     Decoded::Event(event) => assert_eq!(event.context.as_deref(), Some("ctx-1")),
//!     Decoded::Unrecognized(_) => unreachable!(),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod device;
pub mod error;
pub mod event_kind;
pub mod manifest;
pub mod message;

pub use codec::Decoded;
pub use device::{DeviceDescriptor, DeviceInfo, DeviceSize, DeviceType, RegistrationInfo};
pub use error::{DecodeError, ProtocolError, Result};
pub use event_kind::{CommandKind, EventKind};
pub use manifest::{Manifest, ManifestAction};
pub use message::{Command, Handshake, InboundEvent};
