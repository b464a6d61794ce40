//! # Deck SDK - plugin runtime for key/dial controller hosts
//!
//! A plugin is a separate process the host launches with a port, a token and
//! a registration event on its command line. This crate connects back to the
//! host over one WebSocket, registers, and routes the host's events to your
//! action handlers:
//!
//! ```rust,no_run
//! use deck_sdk::{async_trait, Action, ActionHandler, EventKind, HandlerResult, InboundEvent, Plugin};
//!
//! struct Counter;
//!
//! #[async_trait]
//! impl ActionHandler for Counter {
//!     fn manifest_id(&self) -> Option<&str> {
//!         Some("com.example.counter")
//!     }
//!
//!     fn implemented_events(&self) -> Vec<EventKind> {
//!         vec![EventKind::KeyDown]
//!     }
//!
//!     async fn on_key_down(&self, action: Action, _event: InboundEvent) -> HandlerResult {
//!         let settings = action.get_settings().await?;
//!         let count = settings["count"].as_u64().unwrap_or(0) + 1;
//!         action.set_settings(serde_json::json!({ "count": count })).await?;
//!         action.set_title(&count.to_string(), Default::default(), None).await?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> deck_sdk::Result<()> {
//!     deck_sdk::logging::init_logging_from_env()?;
//!
//!     let plugin = Plugin::from_env_with_manifest("manifest.json")?;
//!     plugin.register_action(Counter)?;
//!     plugin.connect()?;
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     plugin.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! deck-sdk          Plugin, ActionRouter, DeviceRegistry, handles
//!     ↓
//! deck-connection   WebSocket, handshake, reconnect, outbound queue
//!     ↓
//! deck-events       EventDispatcher, request/reply correlation
//!     ↓
//! deck-protocol     envelopes, event names, codec, manifest
//! ```
//!
//! Delivery is at-most-once: commands issued while the socket is down wait
//! for the next handshake, and a frame lost to a failing socket is not
//! resent.

pub mod action;
pub mod devices;
pub mod error;
pub mod logging;
pub mod params;
pub mod plugin;
pub mod router;
pub mod settings;
pub mod system;

pub use action::{Action, Target, TriggerDescription};
pub use devices::{Device, DeviceRegistry};
pub use error::{HandlerError, HandlerResult, Result, RouterError, SdkError};
pub use params::{ParamsError, RegistrationParams};
pub use plugin::Plugin;
pub use router::{ActionHandler, ActionRouter, HandlerRegistration};
pub use settings::GlobalSettings;
pub use system::System;

pub use async_trait::async_trait;
pub use deck_connection::{Connection, ConnectionConfig, ConnectionError, ConnectionState, Subscription};
pub use deck_events::CorrelationError;
pub use deck_protocol::{Command, CommandKind, EventKind, InboundEvent, Manifest};
