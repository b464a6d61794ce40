//! Plugin-wide settings shared by every action instance.

use std::time::Duration;

use deck_connection::Connection;
use deck_protocol::{Command, CommandKind, EventKind, InboundEvent};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

/// Reads and writes the plugin's global settings. Commands are addressed to
/// the plugin's own uuid.
#[derive(Debug, Clone)]
pub struct GlobalSettings {
    connection: Connection,
    plugin_uuid: String,
}

impl GlobalSettings {
    pub fn new(connection: Connection, plugin_uuid: impl Into<String>) -> Self {
        Self {
            connection,
            plugin_uuid: plugin_uuid.into(),
        }
    }

    fn command(&self, kind: CommandKind) -> Command {
        Command::new(kind).with_context(&self.plugin_uuid)
    }

    /// Request the settings and wait for the next `didReceiveGlobalSettings`.
    ///
    /// Replies are not tagged per request, so concurrent calls may resolve
    /// with the same reply.
    pub async fn get(&self) -> Result<Value> {
        let pending = self
            .connection
            .request_once(&self.command(CommandKind::GetGlobalSettings), EventKind::DidReceiveGlobalSettings)
            .await?;
        Ok(extract(pending.wait().await?))
    }

    /// Like [`get`](Self::get), giving up after `timeout`.
    pub async fn get_timeout(&self, timeout: Duration) -> Result<Value> {
        let pending = self
            .connection
            .request_once(&self.command(CommandKind::GetGlobalSettings), EventKind::DidReceiveGlobalSettings)
            .await?;
        Ok(extract(pending.wait_timeout(timeout).await?))
    }

    pub async fn get_as<T: DeserializeOwned>(&self) -> Result<T> {
        let settings = self.get().await?;
        Ok(serde_json::from_value(settings)?)
    }

    pub async fn set(&self, settings: Value) -> Result<()> {
        self.connection
            .send(&self.command(CommandKind::SetGlobalSettings).with_payload(settings))
            .await?;
        Ok(())
    }
}

fn extract(reply: InboundEvent) -> Value {
    reply.settings().cloned().unwrap_or(Value::Null)
}
