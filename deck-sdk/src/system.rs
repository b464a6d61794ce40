//! Host-level commands that do not address an action instance.

use deck_connection::Connection;
use deck_protocol::{Command, CommandKind};
use serde_json::{json, Value};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct System {
    connection: Connection,
    plugin_uuid: String,
}

impl System {
    pub fn new(connection: Connection, plugin_uuid: impl Into<String>) -> Self {
        Self {
            connection,
            plugin_uuid: plugin_uuid.into(),
        }
    }

    /// Open `url` in the user's default browser.
    pub async fn open_url(&self, url: &str) -> Result<()> {
        self.send(Command::new(CommandKind::OpenUrl).with_payload(json!({ "url": url })))
            .await
    }

    /// Write a line to the host's log for this plugin.
    pub async fn log_message(&self, message: &str) -> Result<()> {
        self.send(Command::new(CommandKind::LogMessage).with_payload(json!({ "message": message })))
            .await
    }

    /// Switch `device` to a profile bundled with the plugin, or back to the
    /// previous profile when `profile` is `None`.
    pub async fn switch_to_profile(&self, device: &str, profile: Option<&str>, page: Option<u32>) -> Result<()> {
        self.send(profile_command(&self.plugin_uuid, device, profile, page))
            .await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.connection.send(&command).await?;
        Ok(())
    }
}

fn profile_command(plugin_uuid: &str, device: &str, profile: Option<&str>, page: Option<u32>) -> Command {
    let mut payload = serde_json::Map::new();
    if let Some(profile) = profile {
        payload.insert("profile".to_string(), Value::String(profile.to_string()));
    }
    if let Some(page) = page {
        payload.insert("page".to_string(), json!(page));
    }
    Command::new(CommandKind::SwitchToProfile)
        .with_context(plugin_uuid)
        .with_device(device)
        .with_payload(Value::Object(payload))
}
