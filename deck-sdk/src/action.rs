//! Handle to one visible action instance.

use std::time::Duration;

use deck_connection::Connection;
use deck_protocol::{Command, CommandKind, EventKind, InboundEvent};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::Result;

/// Which surface a title or image applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Both,
    Hardware,
    Software,
}

impl Target {
    fn code(self) -> u8 {
        match self {
            Target::Both => 0,
            Target::Hardware => 1,
            Target::Software => 2,
        }
    }
}

/// Descriptions shown for an encoder's interactions. Absent fields keep the
/// manifest's text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerDescription {
    pub long_touch: Option<String>,
    pub push: Option<String>,
    pub rotate: Option<String>,
    pub touch: Option<String>,
}

impl TriggerDescription {
    fn to_payload(&self) -> Value {
        let mut payload = Map::new();
        let fields = [
            ("longTouch", &self.long_touch),
            ("push", &self.push),
            ("rotate", &self.rotate),
            ("touch", &self.touch),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                payload.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(payload)
    }
}

/// One instance of an action on a device, addressed by its context.
///
/// Handed to [`ActionHandler`](crate::ActionHandler) callbacks; cheap to clone.
#[derive(Debug, Clone)]
pub struct Action {
    manifest_id: String,
    context: String,
    device: Option<String>,
    connection: Connection,
}

impl Action {
    pub fn new(manifest_id: impl Into<String>, context: impl Into<String>, connection: Connection) -> Self {
        Self {
            manifest_id: manifest_id.into(),
            context: context.into(),
            device: None,
            connection,
        }
    }

    /// Handle for the instance an inbound event addresses, or `None` if the
    /// event carries no action or context.
    pub fn from_event(event: &InboundEvent, connection: &Connection) -> Option<Self> {
        let action = Self::new(event.action.as_deref()?, event.context.as_deref()?, connection.clone());
        Some(Self {
            device: event.device.clone(),
            ..action
        })
    }

    pub fn manifest_id(&self) -> &str {
        &self.manifest_id
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    fn command(&self, kind: CommandKind) -> Command {
        Command::new(kind).with_context(&self.context)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.connection.send(&command).await?;
        Ok(())
    }

    pub async fn set_title(&self, title: &str, target: Target, state: Option<u32>) -> Result<()> {
        self.send(self.title_command(title, target, state)).await
    }

    fn title_command(&self, title: &str, target: Target, state: Option<u32>) -> Command {
        let mut payload = json!({ "title": title, "target": target.code() });
        if let Some(state) = state {
            payload["state"] = json!(state);
        }
        self.command(CommandKind::SetTitle).with_payload(payload)
    }

    /// Set the image from a data URL or SVG string.
    pub async fn set_image(&self, image: &str, target: Target, state: Option<u32>) -> Result<()> {
        let mut payload = json!({ "image": image, "target": target.code() });
        if let Some(state) = state {
            payload["state"] = json!(state);
        }
        self.send(self.command(CommandKind::SetImage).with_payload(payload)).await
    }

    pub async fn set_state(&self, state: u32) -> Result<()> {
        self.send(self.command(CommandKind::SetState).with_payload(json!({ "state": state })))
            .await
    }

    pub async fn show_alert(&self) -> Result<()> {
        self.send(self.command(CommandKind::ShowAlert)).await
    }

    pub async fn show_ok(&self) -> Result<()> {
        self.send(self.command(CommandKind::ShowOk)).await
    }

    /// Persist `settings` for this instance.
    pub async fn set_settings(&self, settings: Value) -> Result<()> {
        self.send(self.command(CommandKind::SetSettings).with_payload(settings))
            .await
    }

    /// Ask the host for this instance's settings and wait for the reply
    /// addressed to this context.
    pub async fn get_settings(&self) -> Result<Value> {
        let pending = self
            .connection
            .request_for_context(&self.command(CommandKind::GetSettings), EventKind::DidReceiveSettings)
            .await?;
        let reply = pending.wait().await?;
        Ok(reply.settings().cloned().unwrap_or(Value::Null))
    }

    /// Like [`get_settings`](Self::get_settings), giving up after `timeout`.
    pub async fn get_settings_timeout(&self, timeout: Duration) -> Result<Value> {
        let pending = self
            .connection
            .request_for_context(&self.command(CommandKind::GetSettings), EventKind::DidReceiveSettings)
            .await?;
        let reply = pending.wait_timeout(timeout).await?;
        Ok(reply.settings().cloned().unwrap_or(Value::Null))
    }

    /// Fetch the settings and deserialize them.
    pub async fn get_settings_as<T: DeserializeOwned>(&self) -> Result<T> {
        let settings = self.get_settings().await?;
        Ok(serde_json::from_value(settings)?)
    }

    pub async fn send_to_property_inspector(&self, payload: Value) -> Result<()> {
        self.send(self.command(CommandKind::SendToPropertyInspector).with_payload(payload))
            .await
    }

    /// Update values of the touch-display layout.
    pub async fn set_feedback(&self, feedback: Value) -> Result<()> {
        self.send(self.command(CommandKind::SetFeedback).with_payload(feedback))
            .await
    }

    pub async fn set_feedback_layout(&self, layout: &str) -> Result<()> {
        self.send(
            self.command(CommandKind::SetFeedbackLayout)
                .with_payload(json!({ "layout": layout })),
        )
        .await
    }

    pub async fn set_trigger_description(&self, description: &TriggerDescription) -> Result<()> {
        self.send(
            self.command(CommandKind::SetTriggerDescription)
                .with_payload(description.to_payload()),
        )
        .await
    }
}
