//! Frame envelopes exchanged with the host.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::device::DeviceInfo;
use crate::event_kind::EventKind;

/// Registration frame sent once, immediately after the socket opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    /// Registration event name handed to the plugin by the host
    pub event: String,
    /// Token identifying this plugin process
    pub uuid: String,
}

impl Handshake {
    pub fn new(event: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            uuid: uuid.into(),
        }
    }
}

/// Outbound command envelope.
///
/// `context` names the target instance (an action instance or the plugin
/// itself); without it the command is directed at the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Command {
    /// Create a command with only its event name set.
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            context: None,
            device: None,
            payload: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Inbound event envelope.
///
/// When both `action` and `context` are present they identify one action
/// instance and the manifest identifier it was declared under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,
}

impl InboundEvent {
    /// Create an event with only its tag set.
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            action: None,
            context: None,
            device: None,
            payload: None,
            device_info: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_device_info(mut self, info: DeviceInfo) -> Self {
        self.device_info = Some(info);
        self
    }

    /// The typed tag of this event.
    pub fn kind(&self) -> EventKind {
        EventKind::from_name(&self.event)
    }

    /// Deserialize the payload into a caller-chosen type.
    ///
    /// A missing payload is treated as JSON `null`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.payload {
            Some(value) => T::deserialize(value),
            None => T::deserialize(&Value::Null),
        }
    }

    /// Read the `settings` object from the payload, if any.
    pub fn settings(&self) -> Option<&Value> {
        self.payload.as_ref()?.get("settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_skips_absent_fields() {
        let command = Command::new("showOk").with_context("abc");
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value, json!({ "event": "showOk", "context": "abc" }));
    }

    #[test]
    fn test_handshake_shape() {
        let handshake = Handshake::new("registerPlugin", "token-1");
        let value = serde_json::to_value(&handshake).unwrap();
        assert_eq!(value, json!({ "event": "registerPlugin", "uuid": "token-1" }));
    }

    #[test]
    fn test_inbound_event_reads_device_info() {
        let event: InboundEvent = serde_json::from_value(json!({
            "event": "deviceDidConnect",
            "device": "D1",
            "deviceInfo": { "name": "Desk", "type": 0, "size": { "columns": 5, "rows": 3 } }
        }))
        .unwrap();

        assert_eq!(event.kind(), EventKind::DeviceDidConnect);
        let info = event.device_info.unwrap();
        assert_eq!(info.name.as_deref(), Some("Desk"));
        assert_eq!(info.size.unwrap().columns, 5);
    }

    #[test]
    fn test_payload_as_and_settings() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Settings {
            count: u32,
        }

        let event = InboundEvent::new("didReceiveSettings")
            .with_payload(json!({ "settings": { "count": 3 } }));

        assert_eq!(event.settings(), Some(&json!({ "count": 3 })));

        #[derive(Debug, Deserialize)]
        struct Payload {
            settings: Settings,
        }
        let payload: Payload = event.payload_as().unwrap();
        assert_eq!(payload.settings, Settings { count: 3 });

        let empty = InboundEvent::new("keyDown");
        let nothing: Option<Payload> = empty.payload_as().unwrap();
        assert!(nothing.is_none());
    }
}
