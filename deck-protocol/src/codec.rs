//! JSON text-frame codec.
//!
//! [`encode`] turns any outbound envelope into the text of one frame.
//! [`decode`] never panics: it either yields a dispatchable event, reports a
//! well-formed document without an `event` tag as [`Decoded::Unrecognized`],
//! or returns a [`DecodeError`] carrying the raw frame.

use serde::Serialize;
use serde_json::Value;

use crate::error::{DecodeError, ProtocolError, Result};
use crate::message::InboundEvent;

/// Outcome of decoding a well-formed frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A frame tagged with an `event` name
    Event(InboundEvent),
    /// Valid JSON that carries no `event` tag
    Unrecognized(Value),
}

/// Serialize an envelope to frame text.
pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

/// Parse frame text into an inbound event.
pub fn decode(text: &str) -> std::result::Result<Decoded, DecodeError> {
    let value: Value = serde_json::from_str(text).map_err(|source| DecodeError {
        raw: text.to_string(),
        source,
    })?;

    let tagged = value
        .as_object()
        .and_then(|object| object.get("event"))
        .is_some_and(Value::is_string);
    if !tagged {
        return Ok(Decoded::Unrecognized(value));
    }

    serde_json::from_value(value)
        .map(Decoded::Event)
        .map_err(|source| DecodeError {
            raw: text.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Command;
    use serde_json::json;

    #[test]
    fn test_decode_event() {
        let decoded = decode(r#"{"event":"keyDown","action":"com.x.a","context":"c1"}"#).unwrap();
        match decoded {
            Decoded::Event(event) => {
                assert_eq!(event.event, "keyDown");
                assert_eq!(event.action.as_deref(), Some("com.x.a"));
                assert_eq!(event.context.as_deref(), Some("c1"));
            }
            other => panic!("Expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_untagged_is_unrecognized() {
        assert_eq!(
            decode(r#"{"hello":"world"}"#).unwrap(),
            Decoded::Unrecognized(json!({ "hello": "world" }))
        );
        assert_eq!(decode("[1,2]").unwrap(), Decoded::Unrecognized(json!([1, 2])));
        assert_eq!(
            decode(r#"{"event":7}"#).unwrap(),
            Decoded::Unrecognized(json!({ "event": 7 }))
        );
    }

    #[test]
    fn test_decode_invalid_json() {
        let error = decode("{not json").unwrap_err();
        assert_eq!(error.raw, "{not json");
        assert!(error.source.is_syntax() || error.source.is_eof());
    }

    #[test]
    fn test_decode_wrongly_typed_field() {
        let error = decode(r#"{"event":"keyDown","context":12}"#).unwrap_err();
        assert_eq!(error.raw, r#"{"event":"keyDown","context":12}"#);
        assert!(error.source.is_data());
    }

    #[test]
    fn test_encode_command() {
        let command = Command::new("setTitle")
            .with_context("c1")
            .with_payload(json!({ "title": "Hi" }));
        let text = encode(&command).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({ "event": "setTitle", "context": "c1", "payload": { "title": "Hi" } })
        );
    }
}
