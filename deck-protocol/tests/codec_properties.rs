//! Property tests for the wire codec.

use deck_protocol::{codec, Command, Decoded};
use proptest::prelude::*;
use serde_json::{json, Value};

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z]{1,24}"
}

fn payload_strategy() -> impl Strategy<Value = Option<Value>> {
    prop::option::of(
        (any::<i64>(), "[ -~]{0,32}", any::<bool>())
            .prop_map(|(n, s, b)| json!({ "n": n, "s": s, "b": b, "nested": { "list": [n, s] } })),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Decoding an encoded command recovers an equal envelope.
    #[test]
    fn prop_command_round_trip(
        event in name_strategy(),
        context in prop::option::of("[a-f0-9]{8,32}"),
        device in prop::option::of("[A-F0-9]{8,32}"),
        payload in payload_strategy(),
    ) {
        let command = Command { event, context, device, payload };
        let frame = codec::encode(&command).unwrap();

        match codec::decode(&frame).unwrap() {
            Decoded::Event(decoded) => {
                prop_assert_eq!(&decoded.event, &command.event);
                prop_assert_eq!(&decoded.context, &command.context);
                prop_assert_eq!(&decoded.device, &command.device);
                prop_assert_eq!(&decoded.payload, &command.payload);
                prop_assert!(decoded.action.is_none());
            }
            Decoded::Unrecognized(value) => {
                prop_assert!(false, "round trip lost the event tag: {}", value);
            }
        }
    }

    /// Arbitrary text never panics the decoder.
    #[test]
    fn prop_decode_never_panics(text in ".{0,64}") {
        let _ = codec::decode(&text);
    }
}
