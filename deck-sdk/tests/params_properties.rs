//! Property tests for command-line parameter parsing.

use deck_sdk::RegistrationParams;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_flags_parse_in_any_order(
        port in 1u16..,
        uuid in "[A-Za-z0-9]{1,32}",
        event in "[a-zA-Z]{1,20}",
        rotate in 0usize..3,
    ) {
        let mut pairs = vec![
            vec!["-port".to_string(), port.to_string()],
            vec!["-pluginUUID".to_string(), uuid.clone()],
            vec!["-registerEvent".to_string(), event.clone()],
        ];
        pairs.rotate_left(rotate);

        let args = std::iter::once("plugin".to_string()).chain(pairs.into_iter().flatten());
        let params = RegistrationParams::from_args(args).unwrap();

        prop_assert_eq!(params.port, port);
        prop_assert_eq!(params.plugin_uuid, uuid);
        prop_assert_eq!(params.register_event, event);
    }

    #[test]
    fn prop_arbitrary_arguments_never_panic(args in proptest::collection::vec(".{0,12}", 0..10)) {
        let _ = RegistrationParams::from_args(args);
    }
}
