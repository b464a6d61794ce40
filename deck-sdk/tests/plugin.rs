//! Plugin facade against a local WebSocket host.

use std::time::Duration;

use deck_sdk::{
    async_trait, Action, ActionHandler, ConnectionConfig, EventKind, HandlerResult, InboundEvent, Manifest,
    Plugin, RegistrationParams, Target,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Host side of a single accepted socket.
struct Host {
    port: u16,
    from_plugin: mpsc::UnboundedReceiver<Value>,
    to_plugin: mpsc::UnboundedSender<Value>,
}

impl Host {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (inbound_tx, from_plugin) = mpsc::unbounded_channel();
        let (to_plugin, mut outbound_rx) = mpsc::unbounded_channel::<Value>();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            let (mut sink, mut source) = socket.split();
            loop {
                tokio::select! {
                    frame = source.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            let _ = inbound_tx.send(serde_json::from_str(text.as_str()).unwrap());
                        }
                        Some(Ok(_)) => {}
                        _ => break,
                    },
                    Some(value) = outbound_rx.recv() => {
                        if sink.send(Message::text(value.to_string())).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            port,
            from_plugin,
            to_plugin,
        }
    }

    async fn recv(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(5), self.from_plugin.recv())
            .await
            .expect("timed out waiting for the plugin")
            .unwrap()
    }

    fn send(&self, value: Value) {
        self.to_plugin.send(value).unwrap();
    }
}

struct Counter;

#[async_trait]
impl ActionHandler for Counter {
    fn manifest_id(&self) -> Option<&str> {
        Some("com.example.counter")
    }

    fn implemented_events(&self) -> Vec<EventKind> {
        vec![EventKind::KeyDown]
    }

    async fn on_key_down(&self, action: Action, _event: InboundEvent) -> HandlerResult {
        let settings = action.get_settings().await?;
        let count = settings["count"].as_u64().unwrap_or(0) + 1;
        action.set_settings(json!({ "count": count })).await?;
        action.set_title(&count.to_string(), Target::Both, None).await?;
        Ok(())
    }
}

fn plugin(port: u16) -> Plugin {
    let params = RegistrationParams::from_args([
        "plugin",
        "-port",
        port.to_string().as_str(),
        "-pluginUUID",
        "PLUGIN",
        "-registerEvent",
        "registerPlugin",
        "-info",
        r#"{"devices":[{"id":"DEV","type":0}]}"#,
    ])
    .unwrap();
    let config = ConnectionConfig::new(port, "PLUGIN", "registerPlugin")
        .with_reconnect_delay(Duration::from_millis(10), Duration::from_millis(50));
    Plugin::with_config(params, config, Manifest::from_action_ids(["com.example.counter"])).unwrap()
}

#[tokio::test]
async fn test_key_press_round_trip() {
    let mut host = Host::start().await;
    let plugin = plugin(host.port);
    plugin.register_action(Counter).unwrap();
    plugin.connect().unwrap();

    assert_eq!(host.recv().await, json!({ "event": "registerPlugin", "uuid": "PLUGIN" }));

    host.send(json!({
        "event": "keyDown",
        "action": "com.example.counter",
        "context": "CTX",
        "device": "DEV",
        "payload": { "settings": {} }
    }));

    assert_eq!(host.recv().await, json!({ "event": "getSettings", "context": "CTX" }));
    host.send(json!({
        "event": "didReceiveSettings",
        "action": "com.example.counter",
        "context": "CTX",
        "payload": { "settings": { "count": 4 } }
    }));

    assert_eq!(
        host.recv().await,
        json!({ "event": "setSettings", "context": "CTX", "payload": { "count": 5 } })
    );
    assert_eq!(
        host.recv().await,
        json!({ "event": "setTitle", "context": "CTX", "payload": { "title": "5", "target": 0 } })
    );
    plugin.close().await;
}

#[tokio::test]
async fn test_global_settings_and_devices() {
    let mut host = Host::start().await;
    let plugin = plugin(host.port);
    plugin.connect().unwrap();
    host.recv().await;

    assert!(!plugin.devices().get("DEV").unwrap().is_connected());
    host.send(json!({
        "event": "deviceDidConnect",
        "device": "DEV",
        "deviceInfo": { "name": "Desk", "size": { "columns": 5, "rows": 3 }, "type": 0 }
    }));

    let settings = plugin.global_settings().clone();
    let get = tokio::spawn(async move { settings.get_timeout(Duration::from_secs(5)).await });
    assert_eq!(host.recv().await, json!({ "event": "getGlobalSettings", "context": "PLUGIN" }));
    host.send(json!({
        "event": "didReceiveGlobalSettings",
        "payload": { "settings": { "theme": "dark" } }
    }));
    assert_eq!(get.await.unwrap().unwrap(), json!({ "theme": "dark" }));

    let device = plugin.devices().get("DEV").unwrap();
    assert!(device.is_connected());
    assert_eq!(device.name().as_deref(), Some("Desk"));
    assert_eq!(plugin.devices().len(), 1);

    plugin.system().open_url("https://example.com").await.unwrap();
    assert_eq!(
        host.recv().await,
        json!({ "event": "openUrl", "payload": { "url": "https://example.com" } })
    );
    plugin.close().await;
}
