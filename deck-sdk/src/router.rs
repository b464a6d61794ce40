//! Routing of per-instance events to action handlers.
//!
//! The host sends every action event to the plugin as a whole, tagged with
//! the manifest identifier of the action it belongs to. [`ActionRouter`]
//! subscribes each registered handler to the events it implements and
//! filters deliveries down to the handler's own identifier.
//!
//! Each registration owns a queue drained by a single task, so one handler
//! sees its events in the order the host sent them and never runs two
//! callbacks at once. Separate registrations run independently.

use std::sync::Arc;

use async_trait::async_trait;
use deck_connection::{Connection, Subscription, WeakConnection};
use deck_protocol::{EventKind, InboundEvent, Manifest};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::action::Action;
use crate::error::{HandlerResult, RouterError};

/// Application logic for one action declared in the manifest.
///
/// Implement [`implemented_events`](Self::implemented_events) to list the
/// callbacks you override; only those events are subscribed. Callbacks run
/// one at a time, in arrival order, on a task owned by the registration.
/// Errors are logged and otherwise ignored.
#[async_trait]
pub trait ActionHandler: Send + Sync + 'static {
    /// Manifest identifier this handler serves.
    fn manifest_id(&self) -> Option<&str>;

    /// Events this handler wants. Queried once, at registration.
    fn implemented_events(&self) -> Vec<EventKind>;

    async fn on_will_appear(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }

    async fn on_will_disappear(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }

    async fn on_key_down(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }

    async fn on_key_up(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }

    async fn on_dial_down(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }

    async fn on_dial_up(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }

    async fn on_dial_rotate(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }

    async fn on_touch_tap(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }

    async fn on_did_receive_settings(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }

    async fn on_title_parameters_did_change(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }

    async fn on_property_inspector_did_appear(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }

    async fn on_property_inspector_did_disappear(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }

    async fn on_send_to_plugin(&self, _action: Action, _event: InboundEvent) -> HandlerResult {
        Ok(())
    }
}

async fn invoke(handler: &dyn ActionHandler, kind: &EventKind, action: Action, event: InboundEvent) -> HandlerResult {
    match kind {
        EventKind::WillAppear => handler.on_will_appear(action, event).await,
        EventKind::WillDisappear => handler.on_will_disappear(action, event).await,
        EventKind::KeyDown => handler.on_key_down(action, event).await,
        EventKind::KeyUp => handler.on_key_up(action, event).await,
        EventKind::DialDown => handler.on_dial_down(action, event).await,
        EventKind::DialUp => handler.on_dial_up(action, event).await,
        EventKind::DialRotate => handler.on_dial_rotate(action, event).await,
        EventKind::TouchTap => handler.on_touch_tap(action, event).await,
        EventKind::DidReceiveSettings => handler.on_did_receive_settings(action, event).await,
        EventKind::TitleParametersDidChange => handler.on_title_parameters_did_change(action, event).await,
        EventKind::PropertyInspectorDidAppear => handler.on_property_inspector_did_appear(action, event).await,
        EventKind::PropertyInspectorDidDisappear => {
            handler.on_property_inspector_did_disappear(action, event).await
        }
        EventKind::SendToPlugin => handler.on_send_to_plugin(action, event).await,
        _ => Ok(()),
    }
}

/// The listeners created for one handler.
///
/// Dropping a registration leaves its listeners in place; call
/// [`dispose`](Self::dispose) to remove them.
#[derive(Debug)]
pub struct HandlerRegistration {
    manifest_id: String,
    subscriptions: Vec<Subscription>,
}

impl HandlerRegistration {
    pub fn manifest_id(&self) -> &str {
        &self.manifest_id
    }

    /// Number of events this registration listens to.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether registration produced no listeners at all.
    pub fn is_inert(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Remove every listener of this registration. Idempotent.
    pub fn dispose(&self) {
        for subscription in &self.subscriptions {
            subscription.dispose();
        }
    }
}

/// Matches per-instance events to handlers by manifest identifier.
#[derive(Debug, Clone)]
pub struct ActionRouter {
    connection: Connection,
    manifest: Arc<Manifest>,
}

impl ActionRouter {
    pub fn new(connection: Connection, manifest: Manifest) -> Self {
        Self {
            connection,
            manifest: Arc::new(manifest),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn register<H: ActionHandler>(&self, handler: H) -> Result<HandlerRegistration, RouterError> {
        self.register_arc(Arc::new(handler))
    }

    /// Subscribe `handler` to each action event it implements.
    ///
    /// A handler without a manifest id is rejected. A handler whose id the
    /// manifest does not declare is logged once and gets an inert
    /// registration.
    pub fn register_arc(&self, handler: Arc<dyn ActionHandler>) -> Result<HandlerRegistration, RouterError> {
        let manifest_id = handler
            .manifest_id()
            .filter(|id| !id.is_empty())
            .ok_or(RouterError::MissingManifestId)?
            .to_string();

        if !self.manifest.contains_action(&manifest_id) {
            tracing::warn!(
                manifest_id = %manifest_id,
                "Action handler ignored: manifest declares no action with this id"
            );
            return Ok(HandlerRegistration {
                manifest_id,
                subscriptions: Vec::new(),
            });
        }

        let mut kinds: Vec<EventKind> = Vec::new();
        for kind in handler.implemented_events() {
            if !kind.is_action_event() {
                tracing::debug!("Handler for {} lists non-action event {}; ignoring", manifest_id, kind);
                continue;
            }
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }

        let queue = Arc::new(HandlerQueue::new(&manifest_id, handler, self.connection.downgrade()));
        let subscriptions = kinds
            .into_iter()
            .map(|kind| self.subscribe(kind, Arc::clone(&queue)))
            .collect::<Vec<_>>();

        tracing::debug!(
            "Registered handler for {} on {} event(s)",
            manifest_id,
            subscriptions.len()
        );
        Ok(HandlerRegistration {
            manifest_id,
            subscriptions,
        })
    }

    fn subscribe(&self, kind: EventKind, queue: Arc<HandlerQueue>) -> Subscription {
        let name = kind.as_str().to_string();

        self.connection.add_disposable_listener(name, move |event: &InboundEvent| {
            if event.action.as_deref() != Some(queue.manifest_id.as_str()) {
                return;
            }
            queue.push(&kind, event);
        })
    }
}

type Delivery = (EventKind, InboundEvent);

/// Deliveries for one registration, shared by its listeners.
///
/// The draining task is started on first use and holds no sender, so it
/// finishes once the listeners are disposed.
struct HandlerQueue {
    manifest_id: String,
    handler: Arc<dyn ActionHandler>,
    connection: WeakConnection,
    tx: mpsc::UnboundedSender<Delivery>,
    idle: Mutex<Option<mpsc::UnboundedReceiver<Delivery>>>,
}

impl HandlerQueue {
    fn new(manifest_id: &str, handler: Arc<dyn ActionHandler>, connection: WeakConnection) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            manifest_id: manifest_id.to_string(),
            handler,
            connection,
            tx,
            idle: Mutex::new(Some(rx)),
        }
    }

    fn push(&self, kind: &EventKind, event: &InboundEvent) {
        let mut idle = self.idle.lock();
        if let Some(rx) = idle.take() {
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                *idle = Some(rx);
                tracing::error!("No tokio runtime to run the {} handler on", event.event);
                return;
            };
            runtime.spawn(drain(
                self.manifest_id.clone(),
                Arc::clone(&self.handler),
                self.connection.clone(),
                rx,
            ));
        }
        drop(idle);

        if self.tx.send((kind.clone(), event.clone())).is_err() {
            tracing::debug!("Handler queue for {} is gone; dropping {}", self.manifest_id, event.event);
        }
    }
}

async fn drain(
    manifest_id: String,
    handler: Arc<dyn ActionHandler>,
    connection: WeakConnection,
    mut rx: mpsc::UnboundedReceiver<Delivery>,
) {
    while let Some((kind, event)) = rx.recv().await {
        let Some(connection) = connection.upgrade() else {
            break;
        };
        let Some(action) = Action::from_event(&event, &connection) else {
            tracing::debug!("Dropping {} without a context", event.event);
            continue;
        };

        let context = action.context().to_string();
        if let Err(error) = invoke(handler.as_ref(), &kind, action, event).await {
            tracing::error!(
                manifest_id = %manifest_id,
                context = %context,
                "Handler for {} failed: {}",
                kind,
                error
            );
        }
    }
    tracing::debug!("Handler queue for {} drained", manifest_id);
}
