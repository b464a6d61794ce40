//! Request/reply correlation on top of [`EventDispatcher`].
//!
//! Some host commands are answered by a later, separately-tagged event. Two
//! patterns pair the command with its answer:
//!
//! - [`expect_once`]: the next event of a name resolves the waiter. Used when
//!   only one party can be waiting on that reply class at a time.
//! - [`expect_context`]: the next event of a name whose `context` matches
//!   resolves the waiter. Replies for other contexts are ignored and the
//!   listener stays registered until its own context arrives.
//!
//! Register the waiter *before* sending the command so that a fast reply is
//! never missed.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};
use std::time::Duration;

use deck_protocol::InboundEvent;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::dispatcher::{EventDispatcher, Subscription};
use crate::error::CorrelationError;

/// A single-resolution wait for a correlated reply.
///
/// Await it directly or use [`wait_timeout`](Self::wait_timeout). Dropping
/// it before a reply arrives removes the underlying listener.
#[must_use = "a pending reply does nothing unless awaited"]
#[derive(Debug)]
pub struct PendingReply<E> {
    reply: oneshot::Receiver<E>,
    listener: ListenerGuard,
}

impl<E> PendingReply<E> {
    /// Wait for the reply without a time limit.
    pub async fn wait(self) -> Result<E, CorrelationError> {
        self.await
    }

    /// Wait for the reply for at most `timeout`.
    ///
    /// On timeout the listener is removed and a later matching event is not
    /// consumed by this request.
    pub async fn wait_timeout(self, timeout: Duration) -> Result<E, CorrelationError> {
        match tokio::time::timeout(timeout, self).await {
            Ok(result) => result,
            Err(_) => Err(CorrelationError::Timeout(timeout)),
        }
    }

    /// The subscription backing this wait.
    pub fn subscription(&self) -> &Subscription {
        &self.listener.0
    }
}

impl<E> Future for PendingReply<E> {
    type Output = Result<E, CorrelationError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.reply)
            .poll(cx)
            .map(|reply| reply.map_err(|_| CorrelationError::Abandoned))
    }
}

/// Disposes its subscription when dropped.
#[derive(Debug)]
struct ListenerGuard(Subscription);

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.0.dispose();
    }
}

/// Resolve with the next event emitted under `name`.
pub fn expect_once<E>(dispatcher: &EventDispatcher<E>, name: &str) -> PendingReply<E>
where
    E: Clone + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let subscription = dispatcher.add_disposable_once(name, move |event: &E| {
        if tx.send(event.clone()).is_err() {
            tracing::debug!("Reply arrived after its waiter was dropped");
        }
    });

    PendingReply {
        reply: rx,
        listener: ListenerGuard(subscription),
    }
}

/// Resolve with the first event emitted under `name` that satisfies
/// `predicate`, then unsubscribe.
pub fn expect_matching<E, P>(dispatcher: &EventDispatcher<E>, name: &str, predicate: P) -> PendingReply<E>
where
    E: Clone + Send + 'static,
    P: Fn(&E) -> bool + Send + Sync + 'static,
{
    let (tx, rx) = oneshot::channel();
    let sender = Arc::new(Mutex::new(Some(tx)));
    let own_subscription: Arc<OnceLock<Subscription>> = Arc::new(OnceLock::new());

    let listener_sender = Arc::clone(&sender);
    let listener_subscription = Arc::clone(&own_subscription);
    let subscription = dispatcher.add_disposable_listener(name, move |event: &E| {
        if !predicate(event) {
            return;
        }
        if let Some(tx) = listener_sender.lock().take() {
            if tx.send(event.clone()).is_err() {
                tracing::debug!("Reply arrived after its waiter was dropped");
            }
        }
        if let Some(subscription) = listener_subscription.get() {
            subscription.dispose();
        }
    });

    let _ = own_subscription.set(subscription.clone());
    // A reply delivered on another thread before the handle was stored
    // could not unsubscribe itself.
    if sender.lock().is_none() {
        subscription.dispose();
    }

    PendingReply {
        reply: rx,
        listener: ListenerGuard(subscription),
    }
}

/// Resolve with the first event emitted under `name` whose `context` equals
/// `context`.
pub fn expect_context(
    dispatcher: &EventDispatcher<InboundEvent>,
    name: &str,
    context: impl Into<String>,
) -> PendingReply<InboundEvent> {
    let context = context.into();
    expect_matching(dispatcher, name, move |event: &InboundEvent| {
        event.context.as_deref() == Some(context.as_str())
    })
}
