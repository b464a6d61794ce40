//! # deck-events
//!
//! In-process publish/subscribe keyed by event name, plus the two
//! request/reply correlation patterns built on top of it.
//!
//! ## Dispatcher
//!
//! [`EventDispatcher`] keeps an ordered listener list per event name.
//! Listeners are plain closures; one-shot listeners remove themselves before
//! their single call, and disposable listeners hand back a [`Subscription`]
//! that can be torn down later.
//!
//! ```rust
//! use deck_events::EventDispatcher;
//!
//! let dispatcher = EventDispatcher::<String>::new();
//! let subscription = dispatcher.add_disposable_listener("greet", |name: &String| {
//!     println!("hello {name}");
//! });
//!
//! assert_eq!(dispatcher.emit("greet", &"world".to_string()), 1);
//! subscription.dispose();
//! assert_eq!(dispatcher.emit("greet", &"again".to_string()), 0);
//! ```
//!
//! ## Correlation
//!
//! [`correlator::expect_once`] waits for the next event of a name, and
//! [`correlator::expect_context`] waits for the next event of a name whose
//! `context` matches, ignoring replies addressed to other instances.

pub mod correlator;
pub mod dispatcher;
pub mod error;

pub use correlator::{expect_context, expect_matching, expect_once, PendingReply};
pub use dispatcher::{EventDispatcher, ListenerId, Subscription};
pub use error::CorrelationError;
