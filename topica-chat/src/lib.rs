//! Topic-steered chat conversations with a language model.
//!
//! This crate holds the provider-independent pieces of topica:
//! - [`Message`] and [`Citation`]: the conversation record
//! - [`TopicRegistry`]: the fixed set of personas and their system instructions
//! - [`ConversationState`]: pure state transitions driven by [`Event`]s
//! - [`ModelAdapter`]: the seam a provider client implements
//! - [`Session`]: runs dispatched requests on tokio and feeds results back
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use topica_chat::{Session, TopicRegistry};
//!
//! let registry = TopicRegistry::builtin();
//! let mut session = Session::new(Arc::new(adapter), registry.default_topic().clone());
//! session.update_input("Hello");
//! session.submit();
//! session.settle().await;
//! println!("{}", session.state().messages()[1].content);
//! ```

mod adapter;
mod conversation;
mod message;
mod session;
mod topic;

pub use adapter::{AdapterFailure, FailureKind, ModelAdapter, ModelReply};
pub use conversation::{
    ConversationState, Dispatch, Effect, Event, Outcome, RequestId, failure_message,
};
pub use message::{Citation, Message, MessageId, Role, dedup_citations};
pub use session::Session;
pub use topic::{STARTER_PROMPTS, Topic, TopicRegistry};
