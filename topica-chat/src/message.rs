use std::collections::HashSet;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a message within a session.
///
/// Backed by a UUIDv7: time-ordered, with a random tail, so two messages
/// created in the same millisecond never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A web source backing an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

impl Citation {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// Removes citations whose uri was already seen, keeping the first title and
/// the first-seen order.
pub fn dedup_citations(citations: impl IntoIterator<Item = Citation>) -> Vec<Citation> {
    let mut seen = HashSet::new();
    citations
        .into_iter()
        .filter(|c| seen.insert(c.uri.clone()))
        .collect()
}

/// A single entry of the conversation. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    /// Creation time, epoch milliseconds.
    pub timestamp_ms: i64,
    /// Empty for user messages and synthetic error replies.
    pub sources: Vec<Citation>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), Vec::new())
    }

    /// Builds an assistant message; duplicate source uris are dropped.
    pub fn assistant(content: impl Into<String>, sources: Vec<Citation>) -> Self {
        Self::new(Role::Assistant, content.into(), dedup_citations(sources))
    }

    fn new(role: Role, content: String, sources: Vec<Citation>) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            content,
            timestamp_ms: Utc::now().timestamp_millis(),
            sources,
        }
    }
}
