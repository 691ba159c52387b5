use async_trait::async_trait;

use crate::message::{Citation, Message};
use crate::topic::Topic;

/// Output of a successful model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub text: String,
    pub sources: Vec<Citation>,
}

impl ModelReply {
    pub fn new(text: impl Into<String>, sources: Vec<Citation>) -> Self {
        Self {
            text: text.into(),
            sources,
        }
    }
}

/// Coarse classification of an adapter failure, used to pick the text shown
/// to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No usable credential; detected before any network attempt.
    MissingCredential,
    /// Credential present but rejected by the provider.
    Unauthorized,
    /// Any other network or provider failure.
    Transport,
}

/// Implemented by adapter error types so the session can classify them
/// without knowing the concrete provider.
pub trait AdapterFailure: std::error::Error + Send + Sync + 'static {
    fn kind(&self) -> FailureKind;
}

/// A language model backend.
///
/// Implementations are stateless with respect to the conversation: the full
/// history is passed on every call. A single attempt is made per call.
#[async_trait]
pub trait ModelAdapter: Send + Sync + 'static {
    type Error: AdapterFailure;

    /// Sends `message` as the next user turn after `history`, steered by the
    /// topic's system instruction.
    async fn send(
        &self,
        message: &str,
        history: &[Message],
        topic: &Topic,
    ) -> Result<ModelReply, Self::Error>;
}
