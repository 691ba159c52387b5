//! Pure conversation state transitions.
//!
//! [`ConversationState::update`] consumes an [`Event`] and returns the
//! [`Effect`] the caller must carry out. Nothing in here performs I/O, so
//! every transition can be exercised without a runtime or a model.

use tracing::debug;

use crate::adapter::{FailureKind, ModelReply};
use crate::message::Message;
use crate::topic::Topic;

/// Identifies one dispatched model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

/// Result of a model call as seen by the state machine.
pub type Outcome = Result<ModelReply, FailureKind>;

#[derive(Debug, Clone)]
pub enum Event {
    SelectTopic(Topic),
    UpdateInput(String),
    Submit,
    Resolved { request: RequestId, outcome: Outcome },
    Cancel,
}

/// A model call the caller must start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub request: RequestId,
    pub message: String,
    /// Messages preceding the new user message.
    pub history: Vec<Message>,
    pub topic: Topic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Dispatch(Dispatch),
    Abort(RequestId),
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    messages: Vec<Message>,
    input: String,
    current_topic: Topic,
    pending: Option<RequestId>,
    next_request: u64,
    notice: Option<String>,
    last_failure: Option<FailureKind>,
}

impl ConversationState {
    pub fn new(topic: Topic) -> Self {
        Self {
            messages: Vec::new(),
            input: String::new(),
            current_topic: topic,
            pending: None,
            next_request: 0,
            notice: None,
            last_failure: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn current_topic(&self) -> &Topic {
        &self.current_topic
    }

    /// True exactly while one dispatched request awaits resolution.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_request(&self) -> Option<RequestId> {
        self.pending
    }

    /// Transient status line, e.g. after a cancelled request.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Failure kind of the most recently resolved request, if it failed.
    pub fn last_failure(&self) -> Option<FailureKind> {
        self.last_failure
    }

    /// Whether a submit would currently be accepted.
    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.input.trim().is_empty()
    }

    pub fn update(&mut self, event: Event) -> Effect {
        match event {
            Event::SelectTopic(topic) => {
                self.current_topic = topic;
                Effect::None
            }
            Event::UpdateInput(text) => {
                self.input = text;
                Effect::None
            }
            Event::Submit => self.submit(),
            Event::Resolved { request, outcome } => {
                self.resolve(request, outcome);
                Effect::None
            }
            Event::Cancel => self.cancel(),
        }
    }

    fn submit(&mut self) -> Effect {
        if !self.can_submit() {
            return Effect::None;
        }

        let message = std::mem::take(&mut self.input);
        let history = self.messages.clone();
        self.messages.push(Message::user(message.clone()));

        let request = RequestId(self.next_request);
        self.next_request += 1;
        self.pending = Some(request);
        self.notice = None;

        Effect::Dispatch(Dispatch {
            request,
            message,
            history,
            topic: self.current_topic.clone(),
        })
    }

    fn resolve(&mut self, request: RequestId, outcome: Outcome) {
        if self.pending != Some(request) {
            debug!(?request, pending = ?self.pending, "ignoring stale resolution");
            return;
        }
        self.pending = None;
        self.last_failure = outcome.as_ref().err().copied();

        let reply = match outcome {
            Ok(reply) => Message::assistant(reply.text, reply.sources),
            Err(kind) => Message::assistant(failure_message(kind), Vec::new()),
        };
        self.messages.push(reply);
    }

    fn cancel(&mut self) -> Effect {
        match self.pending.take() {
            Some(request) => {
                self.notice = Some("Request cancelled".to_string());
                Effect::Abort(request)
            }
            None => Effect::None,
        }
    }
}

/// User-facing text for a failed request.
pub fn failure_message(kind: FailureKind) -> String {
    let (title, body) = match kind {
        FailureKind::MissingCredential => (
            "API key missing",
            "No Gemini API key is configured. Set GEMINI_API_KEY (or `gemini_api_key` in the config file) and restart topica.",
        ),
        FailureKind::Unauthorized => (
            "API key rejected",
            "Gemini refused the configured API key. Check that the key is valid and has access to the model.",
        ),
        FailureKind::Transport => (
            "Connection problem",
            "I couldn't reach Gemini. Please try again shortly.",
        ),
    };
    format!("❌ **{}**\n\n{}", title, body)
}
