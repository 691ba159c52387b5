//! Integration tests for the session driver with scripted adapters

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use topica_chat::{
    AdapterFailure, Citation, FailureKind, Message, ModelAdapter, ModelReply, Role, Session,
    Topic, TopicRegistry,
};

#[derive(Debug)]
struct ScriptedError(FailureKind);

impl fmt::Display for ScriptedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scripted failure: {:?}", self.0)
    }
}

impl std::error::Error for ScriptedError {}

impl AdapterFailure for ScriptedError {
    fn kind(&self) -> FailureKind {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Call {
    message: String,
    history: Vec<Message>,
    system_instruction: String,
}

struct Scripted {
    reply: Result<ModelReply, FailureKind>,
    calls: Mutex<Vec<Call>>,
    gate: Option<Arc<Semaphore>>,
}

impl Scripted {
    fn replying(reply: ModelReply) -> Self {
        Self {
            reply: Ok(reply),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    fn failing(kind: FailureKind) -> Self {
        Self {
            reply: Err(kind),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelAdapter for Scripted {
    type Error = ScriptedError;

    async fn send(
        &self,
        message: &str,
        history: &[Message],
        topic: &Topic,
    ) -> Result<ModelReply, ScriptedError> {
        self.calls.lock().unwrap().push(Call {
            message: message.to_string(),
            history: history.to_vec(),
            system_instruction: topic.system_instruction.clone(),
        });

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.reply.clone().map_err(ScriptedError)
    }
}

fn terse_topic() -> Topic {
    Topic::new("terse", "Terse", "Short answers", "Be terse", "T")
}

async fn poll_until_settled<A: ModelAdapter>(session: &mut Session<A>) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !session.poll() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("request did not resolve");
}

#[tokio::test]
async fn hello_with_terse_topic() {
    let adapter = Arc::new(Scripted::replying(ModelReply::new("Hi", vec![])));
    let mut session = Session::new(Arc::clone(&adapter), terse_topic());

    session.update_input("Hello");
    assert!(session.submit());
    session.settle().await;

    let calls = adapter.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].message, "Hello");
    assert!(calls[0].history.is_empty());
    assert_eq!(calls[0].system_instruction, "Be terse");

    let messages = session.state().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "Hi");
    assert!(messages[1].sources.is_empty());
    assert!(!session.state().is_loading());
}

#[tokio::test]
async fn missing_credential_becomes_configuration_message() {
    let adapter = Arc::new(Scripted::failing(FailureKind::MissingCredential));
    let mut session = Session::new(adapter, TopicRegistry::builtin().default_topic().clone());

    session.update_input("test");
    session.submit();
    poll_until_settled(&mut session).await;

    let reply = &session.state().messages()[1];
    assert_eq!(reply.role, Role::Assistant);
    assert!(reply.content.contains("API key missing"));
    assert!(!session.state().is_loading());
}

#[tokio::test]
async fn duplicate_sources_are_collapsed() {
    let adapter = Arc::new(Scripted::replying(ModelReply::new(
        "answer",
        vec![
            Citation::new("First", "https://x.com"),
            Citation::new("Second", "https://x.com"),
        ],
    )));
    let mut session = Session::new(adapter, terse_topic());

    session.update_input("q");
    session.submit();
    session.settle().await;

    let sources = &session.state().messages()[1].sources;
    assert_eq!(sources, &vec![Citation::new("First", "https://x.com")]);
}

#[tokio::test]
async fn submit_while_loading_is_ignored() {
    let gate = Arc::new(Semaphore::new(0));
    let adapter = Arc::new(
        Scripted::replying(ModelReply::new("done", vec![])).gated(Arc::clone(&gate)),
    );
    let mut session = Session::new(Arc::clone(&adapter), terse_topic());

    session.update_input("first");
    assert!(session.submit());
    assert!(session.state().is_loading());
    assert_eq!(session.outstanding(), 1);

    session.update_input("second");
    assert!(!session.submit());
    assert_eq!(session.outstanding(), 1);
    assert_eq!(session.state().messages().len(), 1);

    gate.add_permits(1);
    session.settle().await;

    assert_eq!(adapter.calls().len(), 1);
    assert!(!session.state().is_loading());
    assert_eq!(session.outstanding(), 0);
    assert_eq!(session.state().input(), "second");
}

#[tokio::test]
async fn user_messages_match_accepted_submits() {
    let adapter = Arc::new(Scripted::replying(ModelReply::new("ok", vec![])));
    let mut session = Session::new(Arc::clone(&adapter), terse_topic());

    let mut accepted = 0;
    for text in ["a", "", "  ", "b", "c"] {
        session.update_input(text);
        if session.submit() {
            accepted += 1;
        }
        assert_eq!(session.state().is_loading(), session.outstanding() == 1);
        session.settle().await;
        assert_eq!(session.outstanding(), 0);
    }

    let users = session
        .state()
        .messages()
        .iter()
        .filter(|m| m.role == Role::User)
        .count();
    assert_eq!(accepted, 3);
    assert_eq!(users, accepted);
    assert_eq!(adapter.calls().len(), accepted);
}

#[tokio::test]
async fn topic_switch_applies_to_later_calls_only() {
    let registry = TopicRegistry::builtin();
    let adapter = Arc::new(Scripted::replying(ModelReply::new("ok", vec![])));
    let mut session = Session::new(Arc::clone(&adapter), registry.default_topic().clone());

    session.update_input("one");
    session.submit();
    session.settle().await;
    let before = session.state().messages().to_vec();

    let coding = registry.find("coding").unwrap().clone();
    session.select_topic(coding.clone());
    assert_eq!(session.state().messages(), before.as_slice());

    session.update_input("two");
    session.submit();
    session.settle().await;

    let calls = adapter.calls();
    assert_eq!(
        calls[0].system_instruction,
        registry.default_topic().system_instruction
    );
    assert_eq!(calls[1].system_instruction, coding.system_instruction);
    assert_eq!(calls[1].history.len(), 2);
}

#[tokio::test]
async fn cancel_aborts_and_allows_retry() {
    let gate = Arc::new(Semaphore::new(0));
    let adapter = Arc::new(
        Scripted::replying(ModelReply::new("late", vec![])).gated(Arc::clone(&gate)),
    );
    let mut session = Session::new(Arc::clone(&adapter), terse_topic());

    session.update_input("slow");
    session.submit();
    session.cancel();

    assert!(!session.state().is_loading());
    assert_eq!(session.outstanding(), 0);
    assert!(!session.poll());
    assert_eq!(session.state().notice(), Some("Request cancelled"));

    gate.add_permits(1);
    session.update_input("again");
    assert!(session.submit());
    session.settle().await;

    let messages = session.state().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].content, "late");
}

#[tokio::test]
async fn loading_tracks_the_single_running_call() {
    let gate = Arc::new(Semaphore::new(0));
    let adapter = Arc::new(
        Scripted::replying(ModelReply::new("done", vec![])).gated(Arc::clone(&gate)),
    );
    let mut session = Session::new(Arc::clone(&adapter), terse_topic());
    let in_step = |s: &Session<Scripted>| s.state().is_loading() == (s.outstanding() == 1);

    session.update_input("one");
    assert!(session.submit());
    assert!(in_step(&session));

    session.cancel();
    assert!(in_step(&session));
    assert!(!session.poll());

    session.update_input("two");
    assert!(session.submit());
    assert_eq!(session.outstanding(), 1);
    assert!(in_step(&session));

    gate.add_permits(1);
    session.settle().await;
    assert!(in_step(&session));

    let assistants = session
        .state()
        .messages()
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .count();
    assert_eq!(assistants, 1);
}
