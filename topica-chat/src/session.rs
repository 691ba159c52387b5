use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::adapter::{AdapterFailure, FailureKind, ModelAdapter};
use crate::conversation::{ConversationState, Dispatch, Effect, Event, Outcome, RequestId};
use crate::topic::Topic;

struct InFlight {
    request: RequestId,
    rx: oneshot::Receiver<Outcome>,
    task: JoinHandle<()>,
}

/// Drives a [`ConversationState`] against a [`ModelAdapter`].
///
/// Dispatch effects run the adapter on a tokio task; the outcome comes back
/// through [`Session::poll`] (non-blocking, for UI loops) or
/// [`Session::settle`]. Must be used from within a tokio runtime.
pub struct Session<A: ModelAdapter> {
    state: ConversationState,
    adapter: Arc<A>,
    in_flight: Option<InFlight>,
}

impl<A: ModelAdapter> Session<A> {
    pub fn new(adapter: Arc<A>, topic: Topic) -> Self {
        Self {
            state: ConversationState::new(topic),
            adapter,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Number of adapter calls currently running (0 or 1).
    pub fn outstanding(&self) -> usize {
        usize::from(self.in_flight.is_some())
    }

    /// Resolutions only enter through [`Session::poll`] and
    /// [`Session::settle`]; a running call the state no longer waits for is
    /// aborted.
    fn handle(&mut self, event: Event) {
        let effect = self.state.update(event);
        self.apply(effect);
        self.release_stale();
    }

    pub fn select_topic(&mut self, topic: Topic) {
        self.handle(Event::SelectTopic(topic));
    }

    pub fn update_input(&mut self, text: impl Into<String>) {
        self.handle(Event::UpdateInput(text.into()));
    }

    /// Returns true if a request was dispatched.
    pub fn submit(&mut self) -> bool {
        let before = self.state.pending_request();
        self.handle(Event::Submit);
        self.state.pending_request() != before
    }

    pub fn cancel(&mut self) {
        self.handle(Event::Cancel);
    }

    /// Feeds a finished request back into the state. Returns true if the
    /// state changed.
    pub fn poll(&mut self) -> bool {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return false;
        };

        let outcome = match in_flight.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return false,
            Err(oneshot::error::TryRecvError::Closed) => {
                error!("model task ended without an outcome");
                Err(FailureKind::Transport)
            }
        };

        let request = in_flight.request;
        self.in_flight = None;
        self.state.update(Event::Resolved { request, outcome });
        true
    }

    /// Waits for the in-flight request, if any, and applies its outcome.
    pub async fn settle(&mut self) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };

        let outcome = in_flight.rx.await.unwrap_or_else(|_| {
            error!("model task ended without an outcome");
            Err(FailureKind::Transport)
        });
        self.state.update(Event::Resolved {
            request: in_flight.request,
            outcome,
        });
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::Dispatch(dispatch) => self.spawn(dispatch),
            Effect::Abort(request) => {
                if let Some(in_flight) = self.in_flight.take_if(|f| f.request == request) {
                    debug!(?request, "aborting model request");
                    in_flight.task.abort();
                }
            }
        }
    }

    fn release_stale(&mut self) {
        let pending = self.state.pending_request();
        if let Some(in_flight) = self.in_flight.take_if(|f| Some(f.request) != pending) {
            debug!(request = ?in_flight.request, "dropping model request the state no longer awaits");
            in_flight.task.abort();
        }
    }

    fn spawn(&mut self, dispatch: Dispatch) {
        let Dispatch {
            request,
            message,
            history,
            topic,
        } = dispatch;
        let (tx, rx) = oneshot::channel();
        let adapter = Arc::clone(&self.adapter);

        debug!(?request, topic = %topic.id, history = history.len(), "dispatching model request");

        let task = tokio::spawn(async move {
            let outcome = match adapter.send(&message, &history, &topic).await {
                Ok(reply) => Ok(reply),
                Err(e) => {
                    warn!(error = %e, kind = ?e.kind(), "model request failed");
                    Err(e.kind())
                }
            };
            let _ = tx.send(outcome);
        });

        self.in_flight = Some(InFlight { request, rx, task });
    }
}

impl<A: ModelAdapter> Drop for Session<A> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
    }
}
