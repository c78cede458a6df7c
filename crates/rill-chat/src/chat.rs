//! Question dispatch and answer streaming

use futures::StreamExt;
use rill_client::{Message, QueryRequest, StreamEvent, decode_stream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    conversation::Conversation,
    error::{Error, Result},
    events::ChatEvent,
    handle::ChatHandle,
    session::StreamSession,
    transport::Transport,
};

/// Where the current question is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    /// Request sent, waiting for response headers
    Sending,
    /// Reading the response body
    Streaming,
    /// Splitting and committing the answer
    Finalizing,
    /// The question failed; returns to idle right after
    Failed,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Sending => "sending",
            Phase::Streaming => "streaming",
            Phase::Finalizing => "finalizing",
            Phase::Failed => "failed",
        }
    }
}

/// Options sent along with every question
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatConfig {
    /// Knowledge-base namespace to search
    pub namespace: Option<String>,
    /// Number of passages to retrieve
    pub top_k: Option<u32>,
}

/// How a question that reached the backend ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The answer was finalized at this position
    Answered { position: usize },
    /// Cancelled; the partial answer, if one was started, stays at this position
    Cancelled { position: Option<usize> },
}

/// A question accepted by [`Chat::begin`] and not yet dispatched
#[derive(Debug)]
#[must_use = "a pending question keeps the chat busy until it is driven"]
pub struct PendingQuestion {
    request: QueryRequest,
    position: usize,
}

impl PendingQuestion {
    /// Position of the user's message
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn request(&self) -> &QueryRequest {
        &self.request
    }
}

/// A single conversation with a question-answering backend
pub struct Chat {
    config: ChatConfig,
    conversation: Conversation,
    transport: Arc<dyn Transport>,
    event_tx: broadcast::Sender<ChatEvent>,
    handle: ChatHandle,
    phase: Phase,
}

impl Chat {
    /// Create a new chat
    pub fn new(config: ChatConfig, transport: Arc<dyn Transport>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            config,
            conversation: Conversation::default(),
            transport,
            event_tx,
            handle: ChatHandle::new(),
            phase: Phase::Idle,
        }
    }

    /// Subscribe to chat events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    /// Get the conversation state
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a question is being answered
    pub fn is_busy(&self) -> bool {
        self.conversation.is_busy()
    }

    /// Get a cloneable handle for cancelling from another task
    pub fn handle(&self) -> ChatHandle {
        self.handle.clone()
    }

    /// Cancel the question in flight
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Set the namespace for subsequent questions
    pub fn set_namespace(&mut self, namespace: Option<String>) {
        self.config.namespace = namespace;
    }

    /// Set the retrieval count for subsequent questions
    pub fn set_top_k(&mut self, top_k: Option<u32>) {
        self.config.top_k = top_k;
    }

    /// Remove every message and the last error
    pub fn clear(&mut self) -> Result<()> {
        if self.conversation.busy {
            return Err(Error::Busy);
        }
        self.conversation.store.clear();
        self.conversation.error = None;
        let _ = self.event_tx.send(ChatEvent::Cleared);
        Ok(())
    }

    /// Ask a question and wait for the answer
    pub async fn ask(&mut self, input: &str) -> Result<Outcome> {
        let pending = self.begin(input)?;
        self.drive(pending).await
    }

    /// Accept a question: append it, clear the last error and mark busy.
    ///
    /// Empty input and a busy chat are rejected without changing anything.
    pub fn begin(&mut self, input: &str) -> Result<PendingQuestion> {
        let question = input.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }
        if self.conversation.busy {
            return Err(Error::Busy);
        }

        self.handle.reset();
        self.handle.set_busy(true);
        self.conversation.busy = true;
        self.conversation.error = None;

        let position = self.conversation.store.push_user(question);
        if let Some(message) = self.conversation.store.get(position) {
            let _ = self.event_tx.send(ChatEvent::UserMessage {
                position,
                message: message.clone(),
            });
        }
        self.set_phase(Phase::Sending);

        let request = QueryRequest::new(question)
            .with_namespace(self.config.namespace.clone())
            .with_top_k(self.config.top_k);
        Ok(PendingQuestion { request, position })
    }

    /// Dispatch an accepted question and stream its answer into the conversation.
    ///
    /// Always leaves the chat idle, also when the returned future is dropped
    /// before it completes. Failures are recorded as the conversation error
    /// before being returned.
    pub async fn drive(&mut self, pending: PendingQuestion) -> Result<Outcome> {
        let cancel = self.handle.token();
        let mut guard = DriveGuard {
            chat: self,
            session: StreamSession::new(),
            settled: false,
        };

        let result = guard
            .chat
            .run(&pending.request, &mut guard.session, &cancel)
            .await;
        guard.settle();
        result
    }

    async fn run(
        &mut self,
        request: &QueryRequest,
        session: &mut StreamSession,
        cancel: &CancellationToken,
    ) -> Result<Outcome> {
        let transport = Arc::clone(&self.transport);
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = transport.open(request) => Some(opened),
        };
        let body = match opened {
            None => return self.cancelled(session),
            Some(Ok(body)) => body,
            Some(Err(e)) => return Err(self.fail(session, e.into())),
        };

        self.set_phase(Phase::Streaming);
        let mut fragments = decode_stream(body);

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                event = fragments.next() => Some(event),
            };

            match event {
                None => return self.cancelled(session),
                Some(Some(StreamEvent::Fragment { text })) => {
                    let started = session.position().is_none();
                    let position = match session.apply(&mut self.conversation.store, &text) {
                        Ok(position) => position,
                        Err(e) => return Err(self.fail(session, e)),
                    };
                    if started {
                        if let Some(message) = self.conversation.store.get(position) {
                            let _ = self.event_tx.send(ChatEvent::AnswerStarted {
                                position,
                                message: message.clone(),
                            });
                        }
                    } else {
                        let _ = self.event_tx.send(ChatEvent::AnswerUpdated {
                            position,
                            text: session.buffer().to_string(),
                        });
                    }
                }
                Some(Some(StreamEvent::Done)) => {
                    self.set_phase(Phase::Finalizing);
                    let position = match session.finish(&mut self.conversation.store) {
                        Ok(position) => position,
                        Err(e) => return Err(self.fail(session, e)),
                    };
                    if let Some(message) = self.conversation.store.get(position) {
                        let _ = self.event_tx.send(ChatEvent::AnswerFinalized {
                            position,
                            message: message.clone(),
                        });
                    }
                    tracing::info!("Answer complete at message {}", position);
                    return Ok(Outcome::Answered { position });
                }
                Some(Some(StreamEvent::Failed { error })) => {
                    return Err(self.fail(session, error.into()));
                }
                Some(None) => {
                    let error = rill_client::Error::stream("response ended without completing");
                    return Err(self.fail(session, error.into()));
                }
            }
        }
    }

    fn cancelled(&mut self, session: &mut StreamSession) -> Result<Outcome> {
        match session.abandon(&mut self.conversation.store) {
            Ok(position) => {
                tracing::info!("Question cancelled");
                let _ = self.event_tx.send(ChatEvent::Cancelled { position });
                Ok(Outcome::Cancelled { position })
            }
            Err(e) => Err(self.fail(session, e)),
        }
    }

    fn fail(&mut self, session: &mut StreamSession, error: Error) -> Error {
        let position = match session.abandon(&mut self.conversation.store) {
            Ok(position) => position,
            Err(e) => {
                tracing::warn!("Failed to release partial answer: {}", e);
                session.position()
            }
        };
        let message = error.to_string();
        match &error {
            Error::Client(e) => tracing::warn!(kind = ?e.kind(), "Question failed: {}", message),
            _ => tracing::warn!("Question failed: {}", message),
        }

        self.conversation.error = Some(message.clone());
        self.set_phase(Phase::Failed);
        let _ = self.event_tx.send(ChatEvent::Failed { position, message });
        error
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase == phase {
            return;
        }
        tracing::debug!("Phase {} -> {}", self.phase.label(), phase.label());
        self.phase = phase;
        let _ = self.event_tx.send(ChatEvent::PhaseChanged { phase });
    }
}

/// Returns the chat to idle when a drive ends or its future is dropped
struct DriveGuard<'a> {
    chat: &'a mut Chat,
    session: StreamSession,
    settled: bool,
}

impl DriveGuard<'_> {
    fn settle(&mut self) {
        if self.settled {
            return;
        }
        self.settled = true;

        // only a dropped drive leaves the session open
        if !self.session.is_complete() {
            match self.session.abandon(&mut self.chat.conversation.store) {
                Ok(position) => {
                    tracing::info!("Question dropped before it finished");
                    let _ = self.chat.event_tx.send(ChatEvent::Cancelled { position });
                }
                Err(e) => tracing::warn!("Failed to release partial answer: {}", e),
            }
        }

        self.chat.conversation.busy = false;
        self.chat.set_phase(Phase::Idle);
        self.chat.handle.set_busy(false);
    }
}

impl Drop for DriveGuard<'_> {
    fn drop(&mut self) {
        self.settle();
    }
}
