use std::sync::Arc;

use tracing::{debug, warn};

use parley_core::cancel::{CancelReason, CancelSignal};
use parley_core::errors::{ChatError, ErrorInfo};
use parley_core::ids::ChatId;
use parley_core::messages::ChatMessage;
use parley_core::parts::Part;
use parley_stream::{CanvasSink, TranscriptAssembler};

use crate::auth::TokenProvider;
use crate::config::ClientConfig;
use crate::hooks::{ClientHooks, NoopHooks, TranscriptStore};
use crate::request::Transport;
use crate::turn::stream_turn;

/// Appended as a final text part when the user stops generation.
pub const STOPPED_NOTICE: &str = "\n\n*[Generation stopped]*";

/// How a turn ended.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnOutcome {
    /// Stream ended normally; transcript persisted.
    Completed,
    /// User stopped generation; partial transcript persisted with a
    /// stopped-notice, no error recorded.
    Stopped,
    /// The turn failed; the error is attached to the assistant message and
    /// nothing was persisted.
    Failed(ErrorInfo),
    /// Regenerate or retry preconditions were not met; nothing happened.
    Skipped,
}

/// The send/regenerate/retry orchestrator. All three entry points run the
/// same pipeline and differ only in which transcript index receives parts.
pub struct ChatClient {
    transport: Transport,
    store: Option<Arc<dyn TranscriptStore>>,
    hooks: Arc<dyn ClientHooks>,
}

impl ChatClient {
    pub fn new(config: ClientConfig, auth: Arc<dyn TokenProvider>) -> anyhow::Result<Self> {
        Ok(Self {
            transport: Transport::new(config, auth)?,
            store: None,
            hooks: Arc::new(NoopHooks),
        })
    }

    pub fn with_store(mut self, store: Arc<dyn TranscriptStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ClientHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Append a user message and stream the reply into a fresh assistant
    /// message at the end of the transcript.
    pub async fn send(
        &self,
        chat: &ChatId,
        transcript: &mut Vec<ChatMessage>,
        prompt: impl Into<String>,
        signal: &CancelSignal,
        sink: &mut dyn CanvasSink,
    ) -> TurnOutcome {
        transcript.push(ChatMessage::user(prompt));
        let history = transcript.clone();
        transcript.push(ChatMessage::assistant());
        let index = transcript.len() - 1;
        self.run_turn(chat, transcript, index, history, signal, sink).await
    }

    /// Re-run the turn that produced the assistant message at `index`,
    /// replacing its parts in place. The message before it must be the user
    /// message that prompted it; otherwise nothing happens.
    pub async fn regenerate(
        &self,
        chat: &ChatId,
        transcript: &mut Vec<ChatMessage>,
        index: usize,
        signal: &CancelSignal,
        sink: &mut dyn CanvasSink,
    ) -> TurnOutcome {
        if !can_rerun(transcript, index) {
            debug!(index, "regenerate preconditions not met");
            return TurnOutcome::Skipped;
        }

        let history = transcript[..index].to_vec();
        let message = &mut transcript[index];
        message.parts = Some(Vec::new());
        message.error = None;
        self.run_turn(chat, transcript, index, history, signal, sink).await
    }

    /// Retry a failed assistant message. Identical to `regenerate`; the
    /// separate name exists because callers reach it from the error surface.
    pub async fn retry(
        &self,
        chat: &ChatId,
        transcript: &mut Vec<ChatMessage>,
        index: usize,
        signal: &CancelSignal,
        sink: &mut dyn CanvasSink,
    ) -> TurnOutcome {
        self.regenerate(chat, transcript, index, signal, sink).await
    }

    async fn run_turn(
        &self,
        chat: &ChatId,
        transcript: &mut Vec<ChatMessage>,
        index: usize,
        history: Vec<ChatMessage>,
        signal: &CancelSignal,
        sink: &mut dyn CanvasSink,
    ) -> TurnOutcome {
        let timeout = self.transport.config().inactivity_timeout;
        let result = stream_turn(
            &self.transport,
            &history,
            &mut transcript[index],
            signal,
            timeout,
            sink,
        )
        .await;

        match result {
            Ok(()) => {
                TranscriptAssembler::finalize(transcript[index].parts_mut());
                self.persist(chat, transcript).await;
                self.hooks.on_message_success();
                TurnOutcome::Completed
            }
            // A user stop is a successful partial completion: notice
            // appended, transcript persisted, no error recorded. Open
            // thinking parts stay as the user saw them.
            Err(ChatError::Aborted)
                if signal.reason() != Some(CancelReason::Inactivity) =>
            {
                transcript[index].parts_mut().push(Part::text(STOPPED_NOTICE));
                self.persist(chat, transcript).await;
                self.hooks.on_generation_stopped();
                TurnOutcome::Stopped
            }
            Err(err) => {
                // Watchdog aborts are reported as timeouts, not stops.
                let err = match err {
                    ChatError::Aborted => ChatError::Timeout(timeout),
                    other => other,
                };
                let info = ErrorInfo::from(&err);
                transcript[index].error = Some(info.clone());
                self.hooks.on_error(&info);
                TurnOutcome::Failed(info)
            }
        }
    }

    async fn persist(&self, chat: &ChatId, transcript: &[ChatMessage]) {
        if let Some(store) = &self.store {
            if let Err(err) = store.save(chat, transcript).await {
                warn!(%err, chat = %chat, "failed to persist transcript");
            }
        }
    }
}

fn can_rerun(transcript: &[ChatMessage], index: usize) -> bool {
    index >= 1
        && transcript.get(index).is_some_and(ChatMessage::is_assistant)
        && transcript[index - 1].is_user()
}
