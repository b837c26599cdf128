use async_trait::async_trait;

use parley_core::errors::ErrorInfo;
use parley_core::ids::ChatId;
use parley_core::messages::ChatMessage;

/// Persistence seam. The client saves the whole transcript after a
/// successful or user-stopped turn; failed turns are never persisted.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn save(&self, chat: &ChatId, messages: &[ChatMessage]) -> anyhow::Result<()>;
}

/// Turn-outcome notifications. Defaults are no-ops so callers implement only
/// what they care about (quota counters, UI toasts).
pub trait ClientHooks: Send + Sync {
    /// A turn completed normally.
    fn on_message_success(&self) {}

    /// The user stopped generation mid-stream.
    fn on_generation_stopped(&self) {}

    /// A turn failed; `error` is what was attached to the message.
    fn on_error(&self, _error: &ErrorInfo) {}
}

pub struct NoopHooks;

impl ClientHooks for NoopHooks {}
