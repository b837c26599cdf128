use std::sync::Arc;

use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tracing::debug;

use parley_core::errors::ChatError;
use parley_core::messages::ChatMessage;
use parley_stream::EventStream;

use crate::auth::TokenProvider;
use crate::config::ClientConfig;

/// Opens the streaming chat request. Owns the HTTP client and the token
/// provider; everything past the response status line belongs to
/// `EventStream`.
pub struct Transport {
    http: reqwest::Client,
    config: ClientConfig,
    auth: Arc<dyn TokenProvider>,
}

impl Transport {
    pub fn new(config: ClientConfig, auth: Arc<dyn TokenProvider>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, config, auth })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POST the history and hand back the decoded event stream. Failure
    /// statuses are classified here so callers only ever see `ChatError`.
    pub async fn open_stream(&self, history: &[ChatMessage]) -> Result<EventStream, ChatError> {
        let mut request = self
            .http
            .post(self.config.chat_url())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&json!({ "messages": wire_messages(history) }));

        match self.auth.bearer_token().await {
            Ok(Some(token)) => {
                request = request.bearer_auth(token.expose_secret());
            }
            Ok(None) => {}
            Err(err) => {
                debug!(%err, "token provider failed, sending unauthenticated");
            }
        }

        let response = request
            .send()
            .await
            .map_err(|err| ChatError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(ChatError::from_status(status.as_u16(), retry_after));
        }

        Ok(EventStream::new(response.bytes_stream()))
    }
}

/// Project the transcript onto the wire shape. Local bookkeeping such as a
/// prior turn's `error` never leaves the process.
pub fn wire_messages(history: &[ChatMessage]) -> Vec<Value> {
    history
        .iter()
        .map(|msg| {
            let mut obj = serde_json::Map::new();
            obj.insert("role".into(), serde_json::to_value(msg.role).unwrap_or(Value::Null));
            if let Some(content) = &msg.content {
                obj.insert("content".into(), Value::String(content.clone()));
            }
            if let Some(parts) = &msg.parts {
                obj.insert(
                    "parts".into(),
                    serde_json::to_value(parts).unwrap_or(Value::Null),
                );
            }
            Value::Object(obj)
        })
        .collect()
}
