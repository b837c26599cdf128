use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Typed error hierarchy for chat turns. Everything that escapes the stream
/// pipeline is classified into one of five kinds before it reaches a
/// transcript; the UI layer reads `ChatMessage::error`, it never catches.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ChatError {
    #[error("network error: {0}")]
    Network(String),

    #[error("no activity for {0:?}")]
    Timeout(Duration),

    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("server error{}: {message}", status.map(|s| format!(" {s}")).unwrap_or_default())]
    Server { status: Option<u16>, message: String },

    /// Cancellation surfaced as an error. The orchestrators translate a
    /// user-requested stop into a stopped-notice instead; this kind is for
    /// paths without that convenience.
    #[error("aborted")]
    Aborted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    RateLimit,
    Server,
    Abort,
}

/// The serializable failure shape attached to a failed assistant message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::Server { .. } => ErrorKind::Server,
            Self::Aborted => ErrorKind::Abort,
        }
    }

    /// Classify an HTTP failure status. `retry_after` is the parsed
    /// `Retry-After` header in seconds, meaningful only for 429.
    pub fn from_status(status: u16, retry_after: Option<u64>) -> Self {
        match status {
            429 => Self::RateLimited {
                retry_after: retry_after.map(Duration::from_secs),
            },
            401 | 403 => Self::Server {
                status: Some(status),
                message: "Authentication error. Please refresh and try again.".into(),
            },
            500..=599 => Self::Server {
                status: Some(status),
                message: "Server error. Please try again later.".into(),
            },
            other => Self::Server {
                status: Some(other),
                message: format!("Server returned {other}"),
            },
        }
    }

    /// The user-facing message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Network error. Please check your connection and try again.".into()
            }
            Self::Timeout(_) => {
                "Request timed out. The server took too long to respond.".into()
            }
            Self::RateLimited { retry_after: Some(d) } => format!(
                "Too many requests. Please try again in {} seconds.",
                d.as_secs()
            ),
            Self::RateLimited { retry_after: None } => {
                "Too many requests. Please wait a moment and try again.".into()
            }
            Self::Server { message, .. } => message.clone(),
            Self::Aborted => "Generation stopped".into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Server { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<&ChatError> for ErrorInfo {
    fn from(err: &ChatError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
            status: err.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(ChatError::from_status(429, None).kind(), ErrorKind::RateLimit);
        assert_eq!(ChatError::from_status(500, None).kind(), ErrorKind::Server);
        assert_eq!(ChatError::from_status(503, None).kind(), ErrorKind::Server);
        assert_eq!(ChatError::from_status(401, None).kind(), ErrorKind::Server);
        assert_eq!(ChatError::from_status(403, None).kind(), ErrorKind::Server);
        assert_eq!(ChatError::from_status(418, None).kind(), ErrorKind::Server);
    }

    #[test]
    fn auth_statuses_get_auth_message() {
        let err = ChatError::from_status(401, None);
        assert_eq!(
            err.user_message(),
            "Authentication error. Please refresh and try again."
        );
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn retry_after_folds_into_message() {
        let err = ChatError::from_status(429, Some(30));
        assert_eq!(
            err.user_message(),
            "Too many requests. Please try again in 30 seconds."
        );

        let err = ChatError::from_status(429, None);
        assert_eq!(
            err.user_message(),
            "Too many requests. Please wait a moment and try again."
        );
    }

    #[test]
    fn error_info_wire_shape() {
        let err = ChatError::from_status(429, Some(5));
        let info = ErrorInfo::from(&err);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "rate_limit");
        assert_eq!(json["status"], 429);
        assert!(json["message"].as_str().unwrap().contains("5 seconds"));
    }

    #[test]
    fn timeout_info_has_no_status() {
        let err = ChatError::Timeout(Duration::from_secs(300));
        let info = ErrorInfo::from(&err);
        assert_eq!(info.kind, ErrorKind::Timeout);
        assert!(info.status.is_none());
    }

    #[test]
    fn kind_serialization() {
        assert_eq!(serde_json::to_string(&ErrorKind::RateLimit).unwrap(), r#""rate_limit""#);
        assert_eq!(serde_json::to_string(&ErrorKind::Network).unwrap(), r#""network""#);
        assert_eq!(serde_json::to_string(&ErrorKind::Abort).unwrap(), r#""abort""#);
    }
}
