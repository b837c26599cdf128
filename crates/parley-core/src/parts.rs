use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A reconstructed unit of an assistant message, built by folding a run of
/// wire events together. Underscore-prefixed field names (`_complete`,
/// `_startTime`, `_duration`) are kept on the wire so persisted transcripts
/// stay readable by existing renderers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
        /// Epoch millis at which the thinking run opened.
        #[serde(
            default,
            rename = "_startTime",
            skip_serializing_if = "Option::is_none"
        )]
        start_time: Option<i64>,
        #[serde(default, rename = "_complete")]
        complete: bool,
        /// Whole seconds spent thinking, computed when the part closes.
        #[serde(default, rename = "_duration", skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
    Code {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    Table {
        #[serde(default)]
        headers: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<String>>,
    },
    Callout {
        style: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        callout: String,
    },
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Steps {
        steps: Vec<StepRecord>,
    },
    Canvas {
        title: String,
        content: String,
        #[serde(default, rename = "_complete")]
        complete: bool,
    },
}

/// One atomic record inside a `steps` part. Steps are recorded
/// already-complete and are never merged or mutated after insertion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(rename = "_complete")]
    pub complete: bool,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Whether this part can still absorb deltas of its own type.
    pub fn is_open_thinking(&self) -> bool {
        matches!(self, Self::Thinking { complete: false, .. })
    }
}
