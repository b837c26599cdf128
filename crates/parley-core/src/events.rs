use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One decoded SSE frame. Flat and minimal: a single frame carries one small
/// delta, and the aggregator in `parley-stream` reconstructs full parts from
/// runs of them. Frames arrive strictly in wire order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireEvent {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    Code {
        #[serde(default)]
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    /// `headers` opens a table, each `row` extends it.
    Table {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        row: Option<Vec<String>>,
    },
    Callout {
        #[serde(default)]
        style: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        callout: String,
    },
    Image {
        // Some producers send `src` instead of `image`.
        #[serde(default, alias = "src", skip_serializing_if = "Option::is_none")]
        image: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    /// One already-complete tool/reasoning action.
    Step {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
    },
    /// Side-document channel, orthogonal to the conversational stream.
    Canvas(CanvasEvent),
    /// Unrecognized `type` tags deserialize here instead of failing the frame.
    #[serde(other)]
    Unknown,
}

/// Payload of a `canvas` event. Fields are independent flags: a single event
/// may combine them (e.g. `open` + `title`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl WireEvent {
    /// Short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Thinking { .. } => "thinking",
            Self::Code { .. } => "code",
            Self::Table { .. } => "table",
            Self::Callout { .. } => "callout",
            Self::Image { .. } => "image",
            Self::Step { .. } => "step",
            Self::Canvas(_) => "canvas",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_text_event() {
        let ev: WireEvent = serde_json::from_str(r#"{"type":"text","text":"hi"}"#).unwrap();
        assert_eq!(ev, WireEvent::Text { text: "hi".into() });
    }

    #[test]
    fn parse_text_event_without_payload() {
        let ev: WireEvent = serde_json::from_str(r#"{"type":"text"}"#).unwrap();
        assert_eq!(ev, WireEvent::Text { text: String::new() });
    }

    #[test]
    fn parse_table_header_and_row_events() {
        let ev: WireEvent =
            serde_json::from_str(r#"{"type":"table","headers":["a","b"]}"#).unwrap();
        assert_eq!(
            ev,
            WireEvent::Table { headers: Some(vec!["a".into(), "b".into()]), row: None }
        );

        let ev: WireEvent = serde_json::from_str(r#"{"type":"table","row":["1","2"]}"#).unwrap();
        assert_eq!(
            ev,
            WireEvent::Table { headers: None, row: Some(vec!["1".into(), "2".into()]) }
        );
    }

    #[test]
    fn parse_image_event_accepts_src_alias() {
        let ev: WireEvent =
            serde_json::from_str(r#"{"type":"image","src":"https://x/y.png","alt":"y"}"#).unwrap();
        assert_eq!(
            ev,
            WireEvent::Image {
                image: Some("https://x/y.png".into()),
                alt: Some("y".into()),
                caption: None,
            }
        );
    }

    #[test]
    fn parse_step_event() {
        let ev: WireEvent =
            serde_json::from_str(r#"{"type":"step","step":"search","data":{"q":"rust"}}"#).unwrap();
        match ev {
            WireEvent::Step { step, data, result } => {
                assert_eq!(step.as_deref(), Some("search"));
                assert_eq!(data.unwrap()["q"], "rust");
                assert!(result.is_none());
            }
            other => panic!("expected step, got {other:?}"),
        }
    }

    #[test]
    fn parse_canvas_event() {
        let ev: WireEvent =
            serde_json::from_str(r#"{"type":"canvas","open":true,"title":"Report"}"#).unwrap();
        match ev {
            WireEvent::Canvas(c) => {
                assert_eq!(c.open, Some(true));
                assert_eq!(c.title.as_deref(), Some("Report"));
                assert!(c.content.is_none());
            }
            other => panic!("expected canvas, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_does_not_fail() {
        let ev: WireEvent =
            serde_json::from_str(r#"{"type":"confetti","amount":9000}"#).unwrap();
        assert_eq!(ev, WireEvent::Unknown);
    }

    #[test]
    fn kind_strings() {
        assert_eq!(WireEvent::Text { text: String::new() }.kind(), "text");
        assert_eq!(WireEvent::Canvas(CanvasEvent::default()).kind(), "canvas");
        assert_eq!(WireEvent::Unknown.kind(), "unknown");
    }
}
