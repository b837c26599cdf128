use parley_core::events::CanvasEvent;
use parley_core::parts::Part;

/// Receives every canvas event, in order, after it has been folded into the
/// parts list. Implementations drive whatever surface renders the canvas.
pub trait CanvasSink {
    fn on_canvas_event(&mut self, event: &CanvasEvent);
}

/// A sink that drops everything, for callers without a canvas surface.
#[derive(Debug, Default)]
pub struct NullCanvasSink;

impl CanvasSink for NullCanvasSink {
    fn on_canvas_event(&mut self, _event: &CanvasEvent) {}
}

/// Folds canvas events into the parts list, independently of the part
/// aggregator. The dispatcher tracks the one open canvas part; canvas
/// traffic never disturbs a text or thinking merge run, and vice versa.
///
/// Field handling is sequential, not exclusive: a single event may open,
/// append content, and complete in one go.
#[derive(Debug, Default)]
pub struct CanvasDispatcher {
    current: Option<usize>,
}

impl CanvasDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(
        &mut self,
        parts: &mut Vec<Part>,
        event: &CanvasEvent,
        sink: &mut dyn CanvasSink,
    ) {
        if event.open == Some(true) {
            parts.push(Part::Canvas {
                title: event.title.clone().unwrap_or_else(|| "Untitled".to_string()),
                content: String::new(),
                complete: false,
            });
            self.current = Some(parts.len() - 1);
        }

        if let (Some(idx), Some(delta)) = (self.current, event.content.as_deref()) {
            if let Part::Canvas { content, .. } = &mut parts[idx] {
                content.push_str(delta);
            }
        }

        if event.done == Some(true) {
            if let Some(idx) = self.current {
                if let Part::Canvas { complete, .. } = &mut parts[idx] {
                    *complete = true;
                }
            }
        }

        // `open: false` carries no fold-side effect; the sink still sees it.
        sink.on_canvas_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        seen: Vec<CanvasEvent>,
    }

    impl CanvasSink for RecordingSink {
        fn on_canvas_event(&mut self, event: &CanvasEvent) {
            self.seen.push(event.clone());
        }
    }

    fn open(title: &str) -> CanvasEvent {
        CanvasEvent {
            open: Some(true),
            title: Some(title.into()),
            content: None,
            done: None,
        }
    }

    fn content(delta: &str) -> CanvasEvent {
        CanvasEvent {
            open: None,
            title: None,
            content: Some(delta.into()),
            done: None,
        }
    }

    fn done() -> CanvasEvent {
        CanvasEvent {
            open: None,
            title: None,
            content: None,
            done: Some(true),
        }
    }

    #[test]
    fn open_content_done_builds_one_part() {
        let mut dispatcher = CanvasDispatcher::new();
        let mut sink = RecordingSink::default();
        let mut parts = Vec::new();

        dispatcher.apply(&mut parts, &open("T"), &mut sink);
        dispatcher.apply(&mut parts, &content("Hel"), &mut sink);
        dispatcher.apply(&mut parts, &content("lo"), &mut sink);
        dispatcher.apply(&mut parts, &done(), &mut sink);

        assert_eq!(
            parts,
            vec![Part::Canvas {
                title: "T".into(),
                content: "Hello".into(),
                complete: true,
            }]
        );
    }

    #[test]
    fn open_without_title_defaults_to_untitled() {
        let mut dispatcher = CanvasDispatcher::new();
        let mut parts = Vec::new();
        dispatcher.apply(
            &mut parts,
            &CanvasEvent { open: Some(true), title: None, content: None, done: None },
            &mut NullCanvasSink,
        );
        assert!(matches!(&parts[0], Part::Canvas { title, .. } if title == "Untitled"));
    }

    #[test]
    fn content_before_any_open_is_dropped() {
        let mut dispatcher = CanvasDispatcher::new();
        let mut sink = RecordingSink::default();
        let mut parts = Vec::new();

        dispatcher.apply(&mut parts, &content("lost"), &mut sink);

        assert!(parts.is_empty());
        // The sink still observed the event.
        assert_eq!(sink.seen.len(), 1);
    }

    #[test]
    fn single_event_can_open_fill_and_complete() {
        let mut dispatcher = CanvasDispatcher::new();
        let mut parts = Vec::new();
        dispatcher.apply(
            &mut parts,
            &CanvasEvent {
                open: Some(true),
                title: Some("One".into()),
                content: Some("shot".into()),
                done: Some(true),
            },
            &mut NullCanvasSink,
        );
        assert_eq!(
            parts,
            vec![Part::Canvas {
                title: "One".into(),
                content: "shot".into(),
                complete: true,
            }]
        );
    }

    #[test]
    fn reopen_starts_a_fresh_part() {
        let mut dispatcher = CanvasDispatcher::new();
        let mut parts = Vec::new();
        dispatcher.apply(&mut parts, &open("A"), &mut NullCanvasSink);
        dispatcher.apply(&mut parts, &content("first"), &mut NullCanvasSink);
        dispatcher.apply(&mut parts, &open("B"), &mut NullCanvasSink);
        dispatcher.apply(&mut parts, &content("second"), &mut NullCanvasSink);

        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[0], Part::Canvas { content, .. } if content == "first"));
        assert!(matches!(&parts[1], Part::Canvas { content, .. } if content == "second"));
    }

    #[test]
    fn every_event_forwards_to_the_sink_exactly_once() {
        let mut dispatcher = CanvasDispatcher::new();
        let mut sink = RecordingSink::default();
        let mut parts = Vec::new();

        let events = [open("T"), content("x"), done()];
        for event in &events {
            dispatcher.apply(&mut parts, event, &mut sink);
        }
        assert_eq!(sink.seen.len(), 3);
        assert_eq!(sink.seen[1].content.as_deref(), Some("x"));
    }

    #[test]
    fn close_event_forwards_without_folding() {
        let mut dispatcher = CanvasDispatcher::new();
        let mut sink = RecordingSink::default();
        let mut parts = Vec::new();

        dispatcher.apply(&mut parts, &open("T"), &mut sink);
        dispatcher.apply(
            &mut parts,
            &CanvasEvent { open: Some(false), title: None, content: None, done: None },
            &mut sink,
        );

        // The part is untouched and still incomplete.
        assert_eq!(
            parts,
            vec![Part::Canvas { title: "T".into(), content: String::new(), complete: false }]
        );
        assert_eq!(sink.seen.len(), 2);
    }
}
