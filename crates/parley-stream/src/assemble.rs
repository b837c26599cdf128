use parley_core::events::WireEvent;
use parley_core::parts::Part;

use crate::aggregate::Aggregator;
use crate::canvas::{CanvasDispatcher, CanvasSink};

/// Routes each decoded event to the right folder: canvas events to the
/// canvas dispatcher, everything else to the part aggregator. The two keep
/// independent cursors, so interleaved canvas and text traffic never break
/// each other's runs.
#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    aggregator: Aggregator,
    canvas: CanvasDispatcher,
}

impl TranscriptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(
        &mut self,
        parts: &mut Vec<Part>,
        event: &WireEvent,
        sink: &mut dyn CanvasSink,
    ) {
        match event {
            WireEvent::Canvas(canvas_event) => {
                self.canvas.apply(parts, canvas_event, sink);
            }
            other => self.aggregator.apply(parts, other),
        }
    }

    /// Close anything left open at end of stream.
    pub fn finalize(parts: &mut [Part]) {
        Aggregator::finalize(parts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::NullCanvasSink;
    use parley_core::events::CanvasEvent;

    fn text(s: &str) -> WireEvent {
        WireEvent::Text { text: s.into() }
    }

    #[test]
    fn canvas_traffic_does_not_break_a_text_run() {
        let mut assembler = TranscriptAssembler::new();
        let mut sink = NullCanvasSink;
        let mut parts = Vec::new();

        assembler.apply(&mut parts, &text("hel"), &mut sink);
        assembler.apply(
            &mut parts,
            &WireEvent::Canvas(CanvasEvent {
                open: Some(true),
                title: Some("Doc".into()),
                content: None,
                done: None,
            }),
            &mut sink,
        );
        assembler.apply(&mut parts, &text("lo"), &mut sink);

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], Part::text("hello"));
        assert!(matches!(&parts[1], Part::Canvas { title, .. } if title == "Doc"));
    }

    #[test]
    fn text_traffic_does_not_steal_the_canvas_pointer() {
        let mut assembler = TranscriptAssembler::new();
        let mut sink = NullCanvasSink;
        let mut parts = Vec::new();

        assembler.apply(
            &mut parts,
            &WireEvent::Canvas(CanvasEvent {
                open: Some(true),
                title: Some("Doc".into()),
                content: None,
                done: None,
            }),
            &mut sink,
        );
        assembler.apply(&mut parts, &text("aside"), &mut sink);
        assembler.apply(
            &mut parts,
            &WireEvent::Canvas(CanvasEvent {
                open: None,
                title: None,
                content: Some("body".into()),
                done: None,
            }),
            &mut sink,
        );

        assert!(matches!(&parts[0], Part::Canvas { content, .. } if content == "body"));
        assert_eq!(parts[1], Part::text("aside"));
    }

    #[test]
    fn finalize_closes_open_thinking() {
        let mut assembler = TranscriptAssembler::new();
        let mut sink = NullCanvasSink;
        let mut parts = Vec::new();

        assembler.apply(
            &mut parts,
            &WireEvent::Thinking { thinking: "pondering".into() },
            &mut sink,
        );
        assert!(parts[0].is_open_thinking());

        TranscriptAssembler::finalize(&mut parts);
        assert!(!parts[0].is_open_thinking());
    }
}
