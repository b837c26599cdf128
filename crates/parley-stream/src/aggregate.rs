use serde_json::Value;
use tracing::warn;

use parley_core::events::WireEvent;
use parley_core::parts::{Part, StepRecord};

/// Where the next event may land. Exactly one of these holds at a time: a
/// merge run and a steps run cannot both be open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor {
    Idle,
    /// Index of the part absorbing same-typed deltas.
    Mergeable(usize),
    /// Index of the open steps container.
    Steps(usize),
}

/// The part-aggregation state machine.
///
/// `apply` is a transition function over the ordered parts list: each event
/// either extends the part under the cursor or closes it and opens a new one.
/// The caller owns the parts vector (it lives on the assistant message being
/// streamed into); the aggregator holds only the cursor.
///
/// Canvas events are not handled here — they belong to the canvas dispatcher,
/// which keeps its own independent pointer.
#[derive(Debug)]
pub struct Aggregator {
    cursor: Cursor,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self { cursor: Cursor::Idle }
    }

    pub fn apply(&mut self, parts: &mut Vec<Part>, event: &WireEvent) {
        match event {
            WireEvent::Canvas(_) => {
                // Routed to the canvas dispatcher by the assembler. If one
                // slips through, leave the cursor untouched: canvas traffic
                // never interrupts a merge run.
            }
            WireEvent::Step { step, data, result } => {
                self.apply_step(parts, step.as_deref(), data.as_ref(), result.as_ref());
            }
            WireEvent::Unknown => {
                warn!("ignoring event with unrecognized type");
                self.cursor = Cursor::Idle;
            }
            other => self.apply_mergeable(parts, other),
        }
    }

    /// Close any thinking part still open at stream end.
    pub fn finalize(parts: &mut [Part]) {
        for part in parts {
            close_thinking(part);
        }
    }

    fn apply_step(
        &mut self,
        parts: &mut Vec<Part>,
        step: Option<&str>,
        data: Option<&Value>,
        result: Option<&Value>,
    ) {
        let idx = match self.cursor {
            Cursor::Steps(idx) => idx,
            // A step always interrupts a merge run; the superseded part is
            // left as-is (thinking closes only when another mergeable type
            // takes over or at finalize).
            _ => {
                parts.push(Part::Steps { steps: Vec::new() });
                parts.len() - 1
            }
        };
        self.cursor = Cursor::Steps(idx);

        // A bare step event with neither name nor data records nothing.
        if step.is_none() && data.is_none() {
            return;
        }

        if let Part::Steps { steps } = &mut parts[idx] {
            steps.push(StepRecord {
                step: step.unwrap_or_default().to_string(),
                data: data.cloned().unwrap_or(Value::Null),
                result: result.cloned(),
                complete: true,
            });
        }
    }

    fn apply_mergeable(&mut self, parts: &mut Vec<Part>, event: &WireEvent) {
        if let Cursor::Mergeable(idx) = self.cursor {
            if try_merge(&mut parts[idx], event) {
                return;
            }
            // Type changed: the superseded part closes before a new one opens.
            close_thinking(&mut parts[idx]);
        }

        parts.push(open_part(event));
        self.cursor = Cursor::Mergeable(parts.len() - 1);
    }
}

/// Merge `event` into `part` if they are the same type. Returns true when the
/// event was consumed, including the same-typed cases with nothing to merge
/// (a `table` continuation without a `row`, repeated `callout`/`image`
/// frames) — those are deliberate no-ops, not new parts.
fn try_merge(part: &mut Part, event: &WireEvent) -> bool {
    match (part, event) {
        (Part::Table { rows, .. }, WireEvent::Table { row, .. }) => {
            if let Some(row) = row {
                rows.push(row.clone());
            }
            true
        }
        (Part::Text { text }, WireEvent::Text { text: delta }) => {
            text.push_str(delta);
            true
        }
        (Part::Thinking { thinking, .. }, WireEvent::Thinking { thinking: delta }) => {
            thinking.push_str(delta);
            true
        }
        (Part::Code { code, .. }, WireEvent::Code { code: delta, .. }) => {
            code.push_str(delta);
            true
        }
        (Part::Callout { .. }, WireEvent::Callout { .. }) => true,
        (Part::Image { .. }, WireEvent::Image { .. }) => true,
        _ => false,
    }
}

/// Build a fresh part from the first event of a run.
fn open_part(event: &WireEvent) -> Part {
    match event {
        WireEvent::Text { text } => Part::Text { text: text.clone() },
        WireEvent::Thinking { thinking } => Part::Thinking {
            thinking: thinking.clone(),
            start_time: Some(now_millis()),
            complete: false,
            duration: None,
        },
        WireEvent::Code { code, language } => Part::Code {
            code: code.clone(),
            language: language.clone(),
        },
        WireEvent::Table { headers, row } => Part::Table {
            headers: headers.clone().unwrap_or_default(),
            rows: row.iter().cloned().collect(),
        },
        WireEvent::Callout { style, title, callout } => Part::Callout {
            style: style.clone(),
            title: title.clone(),
            callout: callout.clone(),
        },
        WireEvent::Image { image, alt, caption } => Part::Image {
            image: image.clone(),
            alt: alt.clone(),
            caption: caption.clone(),
        },
        // Step, canvas and unknown events never open a mergeable part.
        WireEvent::Step { .. } | WireEvent::Canvas(_) | WireEvent::Unknown => {
            unreachable!("non-mergeable event routed to open_part")
        }
    }
}

fn close_thinking(part: &mut Part) {
    if let Part::Thinking { start_time, complete, duration, .. } = part {
        if *complete {
            return;
        }
        *complete = true;
        if let Some(start) = *start_time {
            let elapsed = (now_millis() - start).max(0);
            *duration = Some((elapsed as f64 / 1000.0).round() as u64);
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
