use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tracing::warn;

use parley_core::errors::ChatError;
use parley_core::events::WireEvent;

/// Literal payload marking normal end of stream.
pub const DONE_SENTINEL: &str = "[DONE]";

const DATA_PREFIX: &str = "data: ";

/// Incremental SSE frame decoder. Feed it raw body chunks; it buffers,
/// splits on newlines, and decodes `data: ` frames into events.
///
/// A malformed frame is logged and dropped — a single bad frame never aborts
/// the stream. Once the `[DONE]` sentinel is seen the decoder latches done
/// and discards everything still buffered.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
    done: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the end-of-stream sentinel has been observed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one body chunk, returning every event completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<WireEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }

        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        while let Some(newline) = self.buffer.find('\n') {
            let line = self.buffer[..newline].trim().to_string();
            self.buffer.drain(..=newline);

            // Skip blank lines and non-data fields (event:, id:, comments).
            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                continue;
            };

            if payload == DONE_SENTINEL {
                self.done = true;
                self.buffer.clear();
                break;
            }

            match serde_json::from_str::<WireEvent>(payload) {
                Ok(event) => events.push(event),
                Err(err) => {
                    warn!(%err, frame = payload, "dropping malformed SSE frame");
                }
            }
        }

        events
    }
}

/// Adapts a streaming HTTP body into an ordered, finite stream of decoded
/// events. Terminates on the sentinel or on body exhaustion; a body-level
/// error surfaces once as a network error and fuses the stream.
pub struct EventStream {
    inner: Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>,
    decoder: FrameDecoder,
    pending: std::collections::VecDeque<WireEvent>,
    finished: bool,
}

impl EventStream {
    pub fn new(
        body: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(body),
            decoder: FrameDecoder::new(),
            pending: std::collections::VecDeque::new(),
            finished: false,
        }
    }
}

impl Stream for EventStream {
    type Item = Result<WireEvent, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if self.finished {
                return Poll::Ready(None);
            }

            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let events = self.decoder.feed(&bytes);
                    self.pending.extend(events);
                    if self.decoder.is_done() {
                        self.finished = true;
                    }
                }
                Poll::Ready(Some(Err(err))) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(ChatError::Network(err.to_string()))));
                }
                Poll::Ready(None) => {
                    // Body closed without a sentinel. A trailing unterminated
                    // line is dropped, matching the reference reader.
                    self.finished = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
