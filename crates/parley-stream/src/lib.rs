pub mod aggregate;
pub mod assemble;
pub mod canvas;
pub mod sse;
pub mod watchdog;

pub use aggregate::Aggregator;
pub use assemble::TranscriptAssembler;
pub use canvas::{CanvasDispatcher, CanvasSink, NullCanvasSink};
pub use sse::{EventStream, FrameDecoder, DONE_SENTINEL};
pub use watchdog::InactivityWatchdog;
