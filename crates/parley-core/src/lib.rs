pub mod cancel;
pub mod errors;
pub mod events;
pub mod ids;
pub mod messages;
pub mod parts;

pub use cancel::{CancelReason, CancelSignal};
pub use errors::{ChatError, ErrorInfo, ErrorKind};
pub use events::{CanvasEvent, WireEvent};
pub use ids::ChatId;
pub use messages::{ChatMessage, Role};
pub use parts::{Part, StepRecord};
