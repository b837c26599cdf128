use std::time::Duration;

use futures::StreamExt;
use tracing::debug;

use parley_core::cancel::CancelSignal;
use parley_core::errors::ChatError;
use parley_core::messages::ChatMessage;
use parley_stream::{CanvasSink, InactivityWatchdog, TranscriptAssembler};

use crate::request::Transport;

/// Drive one streamed turn into `message`. The watchdog is armed before the
/// request goes out so a connection that never produces a byte still times
/// out; every decoded event rearms it.
///
/// Cancellation (either cause) surfaces as `ChatError::Aborted`; the caller
/// reads the reason off the signal to tell a stop from a timeout. Whatever
/// parts arrived before the abort stay on the message.
pub(crate) async fn stream_turn(
    transport: &Transport,
    history: &[ChatMessage],
    message: &mut ChatMessage,
    signal: &CancelSignal,
    inactivity_timeout: Duration,
    sink: &mut dyn CanvasSink,
) -> Result<(), ChatError> {
    let watchdog = InactivityWatchdog::spawn(signal.clone(), inactivity_timeout);

    let mut stream = tokio::select! {
        biased;
        () = signal.cancelled() => return Err(ChatError::Aborted),
        opened = transport.open_stream(history) => opened?,
    };

    let mut assembler = TranscriptAssembler::new();
    let mut event_count = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            () = signal.cancelled() => return Err(ChatError::Aborted),
            next = stream.next() => next,
        };

        match next {
            Some(Ok(event)) => {
                watchdog.rearm();
                assembler.apply(message.parts_mut(), &event, sink);
                event_count += 1;
            }
            Some(Err(err)) => return Err(err),
            None => break,
        }
    }

    debug!(events = event_count, "stream ended");
    drop(watchdog);
    Ok(())
}
