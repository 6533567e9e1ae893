use std::io::Read;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::protocol::frame_reader::FrameReader;
use crate::protocol::message::ProgressMessage;
use crate::site::latch::{Completion, CompletionLatch, CompletionSource};

/// Releases the latch if the watcher unwinds before signalling.
struct SignalOnDrop(Arc<CompletionLatch>);

impl Drop for SignalOnDrop {
    fn drop(&mut self) {
        if self.0.signal(Completion::aborted(CompletionSource::ChannelClosed)) {
            warn!("watcher stopped without a terminal status");
        }
    }
}

/// Reads frames until a terminal STATUS, end of stream or a framing error.
pub(crate) fn watch<R: Read>(reader: R, latch: Arc<CompletionLatch>) {
    let _guard = SignalOnDrop(latch.clone());
    let mut frames = FrameReader::new(reader);

    loop {
        let frame = match frames.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!("progress channel closed");
                latch.signal(Completion::aborted(CompletionSource::ChannelClosed));
                return;
            }
            Err(err) => {
                warn!(%err, "progress channel unreadable");
                latch.signal(Completion::aborted(CompletionSource::ProtocolError));
                return;
            }
        };

        let message = match ProgressMessage::decode(frame.tag, &frame.payload) {
            Ok(message) => message,
            Err(err) if err.is_recoverable() => {
                warn!(%err, tag = frame.tag, "skipping malformed frame");
                latch.record_frame();
                continue;
            }
            Err(err) => {
                warn!(%err, "progress channel unreadable");
                latch.signal(Completion::aborted(CompletionSource::ProtocolError));
                return;
            }
        };

        match message {
            ProgressMessage::Status(state) if state.is_terminal() => {
                debug!(?state, "terminal status received");
                latch.signal(Completion::reported(state));
                return;
            }
            ProgressMessage::Status(state) => latch.record_state(state),
            ProgressMessage::Progress(progress) => latch.record_progress(progress),
            ProgressMessage::Image(_) | ProgressMessage::Stats(_) => latch.record_frame(),
            ProgressMessage::Unknown { tag, .. } => {
                debug!(tag, "ignoring frame");
                latch.record_frame();
            }
        }
    }
}
