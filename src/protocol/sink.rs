use std::io::Write;

use tracing::debug;

use crate::core::actions::calculate::ports::progress_sink::ProgressSink;
use crate::protocol::errors::ChannelProtocolError;
use crate::protocol::message::ProgressMessage;

/// Serializes progress messages as frames onto a byte stream.
#[derive(Debug)]
pub struct ChannelSink<W: Write> {
    writer: W,
    frames_written: u64,
}

impl<W: Write> ChannelSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ProgressSink for ChannelSink<W> {
    fn send(&mut self, message: &ProgressMessage) -> Result<(), ChannelProtocolError> {
        let frame = message.encode()?;

        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        self.frames_written += 1;

        if let Some(state) = message.terminal_state() {
            debug!(?state, frames = self.frames_written, "terminal status written");
        }

        Ok(())
    }
}
