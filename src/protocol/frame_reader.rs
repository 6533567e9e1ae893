use std::io::{ErrorKind, Read};

use tracing::trace;

use crate::protocol::errors::ChannelProtocolError;
use crate::protocol::frame::{Frame, HEADER_SIZE, MAX_PAYLOAD_SIZE, decode_header};

const READ_CHUNK: usize = 4096;

/// Reassembles frames from a byte stream.
///
/// Bytes are accumulated until a whole frame (header plus the declared
/// payload) is buffered; short reads only mean more data is pending. The
/// payload buffer is sized from the declared length, which is checked
/// against [`MAX_PAYLOAD_SIZE`] first.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(READ_CHUNK),
        }
    }

    /// Next complete frame, or `None` when the stream closed on a frame boundary.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, ChannelProtocolError> {
        loop {
            if let Some(frame) = self.take_buffered()? {
                return Ok(Some(frame));
            }

            let mut chunk = [0u8; READ_CHUNK];
            match self.reader.read(&mut chunk) {
                Ok(0) => return self.end_of_stream(),
                Ok(n) => {
                    trace!(bytes = n, buffered = self.buffer.len(), "read from progress channel");
                    self.buffer.extend_from_slice(&chunk[..n]);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn take_buffered(&mut self) -> Result<Option<Frame>, ChannelProtocolError> {
        let Some(header) = self.buffer.first_chunk::<HEADER_SIZE>() else {
            return Ok(None);
        };
        let (tag, length) = decode_header(header);

        if length > MAX_PAYLOAD_SIZE {
            return Err(ChannelProtocolError::PayloadTooLarge {
                length,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        if self.buffer.len() < HEADER_SIZE + length {
            return Ok(None);
        }

        let mut payload = Vec::with_capacity(length);
        payload.extend_from_slice(&self.buffer[HEADER_SIZE..HEADER_SIZE + length]);
        self.buffer.drain(..HEADER_SIZE + length);

        Ok(Some(Frame { tag, payload }))
    }

    fn end_of_stream(&self) -> Result<Option<Frame>, ChannelProtocolError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let expected = match self.buffer.first_chunk::<HEADER_SIZE>() {
            Some(header) => HEADER_SIZE + decode_header(header).1,
            None => HEADER_SIZE,
        };

        Err(ChannelProtocolError::Truncated {
            expected,
            available: self.buffer.len(),
        })
    }
}
