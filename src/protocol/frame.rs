use std::io::Write;

use crate::protocol::errors::ChannelProtocolError;

/// Tag and length, both `u32` little-endian.
pub const HEADER_SIZE: usize = 8;

/// Largest payload a reader accepts. A larger declared length means the
/// stream is out of sync.
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub tag: u32,
    pub payload: Vec<u8>,
}

#[must_use]
pub fn encode_header(tag: u32, length: u32) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[..4].copy_from_slice(&tag.to_le_bytes());
    header[4..].copy_from_slice(&length.to_le_bytes());
    header
}

/// Returns `(tag, payload length)`.
#[must_use]
pub fn decode_header(header: &[u8; HEADER_SIZE]) -> (u32, usize) {
    let tag = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    (tag, length as usize)
}

/// Length field for `payload`, refused when a reader would reject it.
fn payload_length(payload: &[u8]) -> Result<u32, ChannelProtocolError> {
    let too_large = || ChannelProtocolError::PayloadTooLarge {
        length: payload.len(),
        max: MAX_PAYLOAD_SIZE,
    };

    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(too_large());
    }
    u32::try_from(payload.len()).map_err(|_| too_large())
}

pub fn encode_frame(tag: u32, payload: &[u8]) -> Result<Vec<u8>, ChannelProtocolError> {
    let length = payload_length(payload)?;
    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&encode_header(tag, length));
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Writes one frame as a single buffer so a frame is never interleaved.
///
/// Nothing is written when the payload is too large to frame.
pub fn write_frame<W: Write>(
    writer: &mut W,
    tag: u32,
    payload: &[u8],
) -> Result<(), ChannelProtocolError> {
    let frame = encode_frame(tag, payload)?;
    writer.write_all(&frame)?;
    Ok(())
}
