use thiserror::Error;

/// Failures reading or writing the progress channel.
///
/// [`ChannelProtocolError::is_recoverable`] tells whether framing is still
/// intact, in which case the reader may skip the frame and continue.
#[derive(Debug, Error)]
pub enum ChannelProtocolError {
    #[error("channel i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stream closed mid-frame: needed {expected} bytes, had {available}")]
    Truncated { expected: usize, available: usize },
    #[error("declared payload of {length} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { length: usize, max: usize },
    #[error("message type {tag} expects a {expected} byte payload, got {actual}")]
    MalformedPayload {
        tag: u32,
        expected: usize,
        actual: usize,
    },
    #[error("unknown calculation state {0}")]
    UnknownState(u32),
    #[error("tag {0} has a typed message and cannot be sent as an opaque frame")]
    TypedTagAsUnknown(u32),
}

impl ChannelProtocolError {
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedPayload { .. } | Self::UnknownState(_))
    }
}
