//! Typed progress messages and their payload encodings.
//!
//! All integers are little-endian. Payload layouts:
//!
//! | type     | tag | payload                                   |
//! |----------|-----|-------------------------------------------|
//! | IMAGE    | 1   | x, y, width, height as `u32`              |
//! | PROGRESS | 2   | fraction done as `f32`                    |
//! | STATUS   | 3   | [`CalcState`] as `u32`                    |
//! | STATS    | 6   | pixels, iterations, inside as `u64`       |
//!
//! ITERS (0), PIXEL (4) and TOLERANCE (5) are reserved and, like any other
//! tag, pass through as [`ProgressMessage::Unknown`].

use crate::protocol::errors::ChannelProtocolError;
use crate::protocol::frame::encode_frame;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageType {
    Iters = 0,
    Image = 1,
    Progress = 2,
    Status = 3,
    Pixel = 4,
    Tolerance = 5,
    Stats = 6,
}

impl MessageType {
    #[must_use]
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::Iters),
            1 => Some(Self::Image),
            2 => Some(Self::Progress),
            3 => Some(Self::Status),
            4 => Some(Self::Pixel),
            5 => Some(Self::Tolerance),
            6 => Some(Self::Stats),
            _ => None,
        }
    }

    #[must_use]
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Tags with a typed [`ProgressMessage`] variant.
    #[must_use]
    pub fn is_typed(self) -> bool {
        matches!(self, Self::Image | Self::Progress | Self::Status | Self::Stats)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CalcState {
    Done = 0,
    Calculating = 1,
    Deepening = 2,
    Antialiasing = 3,
    Paused = 4,
    Tightening = 5,
    Aborted = 6,
    Error = 7,
}

impl CalcState {
    #[must_use]
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Done),
            1 => Some(Self::Calculating),
            2 => Some(Self::Deepening),
            3 => Some(Self::Antialiasing),
            4 => Some(Self::Paused),
            5 => Some(Self::Tightening),
            6 => Some(Self::Aborted),
            7 => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// No further messages follow a terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted | Self::Error)
    }
}

/// Rectangle of the image that has finished computing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct CalcStats {
    pub pixels: u64,
    pub iterations: u64,
    pub inside: u64,
}

impl CalcStats {
    pub fn merge(&mut self, other: &CalcStats) {
        self.pixels += other.pixels;
        self.iterations += other.iterations;
        self.inside += other.inside;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    Status(CalcState),
    Progress(f32),
    Image(ImageRegion),
    Stats(CalcStats),
    /// Opaque frame. Its tag is never one of the typed tags (IMAGE,
    /// PROGRESS, STATUS, STATS); [`ProgressMessage::encode`] refuses those.
    Unknown { tag: u32, payload: Vec<u8> },
}

const STATUS_LEN: usize = 4;
const PROGRESS_LEN: usize = 4;
const IMAGE_LEN: usize = 16;
const STATS_LEN: usize = 24;

fn expect_len(tag: u32, payload: &[u8], expected: usize) -> Result<(), ChannelProtocolError> {
    if payload.len() != expected {
        return Err(ChannelProtocolError::MalformedPayload {
            tag,
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(word)
}

impl ProgressMessage {
    #[must_use]
    pub fn tag(&self) -> u32 {
        match self {
            Self::Status(_) => MessageType::Status.tag(),
            Self::Progress(_) => MessageType::Progress.tag(),
            Self::Image(_) => MessageType::Image.tag(),
            Self::Stats(_) => MessageType::Stats.tag(),
            Self::Unknown { tag, .. } => *tag,
        }
    }

    /// The terminal state carried by this message, if any.
    #[must_use]
    pub fn terminal_state(&self) -> Option<CalcState> {
        match self {
            Self::Status(state) if state.is_terminal() => Some(*state),
            _ => None,
        }
    }

    #[must_use]
    pub fn encode_payload(&self) -> Vec<u8> {
        match self {
            Self::Status(state) => state.as_u32().to_le_bytes().to_vec(),
            Self::Progress(fraction) => fraction.to_le_bytes().to_vec(),
            Self::Image(region) => [region.x, region.y, region.width, region.height]
                .iter()
                .flat_map(|v| v.to_le_bytes())
                .collect(),
            Self::Stats(stats) => [stats.pixels, stats.iterations, stats.inside]
                .iter()
                .flat_map(|v| v.to_le_bytes())
                .collect(),
            Self::Unknown { payload, .. } => payload.clone(),
        }
    }

    /// Header and payload, ready to write to the channel.
    ///
    /// Fails for payloads too large to frame and for an `Unknown` carrying
    /// a typed tag, which would not decode back to itself.
    pub fn encode(&self) -> Result<Vec<u8>, ChannelProtocolError> {
        if let Self::Unknown { tag, .. } = self {
            if MessageType::from_tag(*tag).is_some_and(MessageType::is_typed) {
                return Err(ChannelProtocolError::TypedTagAsUnknown(*tag));
            }
        }

        encode_frame(self.tag(), &self.encode_payload())
    }

    /// Decodes one frame's payload.
    ///
    /// Errors leave the framing intact: the caller may skip the frame.
    pub fn decode(tag: u32, payload: &[u8]) -> Result<Self, ChannelProtocolError> {
        match MessageType::from_tag(tag) {
            Some(MessageType::Status) => {
                expect_len(tag, payload, STATUS_LEN)?;
                let raw = read_u32(payload, 0);
                CalcState::from_u32(raw)
                    .map(Self::Status)
                    .ok_or(ChannelProtocolError::UnknownState(raw))
            }
            Some(MessageType::Progress) => {
                expect_len(tag, payload, PROGRESS_LEN)?;
                Ok(Self::Progress(f32::from_bits(read_u32(payload, 0))))
            }
            Some(MessageType::Image) => {
                expect_len(tag, payload, IMAGE_LEN)?;
                Ok(Self::Image(ImageRegion {
                    x: read_u32(payload, 0),
                    y: read_u32(payload, 4),
                    width: read_u32(payload, 8),
                    height: read_u32(payload, 12),
                }))
            }
            Some(MessageType::Stats) => {
                expect_len(tag, payload, STATS_LEN)?;
                Ok(Self::Stats(CalcStats {
                    pixels: read_u64(payload, 0),
                    iterations: read_u64(payload, 8),
                    inside: read_u64(payload, 16),
                }))
            }
            _ => Ok(Self::Unknown {
                tag,
                payload: payload.to_vec(),
            }),
        }
    }
}
