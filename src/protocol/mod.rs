//! Progress channel: framed, typed messages on a one-way byte stream.
//!
//! A frame is a `u32` message tag, a `u32` payload length and exactly that
//! many payload bytes, little-endian. The calculation side writes frames
//! through [`ChannelSink`], the watcher reads them back with [`FrameReader`].

pub mod errors;
pub mod frame;
pub mod frame_reader;
pub mod message;
pub mod sink;

pub use errors::ChannelProtocolError;
pub use frame::{Frame, HEADER_SIZE, MAX_PAYLOAD_SIZE, encode_frame, write_frame};
pub use frame_reader::FrameReader;
pub use message::{CalcState, CalcStats, ImageRegion, MessageType, ProgressMessage};
pub use sink::ChannelSink;
