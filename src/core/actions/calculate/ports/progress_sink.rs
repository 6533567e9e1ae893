use crate::protocol::errors::ChannelProtocolError;
use crate::protocol::message::ProgressMessage;

/// Write side of the progress channel.
pub trait ProgressSink {
    fn send(&mut self, message: &ProgressMessage) -> Result<(), ChannelProtocolError>;
}

impl ProgressSink for Vec<ProgressMessage> {
    fn send(&mut self, message: &ProgressMessage) -> Result<(), ChannelProtocolError> {
        self.push(message.clone());
        Ok(())
    }
}
