use crate::{bin_serialization::SerializeError, contracts::Message, data_types::Rank};

#[derive(Debug, PartialEq)]
pub enum ChannelError {
    /// There is no route to the destination rank
    NotConnected { rank: Rank },

    /// The transport failed while writing the message
    Io { msg: String },

    /// The message could not be serialized
    Encode { msg: String },

    /// The receiving side of the destination's inbox has gone away
    Disconnected { rank: Rank },
}

impl From<SerializeError> for ChannelError {
    fn from(err: SerializeError) -> Self {
        match err {
            SerializeError::Error { msg } => ChannelError::Encode { msg },
        }
    }
}

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Reliable, ordered, point to point delivery of messages to other ranks.
///
/// Messages sent from one rank to another arrive in the order they were sent. There
/// is no ordering between different senders, no acknowledgement and no retry beyond
/// what the transport does internally. Inbound messages are pushed into the inbox
/// that was supplied when the transport was built.
pub trait Channel: Send + Sync {
    fn send(self: &Self, destination: Rank, message: &Message) -> ChannelResult<()>;
}
