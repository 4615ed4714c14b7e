/*
Wraps each message in an envelope that contains
- The tag that identifies the payload shape
- The rank of the node that sent the message
Serializes and deserilizes these envelopes to byte arrays for transmission over Tcp
*/

use rmp_serde::{Deserializer, Serializer};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    contracts::{self, payloads, Envelope, Message},
    data_types::{Rank, TagId},
};

pub type SerializeResult = Result<Vec<u8>, SerializeError>;
pub type DeserializeResult<T> = Result<T, DeserializeError>;

#[derive(Debug, PartialEq)]
pub enum SerializeError {
    Error { msg: String },
}

#[derive(Debug, PartialEq)]
pub enum DeserializeError {
    Error { msg: String },
    Truncated { len: usize },
    UnknownTag { tag: TagId },
}

const BUFFER_CAPACITY: usize = 256;
const TAG_SIZE: usize = size_of::<TagId>();
const SOURCE_SIZE: usize = size_of::<Rank>();
pub const HEADER_SIZE: usize = TAG_SIZE + SOURCE_SIZE;

pub struct EnvelopeCodec {}

impl EnvelopeCodec {
    pub fn new() -> Self {
        Self {}
    }

    pub fn serialize_envelope(self: &Self, envelope: &Envelope) -> SerializeResult {
        let tag = envelope.message.tag();
        let source = envelope.source;
        match &envelope.message {
            Message::Load(sample) => self.serialize_entity(sample, tag, source),
            Message::Place(place) => self.serialize_entity(place, tag, source),
            Message::List(list) => self.serialize_entity(list, tag, source),
            Message::Signal(signal) => self.serialize_entity(signal, tag, source),
            Message::SignalResolved(entry) => self.serialize_entity(entry, tag, source),
            Message::DirectoryUpdate(entry) => self.serialize_entity(entry, tag, source),
            Message::FindOwner(signal) => self.serialize_entity(signal, tag, source),
            Message::Admit(notice) => self.serialize_entity(notice, tag, source),
            Message::TaskTransfer(transfer) => self.serialize_entity(transfer, tag, source),
            Message::Withdraw(notice) => self.serialize_entity(notice, tag, source),
            Message::Terminate(unused) => self.serialize_entity(unused, tag, source),
            Message::Presence(unused) => self.serialize_entity(unused, tag, source),
            Message::Report(report) => self.serialize_entity(report, tag, source),
        }
    }

    pub fn deserialize_envelope(self: &Self, buffer: &[u8]) -> DeserializeResult<Envelope> {
        let (tag, source) = self.extract_metadata(buffer)?;
        let payload = &buffer[HEADER_SIZE..];

        let message = match tag {
            contracts::TAG_LOAD => Message::Load(self.deserialize_entity::<payloads::LoadSample>(payload)?),
            contracts::TAG_PLACE => Message::Place(self.deserialize_entity::<payloads::Place>(payload)?),
            contracts::TAG_LIST => Message::List(self.deserialize_entity::<payloads::List>(payload)?),
            contracts::TAG_SIGNAL => Message::Signal(self.deserialize_entity::<payloads::TaskSignal>(payload)?),
            contracts::TAG_SIGNAL_RESOLVED => {
                Message::SignalResolved(self.deserialize_entity::<payloads::DirectoryEntry>(payload)?)
            }
            contracts::TAG_DIRECTORY_UPDATE => {
                Message::DirectoryUpdate(self.deserialize_entity::<payloads::DirectoryEntry>(payload)?)
            }
            contracts::TAG_FIND_OWNER => Message::FindOwner(self.deserialize_entity::<payloads::TaskSignal>(payload)?),
            contracts::TAG_ADMIT => Message::Admit(self.deserialize_entity::<payloads::RankNotice>(payload)?),
            contracts::TAG_TASK_TRANSFER => {
                Message::TaskTransfer(self.deserialize_entity::<payloads::TaskTransfer>(payload)?)
            }
            contracts::TAG_WITHDRAW => Message::Withdraw(self.deserialize_entity::<payloads::RankNotice>(payload)?),
            contracts::TAG_TERMINATE => Message::Terminate(self.deserialize_entity::<payloads::Unused>(payload)?),
            contracts::TAG_PRESENCE => Message::Presence(self.deserialize_entity::<payloads::Unused>(payload)?),
            contracts::TAG_REPORT => Message::Report(self.deserialize_entity::<payloads::Report>(payload)?),
            _ => return Err(DeserializeError::UnknownTag { tag }),
        };

        Ok(Envelope { source, message })
    }

    fn serialize_entity<T: Serialize>(
        self: &Self,
        entity: &T,
        tag: TagId,
        source: Rank,
    ) -> SerializeResult {
        let mut buffer = Vec::with_capacity(BUFFER_CAPACITY);
        buffer.extend_from_slice(&tag.to_le_bytes());
        buffer.extend_from_slice(&source.to_le_bytes());
        let mut serializer = Serializer::new(&mut buffer);
        match entity.serialize(&mut serializer) {
            Ok(_) => Ok(buffer),
            Err(err) => Err(SerializeError::Error {
                msg: format!("{err}"),
            }),
        }
    }

    fn extract_metadata(self: &Self, buffer: &[u8]) -> DeserializeResult<(TagId, Rank)> {
        if buffer.len() < HEADER_SIZE {
            return Err(DeserializeError::Truncated { len: buffer.len() });
        }
        let tag = TagId::from_le_bytes([buffer[0], buffer[1]]);
        let source = Rank::from_le_bytes([buffer[TAG_SIZE], buffer[TAG_SIZE + 1]]);
        Ok((tag, source))
    }

    fn deserialize_entity<T>(self: &Self, payload: &[u8]) -> DeserializeResult<T>
    where
        T: DeserializeOwned,
    {
        let mut deserializer = Deserializer::new(payload);
        match Deserialize::deserialize(&mut deserializer) {
            Ok(entity) => Ok(entity),
            Err(err) => Err(DeserializeError::Error {
                msg: format!("{err:?}"),
            }),
        }
    }
}
