/*
Data contracts for the messages that nodes exchange. Every message carries a tag
that identifies the shape of its payload, so the receiver knows what to expect
before it decodes anything.
*/

use crate::data_types::{
    CommandLine, GlobalId, ListFlag, Load, Rank, SignalNumber, Slot, TagId,
};

pub mod display;
pub mod payloads;

pub const TAG_LOAD: TagId = 1;
pub const TAG_PLACE: TagId = 2;
pub const TAG_LIST: TagId = 3;
pub const TAG_SIGNAL: TagId = 4;
pub const TAG_SIGNAL_RESOLVED: TagId = 5;
pub const TAG_DIRECTORY_UPDATE: TagId = 6;
pub const TAG_FIND_OWNER: TagId = 7;
pub const TAG_ADMIT: TagId = 8;
pub const TAG_TASK_TRANSFER: TagId = 9;
pub const TAG_WITHDRAW: TagId = 10;
pub const TAG_TERMINATE: TagId = 11;
pub const TAG_PRESENCE: TagId = 12;
pub const TAG_REPORT: TagId = 13;

pub const LIST_SHORT: ListFlag = 0;
pub const LIST_LONG: ListFlag = 1;

/// One message of the peer to peer protocol. Each variant wraps the payload
/// contract that is serialized for its tag.
#[derive(Clone, PartialEq, Debug)]
pub enum Message {
    /// Sender's current load sample
    Load(payloads::LoadSample),

    /// Request to run a command on the least loaded node
    Place(payloads::Place),

    /// Request to list the tasks owned by the receiver
    List(payloads::List),

    /// The receiver owns the task and must deliver the signal to it
    Signal(payloads::TaskSignal),

    /// The sender no longer holds the task in the given slot
    SignalResolved(payloads::DirectoryEntry),

    /// The sender now holds the task in the given slot
    DirectoryUpdate(payloads::DirectoryEntry),

    /// Find the owner of a task and deliver the signal to it
    FindOwner(payloads::TaskSignal),

    /// The rank now participates in load balancing
    Admit(payloads::RankNotice),

    /// A task migrating from the sender to the receiver
    TaskTransfer(payloads::TaskTransfer),

    /// The rank no longer participates in load balancing
    Withdraw(payloads::RankNotice),

    /// Stop the receiver's dispatch loop
    Terminate(payloads::Unused),

    /// Ask the receiver to acknowledge that it participates
    Presence(payloads::Unused),

    /// Text sent back to the operator
    Report(payloads::Report),
}

impl Message {
    pub fn tag(self: &Self) -> TagId {
        match self {
            Message::Load(_) => TAG_LOAD,
            Message::Place(_) => TAG_PLACE,
            Message::List(_) => TAG_LIST,
            Message::Signal(_) => TAG_SIGNAL,
            Message::SignalResolved(_) => TAG_SIGNAL_RESOLVED,
            Message::DirectoryUpdate(_) => TAG_DIRECTORY_UPDATE,
            Message::FindOwner(_) => TAG_FIND_OWNER,
            Message::Admit(_) => TAG_ADMIT,
            Message::TaskTransfer(_) => TAG_TASK_TRANSFER,
            Message::Withdraw(_) => TAG_WITHDRAW,
            Message::Terminate(_) => TAG_TERMINATE,
            Message::Presence(_) => TAG_PRESENCE,
            Message::Report(_) => TAG_REPORT,
        }
    }

    /// Short lower case name used in logs and metric keys
    pub fn name(self: &Self) -> &'static str {
        match self {
            Message::Load(_) => "load",
            Message::Place(_) => "place",
            Message::List(_) => "list",
            Message::Signal(_) => "signal",
            Message::SignalResolved(_) => "signal_resolved",
            Message::DirectoryUpdate(_) => "directory_update",
            Message::FindOwner(_) => "find_owner",
            Message::Admit(_) => "admit",
            Message::TaskTransfer(_) => "task_transfer",
            Message::Withdraw(_) => "withdraw",
            Message::Terminate(_) => "terminate",
            Message::Presence(_) => "presence",
            Message::Report(_) => "report",
        }
    }

    pub fn load(load: Load) -> Self {
        Message::Load(payloads::LoadSample { load })
    }

    pub fn place(command_line: CommandLine) -> Self {
        Message::Place(payloads::Place { command_line })
    }

    pub fn list(format: ListFlag) -> Self {
        Message::List(payloads::List { format })
    }

    pub fn signal(signal: SignalNumber, global_id: GlobalId) -> Self {
        Message::Signal(payloads::TaskSignal { signal, global_id })
    }

    pub fn find_owner(signal: SignalNumber, global_id: GlobalId) -> Self {
        Message::FindOwner(payloads::TaskSignal { signal, global_id })
    }

    pub fn signal_resolved(global_id: GlobalId, slot: Slot) -> Self {
        Message::SignalResolved(payloads::DirectoryEntry { global_id, slot })
    }

    pub fn directory_update(global_id: GlobalId, slot: Slot) -> Self {
        Message::DirectoryUpdate(payloads::DirectoryEntry { global_id, slot })
    }

    pub fn admit(rank: Rank) -> Self {
        Message::Admit(payloads::RankNotice { rank })
    }

    pub fn withdraw(rank: Rank) -> Self {
        Message::Withdraw(payloads::RankNotice { rank })
    }

    pub fn task_transfer(global_id: GlobalId, command_line: CommandLine) -> Self {
        Message::TaskTransfer(payloads::TaskTransfer {
            global_id: global_id.to_string(),
            command_line,
        })
    }

    pub fn terminate() -> Self {
        Message::Terminate(payloads::Unused { value: 0 })
    }

    pub fn presence() -> Self {
        Message::Presence(payloads::Unused { value: 0 })
    }

    pub fn report(lines: Vec<String>) -> Self {
        Message::Report(payloads::Report { lines })
    }
}

/// A message together with the rank that sent it
#[derive(Clone, PartialEq, Debug)]
pub struct Envelope {
    pub source: Rank,
    pub message: Message,
}

impl Envelope {
    pub fn new(source: Rank, message: Message) -> Self {
        Self { source, message }
    }
}
