/*
Payload contracts, one per message tag. These are serialized with MessagePack
after the tag and source rank header.
*/

use crate::data_types::{CommandLine, GlobalId, ListFlag, Load, Rank, SignalNumber, Slot};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct LoadSample {
    pub load: Load,
}

/// The element count travels with the array so the receiver can size its
/// buffers before reading the strings
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Place {
    pub command_line: CommandLine,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct List {
    pub format: ListFlag,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct TaskSignal {
    pub signal: SignalNumber,
    pub global_id: GlobalId,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct DirectoryEntry {
    pub global_id: GlobalId,
    pub slot: Slot,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct RankNotice {
    pub rank: Rank,
}

/// The global id travels as text, the receiver parses it back
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct TaskTransfer {
    pub global_id: String,
    pub command_line: CommandLine,
}

impl TaskTransfer {
    pub fn parse_global_id(self: &Self) -> Option<GlobalId> {
        self.global_id.trim().parse().ok()
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Unused {
    pub value: i32,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Report {
    pub lines: Vec<String>,
}
