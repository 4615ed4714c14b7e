/*
Aliases for data types for readability and to allow resizing in future
*/

pub type Rank = u16; // Position of a node in the peer list, 0 is the operator
pub type Slot = u16; // Index into a node's local task table
pub type GlobalId = u32; // Network unique task identifier, 0 means empty
pub type LocalHandle = u32; // Operating system pid of a task on its owning node
pub type SignalNumber = i32; // Posix signal number
pub type Load = f64; // Load average sample, relative values only matter
pub type ListFlag = i32; // 0 for short listing, 1 for long listing
pub type TagId = u16; // Identifies the payload shape of a message on the wire

pub type CommandLine = Vec<String>; // Program followed by its arguments

/// Rank of the node that issues commands and never balances load
pub const OPERATOR_RANK: Rank = 0;

/// Directory entries holding this id are empty
pub const NO_GLOBAL_ID: GlobalId = 0;

/// Signal used to stop the local copy of a task that is migrating away
pub const SIGKILL: SignalNumber = 9;
