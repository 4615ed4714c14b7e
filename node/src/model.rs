/*
Defines the state that a node owns. All of it is touched only by the node's
dispatch loop, so none of it needs locking.
*/

pub mod directory;
pub mod ledger;
pub mod task_table;
