pub mod bin_serialization;
pub mod channel;
pub mod contracts;
pub mod data_types;
pub mod formatting;
pub mod listing;
pub mod memory;
pub mod settings;
pub mod sockets;
