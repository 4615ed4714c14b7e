/// Sends operator commands into the network
pub mod client;

/// Parsing lines typed at the operator prompt
pub mod commands;

/// Prints the reports that nodes send back
pub mod report_printer;

/// Peer list and other configuration
pub mod settings;
