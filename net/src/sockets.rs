/*
Thin wrapper around sockets implemenation in the standard library.
Frames envelopes with a length prefix so that they can be streamed over Tcp
*/
pub mod tcp_transport;

pub type MessageLength = u16;
