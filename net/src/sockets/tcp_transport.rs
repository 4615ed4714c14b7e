use super::MessageLength;
use crate::{
    bin_serialization::EnvelopeCodec,
    channel::{Channel, ChannelError, ChannelResult},
    contracts::{Envelope, Message},
    data_types::Rank,
};
use log::{info, warn};
use std::{
    collections::HashMap,
    io::{ErrorKind, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

#[cfg(debug_assertions)]
use log::debug;

const MESSAGE_LENGTH_SIZE: usize = size_of::<MessageLength>();
const MAX_MESSAGE_SIZE: usize = 4096;
const RECEIVE_BUFFER_SIZE: usize = MAX_MESSAGE_SIZE << 2;
const READ_TIMEOUT: Duration = Duration::from_millis(50);
const MAX_CONNECT_RETRY_COUNT: usize = 5;
const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(200);

/// Connects this rank to its peers over Tcp. The peer list is indexed by rank and every
/// rank listens on its own entry. Outbound messages use one lazily opened connection
/// per destination, so the order in which this rank sends to a destination is the order
/// in which the destination receives. Inbound frames are decoded by one reader thread
/// per accepted connection and pushed into the inbox.
pub struct TcpTransport {
    rank: Rank,
    peers: Vec<String>,
    codec: EnvelopeCodec,
    connections: Mutex<HashMap<Rank, TcpStream>>,
    stop_signal: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl TcpTransport {
    pub fn local_addr(self: &Self) -> SocketAddr { self.local_addr }

    pub fn bind<T>(rank: Rank, peers: &[String], inbox: Sender<T>) -> ChannelResult<Self>
    where
        T: From<Envelope> + Send + 'static,
    {
        let authority = match peers.get(rank as usize) {
            Some(authority) => authority,
            None => return Err(ChannelError::NotConnected { rank }),
        };

        let listener = TcpListener::bind(authority).map_err(|e| ChannelError::Io {
            msg: format!("Failed to listen on {authority}: {e}"),
        })?;
        let local_addr = listener.local_addr().map_err(|e| ChannelError::Io {
            msg: format!("{e}"),
        })?;

        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread = ListenerThread::new(listener, inbox, &stop_signal);
        thread::Builder::new()
            .name(format!("tcp-listener-{rank}"))
            .spawn(move || thread.run())
            .map_err(|e| ChannelError::Io { msg: format!("{e}") })?;

        info!("TcpTransport: Rank {rank} listening on {local_addr}");

        Ok(Self {
            rank,
            peers: peers.to_vec(),
            codec: EnvelopeCodec::new(),
            connections: Mutex::new(HashMap::new()),
            stop_signal,
            local_addr,
        })
    }

    pub fn stop(self: &Self) {
        if !self.stop_signal.swap(true, Ordering::Relaxed) {
            // We need to initiate a connection to wake the listener thread
            let _ = TcpStream::connect(self.local_addr);
            info!("TcpTransport: Stopped");
        }
    }

    fn connect(self: &Self, destination: Rank) -> ChannelResult<TcpStream> {
        let authority = match self.peers.get(destination as usize) {
            Some(authority) => authority,
            None => return Err(ChannelError::NotConnected { rank: destination }),
        };

        let mut retry_count = 0;
        loop {
            match TcpStream::connect(authority) {
                Ok(stream) => {
                    let _ = stream.set_nodelay(true);
                    info!("TcpTransport: Connected to rank {destination} at {authority}");
                    return Ok(stream);
                }
                Err(e) => {
                    retry_count += 1;
                    if retry_count > MAX_CONNECT_RETRY_COUNT {
                        warn!("TcpTransport: Giving up connecting to rank {destination} at {authority}: {e}");
                        return Err(ChannelError::NotConnected { rank: destination });
                    }
                    thread::sleep(CONNECT_RETRY_INTERVAL);
                }
            }
        }
    }
}

impl Channel for TcpTransport {
    fn send(self: &Self, destination: Rank, message: &Message) -> ChannelResult<()> {
        let buffer = self
            .codec
            .serialize_envelope(&Envelope::new(self.rank, message.clone()))?;

        let len = buffer.len();
        if len + MESSAGE_LENGTH_SIZE > MAX_MESSAGE_SIZE {
            return Err(ChannelError::Encode {
                msg: format!("{len} bytes exceeds maximum message length"),
            });
        }
        let length = (len as MessageLength).to_le_bytes();

        let mut connections = self.connections.lock().unwrap();
        if !connections.contains_key(&destination) {
            let stream = self.connect(destination)?;
            connections.insert(destination, stream);
        }

        let result = match connections.get_mut(&destination) {
            Some(stream) => stream
                .write_all(&length)
                .and_then(|_| stream.write_all(&buffer)),
            None => return Err(ChannelError::NotConnected { rank: destination }),
        };

        match result {
            Ok(_) => {
                #[cfg(debug_assertions)]
                debug!("TcpTransport: Sent {message} to rank {destination}");
                Ok(())
            }
            Err(e) => {
                connections.remove(&destination);
                Err(ChannelError::Io {
                    msg: format!("Failed to send to rank {destination}: {e}"),
                })
            }
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A thread that owns the Tcp listener and spawns a reader thread for each peer that
/// connects.
struct ListenerThread<T> {
    listener: TcpListener,
    inbox: Sender<T>,
    stop_signal: Arc<AtomicBool>,
}

impl<T> ListenerThread<T>
where
    T: From<Envelope> + Send + 'static,
{
    fn new(listener: TcpListener, inbox: Sender<T>, stop_signal: &Arc<AtomicBool>) -> Self {
        Self {
            listener,
            inbox,
            stop_signal: stop_signal.clone(),
        }
    }

    fn run(self: Self) {
        info!("ListenerThread: Started");
        while !self.stop_signal.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, address)) => {
                    if self.stop_signal.load(Ordering::Relaxed) {
                        break;
                    }
                    info!("ListenerThread: A peer connected from {address}");
                    let reader = ReaderThread::new(stream, self.inbox.clone(), &self.stop_signal);
                    thread::spawn(move || reader.run());
                }
                Err(e) => {
                    warn!("ListenerThread: {e}");
                    self.stop_signal.store(true, Ordering::Relaxed);
                }
            }
        }
        info!("ListenerThread: Stopped");
    }
}

/// Reassembles length prefixed frames from one inbound connection and posts the decoded
/// envelopes to the inbox.
struct ReaderThread<T> {
    stream: TcpStream,
    inbox: Sender<T>,
    codec: EnvelopeCodec,
    stop_signal: Arc<AtomicBool>,
    running: bool,

    receive_buffer: Vec<u8>,
    receive_buffer_count: usize,
    consumed_count: usize,
}

impl<T> ReaderThread<T>
where
    T: From<Envelope> + Send + 'static,
{
    fn new(stream: TcpStream, inbox: Sender<T>, stop_signal: &Arc<AtomicBool>) -> Self {
        let _ = stream.set_read_timeout(Some(READ_TIMEOUT));
        Self {
            stream,
            inbox,
            codec: EnvelopeCodec::new(),
            stop_signal: stop_signal.clone(),
            running: true,

            receive_buffer: vec![0u8; RECEIVE_BUFFER_SIZE],
            receive_buffer_count: 0,
            consumed_count: 0,
        }
    }

    fn run(mut self: Self) {
        while self.running && !self.stop_signal.load(Ordering::Relaxed) {
            self.try_receive();
            self.try_extract_received();
        }
        #[cfg(debug_assertions)]
        debug!("ReaderThread: Stopped");
    }

    fn try_receive(self: &mut Self) {
        match self
            .stream
            .read(&mut self.receive_buffer[self.receive_buffer_count..])
        {
            Ok(0) => {
                info!("ReaderThread: Peer closed the connection");
                self.running = false;
            }
            Ok(byte_count) => {
                self.receive_buffer_count += byte_count;
            }
            Err(err) => match err.kind() {
                ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {}
                _ => {
                    warn!("ReaderThread: Rx stream failed: {err}");
                    self.running = false;
                }
            },
        }
    }

    fn try_extract_received(self: &mut Self) {
        loop {
            let residual_byte_count = self.receive_buffer_count - self.consumed_count;
            if residual_byte_count < MESSAGE_LENGTH_SIZE {
                break;
            }

            let length_start_index = self.consumed_count;
            let length_bytes = [
                self.receive_buffer[length_start_index],
                self.receive_buffer[length_start_index + 1],
            ];
            let message_length = MessageLength::from_le_bytes(length_bytes) as usize;

            let entire_length = MESSAGE_LENGTH_SIZE + message_length;
            if residual_byte_count < entire_length {
                break;
            }

            let message_start_index = self.consumed_count + MESSAGE_LENGTH_SIZE;
            let message_end_index = message_start_index + message_length;
            let decoded = self
                .codec
                .deserialize_envelope(&self.receive_buffer[message_start_index..message_end_index]);
            self.consumed_count += entire_length;

            match decoded {
                Ok(envelope) => {
                    if self.inbox.send(T::from(envelope)).is_err() {
                        info!("ReaderThread: Inbox closed");
                        self.running = false;
                        return;
                    }
                }
                Err(e) => warn!("ReaderThread: Dropping undecodable frame. {e:?}"),
            }
        }

        let residual_byte_count = self.receive_buffer_count - self.consumed_count;
        if residual_byte_count == 0 {
            self.receive_buffer_count = 0;
            self.consumed_count = 0;
        } else {
            let space_remaining = RECEIVE_BUFFER_SIZE - self.receive_buffer_count;
            if space_remaining < MAX_MESSAGE_SIZE {
                self.receive_buffer
                    .copy_within(self.consumed_count..self.receive_buffer_count, 0);
                self.receive_buffer_count -= self.consumed_count;
                self.consumed_count = 0;
            }
        }
    }
}
