/*
An in-process network where every rank has an mpsc inbox. Used to run several nodes
inside one process, for example in tests and simulations. Each mpsc channel is FIFO
so the per-sender ordering guarantee of a real transport is preserved.
*/

use std::sync::{mpsc::Sender, Arc, Mutex, RwLock};

use log::warn;

use crate::{
    channel::{Channel, ChannelError, ChannelResult},
    contracts::{Envelope, Message},
    data_types::Rank,
};

type Deliver = Box<dyn Fn(Envelope) -> bool + Send + Sync>;

pub struct MemoryNetwork {
    inboxes: RwLock<Vec<Option<Deliver>>>,
}

impl MemoryNetwork {
    pub fn new(size: usize) -> Arc<Self> {
        let mut inboxes = Vec::with_capacity(size);
        inboxes.resize_with(size, || None);
        Arc::new(Self {
            inboxes: RwLock::new(inboxes),
        })
    }

    /// Connects a rank's inbox to the network. Any inbox whose item type can be built
    /// from an envelope will do, which lets a node merge network traffic with its own
    /// timer events in a single queue.
    pub fn register<T>(self: &Self, rank: Rank, inbox: Sender<T>)
    where
        T: From<Envelope> + Send + 'static,
    {
        let inbox = Mutex::new(inbox);
        let deliver: Deliver = Box::new(move |envelope| {
            inbox.lock().unwrap().send(T::from(envelope)).is_ok()
        });
        self.inboxes.write().unwrap()[rank as usize] = Some(deliver);
    }

    /// Returns the channel that a rank uses to send messages
    pub fn channel(self: &Arc<Self>, rank: Rank) -> MemoryChannel {
        MemoryChannel {
            network: self.clone(),
            rank,
        }
    }

    fn deliver(self: &Self, destination: Rank, envelope: Envelope) -> ChannelResult<()> {
        let inboxes = self.inboxes.read().unwrap();
        match inboxes.get(destination as usize) {
            Some(Some(deliver)) => {
                if deliver(envelope) {
                    Ok(())
                } else {
                    Err(ChannelError::Disconnected { rank: destination })
                }
            }
            _ => {
                warn!("MemoryNetwork: No inbox registered for rank {destination}");
                Err(ChannelError::NotConnected { rank: destination })
            }
        }
    }
}

/// The sending half of a rank's connection to a `MemoryNetwork`
pub struct MemoryChannel {
    network: Arc<MemoryNetwork>,
    rank: Rank,
}

impl Channel for MemoryChannel {
    fn send(self: &Self, destination: Rank, message: &Message) -> ChannelResult<()> {
        self.network
            .deliver(destination, Envelope::new(self.rank, message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn preserves_order_from_one_sender() {
        let network = MemoryNetwork::new(3);
        let (sender, receiver) = channel::<Envelope>();
        network.register(2, sender);

        let channel = network.channel(1);
        channel.send(2, &Message::load(1.0)).unwrap();
        channel.send(2, &Message::load(2.0)).unwrap();
        channel.send(2, &Message::load(3.0)).unwrap();

        let loads: Vec<Message> = receiver.try_iter().map(|e| e.message).collect();
        assert_eq!(
            vec![Message::load(1.0), Message::load(2.0), Message::load(3.0)],
            loads
        );
    }

    #[test]
    fn stamps_the_sender_rank() {
        let network = MemoryNetwork::new(2);
        let (sender, receiver) = channel::<Envelope>();
        network.register(0, sender);

        network.channel(1).send(0, &Message::presence()).unwrap();

        assert_eq!(1, receiver.recv().unwrap().source);
    }

    #[test]
    fn unregistered_rank_is_not_connected() {
        let network = MemoryNetwork::new(2);

        let result = network.channel(0).send(1, &Message::presence());

        assert_eq!(Err(ChannelError::NotConnected { rank: 1 }), result);
    }

    #[test]
    fn dropped_inbox_is_disconnected() {
        let network = MemoryNetwork::new(2);
        let (sender, receiver) = channel::<Envelope>();
        network.register(1, sender);
        drop(receiver);

        let result = network.channel(0).send(1, &Message::presence());

        assert_eq!(Err(ChannelError::Disconnected { rank: 1 }), result);
    }
}
