/*
The operator's side of the protocol. Placement and signal requests enter the
network at rank 1, the operator's neighbour on the ring. Listing, presence and
termination requests go to every worker.
*/

use std::sync::Arc;

use load_balancer_net::{
    channel::{Channel, ChannelResult},
    contracts::Message,
    data_types::{CommandLine, GlobalId, ListFlag, Rank, SignalNumber},
};
use log::warn;

/// Rank that receives requests which only need to reach one node
pub const ENTRY_RANK: Rank = 1;

pub struct Operator {
    channel: Arc<dyn Channel>,
    size: usize,
}

impl Operator {
    pub fn new(channel: Arc<dyn Channel>, size: usize) -> Self {
        Self { channel, size }
    }

    pub fn workers(self: &Self) -> impl Iterator<Item = Rank> {
        (1..self.size).map(|rank| rank as Rank)
    }

    pub fn place(self: &Self, command_line: CommandLine) -> ChannelResult<()> {
        self.channel.send(ENTRY_RANK, &Message::place(command_line))
    }

    /// Asks the network to find the task's owner and deliver the signal. There is
    /// no reply if the task doesn't exist.
    pub fn signal(self: &Self, signal: SignalNumber, global_id: GlobalId) -> ChannelResult<()> {
        self.channel.send(ENTRY_RANK, &Message::find_owner(signal, global_id))
    }

    pub fn list(self: &Self, format: ListFlag) -> usize {
        self.send_to_workers(&Message::list(format))
    }

    pub fn presence(self: &Self) -> usize {
        self.send_to_workers(&Message::presence())
    }

    pub fn terminate(self: &Self) -> usize {
        self.send_to_workers(&Message::terminate())
    }

    /// Returns the number of workers that the message was sent to
    fn send_to_workers(self: &Self, message: &Message) -> usize {
        let mut sent = 0;
        for rank in self.workers() {
            match self.channel.send(rank, message) {
                Ok(()) => sent += 1,
                Err(e) => warn!("Operator: Failed to send {message} to rank {rank}. {e:?}"),
            }
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use load_balancer_net::{
        contracts::{Envelope, LIST_LONG},
        data_types::OPERATOR_RANK,
        memory::MemoryNetwork,
    };
    use std::sync::mpsc::channel;

    #[test]
    fn single_node_requests_enter_at_rank_one() {
        let network = MemoryNetwork::new(3);
        let (sender, rank1) = channel::<Envelope>();
        network.register(1, sender);
        let operator = Operator::new(Arc::new(network.channel(OPERATOR_RANK)), 3);

        operator.place(vec![String::from("yes")]).unwrap();
        operator.signal(9, 2001).unwrap();

        let messages: Vec<Message> = rank1.try_iter().map(|e| e.message).collect();
        assert_eq!(
            vec![Message::place(vec![String::from("yes")]), Message::find_owner(9, 2001)],
            messages
        );
    }

    #[test]
    fn broadcasts_reach_every_worker() {
        let network = MemoryNetwork::new(4);
        let receivers: Vec<_> = (1..4)
            .map(|rank| {
                let (sender, receiver) = channel::<Envelope>();
                network.register(rank, sender);
                receiver
            })
            .collect();
        let operator = Operator::new(Arc::new(network.channel(OPERATOR_RANK)), 4);

        assert_eq!(3, operator.list(LIST_LONG));
        for receiver in receivers.iter() {
            let envelope = receiver.try_recv().unwrap();
            assert_eq!(Envelope::new(OPERATOR_RANK, Message::list(LIST_LONG)), envelope);
        }
    }

    #[test]
    fn unreachable_workers_are_skipped() {
        let network = MemoryNetwork::new(3);
        let (sender, _rank2) = channel::<Envelope>();
        network.register(2, sender);
        let operator = Operator::new(Arc::new(network.channel(OPERATOR_RANK)), 3);

        assert_eq!(1, operator.terminate());
    }
}
