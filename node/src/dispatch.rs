/*
The node's event loop. Messages from the network, timer ticks and shutdown requests
all arrive on one queue and are handled one at a time, so the node's state is only
ever touched from this loop.
*/

use std::sync::mpsc::Receiver;

use load_balancer_net::contracts::{Envelope, Message};
use log::{info, warn};

#[cfg(debug_assertions)]
use log::debug;

use crate::node::{Node, NodeResult};

pub enum NodeEvent {
    Message(Envelope),
    Tick,
    Shutdown,
}

impl From<Envelope> for NodeEvent {
    fn from(envelope: Envelope) -> Self {
        NodeEvent::Message(envelope)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchState {
    Running,
    Terminated,
}

impl Node {
    /// Broadcasts the first load sample so that peers have something to average
    pub fn start(self: &mut Self) -> NodeResult<()> {
        self.record_local_load()?;
        self.timer.arm();
        info!("Node {}: Started with {} ranks", self.rank, self.ledger.size());
        Ok(())
    }

    /// Handles exactly one event. Only a failure of the load sensor is returned as
    /// an error, everything else is logged and handled here.
    pub fn handle(self: &mut Self, event: NodeEvent) -> NodeResult<DispatchState> {
        match event {
            NodeEvent::Message(envelope) => Ok(self.on_message(envelope)),
            NodeEvent::Tick => {
                self.on_tick()?;
                Ok(DispatchState::Running)
            }
            NodeEvent::Shutdown => {
                info!("Node {}: Shutting down", self.rank);
                self.timer.stop();
                Ok(DispatchState::Terminated)
            }
        }
    }

    fn on_message(self: &mut Self, envelope: Envelope) -> DispatchState {
        #[cfg(debug_assertions)]
        debug!("Node {}: Received {envelope}", self.rank);

        if let Some(metrics) = self.metrics.as_mut() {
            metrics.received(&envelope.message);
        }

        let source = envelope.source;
        match envelope.message {
            Message::Load(sample) => self.on_load_received(source, sample.load),
            Message::Place(place) => self.on_place(source, place.command_line),
            Message::List(list) => self.on_list(list.format),
            Message::Signal(signal) => self.on_signal_delivery(signal.signal, signal.global_id),
            Message::SignalResolved(entry) => self.on_signal_resolved(source, entry),
            Message::DirectoryUpdate(entry) => self.on_directory_update(source, entry),
            Message::FindOwner(signal) => self.on_find_owner(signal.signal, signal.global_id),
            Message::Admit(notice) => self.on_admission_received(notice.rank),
            Message::TaskTransfer(transfer) => self.on_task_arrival(source, transfer),
            Message::Withdraw(notice) => self.on_withdrawal_received(notice.rank),
            Message::Terminate(_) => {
                info!("Node {}: Terminated by rank {source}", self.rank);
                self.timer.stop();
                return DispatchState::Terminated;
            }
            Message::Presence(_) => self.on_presence(),
            Message::Report(report) => {
                warn!("Node {}: Unexpected report from rank {source}: {report}", self.rank);
            }
        }
        DispatchState::Running
    }
}

/// Blocks on the node's queue until the node is terminated
pub struct DispatchLoop {
    node: Node,
    events: Receiver<NodeEvent>,
}

impl DispatchLoop {
    pub fn new(node: Node, events: Receiver<NodeEvent>) -> Self {
        Self { node, events }
    }

    pub fn run(self: &mut Self) -> NodeResult<()> {
        self.node.start()?;
        loop {
            let event = match self.events.recv() {
                Ok(event) => event,
                Err(_) => {
                    warn!("Node {}: Event queue closed", self.node.rank());
                    return Ok(());
                }
            };
            if self.node.handle(event)? == DispatchState::Terminated {
                info!("Node {}: Dispatch loop finished", self.node.rank());
                return Ok(());
            }
        }
    }
}
