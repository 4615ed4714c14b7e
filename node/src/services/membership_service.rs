/*
Keeps the membership and load tables up to date and tells the other workers when
this node admits a rank or withdraws itself
*/

use load_balancer_net::{
    contracts::Message,
    data_types::{Load, Rank},
};
use log::info;

#[cfg(debug_assertions)]
use log::debug;

use crate::{
    node::{Node, NodeResult},
    observability::Metrics,
};

impl Node {
    /// Measures the local load and sends it to every other participating worker.
    /// A sensor failure is fatal to the node.
    pub fn record_local_load(self: &mut Self) -> NodeResult<Load> {
        let load = self.sensor.read_load()?;
        self.ledger.set_load(self.rank, load);
        self.broadcast(&Message::load(load));

        if let Some(metrics) = self.metrics.as_mut() {
            metrics.gauge(Metrics::METRIC_LOAD, load);
        }
        Ok(load)
    }

    pub(crate) fn on_load_received(self: &mut Self, from: Rank, load: Load) {
        #[cfg(debug_assertions)]
        debug!("Node {}: Rank {from} has load {load:.2}", self.rank);
        self.ledger.set_load(from, load);
    }

    /// Brings the lowest non participating worker into the network. Returns the
    /// admitted rank, or None when every worker already participates.
    ///
    /// Unlike the other membership notices, ADMIT is also sent to the admitted rank
    /// itself. A withdrawn node has stopped its timer and only learns that it is
    /// back from this notice.
    pub fn admit_node(self: &mut Self) -> Option<Rank> {
        let rank = match self.ledger.first_non_participant() {
            Some(rank) => rank,
            None => {
                info!("Node {}: Network is saturated, no rank to admit", self.rank);
                return None;
            }
        };

        self.ledger.set_participating(rank, true);
        info!("Node {}: Admitting rank {rank}", self.rank);

        self.send_all(&self.ledger.other_workers(), &Message::admit(rank));
        self.incr(Metrics::METRIC_ADMIT_COUNT);
        Some(rank)
    }

    pub(crate) fn on_admission_received(self: &mut Self, rank: Rank) {
        if !self.ledger.set_participating(rank, true) {
            return;
        }
        if rank == self.rank {
            info!("Node {}: Readmitted to the network", self.rank);
            self.timer.arm();
        } else {
            info!("Node {}: Rank {rank} joined the network", self.rank);
        }
    }

    /// Stops taking part in load balancing. The node keeps answering messages but
    /// its timer stops until it is admitted again.
    pub fn withdraw_self(self: &mut Self) {
        self.ledger.set_participating(self.rank, false);
        self.send_all(&self.ledger.other_workers(), &Message::withdraw(self.rank));
        self.timer.disarm();
        self.incr(Metrics::METRIC_WITHDRAW_COUNT);
        info!("Node {}: Withdrawn from the network", self.rank);
    }

    pub(crate) fn on_withdrawal_received(self: &mut Self, rank: Rank) {
        if self.ledger.set_participating(rank, false) {
            info!("Node {}: Rank {rank} left the network", self.rank);
        }
    }
}
