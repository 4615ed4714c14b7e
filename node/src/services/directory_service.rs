/*
Places new tasks on the least loaded node, keeps the directory mirror in step
with the other nodes and routes signals to whichever node owns a task
*/

use load_balancer_net::{
    contracts::{payloads::DirectoryEntry, Message},
    data_types::{CommandLine, GlobalId, Rank, SignalNumber},
};
use log::{info, warn};

use crate::{
    model::task_table::{TaskEntry, TaskTableError},
    node::Node,
    observability::Metrics,
};

impl Node {
    /// Runs a command on the least loaded participating node. A node that doesn't
    /// participate passes the request around the ring, and a node that was chosen
    /// by another participant runs it without choosing again.
    pub(crate) fn on_place(self: &mut Self, source: Rank, command_line: CommandLine) {
        if command_line.is_empty() {
            warn!("Node {}: Ignoring request to place an empty command", self.rank);
            return;
        }

        if !self.is_participating() {
            self.forward_around_ring(&Message::place(command_line));
            return;
        }

        if source != self.rank && self.ledger.is_participating(source) {
            self.launch_local(command_line);
            return;
        }

        match self.ledger.least_loaded(None) {
            Some(target) if target == self.rank => self.launch_local(command_line),
            Some(target) => {
                info!("Node {}: Placing {:?} on rank {target}", self.rank, command_line);
                self.send(target, &Message::place(command_line));
            }
            None => self.launch_local(command_line),
        }
    }

    /// Reserves a slot and an id, announces them, then starts the process
    fn launch_local(self: &mut Self, command_line: CommandLine) {
        let slot = match self.tasks.first_free() {
            Ok(slot) => slot,
            Err(TaskTableError::Full { capacity }) => {
                warn!("Node {}: All {capacity} slots are full, dropping {command_line:?}", self.rank);
                self.report(vec![format!(
                    "Node {} has no free slot, {} was not started",
                    self.rank,
                    command_line.join(" ")
                )]);
                self.incr(Metrics::METRIC_TASK_DROPPED_COUNT);
                return;
            }
        };

        let global_id = match self.ids.generate() {
            Ok(global_id) => global_id,
            Err(e) => {
                warn!("Node {}: Can't place {command_line:?}. {e:?}", self.rank);
                self.report(vec![format!(
                    "Node {} has run out of task ids, {} was not started",
                    self.rank,
                    command_line.join(" ")
                )]);
                self.incr(Metrics::METRIC_TASK_DROPPED_COUNT);
                return;
            }
        };

        if let Err(e) = self.directory.set(self.rank, slot, global_id) {
            warn!("Node {}: {e:?}", self.rank);
        }
        self.broadcast(&Message::directory_update(global_id, slot));

        match self.executor.spawn(&command_line) {
            Ok(local_handle) => {
                info!(
                    "Node {}: Started task {global_id} as process {local_handle} in slot {slot}",
                    self.rank
                );
                self.tasks.insert(
                    slot,
                    TaskEntry {
                        local_handle,
                        global_id,
                        command_line,
                    },
                );
                self.incr(Metrics::METRIC_TASK_STARTED_COUNT);
            }
            Err(e) => {
                warn!("Node {}: Failed to start {command_line:?}. {e:?}", self.rank);
                let _ = self.directory.clear(self.rank, slot, global_id);
                self.broadcast(&Message::signal_resolved(global_id, slot));
                self.incr(Metrics::METRIC_TASK_DROPPED_COUNT);
            }
        }
    }

    pub(crate) fn on_directory_update(self: &mut Self, source: Rank, entry: DirectoryEntry) {
        if let Err(e) = self.directory.set(source, entry.slot, entry.global_id) {
            warn!("Node {}: Ignoring update from rank {source}. {e:?}", self.rank);
        }
    }

    pub(crate) fn on_signal_resolved(self: &mut Self, source: Rank, entry: DirectoryEntry) {
        if let Err(e) = self.directory.clear(source, entry.slot, entry.global_id) {
            warn!("Node {}: Ignoring removal from rank {source}. {e:?}", self.rank);
        }
    }

    /// Finds the owner of a task and has it deliver the signal. There is no reply
    /// when the task can't be found.
    pub(crate) fn on_find_owner(self: &mut Self, signal: SignalNumber, global_id: GlobalId) {
        if !self.is_participating() {
            self.forward_around_ring(&Message::find_owner(signal, global_id));
            return;
        }

        match self.directory.find_owner(global_id) {
            Some((owner, _)) if owner == self.rank => self.on_signal_delivery(signal, global_id),
            Some((owner, _)) => {
                info!("Node {}: Task {global_id} is owned by rank {owner}", self.rank);
                self.send(owner, &Message::signal(signal, global_id));
            }
            None => {
                info!("Node {}: Task {global_id} was not found", self.rank);
            }
        }
    }

    pub(crate) fn on_signal_delivery(self: &mut Self, signal: SignalNumber, global_id: GlobalId) {
        match self.tasks.find(global_id) {
            Some(slot) => {
                info!("Node {}: Delivering signal {signal} to task {global_id}", self.rank);
                self.remove_task(slot, signal);
            }
            None => {
                info!("Node {}: Task {global_id} is not here, signal {signal} dropped", self.rank);
            }
        }
    }

    fn forward_around_ring(self: &Self, message: &Message) {
        if self.ledger.participant_count() == 0 {
            warn!("Node {}: Nobody participates, dropping {message}", self.rank);
            return;
        }
        let next = self.ledger.ring_next();
        if next == self.rank {
            warn!("Node {}: No other node to forward {message} to", self.rank);
            return;
        }
        info!("Node {}: Not participating, forwarding {message} to rank {next}", self.rank);
        self.send(next, message);
    }
}
