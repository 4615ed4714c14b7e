/*
Moves tasks between nodes. The sender forwards the task's id and command line,
then stops its own copy and announces that its slot is free. The receiver starts
a new copy and announces where it lives. The two announcements can arrive in
either order, the directory mirrors converge once both have been applied.
*/

use load_balancer_net::{
    contracts::{payloads::TaskTransfer, Message},
    data_types::{Rank, SignalNumber, Slot, SIGKILL},
};
use log::{info, warn};

use crate::{
    model::task_table::{TaskEntry, TaskTableError},
    node::Node,
    observability::Metrics,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MigrationMode {
    /// Move the task in the lowest occupied slot
    Single,

    /// Move every task
    Drain,
}

impl Node {
    /// Sends tasks to the target in slot order. Returns the number of tasks moved.
    pub fn migrate(self: &mut Self, target: Rank, mode: MigrationMode) -> usize {
        let mut moved = 0;
        while let Some(slot) = self.tasks.first_occupied() {
            if let Some(entry) = self.tasks.get(slot) {
                let transfer = Message::task_transfer(entry.global_id, entry.command_line.clone());
                info!("Node {}: Moving task {} to rank {target}", self.rank, entry.global_id);
                self.send(target, &transfer);
            }
            self.remove_task(slot, SIGKILL);
            moved += 1;

            if mode == MigrationMode::Single {
                break;
            }
        }
        moved
    }

    /// Signals the task in a slot, frees the slot and tells the other participants
    pub(crate) fn remove_task(self: &mut Self, slot: Slot, signal: SignalNumber) -> Option<TaskEntry> {
        let entry = self.tasks.remove(slot)?;

        if let Err(e) = self.executor.signal(entry.local_handle, signal) {
            warn!(
                "Node {}: Failed to signal process {} of task {}. {e:?}",
                self.rank, entry.local_handle, entry.global_id
            );
        }

        if let Err(e) = self.directory.clear(self.rank, slot, entry.global_id) {
            warn!("Node {}: {e:?}", self.rank);
        }
        self.broadcast(&Message::signal_resolved(entry.global_id, slot));
        self.incr(Metrics::METRIC_TASK_SIGNALLED_COUNT);
        Some(entry)
    }

    pub(crate) fn on_task_arrival(self: &mut Self, source: Rank, transfer: TaskTransfer) {
        let global_id = match transfer.parse_global_id() {
            Some(global_id) => global_id,
            None => {
                warn!(
                    "Node {}: Dropping task from rank {source} with invalid id '{}'",
                    self.rank, transfer.global_id
                );
                self.incr(Metrics::METRIC_TASK_DROPPED_COUNT);
                return;
            }
        };

        let slot = match self.tasks.first_free() {
            Ok(slot) => slot,
            Err(TaskTableError::Full { capacity }) => {
                warn!("Node {}: All {capacity} slots are full, dropping task {global_id}", self.rank);
                self.report(vec![format!(
                    "Node {} has no free slot, task {global_id} from rank {source} was dropped",
                    self.rank
                )]);
                self.incr(Metrics::METRIC_TASK_DROPPED_COUNT);
                return;
            }
        };

        let local_handle = match self.executor.spawn(&transfer.command_line) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Node {}: Failed to start task {global_id}. {e:?}", self.rank);
                self.incr(Metrics::METRIC_TASK_DROPPED_COUNT);
                return;
            }
        };

        self.tasks.insert(
            slot,
            TaskEntry {
                local_handle,
                global_id,
                command_line: transfer.command_line,
            },
        );
        if let Err(e) = self.directory.set(self.rank, slot, global_id) {
            warn!("Node {}: {e:?}", self.rank);
        }
        self.broadcast(&Message::directory_update(global_id, slot));
        self.incr(Metrics::METRIC_TASK_STARTED_COUNT);

        info!(
            "Node {}: Task {global_id} from rank {source} is process {local_handle} in slot {slot}",
            self.rank
        );
    }
}
