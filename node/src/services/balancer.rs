/*
The load balancing decisions that a participating node makes on every tick of its
timer. The decisions are pure functions of the ledger so that they can be tested
without a network.
*/

use load_balancer_net::data_types::{Load, Rank};
use log::info;

use crate::{
    model::ledger::Ledger,
    node::{Node, NodeResult, Thresholds},
    observability::Metrics,
    services::migration_service::MigrationMode,
};

#[derive(Debug, PartialEq)]
pub enum OverloadAction {
    /// This node is already among the least loaded, the network needs more capacity
    Admit,

    /// Move one task to the lowest of the least loaded ranks
    Migrate { target: Rank },
}

#[derive(Debug, PartialEq)]
pub enum UnderloadAction {
    /// Fewer than two workers participate
    TooSmall,

    /// A lower rank is also underloaded and withdraws first
    Defer { lowest: Rank },

    /// Withdraw and move every task to the target
    Withdraw { target: Rank },
}

fn limit(percent: u32, average: Load) -> Load {
    percent as Load / 100.0 * average
}

/// The average that decisions are made against. Only participants make decisions.
fn balancing_average(ledger: &Ledger) -> Option<Load> {
    if !ledger.is_participating(ledger.rank()) {
        return None;
    }
    ledger.average_load()
}

pub fn overload_action(ledger: &Ledger, thresholds: &Thresholds) -> Option<OverloadAction> {
    let average = balancing_average(ledger)?;
    if ledger.own_load() < limit(thresholds.max_percent, average) {
        return None;
    }

    let least_loaded = ledger.least_loaded_set();
    if least_loaded.contains(&ledger.rank()) {
        Some(OverloadAction::Admit)
    } else {
        least_loaded
            .first()
            .map(|target| OverloadAction::Migrate { target: *target })
    }
}

pub fn underload_action(ledger: &Ledger, thresholds: &Thresholds) -> Option<UnderloadAction> {
    let average = balancing_average(ledger)?;
    let limit = limit(thresholds.min_percent, average);
    if ledger.own_load() > limit {
        return None;
    }

    if ledger.participant_count() < 2 {
        return Some(UnderloadAction::TooSmall);
    }

    let lowest = ledger.participants().find(|rank| ledger.load(*rank) <= limit)?;
    if lowest != ledger.rank() {
        return Some(UnderloadAction::Defer { lowest });
    }

    ledger
        .least_loaded(Some(ledger.rank()))
        .map(|target| UnderloadAction::Withdraw { target })
}

impl Node {
    /// Refreshes and broadcasts the local load, then checks for overload and
    /// underload against the same snapshot of the ledger
    pub fn on_tick(self: &mut Self) -> NodeResult<()> {
        if self.is_participating() {
            self.balance()?;
        } else {
            // Purely reactive until admitted again
            self.timer.disarm();
        }

        let task_count = self.tasks.len() as f64;
        if let Some(metrics) = self.metrics.as_mut() {
            metrics.gauge(Metrics::METRIC_TASK_COUNT, task_count);
            metrics.flush();
        }
        Ok(())
    }

    fn balance(self: &mut Self) -> NodeResult<()> {
        self.record_local_load()?;

        let overload = overload_action(&self.ledger, &self.thresholds);
        let underload = underload_action(&self.ledger, &self.thresholds);

        match overload {
            Some(OverloadAction::Admit) => {
                info!("Node {}: Overloaded along with the rest of the network", self.rank);
                self.admit_node();
            }
            Some(OverloadAction::Migrate { target }) => {
                info!("Node {}: Overloaded, moving a task to rank {target}", self.rank);
                if self.migrate(target, MigrationMode::Single) > 0 {
                    self.incr(Metrics::METRIC_MIGRATE_COUNT);
                }
            }
            None => {}
        }

        match underload {
            Some(UnderloadAction::TooSmall) => {
                info!("Node {}: Underloaded but the network is too small to shrink", self.rank);
            }
            Some(UnderloadAction::Defer { lowest }) => {
                info!("Node {}: Underloaded, rank {lowest} withdraws first", self.rank);
            }
            Some(UnderloadAction::Withdraw { target }) => {
                info!("Node {}: Underloaded, withdrawing and draining to rank {target}", self.rank);
                self.withdraw_self();
                self.migrate(target, MigrationMode::Drain);
            }
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        executor::RecordingExecutor, host::HostInfo, node::Collaborators, sensor::FixedLoadSensor,
        settings::Settings,
    };
    use load_balancer_net::memory::MemoryNetwork;
    use std::sync::Arc;

    const THRESHOLDS: Thresholds = Thresholds {
        max_percent: 70,
        min_percent: 30,
    };

    fn ledger(rank: Rank, loads: &[Load]) -> Ledger {
        let mut ledger = Ledger::new(rank, loads.len());
        for (rank, load) in loads.iter().enumerate() {
            ledger.set_load(rank as Rank, *load);
        }
        ledger
    }

    #[test]
    fn busiest_node_migrates_to_lowest_least_loaded_rank() {
        let ledger = ledger(1, &[0.0, 10.0, 1.0, 1.0]);

        assert_eq!(
            Some(OverloadAction::Migrate { target: 2 }),
            overload_action(&ledger, &THRESHOLDS)
        );
        assert_eq!(None, underload_action(&ledger, &THRESHOLDS));
    }

    #[test]
    fn equal_loads_admit_instead_of_migrating() {
        let ledger = ledger(2, &[0.0, 1.0, 1.0, 1.0]);

        assert_eq!(Some(OverloadAction::Admit), overload_action(&ledger, &THRESHOLDS));
    }

    #[test]
    fn lightly_loaded_node_is_not_overloaded() {
        let ledger = ledger(2, &[0.0, 10.0, 1.0, 1.0]);

        assert_eq!(None, overload_action(&ledger, &THRESHOLDS));
    }

    #[test]
    fn only_the_lowest_underloaded_rank_withdraws() {
        let loads = [0.0, 1.0, 1.0, 1.0, 20.0];

        assert_eq!(
            Some(UnderloadAction::Withdraw { target: 2 }),
            underload_action(&ledger(1, &loads), &THRESHOLDS)
        );
        assert_eq!(
            Some(UnderloadAction::Defer { lowest: 1 }),
            underload_action(&ledger(2, &loads), &THRESHOLDS)
        );
        assert_eq!(
            Some(UnderloadAction::Defer { lowest: 1 }),
            underload_action(&ledger(3, &loads), &THRESHOLDS)
        );
        assert_eq!(None, underload_action(&ledger(4, &loads), &THRESHOLDS));
    }

    #[test]
    fn single_participant_cannot_shrink() {
        let mut ledger = ledger(1, &[0.0, 1.0, 20.0]);
        ledger.set_participating(2, false);

        assert_eq!(Some(UnderloadAction::TooSmall), underload_action(&ledger, &THRESHOLDS));
    }

    #[test]
    fn withdrawn_node_makes_no_decisions() {
        let mut ledger = ledger(1, &[0.0, 10.0, 1.0, 1.0]);
        ledger.set_participating(1, false);

        assert_eq!(None, overload_action(&ledger, &THRESHOLDS));
        assert_eq!(None, underload_action(&ledger, &THRESHOLDS));
    }

    #[test]
    fn idle_network_uses_the_same_thresholds() {
        let loads = [0.0, 0.0, 0.0, 0.0];

        assert_eq!(
            Some(OverloadAction::Admit),
            overload_action(&ledger(1, &loads), &THRESHOLDS)
        );
        assert_eq!(
            Some(UnderloadAction::Withdraw { target: 2 }),
            underload_action(&ledger(1, &loads), &THRESHOLDS)
        );
        assert_eq!(
            Some(UnderloadAction::Defer { lowest: 1 }),
            underload_action(&ledger(2, &loads), &THRESHOLDS)
        );
    }

    fn node_with_metrics(rank: Rank, size: usize) -> Node {
        let network = MemoryNetwork::new(size);
        let settings = Settings {
            peers: (0..size).map(|rank| format!("127.0.0.1:{}", 7400 + rank)).collect(),
            ..Settings::default()
        };
        let collaborators = Collaborators {
            channel: Arc::new(network.channel(rank)),
            executor: Box::new(RecordingExecutor::new()),
            sensor: Box::new(FixedLoadSensor::new(1.0)),
            host: HostInfo::new("test-host", 0),
            metrics: Some(Metrics::new("127.0.0.1:8125", "test").unwrap()),
        };
        Node::new(rank, &settings, collaborators).unwrap()
    }

    #[test]
    fn withdrawn_node_still_flushes_its_metrics() {
        let mut node = node_with_metrics(1, 3);
        node.withdraw_self();

        let pending = |node: &Node| {
            node.metrics.as_ref().unwrap().pending(Metrics::METRIC_WITHDRAW_COUNT)
        };
        assert_eq!(Some(1.0), pending(&node));

        node.on_tick().unwrap();

        assert!(!node.timer.is_armed());
        assert_eq!(None, pending(&node));
    }
}
