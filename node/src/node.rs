/*
A worker node and the state that it owns. The behaviour is split across the
service modules, each of which adds methods to `Node`.
*/

use std::sync::Arc;

use load_balancer_net::{
    channel::Channel,
    contracts::Message,
    data_types::{Rank, OPERATOR_RANK},
};
use log::warn;

use crate::{
    executor::ProcessExecutor,
    host::HostInfo,
    model::{
        directory::{DirectoryMirror, GlobalIdGenerator},
        ledger::Ledger,
        task_table::TaskTable,
    },
    observability::Metrics,
    sensor::{LoadSensor, SensorError},
    settings::{Settings, SettingsResult},
    ticker::Timer,
};

#[derive(Debug, PartialEq)]
pub enum NodeError {
    /// The load sensor could not be read, the node can't take part in balancing
    Sensor { msg: String },
}

impl From<SensorError> for NodeError {
    fn from(err: SensorError) -> Self {
        match err {
            SensorError::Unreadable { msg } => NodeError::Sensor { msg },
            SensorError::Malformed { msg } => NodeError::Sensor { msg },
        }
    }
}

pub type NodeResult<T> = Result<T, NodeError>;

/// Percentages of the network average that trigger rebalancing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub max_percent: u32,
    pub min_percent: u32,
}

/// The things a node talks to that are outside of its own state
pub struct Collaborators {
    pub channel: Arc<dyn Channel>,
    pub executor: Box<dyn ProcessExecutor>,
    pub sensor: Box<dyn LoadSensor>,
    pub host: HostInfo,
    pub metrics: Option<Metrics>,
}

pub struct Node {
    pub(crate) rank: Rank,
    pub(crate) thresholds: Thresholds,
    pub(crate) ledger: Ledger,
    pub(crate) tasks: TaskTable,
    pub(crate) directory: DirectoryMirror,
    pub(crate) ids: GlobalIdGenerator,
    pub(crate) channel: Arc<dyn Channel>,
    pub(crate) executor: Box<dyn ProcessExecutor>,
    pub(crate) sensor: Box<dyn LoadSensor>,
    pub(crate) host: HostInfo,
    pub(crate) metrics: Option<Metrics>,
    pub(crate) timer: Timer,
}

impl Node {
    pub fn new(rank: Rank, settings: &Settings, collaborators: Collaborators) -> SettingsResult<Self> {
        settings.validate()?;
        settings.check_worker_rank(rank)?;

        let size = settings.size();
        Ok(Self {
            rank,
            thresholds: Thresholds {
                max_percent: settings.max_percent,
                min_percent: settings.min_percent,
            },
            ledger: Ledger::new(rank, size),
            tasks: TaskTable::new(settings.task_slots),
            directory: DirectoryMirror::new(size, settings.task_slots),
            ids: GlobalIdGenerator::new(rank),
            channel: collaborators.channel,
            executor: collaborators.executor,
            sensor: collaborators.sensor,
            host: collaborators.host,
            metrics: collaborators.metrics,
            timer: Timer::new(),
        })
    }

    pub fn rank(self: &Self) -> Rank { self.rank }
    pub fn ledger(self: &Self) -> &Ledger { &self.ledger }
    pub fn tasks(self: &Self) -> &TaskTable { &self.tasks }
    pub fn directory(self: &Self) -> &DirectoryMirror { &self.directory }
    pub fn timer(self: &Self) -> &Timer { &self.timer }
    pub fn is_participating(self: &Self) -> bool { self.ledger.is_participating(self.rank) }

    /// Fire and forget. Failures are logged and the message is lost.
    pub(crate) fn send(self: &Self, destination: Rank, message: &Message) {
        if let Err(e) = self.channel.send(destination, message) {
            warn!("Node {}: Failed to send {message} to rank {destination}. {e:?}", self.rank);
        }
    }

    pub(crate) fn send_all(self: &Self, destinations: &[Rank], message: &Message) {
        for destination in destinations {
            self.send(*destination, message);
        }
    }

    /// Sends a message to every other participating worker
    pub(crate) fn broadcast(self: &Self, message: &Message) {
        self.send_all(&self.ledger.other_participants(), message);
    }

    pub(crate) fn report(self: &Self, lines: Vec<String>) {
        self.send(OPERATOR_RANK, &Message::report(lines));
    }

    pub(crate) fn incr(self: &mut Self, metric: &str) {
        if let Some(metrics) = self.metrics.as_mut() {
            metrics.incr(metric);
        }
    }
}
