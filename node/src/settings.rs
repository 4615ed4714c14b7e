/*
Worker settings. The sources are shared with the operator, see
`load_balancer_net::settings`.
*/

use std::time::Duration;

use load_balancer_net::{
    data_types::{Rank, OPERATOR_RANK},
    settings::{check_peers, invalid, load_settings},
};
use serde::Deserialize;

pub use load_balancer_net::settings::{SettingsError, SettingsResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Socket address of each rank, the first one is the operator
    #[serde(default)]
    pub peers: Vec<String>,

    #[serde(default = "default_task_slots")]
    pub task_slots: usize,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Overloaded when the load is at least this percentage of the average
    #[serde(default = "default_max_percent")]
    pub max_percent: u32,

    /// Underloaded when the load is at most this percentage of the average
    #[serde(default = "default_min_percent")]
    pub min_percent: u32,

    /// Metrics are only sent when a host is configured
    #[serde(default)]
    pub statsd_host: String,

    #[serde(default = "default_statsd_prefix")]
    pub statsd_prefix: String,
}

fn default_task_slots() -> usize { 50 }
fn default_tick_interval_ms() -> u64 { 15000 }
fn default_max_percent() -> u32 { 70 }
fn default_min_percent() -> u32 { 30 }
fn default_statsd_prefix() -> String { String::from("loadbal") }

impl Default for Settings {
    fn default() -> Self {
        Self {
            peers: Vec::new(),
            task_slots: default_task_slots(),
            tick_interval_ms: default_tick_interval_ms(),
            max_percent: default_max_percent(),
            min_percent: default_min_percent(),
            statsd_host: String::new(),
            statsd_prefix: default_statsd_prefix(),
        }
    }
}

impl Settings {
    /// Merges configuration sources for an environment and validates the result
    pub fn load(environment: &str) -> SettingsResult<Self> {
        let settings: Settings = load_settings(environment)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(self: &Self) -> SettingsResult<()> {
        check_peers(&self.peers)?;
        if self.task_slots == 0 || self.task_slots > u16::MAX as usize {
            return Err(invalid("task_slots must be between 1 and 65535"));
        }
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms must not be zero"));
        }
        if self.min_percent >= self.max_percent {
            return Err(invalid("min_percent must be less than max_percent"));
        }
        Ok(())
    }

    /// Checks that a rank can run a worker node in this network
    pub fn check_worker_rank(self: &Self, rank: Rank) -> SettingsResult<()> {
        if rank == OPERATOR_RANK || rank as usize >= self.peers.len() {
            Err(invalid(&format!(
                "rank {rank} is not a worker, expected 1 to {}",
                self.peers.len().saturating_sub(1)
            )))
        } else {
            Ok(())
        }
    }

    pub fn size(self: &Self) -> usize { self.peers.len() }

    pub fn tick_interval(self: &Self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn metrics_enabled(self: &Self) -> bool {
        !self.statsd_host.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(peer_count: usize) -> Settings {
        Settings {
            peers: (0..peer_count).map(|rank| format!("127.0.0.1:{}", 7000 + rank)).collect(),
            ..Settings::default()
        }
    }

    #[test]
    fn defaults_match_the_balancing_rules() {
        let settings = Settings::default();

        assert_eq!(50, settings.task_slots);
        assert_eq!(Duration::from_secs(15), settings.tick_interval());
        assert_eq!((70, 30), (settings.max_percent, settings.min_percent));
        assert!(!settings.metrics_enabled());
    }

    #[test]
    fn network_needs_a_worker() {
        assert!(settings(1).validate().is_err());
        assert_eq!(Ok(()), settings(2).validate());
    }

    #[test]
    fn thresholds_must_be_ordered() {
        let settings = Settings {
            min_percent: 80,
            ..settings(3)
        };

        assert!(matches!(settings.validate(), Err(SettingsError::Invalid { .. })));
    }

    #[test]
    fn operator_rank_is_not_a_worker() {
        let settings = settings(4);

        assert!(settings.check_worker_rank(0).is_err());
        assert!(settings.check_worker_rank(4).is_err());
        assert_eq!(Ok(()), settings.check_worker_rank(3));
    }
}
