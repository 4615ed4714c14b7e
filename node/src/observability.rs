use std::collections::HashMap;

use load_balancer_net::contracts::Message;
use statsd::Client;

#[derive(Debug, PartialEq)]
pub enum MetricsError {
    Error { msg: String },
}

/// Accumulates counters between ticks and sends them to statsd in one pipeline
pub struct Metrics {
    client: Client,
    counts: HashMap<String, f64>,
    gauges: HashMap<String, f64>,
}

impl Metrics {
    pub const METRIC_LOAD: &str = "node.load";
    pub const METRIC_TASK_COUNT: &str = "node.task.count";

    pub const METRIC_ADMIT_COUNT: &str = "balancer.admit.count";
    pub const METRIC_MIGRATE_COUNT: &str = "balancer.migrate.count";
    pub const METRIC_WITHDRAW_COUNT: &str = "balancer.withdraw.count";

    pub const METRIC_TASK_STARTED_COUNT: &str = "task.started.count";
    pub const METRIC_TASK_DROPPED_COUNT: &str = "task.dropped.count";
    pub const METRIC_TASK_SIGNALLED_COUNT: &str = "task.signalled.count";

    pub fn new(host: &str, prefix: &str) -> Result<Self, MetricsError> {
        let client = Client::new(host, prefix).map_err(|e| MetricsError::Error {
            msg: format!("{e:?}"),
        })?;

        Ok(Self {
            client,
            counts: HashMap::with_capacity(50),
            gauges: HashMap::with_capacity(5),
        })
    }

    pub fn incr(self: &mut Self, metric: &str) {
        self.count(metric, 1.0);
    }

    pub fn count(self: &mut Self, metric: &str, count: f64) {
        *self.counts.entry(String::from(metric)).or_insert(0.0) += count;
    }

    pub fn gauge(self: &mut Self, metric: &str, value: f64) {
        self.gauges.insert(String::from(metric), value);
    }

    pub fn received(self: &mut Self, message: &Message) {
        self.incr(&received_metric(message));
    }

    pub fn flush(self: &mut Self) {
        let mut pipeline = self.client.pipeline();
        for (metric, count) in self.counts.iter() {
            pipeline.count(metric, *count);
        }
        for (metric, value) in self.gauges.iter() {
            pipeline.gauge(metric, *value);
        }
        pipeline.send(&self.client);
        self.counts.clear();
    }
}

#[cfg(test)]
impl Metrics {
    pub(crate) fn pending(self: &Self, metric: &str) -> Option<f64> {
        self.counts.get(metric).copied()
    }
}

fn received_metric(message: &Message) -> String {
    format!("message.received.{}.count", message.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_metric_is_named_after_the_message() {
        assert_eq!(
            "message.received.task_transfer.count",
            received_metric(&Message::task_transfer(1001, vec![String::from("yes")]))
        );
    }

    #[test]
    fn counts_accumulate_until_flushed() {
        let mut metrics = Metrics::new("127.0.0.1:8125", "test").unwrap();
        metrics.incr(Metrics::METRIC_ADMIT_COUNT);
        metrics.incr(Metrics::METRIC_ADMIT_COUNT);
        metrics.gauge(Metrics::METRIC_LOAD, 0.5);

        assert_eq!(Some(&2.0), metrics.counts.get(Metrics::METRIC_ADMIT_COUNT));

        metrics.flush();
        assert!(metrics.counts.is_empty());
        assert_eq!(Some(&0.5), metrics.gauges.get(Metrics::METRIC_LOAD));
    }
}
