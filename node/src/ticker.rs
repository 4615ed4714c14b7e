/*
The recurring timer that drives load balancing. Ticks are posted into the node's
event queue rather than run on the timer thread, so they are serialized with the
messages that the node receives.
*/

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::info;

#[cfg(debug_assertions)]
use log::debug;

use crate::dispatch::NodeEvent;

/// Shared switches that the node uses to control its ticker
#[derive(Clone)]
pub struct Timer {
    armed: Arc<AtomicBool>,
    stop_signal: Arc<AtomicBool>,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            armed: Arc::new(AtomicBool::new(true)),
            stop_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn arm(self: &Self) { self.armed.store(true, Ordering::Relaxed) }
    pub fn disarm(self: &Self) { self.armed.store(false, Ordering::Relaxed) }
    pub fn is_armed(self: &Self) -> bool { self.armed.load(Ordering::Relaxed) }

    pub fn stop(self: &Self) { self.stop_signal.store(true, Ordering::Relaxed) }
    pub fn is_stopped(self: &Self) -> bool { self.stop_signal.load(Ordering::Relaxed) }
}

pub struct Ticker {
    timer: Timer,
    interval: Duration,
    events: Sender<NodeEvent>,
}

impl Ticker {
    pub fn new(timer: &Timer, interval: Duration, events: Sender<NodeEvent>) -> Self {
        Self {
            timer: timer.clone(),
            interval,
            events,
        }
    }

    pub fn start(self: Self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(self: Self) {
        info!("Ticker: Started with a {}ms interval", self.interval.as_millis());
        loop {
            thread::sleep(self.interval);
            if self.timer.is_stopped() {
                break;
            }
            if self.timer.is_armed() {
                #[cfg(debug_assertions)]
                debug!("Ticker: Tick");
                if self.events.send(NodeEvent::Tick).is_err() {
                    break;
                }
            }
        }
        info!("Ticker: Stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn ticks_only_while_armed() {
        let timer = Timer::new();
        let (sender, receiver) = channel();
        let thread = Ticker::new(&timer, Duration::from_millis(5), sender).start();

        let first = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, NodeEvent::Tick));

        timer.disarm();
        thread::sleep(Duration::from_millis(20));
        while receiver.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(30));
        assert!(receiver.try_recv().is_err());

        timer.stop();
        thread.join().unwrap();
    }
}
