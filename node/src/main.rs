use std::{env, process, sync::{mpsc, Arc}};

use log::{error, info, warn, LevelFilter};

use load_balancer_net::sockets::tcp_transport::TcpTransport;
use load_balancer_node::{
    dispatch::{DispatchLoop, NodeEvent},
    executor::OsProcessExecutor,
    host::HostInfo,
    node::{Collaborators, Node},
    observability::Metrics,
    sensor::ProcLoadAvgSensor,
    settings::Settings,
    ticker::Ticker,
};

fn main() {
    let mut builder = colog::default_builder();
    #[cfg(debug_assertions)]
    builder.filter_level(LevelFilter::Debug);
    #[cfg(not(debug_assertions))]
    builder.filter_level(LevelFilter::Info);
    builder.init();

    // 1st command line arg is the rank of this node in the peer list
    let args: Vec<String> = env::args().collect();
    let rank = match args.get(1).map(|arg| arg.parse::<u16>()) {
        Some(Ok(rank)) => rank,
        _ => {
            error!("Usage: node <rank> [environment]");
            process::exit(2);
        }
    };

    // 2nd command line arg is the name of the environment
    let environment = match args.get(2) {
        Some(s) => s.as_str(),
        None => "dev",
    };

    let settings = match Settings::load(environment) {
        Ok(settings) => settings,
        Err(e) => fatal(&format!("Invalid settings. {e:?}")),
    };
    if let Err(e) = settings.check_worker_rank(rank) {
        fatal(&format!("{e:?}"));
    }

    // Network messages, timer ticks and Ctrl-C all feed the same queue
    let (sender, receiver) = mpsc::channel::<NodeEvent>();

    let transport = match TcpTransport::bind(rank, &settings.peers, sender.clone()) {
        Ok(transport) => Arc::new(transport),
        Err(e) => fatal(&format!("Failed to start networking. {e:?}")),
    };

    let metrics = if settings.metrics_enabled() {
        match Metrics::new(&settings.statsd_host, &settings.statsd_prefix) {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!("Metrics are disabled. {e:?}");
                None
            }
        }
    } else {
        None
    };

    let collaborators = Collaborators {
        channel: transport.clone(),
        executor: Box::new(OsProcessExecutor::new()),
        sensor: Box::new(ProcLoadAvgSensor::new()),
        host: HostInfo::detect(),
        metrics,
    };

    let node = match Node::new(rank, &settings, collaborators) {
        Ok(node) => node,
        Err(e) => fatal(&format!("{e:?}")),
    };

    let shutdown = sender.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = shutdown.send(NodeEvent::Shutdown);
    }) {
        warn!("Ctrl-C will not shut down cleanly. {e}");
    }

    let timer = node.timer().clone();
    let ticker = Ticker::new(&timer, settings.tick_interval(), sender).start();

    let mut dispatch_loop = DispatchLoop::new(node, receiver);
    let result = dispatch_loop.run();

    timer.stop();
    transport.stop();
    drop(ticker);

    match result {
        Ok(()) => info!("Node {rank} exited"),
        Err(e) => fatal(&format!("Node {rank} failed. {e:?}")),
    }
}

fn fatal(msg: &str) -> ! {
    error!("{msg}");
    process::exit(1);
}
