/// The event loop that serializes messages and timer ticks
pub mod dispatch;

/// Starting and signalling the processes that make up tasks
pub mod executor;

/// Host name and user id shown in long listings
pub mod host;

/// The state that a node owns: membership and loads, its tasks and the directory mirror
pub mod model;

/// A worker node and its collaborators
pub mod node;

/// Counters and gauges sent to statsd
pub mod observability;

/// Measuring the local load
pub mod sensor;

/// Business logic of the peer to peer protocol
pub mod services;

/// Configuration merged from files and environment variables
pub mod settings;

/// The recurring timer that drives load balancing
pub mod ticker;
