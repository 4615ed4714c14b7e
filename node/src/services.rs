/// Periodic overload and underload decisions
pub mod balancer;

/// Task placement, directory mirror updates and signal routing
pub mod directory_service;

/// Membership flags, load samples, admission and withdrawal
pub mod membership_service;

/// Moving tasks between nodes
pub mod migration_service;

/// Listing and presence replies to the operator
pub mod report_service;
