use load_balancer_net::settings::{check_peers, load_settings};
use serde::Deserialize;

pub use load_balancer_net::settings::{SettingsError, SettingsResult};

/// The operator only needs to know where everybody listens. It reads the same
/// files and environment variables as the nodes and ignores the rest.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub peers: Vec<String>,
}

impl Settings {
    pub fn load(environment: &str) -> SettingsResult<Self> {
        let settings: Settings = load_settings(environment)?;
        check_peers(&settings.peers)?;
        Ok(settings)
    }
}
