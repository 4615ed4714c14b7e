/*
Settings are merged from `Settings.toml`, an optional `Settings.<environment>.toml`
and environment variables that start with `LOADBAL_`. Nodes and the operator read
the same sources and each deserializes only the fields that it needs.
*/

use config::{Config, Environment, File};
use serde::de::DeserializeOwned;

use crate::data_types::Rank;

#[derive(Debug, PartialEq)]
pub enum SettingsError {
    /// The configuration sources could not be read or merged
    Error { msg: String },

    /// The settings were read but don't describe a usable network
    Invalid { msg: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

pub const ENVIRONMENT_PREFIX: &str = "LOADBAL";

pub fn load_settings<T: DeserializeOwned>(environment: &str) -> SettingsResult<T> {
    let config = Config::builder()
        .add_source(File::with_name("Settings").required(false))
        .add_source(File::with_name(&("Settings.".to_owned() + environment)).required(false))
        .add_source(
            Environment::with_prefix(ENVIRONMENT_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("peers"),
        )
        .build()
        .map_err(|e| SettingsError::Error { msg: format!("{e}") })?;

    config
        .try_deserialize::<T>()
        .map_err(|e| SettingsError::Error { msg: format!("{e}") })
}

/// A network is the operator plus at least one worker, all addressable by rank
pub fn check_peers(peers: &[String]) -> SettingsResult<()> {
    if peers.len() < 2 {
        return Err(invalid("at least two peers are needed, the operator and one worker"));
    }
    if peers.len() > Rank::MAX as usize {
        return Err(invalid("too many peers"));
    }
    Ok(())
}

pub fn invalid(msg: &str) -> SettingsError {
    SettingsError::Invalid { msg: msg.to_owned() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Peers {
        #[serde(default)]
        peers: Vec<String>,
    }

    #[test]
    fn peers_are_read_from_the_environment() {
        std::env::set_var("LOADBAL_PEERS", "127.0.0.1:7400,127.0.0.1:7401");

        let settings: Peers = load_settings("test").unwrap();

        assert_eq!(vec!["127.0.0.1:7400", "127.0.0.1:7401"], settings.peers);
        assert_eq!(Ok(()), check_peers(&settings.peers));
    }

    #[test]
    fn operator_alone_is_not_a_network() {
        let peers = vec![String::from("127.0.0.1:7400")];

        assert!(matches!(check_peers(&peers), Err(SettingsError::Invalid { .. })));
        assert!(matches!(check_peers(&[]), Err(SettingsError::Invalid { .. })));
    }
}
