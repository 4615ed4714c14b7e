use std::{
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use load_balancer_net::data_types::Load;

#[derive(Debug, PartialEq)]
pub enum SensorError {
    Unreadable { msg: String },
    Malformed { msg: String },
}

pub type SensorResult<T> = Result<T, SensorError>;

/// Measures how busy this machine is. Only the relative size of samples from
/// different nodes matters.
pub trait LoadSensor: Send {
    fn read_load(self: &Self) -> SensorResult<Load>;
}

/// Reads the one minute load average that Linux publishes in `/proc/loadavg`
pub struct ProcLoadAvgSensor {
    path: PathBuf,
}

impl ProcLoadAvgSensor {
    pub fn new() -> Self {
        Self::with_path("/proc/loadavg")
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LoadSensor for ProcLoadAvgSensor {
    fn read_load(self: &Self) -> SensorResult<Load> {
        let content = fs::read_to_string(&self.path).map_err(|e| SensorError::Unreadable {
            msg: format!("{}: {e}", self.path.display()),
        })?;

        let first = match content.split_whitespace().next() {
            Some(field) => field,
            None => {
                return Err(SensorError::Malformed {
                    msg: format!("{} is empty", self.path.display()),
                })
            }
        };

        first.parse::<Load>().map_err(|e| SensorError::Malformed {
            msg: format!("{first}: {e}"),
        })
    }
}

/// Returns whatever load it was last given. Clones share the same value.
#[derive(Clone)]
pub struct FixedLoadSensor {
    load: Arc<Mutex<Option<Load>>>,
}

impl FixedLoadSensor {
    pub fn new(load: Load) -> Self {
        Self {
            load: Arc::new(Mutex::new(Some(load))),
        }
    }

    pub fn set(self: &Self, load: Load) {
        *self.load.lock().unwrap() = Some(load);
    }

    /// Makes every subsequent read fail
    pub fn fail(self: &Self) {
        *self.load.lock().unwrap() = None;
    }
}

impl LoadSensor for FixedLoadSensor {
    fn read_load(self: &Self) -> SensorResult<Load> {
        match *self.load.lock().unwrap() {
            Some(load) => Ok(load),
            None => Err(SensorError::Unreadable {
                msg: String::from("sensor failed"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("load_balancer_{}_{name}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_first_field_of_loadavg() {
        let path = temp_file("loadavg", "0.42 0.30 0.25 1/123 4567\n");

        assert_eq!(Ok(0.42), ProcLoadAvgSensor::with_path(&path).read_load());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn garbage_is_malformed() {
        let path = temp_file("garbage", "busy\n");

        assert!(matches!(
            ProcLoadAvgSensor::with_path(&path).read_load(),
            Err(SensorError::Malformed { .. })
        ));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_is_unreadable() {
        let sensor = ProcLoadAvgSensor::with_path("/nonexistent/loadavg");

        assert!(matches!(sensor.read_load(), Err(SensorError::Unreadable { .. })));
    }

    #[test]
    fn fixed_sensor_shares_its_value() {
        let sensor = FixedLoadSensor::new(1.0);
        let control = sensor.clone();

        control.set(2.5);
        assert_eq!(Ok(2.5), sensor.read_load());

        control.fail();
        assert!(sensor.read_load().is_err());
    }
}
