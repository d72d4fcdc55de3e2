use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Zmq {
    #[serde(default = "default_zmq_endpoint")]
    pub endpoint: String,
}

fn default_zmq_endpoint() -> String {
    // Dash Core's zmqpubhash* port in the reference deployment
    "tcp://127.0.0.1:20003".to_string()
}

impl Default for Zmq {
    fn default() -> Self {
        Self {
            endpoint: default_zmq_endpoint(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Storage {
    #[serde(default = "default_chainlock_db_path")]
    pub chainlock_db_path: String,
    #[serde(default = "default_instantlock_db_path")]
    pub instantlock_db_path: String,
}

fn default_chainlock_db_path() -> String {
    "dash-chainlock-data.db".to_string()
}
fn default_instantlock_db_path() -> String {
    "dash-islock-data.db".to_string()
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            chainlock_db_path: default_chainlock_db_path(),
            instantlock_db_path: default_instantlock_db_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Dedup {
    /// Hard cap on tracked transaction hashes; oldest entries are evicted
    /// first once the cap is exceeded.
    #[serde(default = "default_dedup_capacity")]
    pub capacity: usize,
}

fn default_dedup_capacity() -> usize {
    20_000
}

impl Default for Dedup {
    fn default() -> Self {
        Self {
            capacity: default_dedup_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub zmq: Zmq,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub dedup: Dedup,
    #[serde(default)]
    pub log: LogSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("Config.toml")
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        // Environment variable overrides
        if let Ok(endpoint) = env::var("MONITOR_ZMQ_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                settings.zmq.endpoint = endpoint;
            }
        }
        if let Ok(path) = env::var("MONITOR_CHAINLOCK_DB") {
            if !path.trim().is_empty() {
                settings.storage.chainlock_db_path = path;
            }
        }
        if let Ok(path) = env::var("MONITOR_INSTANTLOCK_DB") {
            if !path.trim().is_empty() {
                settings.storage.instantlock_db_path = path;
            }
        }

        Ok(settings)
    }
}
