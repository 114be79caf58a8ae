//! Server settings.
//!
//! Built-in defaults, then an optional `duocanvas.{toml,json,yaml}` in the
//! working directory, then `DUOCANVAS_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "DUOCANVAS";

/// Who receives `canvasUpdate` after a successful draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastScope {
    /// Every open connection, whatever canvas it is looking at.
    #[default]
    AllConnections,
    /// Only connections that joined the edited canvas.
    SessionParticipants,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub backup_interval_secs: u64,
    pub write_timeout_secs: u64,
    pub broadcast_scope: BroadcastScope,
}

impl ServerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn load_from(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_address", "127.0.0.1:7777")?
            .set_default("data_dir", "canvases")?
            .set_default("backup_interval_secs", 30_i64)?
            .set_default("write_timeout_secs", 10_i64)?
            .set_default("broadcast_scope", "all_connections")?
            .add_source(File::with_name("duocanvas").required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}
