//! Application configuration
//!
//! Layered from an optional TOML file and `SAFEDRIVE__*` environment
//! variables (`SAFEDRIVE__API__BASE_URL`, `SAFEDRIVE__CAPTURE__TICK_INTERVAL_MS`, ...).

use backend_client::ApiConfig;
use camera_capture::CameraConfig;
use capture_loop::LoopConfig;
use ::config::{Config, ConfigError, Environment, File};
use lane_scoring::ScoringConfig;
use proximity::ProximityConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file
pub const DEFAULT_CONFIG_FILE: &str = "safedrive.toml";

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "SAFEDRIVE_CONFIG";

/// Dashboard server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub camera: CameraConfig,
    pub capture: LoopConfig,
    pub scoring: ScoringConfig,
    pub proximity: ProximityConfig,
    /// Local store file (token, session user, scored artifacts)
    pub store_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            camera: CameraConfig::default(),
            capture: LoopConfig::default(),
            scoring: ScoringConfig::default(),
            proximity: ProximityConfig::default(),
            store_path: PathBuf::from("safedrive-store.json"),
        }
    }
}

impl AppConfig {
    /// Load from `path` (optional) layered under the environment
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("SAFEDRIVE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Configuration file named by `SAFEDRIVE_CONFIG`, or the default
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}
