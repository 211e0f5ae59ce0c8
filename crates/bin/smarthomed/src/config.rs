//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `smarthome.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;
use smarthome_app::scheduler::DEFAULT_POLL_INTERVAL;
use smarthome_app::services::house_service::RoomSeed;
use smarthome_domain::device::{DeviceKind, DeviceRecord, DeviceState};
use smarthome_domain::id::{DeviceId, RoomId};
use smarthome_domain::room::RoomRecord;
use smarthome_domain::rule::Rule;
use smarthome_domain::schedule::Recurrence;
use smarthome_domain::time::parse_time_of_day;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Background scheduler settings.
    pub scheduler: SchedulerConfig,
    /// Rooms written into an empty store at boot.
    pub rooms: Vec<RoomConfig>,
    /// Automation rules.
    pub rules: Vec<Rule>,
    /// Time-triggered device actions.
    pub schedules: Vec<ScheduleConfig>,
    /// Initial simulated readings.
    pub environment: Vec<EnvironmentConfig>,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Scheduler loop configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two checks for due schedules.
    pub poll_interval_secs: u64,
}

/// A room to seed, with its devices.
#[derive(Debug, Deserialize)]
pub struct RoomConfig {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// A device to seed; it starts in its kind's default state.
#[derive(Debug, Deserialize)]
pub struct DeviceConfig {
    pub id: i64,
    pub name: String,
    pub kind: DeviceKind,
}

/// A device action fired at a wall-clock time.
#[derive(Debug, Deserialize)]
pub struct ScheduleConfig {
    /// Room holding the device.
    pub room: String,
    pub device_id: i64,
    /// `HH:MM`, 24-hour, local time.
    pub at: String,
    #[serde(default = "default_repeat")]
    pub repeat: Recurrence,
    /// Target state token (`ON`, `OFF`, `ACTIVE`, `INACTIVE`).
    pub action: String,
}

/// Simulated readings for one room.
#[derive(Debug, Deserialize)]
pub struct EnvironmentConfig {
    pub room: String,
    pub temperature: Option<f32>,
    pub motion: Option<bool>,
}

fn default_repeat() -> Recurrence {
    Recurrence::Once
}

impl Config {
    /// Load configuration from `smarthome.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("smarthome.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SMARTHOME_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("SMARTHOME_POLL_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                self.scheduler.poll_interval_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("SMARTHOME_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "poll interval must be non-zero".to_string(),
            ));
        }
        for schedule in &self.schedules {
            parse_time_of_day(&schedule.at)
                .map_err(|err| ConfigError::Validation(err.to_string()))?;
            schedule.target()?;
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Pause between two scheduler checks.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.poll_interval_secs)
    }

    /// Seed rooms as storage records.
    #[must_use]
    pub fn room_seeds(&self) -> Vec<RoomSeed> {
        self.rooms
            .iter()
            .map(|room| {
                let record = RoomRecord {
                    id: RoomId::new(room.id),
                    name: room.name.clone(),
                };
                let devices = room
                    .devices
                    .iter()
                    .map(|device| DeviceRecord {
                        id: DeviceId::new(device.id),
                        name: device.name.clone(),
                        kind: device.kind,
                        state: device.kind.default_state(),
                    })
                    .collect();
                (record, devices)
            })
            .collect()
    }
}

impl ScheduleConfig {
    /// Parsed target state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an unknown state token.
    pub fn target(&self) -> Result<DeviceState, ConfigError> {
        self.action
            .parse()
            .map_err(|err: smarthome_domain::error::ValidationError| {
                ConfigError::Validation(err.to_string())
            })
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:smarthome.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "smarthomed=info,smarthome=info".to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
