use chrono::{DateTime, Utc};
use serde::Deserialize;
use showtime_core::{SeatId, Show, ShowId, ShowWindow};
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_hold_ttl")]
    pub hold_ttl_seconds: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    #[serde(default = "default_retention")]
    pub hold_retention_seconds: u64,
    #[serde(default = "default_max_seats")]
    pub max_seats_per_hold: usize,
}

fn default_hold_ttl() -> u64 { 300 }
fn default_sweep_interval() -> u64 { 5 }
fn default_retention() -> u64 { 3600 }
fn default_max_seats() -> usize { 10 }

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            hold_ttl_seconds: default_hold_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
            hold_retention_seconds: default_retention(),
            max_seats_per_hold: default_max_seats(),
        }
    }
}

fn seconds(name: &str, value: u64) -> Result<chrono::Duration, config::ConfigError> {
    i64::try_from(value)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| config::ConfigError::Message(format!("business_rules.{} is out of range: {}", name, value)))
}

impl BusinessRules {
    pub fn hold_ttl(&self) -> Result<chrono::Duration, config::ConfigError> {
        seconds("hold_ttl_seconds", self.hold_ttl_seconds)
    }

    pub fn hold_retention(&self) -> Result<chrono::Duration, config::ConfigError> {
        seconds("hold_retention_seconds", self.hold_retention_seconds)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_seconds.max(1))
    }

    /// Reject rules that cannot be turned into durations.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.hold_ttl()?;
        self.hold_retention()?;
        Ok(())
    }
}

/// Pass/fail gate in front of the API. An empty key list disables the check.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub api_keys: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub shows: Vec<ShowConfig>,
}

/// Seed entry for the in-memory catalog. Seats are generated row by row:
/// rows `["A", "B"]` with 3 seats per row give A1..A3, B1..B3.
#[derive(Debug, Deserialize, Clone)]
pub struct ShowConfig {
    pub id: u64,
    pub movie_title: String,
    pub cinema: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub rows: Vec<String>,
    pub seats_per_row: u32,
}

impl ShowConfig {
    pub fn to_show(&self) -> Show {
        let seats = self
            .rows
            .iter()
            .flat_map(|row| (1..=self.seats_per_row).map(move |n| SeatId(format!("{}{}", row, n))))
            .collect();

        Show {
            id: ShowId(self.id),
            movie_title: self.movie_title.clone(),
            cinema: self.cinema.clone(),
            window: ShowWindow {
                starts_at: self.starts_at,
                ends_at: self.starts_at + chrono::Duration::minutes(self.duration_minutes),
            },
            seats,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local, untracked overrides
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `SHOWTIME_SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("SHOWTIME").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.business_rules.validate()?;
        Ok(config)
    }

    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.business_rules.validate()?;
        Ok(config)
    }

    pub fn shows(&self) -> Vec<Show> {
        self.catalog.shows.iter().map(ShowConfig::to_show).collect()
    }
}
