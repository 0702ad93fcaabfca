use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub availability: AvailabilityConfig,
    #[serde(default)]
    pub alerts: AlertSettings,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    #[serde(default = "default_alert_topic")]
    pub alert_topic: String,
}

fn default_alert_topic() -> String { "alerts.triggered".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct AvailabilityConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 { 30 }

impl AvailabilityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Tuning for the alert pipeline. Every field has a default so the whole
/// section may be omitted.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlertSettings {
    pub group_pacing_ms: u64,
    pub cooldown_hours: i64,
    pub urgency_window_hours: i64,
    pub assumed_capacity: f64,
    pub lookahead_days: i64,
    pub trigger_history_limit: usize,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            group_pacing_ms: 1000,
            cooldown_hours: 45,
            urgency_window_hours: 3,
            assumed_capacity: 150.0,
            lookahead_days: 14,
            trigger_history_limit: 10,
        }
    }
}

impl AlertSettings {
    pub fn group_pacing(&self) -> Duration {
        Duration::from_millis(self.group_pacing_ms)
    }

    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cooldown_hours)
    }

    pub fn urgency_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.urgency_window_hours)
    }

    pub fn lookahead(&self) -> chrono::Duration {
        chrono::Duration::days(self.lookahead_days)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_seconds: u64,
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 900,
            run_on_start: true,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `SEATWATCH__ALERTS__COOLDOWN_HOURS=12`
            .add_source(config::Environment::with_prefix("SEATWATCH").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
