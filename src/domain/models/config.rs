use serde::{Deserialize, Serialize};

use super::group_policy::{ExistingTaskAction, NewTaskAction};

/// Main configuration structure for the deferred action engine
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scheduler defaults
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Event bus configuration
    #[serde(default)]
    pub event_bus: EventBusSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Scheduler defaults applied to incoming requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Existing-task action used when a grouped request does not specify one
    #[serde(default)]
    pub default_existing_action: ExistingTaskAction,

    /// New-task action used when a grouped request does not specify one
    #[serde(default)]
    pub default_new_action: NewTaskAction,

    /// Upper bound on a single delay, in seconds
    #[serde(default = "default_max_delay_seconds")]
    pub max_delay_seconds: f64,
}

const fn default_max_delay_seconds() -> f64 {
    // 30 days
    2_592_000.0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_existing_action: ExistingTaskAction::default(),
            default_new_action: NewTaskAction::default(),
            max_delay_seconds: default_max_delay_seconds(),
        }
    }
}

/// Event bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EventBusSettings {
    /// Broadcast channel capacity
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

const fn default_channel_capacity() -> usize {
    1024
}

impl Default for EventBusSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}
