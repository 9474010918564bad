use crate::domain::recipe::TimingMode;
use crate::domain::types::{Ratio, TickInterval};
use crate::domain::validation_constants::{ratio, timer};
use crate::error::{Error, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub timer: TimerSettings,
    pub calculator: CalculatorSettings,
    #[serde(default)]
    pub playback: PlaybackSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimerSettings {
    pub tick_interval_ms: u64,
    pub timing_mode: TimingMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalculatorSettings {
    pub default_ratio: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PlaybackSettings {
    pub recipe_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Settings {
    pub fn new() -> std::result::Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("COFFEE_CALC").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Defaults overlaid with a single settings file, ignoring the
    /// environment.
    pub fn from_file(path: &str) -> std::result::Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name(path))
            .build()?
            .try_deserialize()
    }

    fn builder() -> std::result::Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("timer.tick_interval_ms", timer::DEFAULT_TICK_INTERVAL_MS as i64)?
            .set_default("timer.timing_mode", "duration")?
            .set_default("calculator.default_ratio", i64::from(ratio::DEFAULT))?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")
    }

    pub fn tick_interval(&self) -> Result<TickInterval> {
        TickInterval::try_new(self.timer.tick_interval_ms).map_err(|_| {
            Error::invalid_setting("timer.tick_interval_ms", self.timer.tick_interval_ms)
        })
    }

    pub fn default_ratio(&self) -> Result<Ratio> {
        Ratio::try_new(self.calculator.default_ratio).map_err(|_| {
            Error::invalid_setting("calculator.default_ratio", self.calculator.default_ratio)
        })
    }
}
