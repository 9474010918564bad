use crate::domain::recipe::TimingMode;
use crate::domain::types::{SettingKey, SettingValue};
use crate::domain::validation_constants::settings;
use thiserror::Error;

/// Coffee Calc error types
///
/// Calculator and playback anomalies never surface here: missing input,
/// an out-of-range derived ratio, or starting an empty recipe are all
/// silent no-ops. These variants cover API misuse and the I/O surface.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Step {index} does not exist (recipe has {len} steps)")]
    StepOutOfRange { index: usize, len: usize },

    #[error("Cannot add a {found} step to a {expected} recipe")]
    MixedStepTiming {
        expected: TimingMode,
        found: TimingMode,
    },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidSetting {
        field: SettingKey,
        value: SettingValue,
    },

    #[error("Brew session has shut down")]
    SessionClosed,
}

impl Error {
    pub fn step_out_of_range(index: usize, len: usize) -> Self {
        Self::StepOutOfRange { index, len }
    }

    pub fn invalid_setting(field: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidSetting {
            field: SettingKey::try_new(field.into()).unwrap_or_else(|_| {
                SettingKey::try_new(settings::UNKNOWN_KEY.to_string()).unwrap()
            }),
            value: SettingValue::try_new(value.to_string()).unwrap_or_else(|_| {
                SettingValue::try_new(settings::OVERSIZED_VALUE.to_string()).unwrap()
            }),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_out_of_range_message() {
        let err = Error::step_out_of_range(4, 2);
        assert_eq!(
            err.to_string(),
            "Step 4 does not exist (recipe has 2 steps)"
        );
    }

    #[test]
    fn test_mixed_timing_message_names_both_modes() {
        let err = Error::MixedStepTiming {
            expected: TimingMode::Duration,
            found: TimingMode::Timestamp,
        };
        assert_eq!(
            err.to_string(),
            "Cannot add a timestamp step to a duration recipe"
        );
    }

    #[test]
    fn test_serde_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_invalid_setting_message() {
        let err = Error::invalid_setting("timer.tick_interval_ms", 0);
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for timer.tick_interval_ms: 0"
        );
    }

    #[test]
    fn test_invalid_setting_falls_back_on_unreportable_parts() {
        let err = Error::invalid_setting("Not A Key", "9".repeat(500));
        let Error::InvalidSetting { field, value } = err else {
            panic!("expected InvalidSetting");
        };
        assert_eq!(field.as_ref(), settings::UNKNOWN_KEY);
        assert_eq!(value.as_ref(), settings::OVERSIZED_VALUE);
    }
}
