//! Validated domain newtypes
//!
//! Values crossing into the calculator or the timer are validated once at
//! the boundary so the algorithms never see an impossible ratio or tick.

use crate::domain::validation_constants::{ratio, timer};
use nutype::nutype;
use std::time::Duration;

/// Brew ratio N:1 (grams of water per gram of coffee)
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 100),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        Display
    )
)]
pub struct Ratio(u32);

impl Ratio {
    /// The ratio selected before any user input (18:1)
    pub fn standard() -> Self {
        Self::try_new(ratio::DEFAULT).unwrap()
    }

    /// Accept a rounded calculation result, rejecting anything outside 1..=100
    pub fn from_rounded(value: f64) -> Option<Self> {
        if !value.is_finite() || value < ratio::MIN as f64 || value > ratio::MAX as f64 {
            return None;
        }
        Self::try_new(value as u32).ok()
    }

    /// Label shown next to the ratio selector, e.g. "18:1"
    pub fn label(&self) -> String {
        format!("{}:1", self.into_inner())
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Self::standard()
    }
}

/// Wall-clock length of one timer second, in milliseconds
///
/// 1000 reproduces real time. Smaller values play a recipe back faster,
/// which the binary uses for previews and the tests use for speed.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 60_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        Display
    )
)]
pub struct TickInterval(u64);

impl TickInterval {
    /// Real-time playback (one timer second per wall-clock second)
    pub fn real_time() -> Self {
        Self::try_new(timer::DEFAULT_TICK_INTERVAL_MS).unwrap()
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.into_inner())
    }
}

impl Default for TickInterval {
    fn default() -> Self {
        Self::real_time()
    }
}

/// Dotted settings key, e.g. `timer.tick_interval_ms`
#[nutype(
    validate(
        not_empty,
        len_char_max = 100,
        regex = r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)*$"
    ),
    derive(Debug, Clone, PartialEq, Eq, Hash, AsRef, Display)
)]
pub struct SettingKey(String);

/// Offending settings value as it was read
///
/// Limited to 200 characters so a pasted file never floods an error report.
#[nutype(
    validate(len_char_max = 200),
    derive(Debug, Clone, PartialEq, Eq, AsRef, Display)
)]
pub struct SettingValue(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_validation() {
        assert!(Ratio::try_new(ratio::MIN).is_ok());
        assert!(Ratio::try_new(ratio::MAX).is_ok());
        assert!(Ratio::try_new(ratio::MIN - 1).is_err());
        assert!(Ratio::try_new(ratio::MAX + 1).is_err());
    }

    #[test]
    fn test_ratio_from_rounded_rejects_out_of_range() {
        assert_eq!(Ratio::from_rounded(15.0).map(|r| r.into_inner()), Some(15));
        assert!(Ratio::from_rounded(1000.0).is_none());
        assert!(Ratio::from_rounded(0.0).is_none());
        assert!(Ratio::from_rounded(f64::INFINITY).is_none());
        assert!(Ratio::from_rounded(f64::NAN).is_none());
    }

    #[test]
    fn test_ratio_label() {
        assert_eq!(Ratio::standard().label(), "18:1");
    }

    #[test]
    fn test_tick_interval_bounds() {
        assert!(TickInterval::try_new(timer::MIN_TICK_INTERVAL_MS - 1).is_err());
        assert!(TickInterval::try_new(timer::MAX_TICK_INTERVAL_MS).is_ok());
        assert!(TickInterval::try_new(timer::MAX_TICK_INTERVAL_MS + 1).is_err());
        assert_eq!(
            TickInterval::real_time().as_duration(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_setting_key_must_be_dotted_lowercase() {
        assert!(SettingKey::try_new("timer.tick_interval_ms".to_string()).is_ok());
        assert!(SettingKey::try_new("ratio".to_string()).is_ok());
        assert!(SettingKey::try_new(String::new()).is_err());
        assert!(SettingKey::try_new("Timer.Tick".to_string()).is_err());
        assert!(SettingKey::try_new("timer..tick".to_string()).is_err());
    }

    #[test]
    fn test_setting_value_length_limit() {
        assert!(SettingValue::try_new("0".to_string()).is_ok());
        assert!(SettingValue::try_new("9".repeat(201)).is_err());
    }
}
