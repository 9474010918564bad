//! Validation constants for domain types
//!
//! This module centralizes the limits and defaults used by the calculator
//! and the step timer so the newtypes and their tests agree on them.

/// Brew ratio (water:coffee) constants
pub mod ratio {
    /// Smallest selectable ratio (1:1)
    pub const MIN: u32 = 1;

    /// Largest selectable ratio (100:1)
    pub const MAX: u32 = 100;

    /// Ratio pre-selected before the user touches anything
    pub const DEFAULT: u32 = 18;
}

/// Calculator output precision
pub mod precision {
    /// Derived water is shown in whole grams
    pub const WATER_DECIMALS: usize = 0;

    /// Derived coffee is shown to a tenth of a gram
    pub const COFFEE_DECIMALS: usize = 1;
}

/// Timer cadence constants
pub mod timer {
    /// Wall-clock milliseconds per timer second at normal speed
    pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

    /// Fastest supported tick (used for accelerated playback)
    pub const MIN_TICK_INTERVAL_MS: u64 = 1;

    /// Slowest supported tick
    pub const MAX_TICK_INTERVAL_MS: u64 = 60_000;

    /// Seconds per minute, for MM:SS step entry and display
    pub const SECONDS_PER_MINUTE: u64 = 60;
}

/// Placeholders used when an error report cannot carry the real key or value
pub mod settings {
    /// Key reported when the offending key is not a valid settings key
    pub const UNKNOWN_KEY: &str = "unknown";

    /// Value reported when the offending value is too long to show
    pub const OVERSIZED_VALUE: &str = "<too long to show>";
}
