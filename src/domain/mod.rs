//! Domain types and brewing logic for the coffee calculator
//!
//! Everything here is synchronous and free of I/O: the ratio calculator,
//! recipe steps, the normalized timeline, and the step timer state machine.
//! Scheduling real timers is left to the application layer.

pub mod calculator;
pub mod display;
pub mod parsing;
pub mod recipe;
pub mod shared_recipe;
pub mod timeline;
pub mod timer;
pub mod types;
pub mod validation_constants;

pub use calculator::{CalculatorField, Derivation, RatioCalculator, RatioInputs, TouchHistory};
pub use display::{format_time, step_details, step_indicator, ControlState};
pub use recipe::{RecipeStep, StepEdit, StepList, StepTiming, TimingMode};
pub use shared_recipe::{LoadedRecipe, RecipeData, RecipeMetadata, SharedStep};
pub use timeline::{Timeline, TimelineEntry};
pub use timer::{StepTimer, TimerHandle, TimerId, TimerSnapshot, TimerState};
pub use types::{Ratio, SettingKey, SettingValue, TickInterval};
