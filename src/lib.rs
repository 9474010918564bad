//! Coffee Calc - a brew ratio calculator and pour-over step timer
//!
//! The calculator derives the missing one of water, coffee, and ratio from
//! the two most recently edited fields. The step timer plays a recipe back
//! second by second, tracking the active step and interpolating how many
//! grams of water should have been poured so far.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;

pub use application::{Application, BrewSession, PlaybackSummary};
pub use error::{Error, Result};
