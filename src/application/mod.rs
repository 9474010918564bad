//! Application services and playback orchestration
//!
//! This module drives the pure domain types on tokio: the brew session owns
//! a step timer and its ticker tasks, and the application wires settings,
//! recipe files, and playback together.

pub mod app;
pub mod session;

pub use app::{Application, PlaybackSummary};
pub use session::{BrewSession, Command};
