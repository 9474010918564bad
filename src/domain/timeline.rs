//! Normalized step timeline
//!
//! Every step, whichever way its timing was entered, becomes an entry with
//! an absolute start/end second and the cumulative water poured at either
//! edge. Step-boundary detection and the closed-form grams calculation
//! both read this one representation.

use crate::domain::recipe::{RecipeStep, StepTiming};
use serde::Serialize;

/// Absolute span of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    /// Cumulative start second (end of the previous step)
    pub start: u64,
    /// Cumulative end second
    pub end: u64,
    /// Grams poured when the step begins
    pub water_start: u32,
    /// Grams poured when the step ends
    pub water_end: u32,
}

impl TimelineEntry {
    pub fn duration(&self) -> u64 {
        self.end - self.start
    }

    /// Grams this step adds
    pub fn increment(&self) -> u32 {
        self.water_end - self.water_start
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Normalize steps that are already in playback order.
    ///
    /// Timestamps earlier than the previous end are lifted to it, and a
    /// cumulative water total never drops below the previous one (a step
    /// with no water keeps the previous total).
    pub fn from_steps(steps: &[RecipeStep]) -> Self {
        let mut entries = Vec::with_capacity(steps.len());
        let mut elapsed = 0u64;
        let mut poured = 0u32;

        for step in steps {
            let (end, water_end) = match step.timing {
                StepTiming::Duration(seconds) => (
                    elapsed.saturating_add(seconds),
                    poured.saturating_add(step.water.unwrap_or(0)),
                ),
                StepTiming::EndsAt(timestamp) => (
                    timestamp.max(elapsed),
                    step.water.map_or(poured, |total| total.max(poured)),
                ),
            };
            entries.push(TimelineEntry {
                start: elapsed,
                end,
                water_start: poured,
                water_end,
            });
            elapsed = end;
            poured = water_end;
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&TimelineEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_duration(&self) -> u64 {
        self.entries.last().map_or(0, |entry| entry.end)
    }

    pub fn total_water(&self) -> u32 {
        self.entries.last().map_or(0, |entry| entry.water_end)
    }

    /// Cumulative second at which step `index` begins
    pub fn step_start(&self, index: usize) -> u64 {
        self.entries.get(index).map_or(0, |entry| entry.start)
    }

    /// Whether `time` has reached the end of a non-empty recipe
    pub fn is_finished_at(&self, time: u64) -> bool {
        !self.entries.is_empty() && time >= self.total_duration()
    }

    /// The first step whose end lies after `time`; the last step once the
    /// recipe is over, and 0 for an empty recipe.
    pub fn active_step_at(&self, time: u64) -> usize {
        self.entries
            .iter()
            .position(|entry| entry.end > time)
            .unwrap_or_else(|| self.entries.len().saturating_sub(1))
    }

    /// Grams poured at `time`: every completed step's water plus the
    /// floored proportional share of the active step.
    pub fn accumulated_grams_at(&self, time: u64) -> u32 {
        if self.is_finished_at(time) || self.entries.is_empty() {
            return self.total_water();
        }

        let entry = &self.entries[self.active_step_at(time)];
        let duration = entry.duration();
        if duration == 0 {
            return entry.water_start;
        }
        let within = time.saturating_sub(entry.start).min(duration);
        let share = u64::from(entry.increment()) * within / duration;
        entry.water_start + share as u32
    }
}
