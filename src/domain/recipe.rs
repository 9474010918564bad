//! Recipe steps and the ordered step list
//!
//! A step's timing arrives either as a duration or as an absolute end
//! timestamp, depending on how the recipe is edited. A list holds one kind
//! only; the [`Timeline`] built from it is the single normalized form the
//! timer works from.

use crate::domain::parsing::{parse_count_or_zero, parse_step_water};
use crate::domain::timeline::Timeline;
use crate::domain::validation_constants::timer::SECONDS_PER_MINUTE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// How a recipe expresses step timing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingMode {
    /// Each step lasts N seconds; water is added during the step.
    #[default]
    Duration,
    /// Each step ends at an absolute second; water is the running total.
    Timestamp,
}

impl fmt::Display for TimingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duration => f.write_str("duration"),
            Self::Timestamp => f.write_str("timestamp"),
        }
    }
}

/// When a step ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepTiming {
    /// Seconds the step lasts
    Duration(u64),
    /// Seconds from recipe start at which the step ends
    EndsAt(u64),
}

impl StepTiming {
    /// Build from the MM and SS form fields; malformed parts count as 0.
    pub fn from_minutes_seconds(mode: TimingMode, minutes: &str, seconds: &str) -> Self {
        let total = parse_count_or_zero(minutes)
            .saturating_mul(SECONDS_PER_MINUTE)
            .saturating_add(parse_count_or_zero(seconds));
        match mode {
            TimingMode::Duration => Self::Duration(total),
            TimingMode::Timestamp => Self::EndsAt(total),
        }
    }

    pub fn mode(&self) -> TimingMode {
        match self {
            Self::Duration(_) => TimingMode::Duration,
            Self::EndsAt(_) => TimingMode::Timestamp,
        }
    }

    pub fn seconds(&self) -> u64 {
        match self {
            Self::Duration(seconds) | Self::EndsAt(seconds) => *seconds,
        }
    }

    /// Split into the (minutes, seconds) pair shown in the step editor
    pub fn minutes_seconds(&self) -> (u64, u64) {
        let seconds = self.seconds();
        (seconds / SECONDS_PER_MINUTE, seconds % SECONDS_PER_MINUTE)
    }
}

/// One phase of a pour-over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub timing: StepTiming,
    pub description: String,
    /// Grams added during this step (duration recipes) or poured in total by
    /// the end of it (timestamp recipes)
    pub water: Option<u32>,
    #[serde(skip)]
    sequence: u64,
}

impl RecipeStep {
    pub fn new(timing: StepTiming, description: impl Into<String>, water: Option<u32>) -> Self {
        Self {
            timing,
            description: description.into(),
            water,
            sequence: 0,
        }
    }

    /// Build from raw form field strings.
    pub fn from_fields(
        mode: TimingMode,
        minutes: &str,
        seconds: &str,
        description: &str,
        water: &str,
    ) -> Self {
        Self::new(
            StepTiming::from_minutes_seconds(mode, minutes, seconds),
            description,
            parse_step_water(water),
        )
    }
}

/// A single field change on an existing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEdit {
    Timing(StepTiming),
    Description(String),
    Water(Option<u32>),
}

/// Ordered steps of one recipe plus their derived timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepList {
    mode: TimingMode,
    steps: Vec<RecipeStep>,
    timeline: Timeline,
    next_sequence: u64,
}

impl StepList {
    pub fn new(mode: TimingMode) -> Self {
        Self {
            mode,
            steps: Vec::new(),
            timeline: Timeline::default(),
            next_sequence: 0,
        }
    }

    /// Build a list from steps in creation order.
    pub fn from_steps(
        mode: TimingMode,
        steps: impl IntoIterator<Item = RecipeStep>,
    ) -> Result<Self> {
        let mut list = Self::new(mode);
        for step in steps {
            list.push(step)?;
        }
        Ok(list)
    }

    pub fn mode(&self) -> TimingMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[RecipeStep] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&RecipeStep> {
        self.steps.get(index)
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Append a step and return the position it ends up at.
    ///
    /// A blank description becomes "Step N". Timestamp recipes re-sort, so
    /// the returned index may be earlier than the last.
    pub fn push(&mut self, mut step: RecipeStep) -> Result<usize> {
        self.ensure_mode(&step.timing)?;

        if step.description.is_empty() {
            step.description = format!("Step {}", self.steps.len() + 1);
        }
        step.sequence = self.next_sequence;
        self.next_sequence += 1;
        let sequence = step.sequence;

        self.steps.push(step);
        self.rebuild();

        let index = self
            .steps
            .iter()
            .position(|step| step.sequence == sequence)
            .unwrap_or(self.steps.len() - 1);
        debug!(index, steps = self.steps.len(), "Added step");
        Ok(index)
    }

    /// Apply an edit to one step.
    pub fn edit(&mut self, index: usize, edit: StepEdit) -> Result<()> {
        let len = self.steps.len();
        if let StepEdit::Timing(timing) = &edit {
            self.ensure_mode(timing)?;
        }
        let step = self
            .steps
            .get_mut(index)
            .ok_or_else(|| Error::step_out_of_range(index, len))?;

        match edit {
            StepEdit::Timing(timing) => step.timing = timing,
            StepEdit::Description(description) => step.description = description,
            StepEdit::Water(water) => step.water = water,
        }
        debug!(index, "Edited step");
        self.rebuild();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<RecipeStep> {
        if index >= self.steps.len() {
            return Err(Error::step_out_of_range(index, self.steps.len()));
        }
        let removed = self.steps.remove(index);
        debug!(index, steps = self.steps.len(), "Removed step");
        self.rebuild();
        Ok(removed)
    }

    fn ensure_mode(&self, timing: &StepTiming) -> Result<()> {
        if timing.mode() != self.mode {
            return Err(Error::MixedStepTiming {
                expected: self.mode,
                found: timing.mode(),
            });
        }
        Ok(())
    }

    fn rebuild(&mut self) {
        if self.mode == TimingMode::Timestamp {
            // Ties keep insertion order.
            self.steps
                .sort_by_key(|step| (step.timing.seconds(), step.sequence));
        }
        self.timeline = Timeline::from_steps(&self.steps);
    }
}

impl Default for StepList {
    fn default() -> Self {
        Self::new(TimingMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pour(seconds: u64, water: u32) -> RecipeStep {
        RecipeStep::new(StepTiming::Duration(seconds), "", Some(water))
    }

    fn at(seconds: u64, description: &str, total: u32) -> RecipeStep {
        RecipeStep::new(StepTiming::EndsAt(seconds), description, Some(total))
    }

    #[test]
    fn test_timing_from_form_fields() {
        assert_eq!(
            StepTiming::from_minutes_seconds(TimingMode::Duration, "1", "30"),
            StepTiming::Duration(90)
        );
        assert_eq!(
            StepTiming::from_minutes_seconds(TimingMode::Timestamp, "", "45"),
            StepTiming::EndsAt(45)
        );
        assert_eq!(
            StepTiming::from_minutes_seconds(TimingMode::Duration, "x", "y"),
            StepTiming::Duration(0)
        );
        assert_eq!(StepTiming::Duration(135).minutes_seconds(), (2, 15));
    }

    #[test]
    fn test_blank_description_gets_default_label() {
        let mut list = StepList::new(TimingMode::Duration);
        list.push(pour(30, 50)).unwrap();
        list.push(RecipeStep::new(StepTiming::Duration(10), "Swirl", None))
            .unwrap();
        list.push(pour(60, 150)).unwrap();

        let labels: Vec<&str> = list.steps().iter().map(|s| s.description.as_str()).collect();
        assert_eq!(labels, vec!["Step 1", "Swirl", "Step 3"]);
    }

    #[test]
    fn test_rejects_mixed_timing() {
        let mut list = StepList::new(TimingMode::Duration);
        let err = list.push(at(30, "Bloom", 50)).unwrap_err();
        assert!(matches!(err, Error::MixedStepTiming { .. }));

        list.push(pour(30, 50)).unwrap();
        let err = list
            .edit(0, StepEdit::Timing(StepTiming::EndsAt(10)))
            .unwrap_err();
        assert!(matches!(err, Error::MixedStepTiming { .. }));
    }

    #[test]
    fn test_timestamp_steps_sort_with_insertion_tiebreak() {
        let mut list = StepList::new(TimingMode::Timestamp);
        list.push(at(90, "Final", 300)).unwrap();
        list.push(at(30, "Bloom", 50)).unwrap();
        list.push(at(30, "Stir", 50)).unwrap();
        let index = list.push(at(60, "Second", 200)).unwrap();

        let labels: Vec<&str> = list.steps().iter().map(|s| s.description.as_str()).collect();
        assert_eq!(labels, vec!["Bloom", "Stir", "Second", "Final"]);
        assert_eq!(index, 2);
    }

    #[test]
    fn test_timestamp_edit_resorts() {
        let mut list = StepList::new(TimingMode::Timestamp);
        list.push(at(30, "Bloom", 50)).unwrap();
        list.push(at(60, "Second", 200)).unwrap();
        list.edit(0, StepEdit::Timing(StepTiming::EndsAt(75)))
            .unwrap();

        assert_eq!(list.steps()[0].description, "Second");
        assert_eq!(list.steps()[1].description, "Bloom");
    }

    #[test]
    fn test_edit_and_remove_out_of_range() {
        let mut list = StepList::new(TimingMode::Duration);
        list.push(pour(30, 50)).unwrap();
        assert!(matches!(
            list.edit(3, StepEdit::Water(None)),
            Err(Error::StepOutOfRange { index: 3, len: 1 })
        ));
        assert!(list.remove(1).is_err());
        assert!(list.remove(0).is_ok());
        assert!(list.is_empty());
    }

    #[test]
    fn test_edits_rebuild_timeline() {
        let mut list = StepList::from_steps(TimingMode::Duration, [pour(30, 50), pour(60, 150)])
            .unwrap();
        assert_eq!(list.timeline().total_duration(), 90);
        assert_eq!(list.timeline().total_water(), 200);

        list.edit(1, StepEdit::Water(Some(100))).unwrap();
        list.edit(0, StepEdit::Timing(StepTiming::Duration(45)))
            .unwrap();
        assert_eq!(list.timeline().total_duration(), 105);
        assert_eq!(list.timeline().total_water(), 150);
    }

    #[test]
    fn test_from_fields_parses_water() {
        let step = RecipeStep::from_fields(TimingMode::Duration, "0", "45", "Bloom", "");
        assert_eq!(step.water, None);
        assert_eq!(step.timing, StepTiming::Duration(45));

        let step = RecipeStep::from_fields(TimingMode::Duration, "1", "0", "Pour", "120");
        assert_eq!(step.water, Some(120));
    }
}
