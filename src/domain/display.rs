//! Text shown next to the timer

use crate::domain::recipe::StepList;
use crate::domain::timer::TimerSnapshot;
use crate::domain::validation_constants::timer::SECONDS_PER_MINUTE;
use serde::Serialize;

/// Seconds as "MM:SS". Minutes keep counting past 59.
pub fn format_time(seconds: u64) -> String {
    format!(
        "{:02}:{:02}",
        seconds / SECONDS_PER_MINUTE,
        seconds % SECONDS_PER_MINUTE
    )
}

pub fn grams_label(grams: u32) -> String {
    format!("{grams}g")
}

/// "Step 2 of 4 - Bloom", or "No steps added" for an empty recipe
pub fn step_indicator(steps: &StepList, index: usize) -> String {
    if steps.is_empty() {
        return "No steps added".to_string();
    }
    let position = index.min(steps.len() - 1);
    let description = steps
        .get(position)
        .map(|step| step.description.as_str())
        .unwrap_or_default();

    if description.is_empty() {
        format!("Step {} of {}", position + 1, steps.len())
    } else {
        format!("Step {} of {} - {}", position + 1, steps.len(), description)
    }
}

/// Pouring instruction for one step; `None` when the step pours nothing.
pub fn step_details(steps: &StepList, index: usize) -> Option<String> {
    let step = steps.get(index)?;
    let water = step.water?;
    Some(format!(
        "Step {} - Add {}g of water to {} for {}",
        index + 1,
        water,
        step.description,
        format_time(step.timing.seconds())
    ))
}

/// Which timer controls a UI should offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub visible: bool,
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

impl From<&TimerSnapshot> for ControlState {
    fn from(snapshot: &TimerSnapshot) -> Self {
        Self {
            visible: snapshot.step_count > 0,
            previous_enabled: snapshot.can_go_previous(),
            next_enabled: snapshot.can_go_next(),
        }
    }
}
