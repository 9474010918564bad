//! Step timer state machine
//!
//! The timer counts elapsed seconds up from zero across the whole recipe.
//! Two repeating timers drive it: a fixed tick that advances the clock one
//! second at a time, and a per-step grams timer whose period is chosen so
//! that the poured-grams gauge moves one gram per firing and lands on the
//! step's total exactly when the step ends.
//!
//! This type holds no clock of its own. It describes which timers should
//! exist as [`TimerHandle`]s, and whoever schedules them feeds firings back
//! through [`StepTimer::on_tick`] and [`StepTimer::on_grams_tick`]. A firing
//! whose handle has since been replaced is ignored.

use crate::domain::display::{format_time, grams_label};
use crate::domain::recipe::{RecipeStep, StepEdit, StepList, TimingMode};
use crate::domain::timeline::Timeline;
use crate::domain::types::TickInterval;
use crate::error::Result;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Shortest grams period handed to a scheduler
const MIN_GRAMS_PERIOD: Duration = Duration::from_micros(1);

/// Identity of one scheduled repeating timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerId(u64);

/// A repeating timer that should currently be running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerHandle {
    pub id: TimerId,
    pub period: Duration,
}

/// Bookkeeping for the grams timer of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GramsTimer {
    pub handle: TimerHandle,
    pub step: usize,
    /// Cumulative grams at the end of the step
    pub target: u32,
    /// How far into the step the timer was started
    offset: Duration,
    /// Scheduled length of the step
    step_length: Duration,
    fired: u32,
}

impl GramsTimer {
    /// Time into the step, measured on this timer's own schedule
    pub fn elapsed_in_step(&self) -> Duration {
        self.offset + self.handle.period.saturating_mul(self.fired)
    }
}

/// `base * numerator / denominator`, saturating at `u64::MAX` nanoseconds
fn scale_duration(base: Duration, numerator: u128, denominator: u128) -> Duration {
    let nanos = base.as_nanos().saturating_mul(numerator) / denominator.max(1);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Cancel whatever occupies `slot` and install `next`, returning the
/// cancelled timer.
pub fn replace_timer<T>(slot: &mut Option<T>, next: Option<T>) -> Option<T> {
    std::mem::replace(slot, next)
}

/// Mutable playback state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerState {
    pub is_running: bool,
    /// Elapsed seconds from recipe start
    pub current_time: u64,
    pub current_step: usize,
    pub accumulated_grams: u32,
    tick_timer: Option<TimerHandle>,
    grams_timer: Option<GramsTimer>,
}

impl TimerState {
    pub fn tick_timer(&self) -> Option<TimerHandle> {
        self.tick_timer
    }

    pub fn grams_timer(&self) -> Option<&GramsTimer> {
        self.grams_timer.as_ref()
    }

    fn cancel_timers(&mut self) {
        replace_timer(&mut self.tick_timer, None);
        replace_timer(&mut self.grams_timer, None);
    }
}

/// What a UI needs to render the timer after any change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub current_time: u64,
    pub active_step: usize,
    pub accumulated_grams: u32,
    pub is_running: bool,
    pub step_count: usize,
    pub total_time: u64,
    pub total_grams: u32,
}

impl TimerSnapshot {
    /// Elapsed time as "MM:SS"
    pub fn elapsed_label(&self) -> String {
        format_time(self.current_time)
    }

    /// Grams poured as "125g"
    pub fn grams_label(&self) -> String {
        grams_label(self.accumulated_grams)
    }

    pub fn can_go_previous(&self) -> bool {
        self.step_count > 0 && self.active_step > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.step_count > 0 && self.active_step + 1 < self.step_count
    }

    pub fn is_finished(&self) -> bool {
        self.step_count > 0 && !self.is_running && self.current_time >= self.total_time
    }
}

/// Playback engine for one recipe
#[derive(Debug, Clone)]
pub struct StepTimer {
    steps: StepList,
    state: TimerState,
    tick_interval: TickInterval,
    next_timer_id: u64,
}

impl StepTimer {
    pub fn new(mode: TimingMode, tick_interval: TickInterval) -> Self {
        Self::with_steps(StepList::new(mode), tick_interval)
    }

    pub fn with_steps(steps: StepList, tick_interval: TickInterval) -> Self {
        Self {
            steps,
            state: TimerState::default(),
            tick_interval,
            next_timer_id: 0,
        }
    }

    pub fn steps(&self) -> &StepList {
        &self.steps
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn tick_interval(&self) -> TickInterval {
        self.tick_interval
    }

    fn timeline(&self) -> &Timeline {
        self.steps.timeline()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            current_time: self.state.current_time,
            active_step: self.state.current_step,
            accumulated_grams: self.state.accumulated_grams,
            is_running: self.state.is_running,
            step_count: self.steps.len(),
            total_time: self.timeline().total_duration(),
            total_grams: self.timeline().total_water(),
        }
    }

    /// Closed-form grams poured at the current elapsed time
    pub fn calculate_accumulated_grams(&self) -> u32 {
        self.timeline().accumulated_grams_at(self.state.current_time)
    }

    /// Start or pause. With no steps this does nothing and returns false.
    pub fn toggle_play_pause(&mut self) -> bool {
        if self.steps.is_empty() {
            info!("No steps available to start timer");
            return false;
        }

        if self.state.is_running {
            self.pause();
        } else {
            if self.timeline().is_finished_at(self.state.current_time) {
                debug!("Recipe already finished, starting over");
                self.state.current_time = 0;
                self.state.current_step = 0;
            }
            info!(current_time = self.state.current_time, "Starting timer");
            self.start();
        }
        true
    }

    fn start(&mut self) {
        let last = self.steps.len().saturating_sub(1);
        self.state.current_step = self.state.current_step.min(last);
        self.state.accumulated_grams = self.calculate_accumulated_grams();
        self.state.is_running = true;

        let tick = self.new_handle(self.tick_interval.as_duration());
        replace_timer(&mut self.state.tick_timer, Some(tick));
        self.start_grams_interval(self.state.current_step);
    }

    /// Pause if running. Returns false when already paused.
    pub fn pause(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }
        info!(current_time = self.state.current_time, "Pausing timer");
        self.stop_playback();
        true
    }

    fn stop_playback(&mut self) {
        self.state.cancel_timers();
        self.state.is_running = false;
    }

    /// One second of playback has passed.
    ///
    /// Returns false when `id` is not the live tick timer.
    pub fn on_tick(&mut self, id: TimerId) -> bool {
        if self.state.tick_timer.map(|tick| tick.id) != Some(id) {
            return false;
        }

        if self.state.current_time >= self.timeline().total_duration() {
            self.finish();
            return true;
        }

        self.state.current_time += 1;
        if self.state.current_time >= self.timeline().total_duration() {
            self.finish();
            return true;
        }

        let active = self.timeline().active_step_at(self.state.current_time);
        if active != self.state.current_step {
            debug!(
                from = self.state.current_step,
                to = active,
                current_time = self.state.current_time,
                "Step boundary crossed"
            );
            self.state.current_step = active;
            self.start_grams_interval(active);
        }
        true
    }

    /// The grams timer fired: one more gram is poured.
    ///
    /// Returns false when `id` is not the live grams timer.
    pub fn on_grams_tick(&mut self, id: TimerId) -> bool {
        let Some(grams) = self.state.grams_timer.as_mut() else {
            return false;
        };
        if grams.handle.id != id {
            return false;
        }

        grams.fired += 1;
        let grams = *grams;
        self.state.accumulated_grams = (self.state.accumulated_grams + 1).min(grams.target);

        let step_done = self.state.accumulated_grams >= grams.target
            || grams.elapsed_in_step() >= grams.step_length;
        if step_done {
            self.state.accumulated_grams = grams.target;
            replace_timer(&mut self.state.grams_timer, None);
            if self.state.is_running {
                self.start_grams_interval(grams.step + 1);
            }
        }
        true
    }

    /// (Re)start the grams timer for `step`.
    fn start_grams_interval(&mut self, step: usize) {
        replace_timer(&mut self.state.grams_timer, None);

        let Some(entry) = self.timeline().entry(step).copied() else {
            return;
        };
        let closed_form = self.calculate_accumulated_grams();

        if entry.increment() == 0 || entry.duration() == 0 {
            self.state.accumulated_grams = self.state.accumulated_grams.max(entry.water_end);
            return;
        }

        self.state.accumulated_grams = self.state.accumulated_grams.max(closed_form);
        if self.state.accumulated_grams >= entry.water_end {
            return;
        }

        let tick = self.tick_interval.as_duration();
        let within = self
            .state
            .current_time
            .saturating_sub(entry.start)
            .min(entry.duration());
        let period = scale_duration(
            tick,
            u128::from(entry.duration()),
            u128::from(entry.increment()),
        )
        .max(MIN_GRAMS_PERIOD);

        let handle = self.new_handle(period);
        debug!(
            step,
            period_ms = period.as_secs_f64() * 1000.0,
            target = entry.water_end,
            "Starting grams interval"
        );
        replace_timer(
            &mut self.state.grams_timer,
            Some(GramsTimer {
                handle,
                step,
                target: entry.water_end,
                offset: scale_duration(tick, u128::from(within), 1),
                step_length: scale_duration(tick, u128::from(entry.duration()), 1),
                fired: 0,
            }),
        );
    }

    fn finish(&mut self) {
        self.state.cancel_timers();
        self.state.is_running = false;
        self.state.current_time = self.timeline().total_duration();
        self.state.current_step = self.steps.len().saturating_sub(1);
        self.state.accumulated_grams = self.timeline().total_water();
        info!(
            total_time = self.state.current_time,
            total_grams = self.state.accumulated_grams,
            "All steps completed"
        );
    }

    /// Jump to the start of the next step. No-op on the last step.
    pub fn next_step(&mut self) -> bool {
        if self.state.current_step + 1 >= self.steps.len() {
            return false;
        }
        self.navigate_to(self.state.current_step + 1);
        true
    }

    /// Jump to the start of the previous step. No-op on the first step.
    pub fn previous_step(&mut self) -> bool {
        if self.state.current_step == 0 || self.steps.is_empty() {
            return false;
        }
        self.navigate_to(self.state.current_step - 1);
        true
    }

    fn navigate_to(&mut self, step: usize) {
        let was_running = self.state.is_running;
        self.stop_playback();

        self.state.current_step = step;
        self.state.current_time = self.timeline().step_start(step);
        self.state.accumulated_grams = self.calculate_accumulated_grams();
        info!(
            step,
            current_time = self.state.current_time,
            description = self.steps.get(step).map(|s| s.description.as_str()),
            "Moved to step"
        );

        if was_running {
            self.start();
        }
    }

    /// Stop and rewind to the beginning.
    pub fn reset(&mut self) {
        self.state.cancel_timers();
        self.state.is_running = false;
        self.state.current_step = 0;
        self.state.current_time = 0;
        self.state.accumulated_grams = 0;
        debug!("Reset timer");
    }

    /// Add a step without interrupting playback.
    pub fn add_step(&mut self, step: RecipeStep) -> Result<usize> {
        let index = self.steps.push(step)?;

        if self.state.current_time > 0 {
            let active = self.timeline().active_step_at(self.state.current_time);
            if active != self.state.current_step {
                self.state.current_step = active;
                if self.state.is_running {
                    self.start_grams_interval(active);
                }
            }
        }
        info!(index, steps = self.steps.len(), "Added step");
        Ok(index)
    }

    /// Edit one step; playback restarts from the beginning.
    pub fn edit_step(&mut self, index: usize, edit: StepEdit) -> Result<()> {
        self.steps.edit(index, edit)?;
        info!(index, "Step edited, resetting playback");
        self.reset();
        Ok(())
    }

    /// Remove one step, shifting the current step down if it sat at or
    /// after the removed one. Playback stops at the start of that step.
    pub fn remove_step(&mut self, index: usize) -> Result<RecipeStep> {
        let removed = self.steps.remove(index)?;
        self.stop_playback();

        if self.state.current_step >= index {
            self.state.current_step = self.state.current_step.saturating_sub(1);
        }
        if self.steps.is_empty() {
            self.state.current_step = 0;
            self.state.current_time = 0;
            self.state.accumulated_grams = 0;
        } else {
            self.state.current_step = self.state.current_step.min(self.steps.len() - 1);
            self.state.current_time = self.timeline().step_start(self.state.current_step);
            self.state.accumulated_grams = self.calculate_accumulated_grams();
        }
        info!(index, steps = self.steps.len(), "Removed step");
        Ok(removed)
    }

    /// Swap in a whole new recipe (e.g. a loaded shared recipe).
    pub fn replace_steps(&mut self, steps: StepList) {
        self.steps = steps;
        self.reset();
    }

    fn new_handle(&mut self, period: Duration) -> TimerHandle {
        self.next_timer_id += 1;
        TimerHandle {
            id: TimerId(self.next_timer_id),
            period,
        }
    }
}
