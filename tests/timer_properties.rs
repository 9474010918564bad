//! Property-based tests for calculator and step timer invariants
//!
//! The step timer is driven by a small discrete-event scheduler that fires
//! the tick and grams timers at the periods the engine asks for, so the
//! interplay of the two timers is exercised without a runtime.

use coffee_calc::domain::{
    CalculatorField, RatioCalculator, RatioInputs, RecipeStep, StepList, StepTimer, StepTiming,
    TickInterval, TimerHandle, TimerId, TimingMode, TouchHistory,
};
use proptest::prelude::*;

pub mod generators {
    use super::*;
    use proptest::collection::vec;

    pub fn field() -> impl Strategy<Value = CalculatorField> {
        prop_oneof![
            Just(CalculatorField::Water),
            Just(CalculatorField::Coffee),
            Just(CalculatorField::Ratio),
        ]
    }

    prop_compose! {
        /// A duration step of up to two minutes pouring up to 400g
        pub fn duration_step()(seconds in 0u64..120, water in proptest::option::of(0u32..400))
            -> RecipeStep {
            RecipeStep::new(StepTiming::Duration(seconds), "", water)
        }
    }

    /// A recipe with at least one step of non-zero length
    pub fn recipe() -> impl Strategy<Value = StepList> {
        vec(duration_step(), 1..6)
            .prop_map(|steps| StepList::from_steps(TimingMode::Duration, steps).unwrap())
            .prop_filter("recipe needs a running time", |list| {
                list.timeline().total_duration() > 0
            })
    }
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    id: TimerId,
    period: u128,
    next: u128,
}

fn reschedule(slot: &mut Option<Scheduled>, wanted: Option<TimerHandle>, now: u128) {
    if slot.map(|s| s.id) == wanted.map(|h| h.id) {
        return;
    }
    *slot = wanted.map(|handle| {
        let period = handle.period.as_nanos();
        Scheduled {
            id: handle.id,
            period,
            next: now + period,
        }
    });
}

/// Observations made while playing a recipe to the end
#[derive(Debug, Default)]
struct Playback {
    /// (current_time, accumulated_grams) after every event
    samples: Vec<(u64, u32)>,
    /// (current_time, accumulated_grams) whenever the active step changed
    boundaries: Vec<(u64, u32)>,
}

/// Fire both timers in time order until playback stops.
///
/// `grams_first` decides which timer goes first when both are due at the
/// same instant.
fn play(timer: &mut StepTimer, grams_first: bool) -> Playback {
    let mut playback = Playback::default();
    let mut now = 0u128;
    let mut tick: Option<Scheduled> = None;
    let mut grams: Option<Scheduled> = None;

    assert!(timer.toggle_play_pause());
    reschedule(&mut tick, timer.state().tick_timer(), now);
    reschedule(
        &mut grams,
        timer.state().grams_timer().map(|g| g.handle),
        now,
    );

    for _ in 0..1_000_000 {
        if !timer.state().is_running {
            break;
        }
        let due_tick = tick.map_or(u128::MAX, |s| s.next);
        let due_grams = grams.map_or(u128::MAX, |s| s.next);
        let fire_grams = due_grams < due_tick || (due_grams == due_tick && grams_first);

        let step_before = timer.state().current_step;
        if fire_grams {
            let scheduled = grams.as_mut().unwrap();
            now = scheduled.next;
            scheduled.next += scheduled.period;
            timer.on_grams_tick(scheduled.id);
        } else {
            let scheduled = tick.as_mut().unwrap();
            now = scheduled.next;
            scheduled.next += scheduled.period;
            timer.on_tick(scheduled.id);
        }

        let state = timer.state();
        playback
            .samples
            .push((state.current_time, state.accumulated_grams));
        if !fire_grams && state.current_step != step_before && state.is_running {
            playback
                .boundaries
                .push((state.current_time, state.accumulated_grams));
        }

        reschedule(&mut tick, timer.state().tick_timer(), now);
        reschedule(
            &mut grams,
            timer.state().grams_timer().map(|g| g.handle),
            now,
        );
    }

    playback
}

proptest! {
    #[test]
    fn touch_history_never_exceeds_two(fields in proptest::collection::vec(generators::field(), 0..30)) {
        let mut history = TouchHistory::new();
        for field in &fields {
            history.record(*field);
            prop_assert!(history.len() <= TouchHistory::CAPACITY);
            prop_assert_eq!(history.as_slice().last(), Some(field));
        }
        if history.len() == 2 {
            prop_assert_ne!(history.as_slice()[0], history.as_slice()[1]);
        }
    }

    #[test]
    fn coffee_is_water_over_ratio(water in 1u32..3000, ratio in 1u32..=100) {
        let mut calculator = RatioCalculator::new();
        calculator.touch(CalculatorField::Water, water.to_string());
        let derived = calculator
            .touch(CalculatorField::Ratio, ratio.to_string())
            .unwrap();

        prop_assert_eq!(derived.field, CalculatorField::Coffee);
        let coffee: f64 = derived.value.parse().unwrap();
        let exact = f64::from(water) / f64::from(ratio);
        prop_assert!((coffee - exact).abs() <= 0.05 + 1e-9);
    }

    #[test]
    fn water_is_coffee_times_ratio(tenths in 1u32..1000, ratio in 1u32..=100) {
        let coffee = format!("{}.{}", tenths / 10, tenths % 10);
        let mut calculator = RatioCalculator::new();
        calculator.touch(CalculatorField::Coffee, coffee.clone());
        let derived = calculator
            .touch(CalculatorField::Ratio, ratio.to_string())
            .unwrap();

        prop_assert_eq!(derived.field, CalculatorField::Water);
        let expected = (coffee.parse::<f64>().unwrap() * f64::from(ratio)).round();
        prop_assert_eq!(derived.value, format!("{expected}"));
    }

    #[test]
    fn derived_ratio_stays_in_range(water in 1u32..5000, coffee in 1u32..200) {
        let mut calculator = RatioCalculator::from_inputs(RatioInputs::default());
        calculator.touch(CalculatorField::Water, water.to_string());
        calculator.touch(CalculatorField::Coffee, coffee.to_string());

        let implied = (f64::from(water) / f64::from(coffee)).round();
        let shown = calculator.value(CalculatorField::Ratio);
        if (1.0..=100.0).contains(&implied) {
            prop_assert_eq!(shown, format!("{implied}"));
        } else {
            prop_assert_eq!(shown, "18");
        }
    }

    #[test]
    fn grams_match_closed_form_at_boundaries(steps in generators::recipe(), grams_first in any::<bool>()) {
        let timeline = steps.timeline().clone();
        let mut timer = StepTimer::with_steps(steps, TickInterval::real_time());
        let playback = play(&mut timer, grams_first);

        for (time, grams) in playback.boundaries {
            prop_assert_eq!(grams, timeline.accumulated_grams_at(time));
        }
    }

    #[test]
    fn playback_is_monotonic_and_clamped(steps in generators::recipe(), grams_first in any::<bool>()) {
        let total_time = steps.timeline().total_duration();
        let total_water = steps.timeline().total_water();
        let mut timer = StepTimer::with_steps(steps, TickInterval::real_time());
        let playback = play(&mut timer, grams_first);

        for pair in playback.samples.windows(2) {
            prop_assert!(pair[1].0 >= pair[0].0, "time went backwards: {:?}", pair);
            prop_assert!(pair[1].1 >= pair[0].1, "grams went backwards: {:?}", pair);
        }
        prop_assert!(playback.samples.iter().all(|(_, grams)| *grams <= total_water));

        let state = timer.state();
        prop_assert!(!state.is_running);
        prop_assert_eq!(state.current_time, total_time);
        prop_assert_eq!(state.accumulated_grams, total_water);
    }

    #[test]
    fn reset_is_idempotent(steps in generators::recipe(), ticks in 0usize..200) {
        let mut timer = StepTimer::with_steps(steps, TickInterval::real_time());
        timer.toggle_play_pause();
        for _ in 0..ticks {
            match timer.state().tick_timer() {
                Some(handle) => {
                    timer.on_tick(handle.id);
                }
                None => break,
            }
        }

        timer.reset();
        let once = timer.state().clone();
        timer.reset();
        prop_assert_eq!(timer.state(), &once);
        prop_assert_eq!(once.current_time, 0);
        prop_assert_eq!(once.current_step, 0);
        prop_assert_eq!(once.accumulated_grams, 0);
        prop_assert!(!once.is_running);
    }
}
