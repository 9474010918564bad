use crate::application::session::BrewSession;
use crate::config::Settings;
use crate::domain::calculator::{CalculatorField, RatioCalculator};
use crate::domain::display::{format_time, step_details, step_indicator};
use crate::domain::recipe::StepList;
use crate::domain::shared_recipe::{LoadedRecipe, RecipeData};
use crate::domain::timer::{StepTimer, TimerSnapshot};
use crate::Result;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Outcome of playing one recipe to the end
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSummary {
    pub steps: usize,
    pub total_time: u64,
    pub total_grams: u32,
    /// Snapshots observed while playing
    pub updates: usize,
    pub final_snapshot: TimerSnapshot,
}

/// Main application struct that coordinates all components
#[derive(Debug)]
pub struct Application {
    settings: Settings,
}

impl Application {
    #[instrument]
    pub fn new() -> Result<Self> {
        let settings = Settings::new()?;
        Self::with_settings(settings)
    }

    /// Build from already-loaded settings, validating the ones the
    /// domain depends on.
    pub fn with_settings(settings: Settings) -> Result<Self> {
        settings.tick_interval()?;
        settings.default_ratio()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read a shared recipe document from disk.
    #[instrument(skip(self))]
    pub async fn load_recipe(&self, path: &Path) -> Result<LoadedRecipe> {
        let json = tokio::fs::read_to_string(path).await?;
        let recipe = RecipeData::from_json(&json)?
            .load_as(self.settings.timer.timing_mode, self.settings.default_ratio()?)?;
        info!(
            path = %path.display(),
            steps = recipe.steps.len(),
            "Loaded recipe"
        );
        Ok(recipe)
    }

    /// Play the recipe at `path` (or the configured one) to completion.
    #[instrument(skip(self))]
    pub async fn run(self, path: Option<&Path>) -> Result<Option<PlaybackSummary>> {
        let Some(path) = path.or(self.settings.playback.recipe_path.as_deref()) else {
            warn!("No recipe given; pass a recipe file or set playback.recipe_path");
            return Ok(None);
        };

        let mut recipe = self.load_recipe(path).await?;
        self.report_calculator(&mut recipe.calculator);
        self.report_recipe(&recipe.steps);

        let summary = self.play(recipe.steps).await?;
        info!(
            total_time = %format_time(summary.total_time),
            total_grams = summary.total_grams,
            "Brew complete"
        );
        Ok(Some(summary))
    }

    /// Run a step list through a brew session until it stops.
    pub async fn play(&self, steps: StepList) -> Result<PlaybackSummary> {
        let step_count = steps.len();
        let labels = steps.clone();
        let timer = StepTimer::with_steps(steps, self.settings.tick_interval()?);
        let session = BrewSession::spawn(timer);
        let mut updates = session.subscribe();

        let mut snapshot = session.toggle_play_pause().await?;
        let mut seen = 0;
        let mut last_step = None;

        while snapshot.is_running {
            if updates.changed().await.is_err() {
                break;
            }
            snapshot = updates.borrow_and_update().clone();
            seen += 1;

            if last_step != Some(snapshot.active_step) {
                last_step = Some(snapshot.active_step);
                info!(
                    elapsed = %snapshot.elapsed_label(),
                    "{}",
                    step_indicator(&labels, snapshot.active_step)
                );
            }
            debug!(
                elapsed = %snapshot.elapsed_label(),
                grams = %snapshot.grams_label(),
                "Tick"
            );
        }

        session.shutdown().await;
        Ok(PlaybackSummary {
            steps: step_count,
            total_time: snapshot.total_time,
            total_grams: snapshot.total_grams,
            updates: seen,
            final_snapshot: snapshot,
        })
    }

    /// Fill in the missing calculator field when exactly two are given.
    fn report_calculator(&self, calculator: &mut RatioCalculator) {
        let given: Vec<CalculatorField> = CalculatorField::ALL
            .into_iter()
            .filter(|field| !calculator.value(*field).trim().is_empty())
            .collect();
        if let [first, second] = given[..] {
            for field in [first, second] {
                let value = calculator.value(field).to_string();
                calculator.touch(field, value);
            }
        }
        let ratio = calculator
            .ratio()
            .map(|ratio| ratio.label())
            .unwrap_or_default();
        let inputs = calculator.inputs();
        info!(
            water = %inputs.water,
            coffee = %inputs.coffee,
            %ratio,
            "Calculator"
        );
    }

    fn report_recipe(&self, steps: &StepList) {
        let timeline = steps.timeline();
        info!(
            steps = steps.len(),
            total_time = %format_time(timeline.total_duration()),
            total_grams = timeline.total_water(),
            "Recipe"
        );
        for index in 0..steps.len() {
            if let Some(details) = step_details(steps, index) {
                info!("{}", details);
            }
        }
    }
}
