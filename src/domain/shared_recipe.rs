//! Shareable recipe document
//!
//! Calculator values, brew metadata, and steps travel as one JSON document
//! whose fields are all strings, exactly as they sit in the form. Loading
//! writes the non-empty calculator values over the defaults without
//! recording touches, then adds the steps in document order.

use crate::domain::calculator::{CalculatorField, RatioCalculator, RatioInputs};
use crate::domain::recipe::{RecipeStep, StepList, TimingMode};
use crate::domain::types::Ratio;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Free-form brew notes carried alongside the recipe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeMetadata {
    /// Grind size in microns
    pub grind_size: String,
    /// Water temperature in °C
    pub water_temp: String,
    pub notes: String,
}

/// One step as entered in the step form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedStep {
    pub water: String,
    pub description: String,
    pub minutes: String,
    pub seconds: String,
}

impl SharedStep {
    pub fn capture(step: &RecipeStep) -> Self {
        let (minutes, seconds) = step.timing.minutes_seconds();
        Self {
            water: step.water.map(|grams| grams.to_string()).unwrap_or_default(),
            description: step.description.clone(),
            minutes: minutes.to_string(),
            seconds: seconds.to_string(),
        }
    }

    pub fn to_step(&self, mode: TimingMode) -> RecipeStep {
        RecipeStep::from_fields(
            mode,
            &self.minutes,
            &self.seconds,
            &self.description,
            &self.water,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeData {
    pub calculator: RatioInputs,
    pub metadata: RecipeMetadata,
    pub steps: Vec<SharedStep>,
    /// Absent in documents written by the browser form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_mode: Option<TimingMode>,
}

/// A shared recipe turned back into working state
#[derive(Debug, Clone)]
pub struct LoadedRecipe {
    pub calculator: RatioCalculator,
    pub metadata: RecipeMetadata,
    pub steps: StepList,
}

impl RecipeData {
    pub fn capture(
        calculator: &RatioCalculator,
        metadata: &RecipeMetadata,
        steps: &StepList,
    ) -> Self {
        Self {
            calculator: calculator.inputs().clone(),
            metadata: metadata.clone(),
            steps: steps.steps().iter().map(SharedStep::capture).collect(),
            timing_mode: Some(steps.mode()),
        }
    }

    /// Load with the built-in defaults: duration steps and an 18:1 ratio.
    pub fn load(self) -> Result<LoadedRecipe> {
        self.load_as(TimingMode::default(), Ratio::standard())
    }

    /// Load, reading steps in `fallback_mode` when the document does not
    /// name a mode and starting the calculator from `default_ratio`.
    pub fn load_as(self, fallback_mode: TimingMode, default_ratio: Ratio) -> Result<LoadedRecipe> {
        let mode = self.timing_mode.unwrap_or(fallback_mode);
        let steps = StepList::from_steps(mode, self.steps.iter().map(|step| step.to_step(mode)))?;

        let mut inputs = RatioInputs::with_ratio(default_ratio);
        for field in CalculatorField::ALL {
            let value = self.calculator.get(field);
            if !value.is_empty() {
                inputs.set(field, value);
            }
        }

        debug!(
            steps = steps.len(),
            %mode,
            ratio = %inputs.ratio,
            "Loaded shared recipe"
        );
        Ok(LoadedRecipe {
            calculator: RatioCalculator::from_inputs(inputs),
            metadata: self.metadata,
            steps,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
