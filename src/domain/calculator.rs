//! Brew ratio calculator
//!
//! Three fields (water grams, coffee grams, ratio N:1) where any two
//! determine the third. Which field gets derived is decided by the order in
//! which the user last edited fields, so the two most recent edits are
//! always treated as authoritative.

use crate::domain::parsing::{parse_leading_float, parse_leading_int, to_fixed};
use crate::domain::types::Ratio;
use crate::domain::validation_constants::precision;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

/// One of the three calculator inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculatorField {
    Water,
    Coffee,
    Ratio,
}

impl CalculatorField {
    /// All fields in derivation-priority order
    pub const ALL: [CalculatorField; 3] = [Self::Water, Self::Coffee, Self::Ratio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Coffee => "coffee",
            Self::Ratio => "ratio",
        }
    }
}

impl fmt::Display for CalculatorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The last two distinct fields the user explicitly edited, oldest first
///
/// Programmatic and derived writes never land here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchHistory {
    fields: Vec<CalculatorField>,
}

impl TouchHistory {
    pub const CAPACITY: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit; re-touching a field moves it to the newest slot.
    pub fn record(&mut self, field: CalculatorField) {
        self.fields.retain(|existing| *existing != field);
        self.fields.push(field);
        if self.fields.len() > Self::CAPACITY {
            self.fields.remove(0);
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: CalculatorField) -> bool {
        self.fields.contains(&field)
    }

    pub fn as_slice(&self) -> &[CalculatorField] {
        &self.fields
    }

    /// The field outside the history once two distinct fields are recorded
    pub fn untouched(&self) -> Option<CalculatorField> {
        if self.fields.len() < Self::CAPACITY {
            return None;
        }
        CalculatorField::ALL
            .into_iter()
            .find(|field| !self.contains(*field))
    }
}

/// Raw field values as the user typed them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioInputs {
    #[serde(default)]
    pub water: String,
    #[serde(default)]
    pub coffee: String,
    #[serde(default)]
    pub ratio: String,
}

impl RatioInputs {
    pub fn with_ratio(ratio: Ratio) -> Self {
        Self {
            water: String::new(),
            coffee: String::new(),
            ratio: ratio.into_inner().to_string(),
        }
    }

    pub fn get(&self, field: CalculatorField) -> &str {
        match field {
            CalculatorField::Water => &self.water,
            CalculatorField::Coffee => &self.coffee,
            CalculatorField::Ratio => &self.ratio,
        }
    }

    pub fn set(&mut self, field: CalculatorField, value: impl Into<String>) {
        let value = value.into();
        match field {
            CalculatorField::Water => self.water = value,
            CalculatorField::Coffee => self.coffee = value,
            CalculatorField::Ratio => self.ratio = value,
        }
    }

    fn water_grams(&self) -> Option<f64> {
        parse_leading_float(&self.water)
    }

    fn coffee_grams(&self) -> Option<f64> {
        parse_leading_float(&self.coffee)
    }

    fn ratio_value(&self) -> Option<i64> {
        parse_leading_int(&self.ratio)
    }

    fn has_value(&self, field: CalculatorField) -> bool {
        match field {
            CalculatorField::Water => self.water_grams().is_some(),
            CalculatorField::Coffee => self.coffee_grams().is_some(),
            CalculatorField::Ratio => self.ratio_value().is_some(),
        }
    }
}

impl Default for RatioInputs {
    fn default() -> Self {
        Self::with_ratio(Ratio::standard())
    }
}

/// A value the calculator wrote into a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    pub field: CalculatorField,
    pub value: String,
}

/// Calculator state: field values, touch order, and which fields hold
/// derived (rather than typed) values
#[derive(Debug, Clone, Default)]
pub struct RatioCalculator {
    inputs: RatioInputs,
    history: TouchHistory,
    calculated: HashSet<CalculatorField>,
}

impl RatioCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_ratio(ratio: Ratio) -> Self {
        Self::from_inputs(RatioInputs::with_ratio(ratio))
    }

    /// Start from existing values (e.g. a shared recipe) with no touches.
    pub fn from_inputs(inputs: RatioInputs) -> Self {
        Self {
            inputs,
            history: TouchHistory::new(),
            calculated: HashSet::new(),
        }
    }

    pub fn inputs(&self) -> &RatioInputs {
        &self.inputs
    }

    pub fn value(&self, field: CalculatorField) -> &str {
        self.inputs.get(field)
    }

    pub fn history(&self) -> &TouchHistory {
        &self.history
    }

    /// Whether the field currently shows a derived value
    pub fn is_calculated(&self, field: CalculatorField) -> bool {
        self.calculated.contains(&field)
    }

    /// Ratio currently selected, if it is a valid 1..=100 value
    pub fn ratio(&self) -> Option<Ratio> {
        self.inputs
            .ratio_value()
            .and_then(|ratio| u32::try_from(ratio).ok())
            .and_then(|ratio| Ratio::try_new(ratio).ok())
    }

    /// Write a value without counting it as a user edit.
    pub fn set_value(&mut self, field: CalculatorField, value: impl Into<String>) {
        self.inputs.set(field, value);
    }

    /// The user finished editing `field`.
    ///
    /// The calculated marker is cleared either way; only a non-empty value
    /// counts as a touch and triggers a recalculation.
    pub fn touch(
        &mut self,
        field: CalculatorField,
        value: impl Into<String>,
    ) -> Option<Derivation> {
        let value = value.into();
        let is_empty = value.is_empty();
        self.inputs.set(field, value);
        self.calculated.remove(&field);

        if is_empty {
            debug!(%field, "Field cleared, touch not recorded");
            return None;
        }

        self.history.record(field);
        debug!(history = ?self.history.as_slice(), "Touch recorded");
        self.recalculate()
    }

    /// Derive the missing field from the other two, if the touch history
    /// identifies one.
    pub fn recalculate(&mut self) -> Option<Derivation> {
        let with_values: Vec<CalculatorField> = CalculatorField::ALL
            .into_iter()
            .filter(|field| self.inputs.has_value(*field))
            .collect();

        if with_values.len() < 2 {
            return None;
        }

        let target = match self.history.len() {
            0 => return None,
            1 => CalculatorField::ALL
                .into_iter()
                .find(|field| !with_values.contains(field))?,
            _ => self.history.untouched()?,
        };

        let value = self.derive(target)?;
        self.inputs.set(target, value.clone());
        self.calculated.insert(target);
        info!(field = %target, %value, "Derived calculator field");

        Some(Derivation {
            field: target,
            value,
        })
    }

    fn derive(&self, target: CalculatorField) -> Option<String> {
        let water = self.inputs.water_grams();
        let coffee = self.inputs.coffee_grams();
        let ratio = self.inputs.ratio_value().map(|ratio| ratio as f64);

        match target {
            CalculatorField::Water => {
                let water = coffee? * ratio?;
                Some(to_fixed(water, precision::WATER_DECIMALS))
            }
            CalculatorField::Coffee => {
                let coffee = water? / ratio?;
                if !coffee.is_finite() {
                    return None;
                }
                Some(to_fixed(coffee, precision::COFFEE_DECIMALS))
            }
            CalculatorField::Ratio => {
                let implied = (water? / coffee?).round();
                match Ratio::from_rounded(implied) {
                    Some(ratio) => Some(ratio.into_inner().to_string()),
                    None => {
                        debug!(implied, "Derived ratio out of range, keeping previous");
                        None
                    }
                }
            }
        }
    }
}
