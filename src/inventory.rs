//! Resolves a recipe's ingredient list against the provisioned pumps
use recipes::recipe::Recipe;

use crate::error::FulfillmentError;
use crate::pump::Pump;

/// Readiness of one pump for one ingredient requirement. Refill is always
/// remediated before cooling, since it does not depend on temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NeedsRefill,
    NeedsCooling,
    NeedsRefillAndCooling,
}

impl Readiness {
    fn classify(needs_refill: bool, needs_cooling: bool) -> Readiness {
        match (needs_refill, needs_cooling) {
            (false, false) => Readiness::Ready,
            (true, false) => Readiness::NeedsRefill,
            (false, true) => Readiness::NeedsCooling,
            (true, true) => Readiness::NeedsRefillAndCooling,
        }
    }

    pub fn needs_refill(&self) -> bool {
        matches!(self, Readiness::NeedsRefill | Readiness::NeedsRefillAndCooling)
    }

    pub fn needs_cooling(&self) -> bool {
        matches!(self, Readiness::NeedsCooling | Readiness::NeedsRefillAndCooling)
    }
}

/// One ingredient requirement resolved to its pump, with everything the
/// dispensing pass needs.
#[derive(Clone)]
pub struct IngredientPlan {
    pub ingredient: String,
    pub pump: Pump,
    pub volume_ml: f64,
    pub optimal_temp_c: f64,
    pub required_fill_percent: f64,
    pub readiness: Readiness,
}

/// Maps every ingredient of `recipe` to its bound pump and classifies the
/// pump's state. Fails with `PumpNotProvisioned` when a recipe references an
/// ingredient no pump dispenses; that is a configuration error, not retried.
pub fn resolve(recipe: &Recipe, pumps: &[Pump]) -> Result<Vec<IngredientPlan>, FulfillmentError> {
    let mut plans = Vec::with_capacity(recipe.ingredients().len());
    for ingredient in recipe.ingredients() {
        let pump = pumps
            .iter()
            .find(|pump| pump.ingredient() == ingredient.name())
            .ok_or_else(|| FulfillmentError::PumpNotProvisioned {
                ingredient: ingredient.name().to_string(),
            })?;

        let required_fill_percent = pump.required_fill_percent(ingredient.quantity_ml());
        let needs_refill = pump.remaining_fill() < required_fill_percent;
        let needs_cooling = pump.is_above_optimal(ingredient.optimal_temp_c());

        plans.push(IngredientPlan {
            ingredient: ingredient.name().to_string(),
            pump: pump.clone(),
            volume_ml: ingredient.quantity_ml(),
            optimal_temp_c: ingredient.optimal_temp_c(),
            required_fill_percent,
            readiness: Readiness::classify(needs_refill, needs_cooling),
        });
    }
    Ok(plans)
}
