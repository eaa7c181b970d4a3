//! Represents one ingredient requirement inside a recipe
use serde::{Deserialize, Serialize};

/// Contains the ingredient name, the quantity to dispense and the temperature
/// the ingredient must be at before dispensing starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    name: String,
    quantity_ml: f64,
    #[serde(rename = "optimal_temp_C")]
    optimal_temp_c: f64,
}

impl Ingredient {
    /// Creates a new ingredient requirement
    /// # Arguments
    /// * `name` - A String representing the name of the ingredient
    /// * `quantity_ml` - A f64 representing the millilitres to dispense
    /// * `optimal_temp_c` - A f64 representing the serving temperature in Celsius
    /// # Returns
    /// * An Ingredient
    pub fn new(name: String, quantity_ml: f64, optimal_temp_c: f64) -> Ingredient {
        Ingredient {
            name,
            quantity_ml,
            optimal_temp_c,
        }
    }

    /// To obtain the name of this ingredient
    pub fn name(&self) -> &str {
        &self.name
    }

    /// To obtain the quantity in millilitres
    pub fn quantity_ml(&self) -> f64 {
        self.quantity_ml
    }

    /// To obtain the serving temperature in Celsius
    pub fn optimal_temp_c(&self) -> f64 {
        self.optimal_temp_c
    }
}
