//! Represents a drink recipe offered by the dispenser
use serde::{Deserialize, Serialize};

use crate::ingredient::Ingredient;

/// A named, ordered list of ingredient requirements. The order of the
/// ingredients is the order they are dispensed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    name: String,
    ingredients: Vec<Ingredient>,
}

impl Recipe {
    /// Creates a new recipe
    /// # Arguments
    /// * `name` - A String representing the unique name of the recipe
    /// * `ingredients` - A Vec<Ingredient> in dispensing order
    /// # Returns
    /// * A Recipe
    pub fn new(name: String, ingredients: Vec<Ingredient>) -> Recipe {
        Recipe { name, ingredients }
    }

    /// To obtain the name of this recipe
    pub fn name(&self) -> &str {
        &self.name
    }

    /// To obtain the ingredients of this recipe, in dispensing order
    pub fn ingredients(&self) -> &Vec<Ingredient> {
        &self.ingredients
    }

    /// Total volume of the drink in millilitres
    pub fn total_volume_ml(&self) -> f64 {
        self.ingredients.iter().map(Ingredient::quantity_ml).sum()
    }

    /// Checks the recipe name, ignoring case
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}
