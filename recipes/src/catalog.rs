//! Loads and validates the recipe catalog consumed by the dispenser
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::recipe::Recipe;

/// The read-only set of recipes known to the system, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    recipes: Vec<Recipe>,
}

/// Errors raised while loading or validating a catalog file.
#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// The file parsed but describes an unusable catalog
    Invalid(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Io(e) => write!(f, "Error reading catalog file: {}", e),
            CatalogError::Parse(e) => write!(f, "Error parsing catalog file: {}", e),
            CatalogError::Invalid(reason) => write!(f, "Invalid catalog: {}", reason),
        }
    }
}

impl Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e)
    }
}

impl Catalog {
    /// Builds a catalog from already-parsed recipes, running the same
    /// validation as the file loaders.
    pub fn new(recipes: Vec<Recipe>) -> Result<Catalog, CatalogError> {
        let catalog = Catalog { recipes };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Loads the catalog from a JSON file containing an array of recipes.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogError> {
        let file = File::open(path)?;
        let recipes: Vec<Recipe> = serde_json::from_reader(BufReader::new(file))?;
        Catalog::new(recipes)
    }

    /// Loads the catalog from a JSON string containing an array of recipes.
    pub fn from_json(json: &str) -> Result<Catalog, CatalogError> {
        let recipes: Vec<Recipe> = serde_json::from_str(json)?;
        Catalog::new(recipes)
    }

    /// Finds a recipe by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|recipe| recipe.is_named(name))
    }

    /// To obtain every recipe in the catalog, in file order
    pub fn recipes(&self) -> &Vec<Recipe> {
        &self.recipes
    }

    /// Names of every recipe, in file order
    pub fn names(&self) -> Vec<&str> {
        self.recipes.iter().map(Recipe::name).collect()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (position, recipe) in self.recipes.iter().enumerate() {
            if recipe.name().trim().is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "recipe at position {} has an empty name",
                    position
                )));
            }
            if self
                .recipes
                .iter()
                .filter(|other| other.is_named(recipe.name()))
                .count()
                > 1
            {
                return Err(CatalogError::Invalid(format!(
                    "duplicate recipe name '{}'",
                    recipe.name()
                )));
            }
            if recipe.ingredients().is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "recipe '{}' has no ingredients",
                    recipe.name()
                )));
            }
            for ingredient in recipe.ingredients() {
                if ingredient.quantity_ml() <= 0.0 {
                    return Err(CatalogError::Invalid(format!(
                        "recipe '{}' asks for a non-positive quantity of '{}'",
                        recipe.name(),
                        ingredient.name()
                    )));
                }
            }
        }
        Ok(())
    }
}
