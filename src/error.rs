//! Everything that can go wrong while fulfilling an order
use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Per-order failure reasons. All of these are contained by the worker loop:
/// the order that hit them is reported as failed and the queue advances.
#[derive(Debug, Clone, PartialEq)]
pub enum FulfillmentError {
    /// The requested recipe is not part of the active set. User error.
    RecipeNotFound { recipe: String },
    /// A recipe references an ingredient no pump was ever provisioned for.
    /// Configuration inconsistency, never retried.
    PumpNotProvisioned { ingredient: String },
    /// The ingredient is warmer than the recipe allows. Transient, normally
    /// resolved by the cooling wait before dispensing starts.
    TemperatureNotReady {
        ingredient: String,
        current_c: f64,
        optimal_c: f64,
    },
    /// Dispensing was attempted without enough product left in the container.
    InsufficientFill {
        ingredient: String,
        available_percent: f64,
        required_percent: f64,
    },
    /// The cooling wait was cancelled from outside.
    CoolingAborted,
    /// The flagged pumps never reached optimal temperature within the bound.
    CoolingTimedOut { waited: Duration },
    /// Unexpected pump-level failure while dispensing.
    DispenseFailure { ingredient: String, message: String },
}

impl fmt::Display for FulfillmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FulfillmentError::RecipeNotFound { recipe } => {
                write!(f, "recipe '{}' is not on the menu", recipe)
            }
            FulfillmentError::PumpNotProvisioned { ingredient } => {
                write!(f, "no pump is provisioned for ingredient '{}'", ingredient)
            }
            FulfillmentError::TemperatureNotReady {
                ingredient,
                current_c,
                optimal_c,
            } => write!(
                f,
                "'{}' reads {:.2}°C, above the optimal {:.2}°C",
                ingredient, current_c, optimal_c
            ),
            FulfillmentError::InsufficientFill {
                ingredient,
                available_percent,
                required_percent,
            } => write!(
                f,
                "'{}' has {:.2}% left but {:.2}% is required",
                ingredient, available_percent, required_percent
            ),
            FulfillmentError::CoolingAborted => write!(f, "cooling wait was aborted"),
            FulfillmentError::CoolingTimedOut { waited } => write!(
                f,
                "ingredients did not reach optimal temperature after {:.1}s",
                waited.as_secs_f64()
            ),
            FulfillmentError::DispenseFailure {
                ingredient,
                message,
            } => write!(f, "failed dispensing '{}': {}", ingredient, message),
        }
    }
}

impl Error for FulfillmentError {}
