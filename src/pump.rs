//! Simulated dispensing unit bound to exactly one ingredient
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::FulfillmentError;
use crate::float_switch::FloatSwitch;
use crate::temperature::TemperatureSensor;

/// Status record published for one pump, for dashboards and collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PumpSnapshot {
    pub pump_id: usize,
    pub ingredient: String,
    pub fill_percent: f64,
    pub temperature_c: f64,
    pub maintenance_required: bool,
    pub bound_recipes: Vec<String>,
    pub timestamp: String,
}

/// What a completed dispense reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct DispenseReport {
    pub ingredient: String,
    pub dispensed_ml: f64,
    pub remaining_fill_percent: f64,
}

struct Hardware {
    float_switch: FloatSwitch,
    last_refill_time: DateTime<Local>,
}

/// One pump of the dispenser. The mutable hardware state sits behind its own
/// lock so status reads from other threads observe refills in progress; the
/// simulated delays of `refill` and `dispense` never hold that lock.
#[derive(Clone)]
pub struct Pump {
    id: usize,
    ingredient: String,
    flow_rate_ml_per_min: f64,
    refill_duration: Duration,
    recipes: Arc<Mutex<Vec<String>>>,
    hardware: Arc<Mutex<Hardware>>,
    sensor: Arc<Mutex<Box<dyn TemperatureSensor>>>,
}

impl Pump {
    /// Creates a pump with a full container refilled "now"
    /// # Arguments
    /// * `id` - Unique pump number
    /// * `ingredient` - The one ingredient this pump dispenses
    /// * `sensor` - Temperature sensor monitoring the container
    /// * `flow_rate_ml_per_min` - Dispensing speed
    /// * `refill_duration` - Simulated duration of a container refill
    /// * `nominal_quantity` - Capacity of a full container, in centilitres
    pub fn new(
        id: usize,
        ingredient: String,
        sensor: Box<dyn TemperatureSensor>,
        flow_rate_ml_per_min: f64,
        refill_duration: Duration,
        nominal_quantity: f64,
    ) -> Pump {
        Pump {
            id,
            ingredient,
            flow_rate_ml_per_min,
            refill_duration,
            recipes: Arc::new(Mutex::new(Vec::new())),
            hardware: Arc::new(Mutex::new(Hardware {
                float_switch: FloatSwitch::new(nominal_quantity),
                last_refill_time: Local::now(),
            })),
            sensor: Arc::new(Mutex::new(sensor)),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn ingredient(&self) -> &str {
        &self.ingredient
    }

    /// Records that a recipe uses this pump's ingredient
    pub fn bind_recipe(&self, recipe_name: &str) {
        let mut recipes = self.recipes.lock().expect("pump recipe list poisoned");
        if !recipes.iter().any(|name| name == recipe_name) {
            recipes.push(recipe_name.to_string());
        }
    }

    pub fn bound_recipes(&self) -> Vec<String> {
        self.recipes
            .lock()
            .expect("pump recipe list poisoned")
            .clone()
    }

    /// Current ingredient temperature, read through the sensor collaborator.
    /// No side effect on pump state.
    pub fn current_temperature(&self) -> f64 {
        let last_refill_time = self
            .hardware
            .lock()
            .expect("pump hardware lock poisoned")
            .last_refill_time;
        self.sensor
            .lock()
            .expect("pump sensor lock poisoned")
            .read_temperature(last_refill_time)
    }

    /// Remaining fill in [0, 100]
    pub fn remaining_fill(&self) -> f64 {
        self.hardware
            .lock()
            .expect("pump hardware lock poisoned")
            .float_switch
            .left_quantity()
    }

    pub fn is_above_optimal(&self, optimal_temp_c: f64) -> bool {
        self.current_temperature() > optimal_temp_c
    }

    pub fn maintenance_required(&self) -> bool {
        self.hardware
            .lock()
            .expect("pump hardware lock poisoned")
            .float_switch
            .maintenance_required()
    }

    /// Fill percentage dispensing `volume_ml` would consume
    pub fn required_fill_percent(&self, volume_ml: f64) -> f64 {
        self.hardware
            .lock()
            .expect("pump hardware lock poisoned")
            .float_switch
            .fill_percent_for(volume_ml)
    }

    /// Swaps in a full container. The container reads empty for the whole
    /// simulated duration, then jumps to 100 %, and the refill timestamp is
    /// reset, which restarts the sensor's warm window.
    pub fn refill(&self) {
        info!("[PUMP {}] Refilling {}...", self.id, self.ingredient);
        {
            let mut hardware = self.hardware.lock().expect("pump hardware lock poisoned");
            hardware.float_switch.set_empty();
        }
        thread::sleep(self.refill_duration);
        {
            let mut hardware = self.hardware.lock().expect("pump hardware lock poisoned");
            hardware.float_switch.set_full();
            hardware.last_refill_time = Local::now();
        }
        info!("[PUMP {}] {} refilled", self.id, self.ingredient);
    }

    /// Dispenses `volume_ml` over a time proportional to the flow rate.
    ///
    /// Fails without dispensing if the ingredient is still above
    /// `optimal_temp_c`, or if less than `required_fill_percent` is left in
    /// the container. Remediation (refill, cooling) is the caller's job.
    pub fn dispense(
        &self,
        volume_ml: f64,
        optimal_temp_c: f64,
        required_fill_percent: f64,
    ) -> Result<DispenseReport, FulfillmentError> {
        let current_c = self.current_temperature();
        if current_c > optimal_temp_c {
            return Err(FulfillmentError::TemperatureNotReady {
                ingredient: self.ingredient.clone(),
                current_c,
                optimal_c: optimal_temp_c,
            });
        }

        let available_percent = self.remaining_fill();
        if available_percent < required_fill_percent {
            return Err(FulfillmentError::InsufficientFill {
                ingredient: self.ingredient.clone(),
                available_percent,
                required_percent: required_fill_percent,
            });
        }

        info!(
            "[PUMP {}] Dispensing {} ml of {}...",
            self.id, volume_ml, self.ingredient
        );
        let seconds = volume_ml / self.flow_rate_ml_per_min * 60.0;
        thread::sleep(Duration::from_secs_f64(seconds));

        let remaining_fill_percent = self
            .hardware
            .lock()
            .map_err(|e| FulfillmentError::DispenseFailure {
                ingredient: self.ingredient.clone(),
                message: e.to_string(),
            })?
            .float_switch
            .drain(volume_ml);

        info!(
            "[PUMP {}] Finished dispensing {} ml of {}. Remaining: {:.2}%",
            self.id, volume_ml, self.ingredient, remaining_fill_percent
        );
        Ok(DispenseReport {
            ingredient: self.ingredient.clone(),
            dispensed_ml: volume_ml,
            remaining_fill_percent,
        })
    }

    pub fn snapshot(&self) -> PumpSnapshot {
        let (fill_percent, maintenance_required) = {
            let hardware = self.hardware.lock().expect("pump hardware lock poisoned");
            (
                hardware.float_switch.left_quantity(),
                hardware.float_switch.maintenance_required(),
            )
        };
        PumpSnapshot {
            pump_id: self.id,
            ingredient: self.ingredient.clone(),
            fill_percent,
            temperature_c: self.current_temperature(),
            maintenance_required,
            bound_recipes: self.bound_recipes(),
            timestamp: Local::now().to_rfc3339(),
        }
    }
}
