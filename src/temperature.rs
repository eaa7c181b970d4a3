//! Temperature sensing for the pumps
use std::time::Duration;

use chrono::{DateTime, Local};
use rand::Rng;

/// How a pump senses the temperature of its ingredient. The engine only
/// depends on this signature, so collaborators can plug any model in.
#[cfg_attr(test, mockall::automock)]
pub trait TemperatureSensor: Send {
    /// Reads the current temperature in Celsius. `last_refill_time` is the
    /// moment the monitored container was last refilled.
    fn read_temperature(&mut self, last_refill_time: DateTime<Local>) -> f64;
}

/// Builds the sensor for a newly provisioned pump, given its id and
/// ingredient name.
pub type SensorFactory = Box<dyn Fn(usize, &str) -> Box<dyn TemperatureSensor> + Send>;

/// Randomized sensor model: product refilled recently has not been chilled
/// yet and reads warm; once the warm window has passed it reads within the
/// serving range.
pub struct SimulatedTemperatureSensor {
    warm_window: Duration,
}

const DEFAULT_WARM_WINDOW: Duration = Duration::from_secs(10);

impl SimulatedTemperatureSensor {
    pub fn new() -> SimulatedTemperatureSensor {
        SimulatedTemperatureSensor {
            warm_window: DEFAULT_WARM_WINDOW,
        }
    }

    pub fn with_warm_window(warm_window: Duration) -> SimulatedTemperatureSensor {
        SimulatedTemperatureSensor { warm_window }
    }
}

impl Default for SimulatedTemperatureSensor {
    fn default() -> Self {
        SimulatedTemperatureSensor::new()
    }
}

impl TemperatureSensor for SimulatedTemperatureSensor {
    fn read_temperature(&mut self, last_refill_time: DateTime<Local>) -> f64 {
        let elapsed = Local::now().signed_duration_since(last_refill_time);
        let still_warm = elapsed.num_milliseconds() < self.warm_window.as_millis() as i64;
        let mut rng = rand::thread_rng();
        let reading: f64 = if still_warm {
            rng.gen_range(4.1..25.0)
        } else {
            rng.gen_range(0.0..4.0)
        };
        (reading * 100.0).round() / 100.0
    }
}
