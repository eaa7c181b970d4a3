//! Tunables for the simulated hardware and the worker loop
use std::time::Duration;

/// All simulated durations and dispensing parameters in one place, so tests
/// can shrink them and the binary keeps realistic values.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a container refill takes
    pub refill_duration: Duration,
    /// Dispensing speed of every pump
    pub flow_rate_ml_per_min: f64,
    /// Container capacity in centilitres; a full container reads 100 %
    pub nominal_quantity: f64,
    /// How often the cooling wait re-reads the flagged pumps
    pub cooling_poll_interval: Duration,
    /// Length of the cosmetic cooling progress indicator
    pub cooling_progress_duration: Duration,
    /// Upper bound on one cooling wait. `None` waits forever.
    pub cooling_max_wait: Option<Duration>,
    /// Pause between two scans of the order queue
    pub worker_poll_interval: Duration,
    /// How long after a refill the simulated sensor keeps reading warm
    pub sensor_warm_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            refill_duration: Duration::from_secs(10),
            flow_rate_ml_per_min: 600.0,
            nominal_quantity: 100.0,
            cooling_poll_interval: Duration::from_secs(1),
            cooling_progress_duration: Duration::from_secs(10),
            cooling_max_wait: Some(Duration::from_secs(120)),
            worker_poll_interval: Duration::from_secs(1),
            sensor_warm_window: Duration::from_secs(10),
        }
    }
}
