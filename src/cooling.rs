//! Blocks order progress until the flagged pumps reach serving temperature.
//!
//! Per in-flight order the protocol moves NotCooling -> Cooling -> Ready.
//! The real gate is the periodic temperature check; the progress indicator
//! runs on its own thread, is purely cosmetic and may finish before or after
//! the actual condition.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::info;

use crate::error::FulfillmentError;
use crate::pump::Pump;

/// Cancellation token for one cooling wait. Cancelling wakes the waiting
/// worker immediately instead of at the next poll.
#[derive(Clone)]
pub struct CoolingToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CoolingToken {
    pub fn new() -> CoolingToken {
        CoolingToken {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock().expect("cooling token lock poisoned");
        *cancelled = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().expect("cooling token lock poisoned")
    }

    /// Sleeps up to `interval`, returning early if cancelled. Returns the
    /// cancellation state afterwards.
    fn wait_for(&self, interval: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let cancelled = lock.lock().expect("cooling token lock poisoned");
        let (cancelled, _timeout) = cvar
            .wait_timeout_while(cancelled, interval, |cancelled| !*cancelled)
            .expect("cooling token lock poisoned");
        *cancelled
    }
}

impl Default for CoolingToken {
    fn default() -> Self {
        CoolingToken::new()
    }
}

fn all_at_optimal(pumps: &[(Pump, f64)]) -> bool {
    pumps
        .iter()
        .all(|(pump, optimal_temp_c)| !pump.is_above_optimal(*optimal_temp_c))
}

/// Drives the wait-until-optimal-temperature protocol for one order.
pub struct CoolingCoordinator {
    poll_interval: Duration,
    progress_duration: Duration,
    max_wait: Option<Duration>,
}

impl CoolingCoordinator {
    pub fn new(
        poll_interval: Duration,
        progress_duration: Duration,
        max_wait: Option<Duration>,
    ) -> CoolingCoordinator {
        CoolingCoordinator {
            poll_interval,
            progress_duration,
            max_wait,
        }
    }

    /// Blocks until every `(pump, optimal_temp_c)` pair reads at or below its
    /// optimal temperature. Returns `CoolingAborted` if the token is
    /// cancelled and `CoolingTimedOut` once the configured bound expires.
    pub fn wait_until_optimal(
        &self,
        pumps: &[(Pump, f64)],
        token: &CoolingToken,
    ) -> Result<(), FulfillmentError> {
        if all_at_optimal(pumps) {
            info!("[COOLING] All ingredients already at optimal temperature");
            return Ok(());
        }

        let names: Vec<&str> = pumps.iter().map(|(pump, _)| pump.ingredient()).collect();
        info!("[COOLING] Waiting for {} to cool down", names.join(", "));

        let done = Arc::new(AtomicBool::new(false));
        self.spawn_progress_indicator(token.clone(), done.clone());

        let started = Instant::now();
        loop {
            if token.is_cancelled() {
                done.store(true, Ordering::SeqCst);
                info!("[COOLING] Wait aborted");
                return Err(FulfillmentError::CoolingAborted);
            }
            if all_at_optimal(pumps) {
                done.store(true, Ordering::SeqCst);
                info!("[COOLING] All ingredients reached optimal temperature");
                return Ok(());
            }
            if let Some(max_wait) = self.max_wait {
                if started.elapsed() >= max_wait {
                    done.store(true, Ordering::SeqCst);
                    return Err(FulfillmentError::CoolingTimedOut {
                        waited: started.elapsed(),
                    });
                }
            }
            token.wait_for(self.poll_interval);
        }
    }

    /// Emits progress lines sized to the fixed simulated cooling duration.
    fn spawn_progress_indicator(&self, token: CoolingToken, done: Arc<AtomicBool>) {
        const STEPS: u32 = 10;
        let step = self.progress_duration / STEPS;
        thread::spawn(move || {
            for completed in 1..=STEPS {
                if done.load(Ordering::SeqCst) || token.is_cancelled() {
                    return;
                }
                thread::sleep(step);
                info!("[COOLING] ~{}% of the expected cooling time elapsed", completed * 100 / STEPS);
            }
        });
    }
}
