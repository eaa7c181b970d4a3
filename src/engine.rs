//! The fulfillment engine: owns the catalog, the pump set and the order
//! queue, and executes one order at a time on a dedicated worker thread.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{error, info, warn};
use recipes::catalog::Catalog;
use recipes::recipe::Recipe;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::cooling::{CoolingCoordinator, CoolingToken};
use crate::error::FulfillmentError;
use crate::inventory::{self, IngredientPlan};
use crate::notification::{Notification, Notifier};
use crate::order::{Order, OrderState};
use crate::pump::{Pump, PumpSnapshot};
use crate::queue::OrderQueue;
use crate::temperature::{SensorFactory, SimulatedTemperatureSensor, TemperatureSensor};

/// Global dispensing state, written only by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    Idle,
    Busy { order_id: u64 },
}

struct EngineInner {
    catalog: Catalog,
    selected: Mutex<Vec<Recipe>>,
    pumps: Mutex<Vec<Pump>>,
    queue: OrderQueue,
    status: Mutex<EngineStatus>,
    notifier: Box<dyn Notifier>,
    config: EngineConfig,
    cooling: CoolingCoordinator,
    active_cooling: Mutex<Option<(u64, CoolingToken)>>,
    running: AtomicBool,
}

/// The dispenser itself. Collaborators (UI, bot, API) hold a shared handle
/// to one engine instance; there is no global state.
pub struct Smartender {
    inner: Arc<EngineInner>,
    sensor_factory: Mutex<SensorFactory>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Smartender {
    /// Creates an engine using the randomized temperature simulator for
    /// every provisioned pump.
    pub fn new(catalog: Catalog, config: EngineConfig, notifier: Box<dyn Notifier>) -> Smartender {
        let warm_window = config.sensor_warm_window;
        Smartender::with_sensor_factory(
            catalog,
            config,
            notifier,
            Box::new(move |_, _| {
                Box::new(SimulatedTemperatureSensor::with_warm_window(warm_window))
                    as Box<dyn TemperatureSensor>
            }),
        )
    }

    /// Creates an engine with a pluggable temperature model. The factory is
    /// called once per provisioned pump with the pump id and ingredient.
    pub fn with_sensor_factory(
        catalog: Catalog,
        config: EngineConfig,
        notifier: Box<dyn Notifier>,
        sensor_factory: SensorFactory,
    ) -> Smartender {
        let cooling = CoolingCoordinator::new(
            config.cooling_poll_interval,
            config.cooling_progress_duration,
            config.cooling_max_wait,
        );
        Smartender {
            inner: Arc::new(EngineInner {
                catalog,
                selected: Mutex::new(Vec::new()),
                pumps: Mutex::new(Vec::new()),
                queue: OrderQueue::new(),
                status: Mutex::new(EngineStatus::Idle),
                notifier,
                config,
                cooling,
                active_cooling: Mutex::new(None),
                running: AtomicBool::new(false),
            }),
            sensor_factory: Mutex::new(sensor_factory),
            worker: Mutex::new(None),
        }
    }

    /// Adds catalog recipes to the active set and provisions a pump for
    /// every ingredient seen for the first time. Returns the size of the
    /// active set afterwards.
    pub fn configure(&self, recipe_names: &[&str]) -> usize {
        info!("[ENGINE] Configuring recipes...");
        {
            let mut selected = self.inner.selected.lock().expect("selected set poisoned");
            for name in recipe_names {
                match self.inner.catalog.get(name) {
                    Some(recipe) => {
                        if !selected.iter().any(|known| known.is_named(recipe.name())) {
                            info!("[ENGINE] {} added to the menu", recipe.name());
                            selected.push(recipe.clone());
                        }
                    }
                    None => warn!("[ENGINE] Recipe '{}' not found in the catalog", name),
                }
            }
        }
        self.setup_pumps();
        self.inner.selected.lock().expect("selected set poisoned").len()
    }

    fn setup_pumps(&self) {
        let selected = self.inner.selected.lock().expect("selected set poisoned");
        let mut pumps = self.inner.pumps.lock().expect("pump set poisoned");
        let factory = self.sensor_factory.lock().expect("sensor factory poisoned");
        for recipe in selected.iter() {
            for ingredient in recipe.ingredients() {
                match pumps.iter().find(|pump| pump.ingredient() == ingredient.name()) {
                    Some(pump) => pump.bind_recipe(recipe.name()),
                    None => {
                        let id = pumps.len();
                        let pump = Pump::new(
                            id,
                            ingredient.name().to_string(),
                            (*factory)(id, ingredient.name()),
                            self.inner.config.flow_rate_ml_per_min,
                            self.inner.config.refill_duration,
                            self.inner.config.nominal_quantity,
                        );
                        pump.bind_recipe(recipe.name());
                        info!("[ENGINE] Pump {} provisioned for {}", id, ingredient.name());
                        pumps.push(pump);
                    }
                }
            }
        }
        info!("[ENGINE] Pumps configured ({} active)", pumps.len());
    }

    /// Starts the single background worker draining the queue.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let inner = self.inner.clone();
        let handle = thread::spawn(move || run_worker(inner));
        *self.worker.lock().expect("worker handle poisoned") = Some(handle);
    }

    /// Stops the worker after the in-flight order, cancelling a pending
    /// cooling wait so shutdown does not hang on it.
    pub fn shutdown(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        if let Some((_, token)) = self
            .inner
            .active_cooling
            .lock()
            .expect("active cooling lock poisoned")
            .as_ref()
        {
            token.cancel();
        }
        let handle = self.worker.lock().expect("worker handle poisoned").take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("[ENGINE] Worker thread ended with a panic");
            }
        }
    }

    /// Enqueues an order and synchronously notifies the requester of its
    /// queue position.
    pub fn submit_order(&self, recipe_name: &str, requester: &str) -> u64 {
        let (order, position) = self.inner.queue.submit(recipe_name, requester);
        self.inner.notifier.notify(
            requester,
            Notification::QueuePosition {
                order_id: order.id(),
                position,
            },
        );
        order.id()
    }

    pub fn status(&self) -> EngineStatus {
        *self.inner.status.lock().expect("status lock poisoned")
    }

    pub fn pump_snapshots(&self) -> Vec<PumpSnapshot> {
        self.inner
            .pumps
            .lock()
            .expect("pump set poisoned")
            .iter()
            .map(Pump::snapshot)
            .collect()
    }

    /// Names of the recipes currently on the menu
    pub fn menu(&self) -> Vec<String> {
        self.inner
            .selected
            .lock()
            .expect("selected set poisoned")
            .iter()
            .map(|recipe| recipe.name().to_string())
            .collect()
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    /// Cancels the cooling wait of the given order, if it is the one
    /// currently cooling. The order fails and the queue advances.
    pub fn abort_cooling(&self, order_id: u64) -> bool {
        let active = self
            .inner
            .active_cooling
            .lock()
            .expect("active cooling lock poisoned");
        match active.as_ref() {
            Some((cooling_id, token)) if *cooling_id == order_id => {
                token.cancel();
                true
            }
            _ => false,
        }
    }
}

fn run_worker(inner: Arc<EngineInner>) {
    info!("[ENGINE] Worker started");
    while inner.running.load(Ordering::SeqCst) {
        if let Some(mut order) = inner.queue.peek_front() {
            *inner.status.lock().expect("status lock poisoned") = EngineStatus::Busy {
                order_id: order.id(),
            };
            order.set_state(OrderState::InProgress);
            inner.notifier.notify(
                order.requester(),
                Notification::Started {
                    order_id: order.id(),
                    recipe: order.recipe_name().to_string(),
                },
            );
            info!(
                "[ENGINE] Processing order {}: {} for {}",
                order.id(),
                order.recipe_name(),
                order.requester()
            );

            match fulfill(&inner, &mut order) {
                Ok(()) => {
                    order.set_state(OrderState::Completed);
                    info!("[ENGINE] Order {} complete", order.id());
                    inner.notifier.notify(
                        order.requester(),
                        Notification::Completed {
                            order_id: order.id(),
                            recipe: order.recipe_name().to_string(),
                        },
                    );
                }
                Err(reason) => {
                    order.set_state(OrderState::Failed);
                    error!("[ENGINE] Order {} failed: {}", order.id(), reason);
                    inner.notifier.notify(
                        order.requester(),
                        Notification::Failed {
                            order_id: order.id(),
                            recipe: order.recipe_name().to_string(),
                            reason: reason.to_string(),
                        },
                    );
                }
            }

            inner.queue.pop_front();
            *inner.status.lock().expect("status lock poisoned") = EngineStatus::Idle;
        }
        thread::sleep(inner.config.worker_poll_interval);
    }
    info!("[ENGINE] Worker stopped");
}

/// Prepares one order: resolve, one remediation pass (refills, then cooling),
/// then the dispensing pass in recipe declaration order. Every error is
/// contained here; the worker always advances to the next order.
fn fulfill(inner: &EngineInner, order: &mut Order) -> Result<(), FulfillmentError> {
    let recipe = {
        let selected = inner.selected.lock().expect("selected set poisoned");
        selected
            .iter()
            .find(|recipe| recipe.is_named(order.recipe_name()))
            .cloned()
    }
    .ok_or_else(|| FulfillmentError::RecipeNotFound {
        recipe: order.recipe_name().to_string(),
    })?;

    let pumps = inner.pumps.lock().expect("pump set poisoned").clone();
    let plans = match inventory::resolve(&recipe, &pumps) {
        Ok(plans) => plans,
        Err(misconfiguration) => {
            error!("[ENGINE] System misconfiguration: {}", misconfiguration);
            return Err(misconfiguration);
        }
    };

    let refills: Vec<&IngredientPlan> = plans
        .iter()
        .filter(|plan| plan.readiness.needs_refill())
        .collect();
    if !refills.is_empty() {
        order.set_state(OrderState::Refilling);
        inner.notifier.notify(
            order.requester(),
            Notification::Refilling {
                order_id: order.id(),
                ingredients: refills.iter().map(|plan| plan.ingredient.clone()).collect(),
            },
        );
        for plan in &refills {
            plan.pump.refill();
        }
    }

    // refills reset the warm window, so re-read instead of trusting the
    // resolver's initial classification
    let to_cool: Vec<(Pump, f64)> = plans
        .iter()
        .filter(|plan| plan.pump.is_above_optimal(plan.optimal_temp_c))
        .map(|plan| (plan.pump.clone(), plan.optimal_temp_c))
        .collect();
    if !to_cool.is_empty() {
        order.set_state(OrderState::Cooling);
        // the token must be registered before the notification goes out, so
        // a requester reacting to it can already abort
        let token = CoolingToken::new();
        *inner
            .active_cooling
            .lock()
            .expect("active cooling lock poisoned") = Some((order.id(), token.clone()));
        inner.notifier.notify(
            order.requester(),
            Notification::Cooling {
                order_id: order.id(),
                ingredients: to_cool
                    .iter()
                    .map(|(pump, _)| pump.ingredient().to_string())
                    .collect(),
            },
        );
        let outcome = inner.cooling.wait_until_optimal(&to_cool, &token);
        *inner
            .active_cooling
            .lock()
            .expect("active cooling lock poisoned") = None;
        outcome?;
    }

    for plan in &plans {
        plan.pump
            .dispense(plan.volume_ml, plan.optimal_temp_c, plan.required_fill_percent)?;
    }
    Ok(())
}
