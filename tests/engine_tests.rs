//! End-to-end tests driving a full engine with a controllable temperature
//! model and a channel notifier to observe the delivery sequence.
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use recipes::catalog::Catalog;
use smartender::config::EngineConfig;
use smartender::engine::{EngineStatus, Smartender};
use smartender::notification::{ChannelNotifier, Notification};
use smartender::temperature::{SensorFactory, TemperatureSensor};

const CATALOG: &str = r#"[
    {
        "name": "Margarita",
        "ingredients": [
            {"name": "tequila", "quantity_ml": 50.0, "optimal_temp_C": 4.0},
            {"name": "lime juice", "quantity_ml": 20.0, "optimal_temp_C": 4.0}
        ]
    },
    {
        "name": "Tequila Slammer",
        "ingredients": [
            {"name": "tequila", "quantity_ml": 80.0, "optimal_temp_C": 4.0}
        ]
    },
    {
        "name": "House Pour",
        "ingredients": [
            {"name": "tequila", "quantity_ml": 950.0, "optimal_temp_C": 4.0}
        ]
    }
]"#;

/// Test-controlled temperature model: one shared table of readings per
/// ingredient, 2.0 °C when unset.
type TemperatureTable = Arc<Mutex<HashMap<String, f64>>>;

struct TableSensor {
    ingredient: String,
    table: TemperatureTable,
}

impl TemperatureSensor for TableSensor {
    fn read_temperature(&mut self, _last_refill_time: DateTime<Local>) -> f64 {
        *self
            .table
            .lock()
            .unwrap()
            .get(&self.ingredient)
            .unwrap_or(&2.0)
    }
}

fn table_factory(table: TemperatureTable) -> SensorFactory {
    Box::new(move |_, ingredient| {
        Box::new(TableSensor {
            ingredient: ingredient.to_string(),
            table: table.clone(),
        }) as Box<dyn TemperatureSensor>
    })
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        refill_duration: Duration::from_millis(30),
        flow_rate_ml_per_min: 600_000.0,
        nominal_quantity: 100.0,
        cooling_poll_interval: Duration::from_millis(10),
        cooling_progress_duration: Duration::from_millis(50),
        cooling_max_wait: Some(Duration::from_secs(5)),
        worker_poll_interval: Duration::from_millis(5),
        sensor_warm_window: Duration::from_millis(0),
    }
}

/// A configured engine whose worker is not started yet; tests call
/// `start()` themselves so submission/startup ordering stays deterministic.
fn build_engine(
    table: TemperatureTable,
    config: EngineConfig,
) -> (Arc<Smartender>, Receiver<(String, Notification)>) {
    let (notifier, receiver) = ChannelNotifier::new();
    let engine = Smartender::with_sensor_factory(
        Catalog::from_json(CATALOG).unwrap(),
        config,
        Box::new(notifier),
        table_factory(table),
    );
    engine.configure(&["Margarita", "Tequila Slammer", "House Pour"]);
    (Arc::new(engine), receiver)
}

fn set_temperature(table: &TemperatureTable, ingredient: &str, temp_c: f64) {
    table
        .lock()
        .unwrap()
        .insert(ingredient.to_string(), temp_c);
}

fn is_terminal(notification: &Notification) -> bool {
    matches!(
        notification,
        Notification::Completed { .. } | Notification::Failed { .. }
    )
}

/// Receives notifications until `stop` matches, panicking on a stall.
fn recv_until<F>(
    receiver: &Receiver<(String, Notification)>,
    mut stop: F,
) -> Vec<(String, Notification)>
where
    F: FnMut(&Notification) -> bool,
{
    let mut events = Vec::new();
    loop {
        match receiver.recv_timeout(Duration::from_secs(10)) {
            Ok((requester, notification)) => {
                let done = stop(&notification);
                events.push((requester, notification));
                if done {
                    return events;
                }
            }
            Err(e) => panic!("stalled waiting for notifications ({:?}); saw {:?}", e, events),
        }
    }
}

#[test]
fn pre_warmed_full_pumps_complete_without_remediation() {
    // scenario A: everything cold and full
    let table = TemperatureTable::default();
    let (engine, receiver) = build_engine(table, fast_config());

    let order_id = engine.submit_order("Margarita", "alice");
    engine.start();
    let events = recv_until(&receiver, is_terminal);

    let kinds: Vec<&Notification> = events.iter().map(|(_, n)| n).collect();
    assert!(matches!(
        kinds[0],
        Notification::QueuePosition { position: 1, .. }
    ));
    assert!(matches!(kinds[1], Notification::Started { .. }));
    assert!(matches!(
        kinds.last().unwrap(),
        Notification::Completed { .. }
    ));
    assert!(events.iter().all(|(requester, _)| requester == "alice"));
    assert!(events
        .iter()
        .all(|(_, n)| !matches!(n, Notification::Refilling { .. } | Notification::Cooling { .. })));
    assert!(events.iter().all(|(_, n)| n.order_id() == order_id));

    // declared quantities were dispensed exactly once
    let snapshots = engine.pump_snapshots();
    let tequila = snapshots.iter().find(|s| s.ingredient == "tequila").unwrap();
    let lime = snapshots.iter().find(|s| s.ingredient == "lime juice").unwrap();
    assert!((tequila.fill_percent - 95.0).abs() < 1e-9);
    assert!((lime.fill_percent - 98.0).abs() < 1e-9);

    engine.shutdown();
    assert_eq!(engine.status(), EngineStatus::Idle)
}

#[test]
fn low_fill_triggers_exactly_one_refill_before_dispensing() {
    // scenario B: drain tequila to 5 %, then ask for a pour needing 8 %
    let table = TemperatureTable::default();
    let (engine, receiver) = build_engine(table, fast_config());
    engine.start();

    engine.submit_order("House Pour", "alice");
    recv_until(&receiver, is_terminal);
    let tequila_fill = engine
        .pump_snapshots()
        .into_iter()
        .find(|s| s.ingredient == "tequila")
        .unwrap()
        .fill_percent;
    assert!((tequila_fill - 5.0).abs() < 1e-9);

    engine.submit_order("Tequila Slammer", "bob");
    let events = recv_until(&receiver, is_terminal);

    let refills = events
        .iter()
        .filter(|(_, n)| matches!(n, Notification::Refilling { .. }))
        .count();
    assert_eq!(refills, 1);
    assert!(matches!(
        events.last().unwrap().1,
        Notification::Completed { .. }
    ));

    // a fresh container minus the proportional dispense
    let tequila_fill = engine
        .pump_snapshots()
        .into_iter()
        .find(|s| s.ingredient == "tequila")
        .unwrap()
        .fill_percent;
    assert!((tequila_fill - 92.0).abs() < 1e-9);

    engine.shutdown()
}

#[test]
fn warm_ingredient_cools_then_completes_without_restarting() {
    // scenario C: lime juice starts at 20 °C against an optimal of 4 °C
    let table = TemperatureTable::default();
    set_temperature(&table, "lime juice", 20.0);
    let (engine, receiver) = build_engine(table.clone(), fast_config());
    engine.start();

    engine.submit_order("Margarita", "alice");
    let before_cooling = recv_until(&receiver, |n| {
        matches!(n, Notification::Cooling { .. })
    });
    match &before_cooling.last().unwrap().1 {
        Notification::Cooling { ingredients, .. } => {
            assert_eq!(ingredients, &vec!["lime juice".to_string()])
        }
        _ => unreachable!(),
    }

    set_temperature(&table, "lime juice", 2.0);
    let rest = recv_until(&receiver, is_terminal);
    assert!(matches!(
        rest.last().unwrap().1,
        Notification::Completed { .. }
    ));

    // the order resumed where it was: no second Started
    let started = before_cooling
        .iter()
        .chain(rest.iter())
        .filter(|(_, n)| matches!(n, Notification::Started { .. }))
        .count();
    assert_eq!(started, 1);

    engine.shutdown()
}

#[test]
fn unknown_recipe_fails_and_the_queue_advances() {
    // scenario D
    let table = TemperatureTable::default();
    let (engine, receiver) = build_engine(table, fast_config());

    engine.submit_order("Negroni", "alice");
    engine.submit_order("Margarita", "bob");
    engine.start();

    let mut terminals = Vec::new();
    let events = recv_until(&receiver, |n| {
        if is_terminal(n) {
            terminals.push(n.clone());
        }
        terminals.len() == 2
    });

    match &terminals[0] {
        Notification::Failed { recipe, reason, .. } => {
            assert_eq!(recipe, "Negroni");
            assert!(reason.contains("not on the menu"), "reason: {}", reason)
        }
        other => panic!("expected the unknown recipe to fail first, got {:?}", other),
    }
    assert!(matches!(&terminals[1], Notification::Completed { recipe, .. } if recipe == "Margarita"));

    // both submitters saw their queue position
    let positions: Vec<usize> = events
        .iter()
        .filter_map(|(_, n)| match n {
            Notification::QueuePosition { position, .. } => Some(*position),
            _ => None,
        })
        .collect();
    assert_eq!(positions, vec![1, 2]);

    engine.shutdown()
}

#[test]
fn concurrent_submissions_complete_in_submission_order() {
    const SUBMITTERS: usize = 6;
    let table = TemperatureTable::default();
    let (engine, receiver) = build_engine(table, fast_config());
    engine.start();

    let mut handles = Vec::new();
    for i in 0..SUBMITTERS {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            engine.submit_order("Margarita", &format!("user-{}", i))
        }));
    }
    let submitted: HashSet<u64> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(submitted.len(), SUBMITTERS, "order ids must be unique");

    let mut terminals = 0;
    let events = recv_until(&receiver, |n| {
        if is_terminal(n) {
            terminals += 1;
        }
        terminals == SUBMITTERS
    });

    // every order completed, in id (= submission) order
    let completed: Vec<u64> = events
        .iter()
        .filter_map(|(_, n)| match n {
            Notification::Completed { order_id, .. } => Some(*order_id),
            Notification::Failed { order_id, .. } => {
                panic!("order {} unexpectedly failed", order_id)
            }
            _ => None,
        })
        .collect();
    assert_eq!(completed.len(), SUBMITTERS);
    let mut sorted = completed.clone();
    sorted.sort_unstable();
    assert_eq!(completed, sorted, "completion order broke FIFO");
    assert_eq!(submitted, completed.iter().copied().collect::<HashSet<u64>>());

    // at most one order in flight: Started and terminals strictly alternate
    let mut in_flight: Option<u64> = None;
    for (_, notification) in &events {
        match notification {
            Notification::Started { order_id, .. } => {
                assert!(
                    in_flight.is_none(),
                    "order {} started while {:?} was in flight",
                    order_id,
                    in_flight
                );
                in_flight = Some(*order_id);
            }
            Notification::Completed { order_id, .. } | Notification::Failed { order_id, .. } => {
                assert_eq!(in_flight, Some(*order_id));
                in_flight = None;
            }
            _ => {}
        }
    }

    // every requester got a position notification
    let notified: HashSet<&str> = events
        .iter()
        .filter(|(_, n)| matches!(n, Notification::QueuePosition { .. }))
        .map(|(requester, _)| requester.as_str())
        .collect();
    assert_eq!(notified.len(), SUBMITTERS);

    engine.shutdown()
}

#[test]
fn aborting_the_cooling_wait_fails_the_order() {
    let table = TemperatureTable::default();
    set_temperature(&table, "lime juice", 20.0);
    let (engine, receiver) = build_engine(table, fast_config());
    engine.start();

    let order_id = engine.submit_order("Margarita", "alice");
    recv_until(&receiver, |n| matches!(n, Notification::Cooling { .. }));

    assert!(engine.abort_cooling(order_id));
    let events = recv_until(&receiver, is_terminal);
    match &events.last().unwrap().1 {
        Notification::Failed { reason, .. } => {
            assert!(reason.contains("aborted"), "reason: {}", reason)
        }
        other => panic!("expected a failure, got {:?}", other),
    }

    engine.shutdown()
}

#[test]
fn bounded_cooling_wait_times_out_and_the_queue_moves_on() {
    let table = TemperatureTable::default();
    set_temperature(&table, "lime juice", 20.0);
    let mut config = fast_config();
    config.cooling_max_wait = Some(Duration::from_millis(60));
    let (engine, receiver) = build_engine(table, config);
    engine.start();

    engine.submit_order("Margarita", "alice");
    engine.submit_order("Tequila Slammer", "bob");

    let mut terminals = Vec::new();
    recv_until(&receiver, |n| {
        if is_terminal(n) {
            terminals.push(n.clone());
        }
        terminals.len() == 2
    });

    match &terminals[0] {
        Notification::Failed { recipe, reason, .. } => {
            assert_eq!(recipe, "Margarita");
            assert!(
                reason.contains("did not reach optimal temperature"),
                "reason: {}",
                reason
            )
        }
        other => panic!("expected the cooling order to fail, got {:?}", other),
    }
    // the tequila-only order is unaffected by the warm lime juice
    assert!(matches!(&terminals[1], Notification::Completed { recipe, .. } if recipe == "Tequila Slammer"));

    engine.shutdown()
}
