//! Console front end for the dispenser: loads the catalog, configures every
//! recipe and drives the engine from stdin commands while a relay actor
//! renders lifecycle notifications.
use std::error::Error;
use std::io::{self, BufRead, Write};

use actix::{Actor, Arbiter};
use log::info;
use recipes::catalog::Catalog;
use smartender::config::EngineConfig;
use smartender::engine::Smartender;
use smartender::notification::{ActorNotifier, NotificationRelay};

#[actix_rt::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "recipes.json".to_string());
    let catalog = Catalog::from_file(&path)?;
    info!("[MAIN] Catalog loaded from {} ({} recipes)", path, catalog.len());
    let names: Vec<String> = catalog
        .names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    // the relay runs in its own arbiter so notifications keep rendering
    // while this thread blocks on stdin
    let arbiter = Arbiter::new();
    let relay = NotificationRelay::start_in_arbiter(&arbiter.handle(), |_| NotificationRelay);

    let engine = Smartender::new(
        catalog,
        EngineConfig::default(),
        Box::new(ActorNotifier::new(relay)),
    );
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    engine.configure(&name_refs);
    engine.start();

    print_help();
    run_console(&engine)?;

    engine.shutdown();
    arbiter.stop();
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  menu                    list the recipes on the menu");
    println!("  order <who> <recipe>    queue a drink for <who>");
    println!("  status                  show what the engine is doing");
    println!("  pumps                   show every pump as JSON");
    println!("  abort <order_id>        cancel the cooling wait of an order");
    println!("  quit                    stop the dispenser");
}

fn run_console(engine: &Smartender) -> io::Result<()> {
    let stdin = io::stdin();
    print!("> ");
    io::stdout().flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("menu") => {
                for name in engine.menu() {
                    println!("  {}", name);
                }
            }
            Some("order") => match parts.next() {
                Some(requester) => {
                    let recipe: Vec<&str> = parts.collect();
                    if recipe.is_empty() {
                        println!("usage: order <who> <recipe>");
                    } else {
                        let id = engine.submit_order(&recipe.join(" "), requester);
                        println!("order {} queued", id);
                    }
                }
                None => println!("usage: order <who> <recipe>"),
            },
            Some("status") => {
                println!("{:?}, {} order(s) queued", engine.status(), engine.queue_len())
            }
            Some("pumps") => match serde_json::to_string_pretty(&engine.pump_snapshots()) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error serializing pump snapshots: {}", e),
            },
            Some("abort") => match parts.next().and_then(|raw| raw.parse::<u64>().ok()) {
                Some(order_id) => {
                    if engine.abort_cooling(order_id) {
                        println!("cooling wait of order {} cancelled", order_id);
                    } else {
                        println!("order {} is not cooling right now", order_id);
                    }
                }
                None => println!("usage: abort <order_id>"),
            },
            Some("quit") | Some("exit") => break,
            Some(other) => println!("unknown command '{}'", other),
            None => {}
        }
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}
