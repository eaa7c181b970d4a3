//! Lifecycle notifications pushed to the requester's channel.
//!
//! Each variant corresponds to one order transition and is delivered at most
//! once per transition. The `Notifier` trait is the seam the surrounding
//! collaborators (UI, bot, API) implement.
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use actix::{Actor, Addr, Context, Handler, Message};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Message, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[rtype(result = "()")]
pub enum Notification {
    QueuePosition { order_id: u64, position: usize },
    Started { order_id: u64, recipe: String },
    Refilling { order_id: u64, ingredients: Vec<String> },
    Cooling { order_id: u64, ingredients: Vec<String> },
    Completed { order_id: u64, recipe: String },
    Failed { order_id: u64, recipe: String, reason: String },
}

impl Notification {
    pub fn order_id(&self) -> u64 {
        match self {
            Notification::QueuePosition { order_id, .. }
            | Notification::Started { order_id, .. }
            | Notification::Refilling { order_id, .. }
            | Notification::Cooling { order_id, .. }
            | Notification::Completed { order_id, .. }
            | Notification::Failed { order_id, .. } => *order_id,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::QueuePosition { order_id, position } => write!(
                f,
                "Order {} received, you are number {} in the queue",
                order_id, position
            ),
            Notification::Started { recipe, .. } => {
                write!(f, "Preparing your {}... Please wait!", recipe)
            }
            Notification::Refilling { ingredients, .. } => {
                write!(f, "Refilling {} before dispensing", ingredients.join(", "))
            }
            Notification::Cooling { ingredients, .. } => write!(
                f,
                "Cooling {} down to serving temperature",
                ingredients.join(", ")
            ),
            Notification::Completed { recipe, .. } => {
                write!(f, "Your {} is ready! Enjoy!", recipe)
            }
            Notification::Failed { recipe, reason, .. } => {
                write!(f, "Could not prepare {}: {}", recipe, reason)
            }
        }
    }
}

/// Push-style delivery to one requester's channel.
pub trait Notifier: Send + Sync {
    fn notify(&self, requester: &str, notification: Notification);
}

/// Writes every notification to the process log.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, requester: &str, notification: Notification) {
        info!("[NOTIFY {}] {}", requester, notification);
    }
}

/// Queues notifications on an mpsc channel; used by embedders and tests to
/// observe the exact delivery sequence.
pub struct ChannelNotifier {
    sender: Mutex<Sender<(String, Notification)>>,
}

impl ChannelNotifier {
    pub fn new() -> (ChannelNotifier, Receiver<(String, Notification)>) {
        let (sender, receiver) = mpsc::channel();
        (
            ChannelNotifier {
                sender: Mutex::new(sender),
            },
            receiver,
        )
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, requester: &str, notification: Notification) {
        if let Ok(sender) = self.sender.lock() {
            // a dropped receiver means the collaborator went away
            let _ = sender.send((requester.to_string(), notification));
        }
    }
}

/// A notification addressed to one requester, as delivered to the relay.
#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct Delivery {
    pub requester: String,
    pub notification: Notification,
}

/// Actor that renders notifications on the terminal, standing in for the
/// chat/UI front ends that are outside the core.
pub struct NotificationRelay;

impl Actor for NotificationRelay {
    type Context = Context<Self>;
}

impl Handler<Delivery> for NotificationRelay {
    type Result = ();

    fn handle(&mut self, msg: Delivery, _ctx: &mut Context<Self>) {
        println!("@{} -> {}", msg.requester, msg.notification);
    }
}

/// Notifier backed by the relay actor. `do_send` is safe from the worker
/// thread, so deliveries never block fulfillment.
pub struct ActorNotifier {
    addr: Addr<NotificationRelay>,
}

impl ActorNotifier {
    pub fn new(addr: Addr<NotificationRelay>) -> ActorNotifier {
        ActorNotifier { addr }
    }
}

impl Notifier for ActorNotifier {
    fn notify(&self, requester: &str, notification: Notification) {
        self.addr.do_send(Delivery {
            requester: requester.to_string(),
            notification,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_texts_name_the_recipe() {
        let completed = Notification::Completed {
            order_id: 7,
            recipe: "Margarita".to_string(),
        };
        assert_eq!(completed.to_string(), "Your Margarita is ready! Enjoy!");

        let failed = Notification::Failed {
            order_id: 7,
            recipe: "Negroni".to_string(),
            reason: "recipe 'Negroni' is not on the menu".to_string(),
        };
        assert_eq!(
            failed.to_string(),
            "Could not prepare Negroni: recipe 'Negroni' is not on the menu"
        )
    }

    #[test]
    fn test_channel_notifier_preserves_order() {
        let (notifier, receiver) = ChannelNotifier::new();
        notifier.notify(
            "alice",
            Notification::QueuePosition {
                order_id: 1,
                position: 1,
            },
        );
        notifier.notify(
            "alice",
            Notification::Started {
                order_id: 1,
                recipe: "Margarita".to_string(),
            },
        );

        let (requester, first) = receiver.recv().unwrap();
        assert_eq!(requester, "alice");
        assert_eq!(first.order_id(), 1);
        assert!(matches!(first, Notification::QueuePosition { .. }));
        let (_, second) = receiver.recv().unwrap();
        assert!(matches!(second, Notification::Started { .. }))
    }

    #[test]
    fn test_notifications_serialize_for_transport_layers() {
        let cooling = Notification::Cooling {
            order_id: 3,
            ingredients: vec!["lime juice".to_string()],
        };
        let json = serde_json::to_string(&cooling).unwrap();
        let parsed: Notification = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cooling)
    }
}
