//! Thread-safe FIFO of pending orders
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::info;

use crate::order::Order;

/// Pending orders in submission order, shared between the submitting threads
/// and the single worker. Ids are handed out under the queue lock, so id
/// order always equals queue order.
#[derive(Clone)]
pub struct OrderQueue {
    pending: Arc<Mutex<VecDeque<Order>>>,
    next_id: Arc<AtomicU64>,
}

impl OrderQueue {
    pub fn new() -> OrderQueue {
        OrderQueue {
            pending: Arc::new(Mutex::new(VecDeque::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Appends a new order and returns it together with its 1-based queue
    /// position (the in-flight order, if any, still counts).
    pub fn submit(&self, recipe_name: &str, requester: &str) -> (Order, usize) {
        let mut pending = self.pending.lock().expect("order queue lock poisoned");
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let order = Order::new(id, recipe_name, requester);
        pending.push_back(order.clone());
        let position = pending.len();
        info!(
            "[QUEUE] Order {} added: {} for {} (position {})",
            id, recipe_name, requester, position
        );
        (order, position)
    }

    /// The order at the head of the queue, without removing it
    pub fn peek_front(&self) -> Option<Order> {
        self.pending
            .lock()
            .expect("order queue lock poisoned")
            .front()
            .cloned()
    }

    /// Removes and returns the head order
    pub fn pop_front(&self) -> Option<Order> {
        self.pending
            .lock()
            .expect("order queue lock poisoned")
            .pop_front()
    }

    /// 1-based position of an order still in the queue
    pub fn position_of(&self, order_id: u64) -> Option<usize> {
        self.pending
            .lock()
            .expect("order queue lock poisoned")
            .iter()
            .position(|order| order.id() == order_id)
            .map(|index| index + 1)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().expect("order queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OrderQueue {
    fn default() -> Self {
        OrderQueue::new()
    }
}
