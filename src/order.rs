//! Represents one requester's drink order and its lifecycle
use chrono::{DateTime, Local};

/// Lifecycle of an order. Only the worker thread moves an order between
/// states; `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Queued,
    InProgress,
    Cooling,
    Refilling,
    Completed,
    Failed,
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Completed | OrderState::Failed)
    }
}

/// One request to prepare a recipe for a requester. Ids come from the
/// queue's monotonic counter and stay unique under concurrent submission.
#[derive(Debug, Clone)]
pub struct Order {
    id: u64,
    recipe_name: String,
    requester: String,
    submitted_at: DateTime<Local>,
    state: OrderState,
}

impl Order {
    pub fn new(id: u64, recipe_name: &str, requester: &str) -> Order {
        Order {
            id,
            recipe_name: recipe_name.to_string(),
            requester: requester.to_string(),
            submitted_at: Local::now(),
            state: OrderState::Queued,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn recipe_name(&self) -> &str {
        &self.recipe_name
    }

    pub fn requester(&self) -> &str {
        &self.requester
    }

    pub fn submitted_at(&self) -> DateTime<Local> {
        self.submitted_at
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn set_state(&mut self, state: OrderState) {
        self.state = state;
    }
}
