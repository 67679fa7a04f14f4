//! Change notification bus.
//!
//! # Invariants
//! - Events are delivered synchronously, on the mutating thread, after the
//!   in-memory state and the save request are both issued.
//! - Subscribers are invoked in subscription order.

use crate::service::undo::UndoActionKind;

/// Persisted collection touched by a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Zones,
    FieldDays,
    Config,
    Medals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Changed(Collection),
    UndoArmed(UndoActionKind),
    UndoCleared,
    MedalUnlocked { medal_id: String },
    RankPromoted { rank_index: usize },
}

pub type SubscriptionId = u64;

type Callback = Box<dyn Fn(&ChangeEvent) + Send>;

#[derive(Default)]
pub struct EventBus {
    next_id: SubscriptionId,
    subscribers: Vec<(SubscriptionId, Callback)>,
}

impl EventBus {
    pub fn subscribe(
        &mut self,
        callback: impl Fn(&ChangeEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.next_id += 1;
        self.subscribers.push((self.next_id, Box::new(callback)));
        self.next_id
    }

    /// Removes a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub fn publish(&self, event: &ChangeEvent) {
        for (_, callback) in &self.subscribers {
            callback(event);
        }
    }
}
