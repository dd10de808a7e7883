//! Presentation queue seeding order.

use std::sync::Arc;

use mixer_common::QueueOrdering;
use rand::seq::SliceRandom;

use super::access::RosterMember;

/// Decides the order in which confirmed attendees present.
pub trait OrderingStrategy: Send + Sync {
    /// Presenter ids in presentation order.
    fn order(&self, roster: &[RosterMember]) -> Vec<String>;
}

/// Keep the roster's registration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationOrder;

impl OrderingStrategy for RegistrationOrder {
    fn order(&self, roster: &[RosterMember]) -> Vec<String> {
        roster.iter().map(|m| m.user_id.clone()).collect()
    }
}

/// Uniform random order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShuffledOrder;

impl OrderingStrategy for ShuffledOrder {
    fn order(&self, roster: &[RosterMember]) -> Vec<String> {
        let mut ids: Vec<String> = roster.iter().map(|m| m.user_id.clone()).collect();
        ids.shuffle(&mut rand::thread_rng());
        ids
    }
}

/// Strategy selected by configuration.
#[must_use]
pub fn strategy_for(ordering: QueueOrdering) -> Arc<dyn OrderingStrategy> {
    match ordering {
        QueueOrdering::Registration => Arc::new(RegistrationOrder),
        QueueOrdering::Shuffled => Arc::new(ShuffledOrder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn roster(ids: &[&str]) -> Vec<RosterMember> {
        ids.iter()
            .map(|id| RosterMember {
                user_id: (*id).to_string(),
                display_name: id.to_uppercase(),
                registered_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_registration_order_is_identity() {
        let ids = RegistrationOrder.order(&roster(&["u3", "u1", "u2"]));
        assert_eq!(ids, ["u3", "u1", "u2"]);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut ids = ShuffledOrder.order(&roster(&["u1", "u2", "u3", "u4", "u5"]));
        ids.sort();
        assert_eq!(ids, ["u1", "u2", "u3", "u4", "u5"]);
    }

    #[test]
    fn test_strategy_for_registration() {
        let strategy = strategy_for(QueueOrdering::Registration);
        assert_eq!(strategy.order(&roster(&["b", "a"])), ["b", "a"]);
    }
}
