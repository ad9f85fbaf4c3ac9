//! # Replacement Policy
//!
//! Decides whether a wholesale collection swap may proceed while undo history
//! exists, and which tombstones survive it.
//!
//! The controller only consults this module when the ledger is non-empty;
//! with an empty ledger replacement is unconditional.
//!
//! | strategy          | proceed            | survivors                    |
//! |-------------------|--------------------|------------------------------|
//! | `ClearTombstones` | yes                | none                         |
//! | `PreserveValid`   | yes                | tombstones present in new set|
//! | `BlockIfPresent`  | no                 | n/a                          |
//! | `AskUser`         | `confirm().await`  | none                         |

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;

use crate::config::ReplacementStrategy;
use crate::item::CardItem;
use crate::ledger::Tombstone;

/// Outcome of a replacement decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementDecision<Id: Eq + Hash> {
    /// Whether the replacement may be applied
    pub proceed: bool,
    /// Tombstone IDs that stay undoable after the swap
    pub surviving: HashSet<Id>,
}

impl<Id: Eq + Hash + Clone> ReplacementDecision<Id> {
    /// Abandon the replacement; nothing changes.
    pub fn abandon() -> Self {
        Self {
            proceed: false,
            surviving: HashSet::new(),
        }
    }

    /// Proceed and evict every tombstone.
    pub fn clear_all() -> Self {
        Self {
            proceed: true,
            surviving: HashSet::new(),
        }
    }

    /// Proceed keeping the given tombstones.
    pub fn preserve(surviving: HashSet<Id>) -> Self {
        Self {
            proceed: true,
            surviving,
        }
    }

    /// Whether the tombstone for `id` survives.
    pub fn survives(&self, id: &Id) -> bool {
        self.proceed && self.surviving.contains(id)
    }

    /// Split `tombstones` into `(survivors, evictees)`, both oldest first.
    ///
    /// An abandoned decision keeps nothing; callers check `proceed` before
    /// touching the ledger.
    pub fn partition<T>(
        &self,
        tombstones: Vec<Tombstone<T>>,
    ) -> (Vec<Tombstone<T>>, Vec<Tombstone<T>>)
    where
        T: CardItem<Id = Id>,
    {
        tombstones
            .into_iter()
            .partition(|tombstone| self.survives(&tombstone.id))
    }
}

/// Decide how a replacement with `new_items` interacts with `tombstones`.
///
/// `confirm` is only awaited for [`ReplacementStrategy::AskUser`].
pub async fn decide<T, F, Fut>(
    strategy: ReplacementStrategy,
    tombstones: &[Tombstone<T>],
    new_items: &[T],
    confirm: F,
) -> ReplacementDecision<T::Id>
where
    T: CardItem,
    F: FnOnce() -> Fut,
    Fut: Future<Output = bool>,
{
    match strategy {
        ReplacementStrategy::ClearTombstones => ReplacementDecision::clear_all(),
        ReplacementStrategy::PreserveValid => {
            let incoming: HashSet<T::Id> = new_items.iter().map(|item| item.id()).collect();
            let surviving = tombstones
                .iter()
                .filter(|t| incoming.contains(&t.id))
                .map(|t| t.id.clone())
                .collect();
            ReplacementDecision::preserve(surviving)
        }
        ReplacementStrategy::BlockIfPresent => ReplacementDecision::abandon(),
        ReplacementStrategy::AskUser => {
            if confirm().await {
                ReplacementDecision::clear_all()
            } else {
                ReplacementDecision::abandon()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;
    use futures::executor::block_on;
    use std::future::ready;

    #[derive(Debug, Clone, PartialEq)]
    struct Card(char);

    impl CardItem for Card {
        type Id = char;

        fn id(&self) -> char {
            self.0
        }
    }

    fn tombstones(ids: &[char]) -> Vec<Tombstone<Card>> {
        ids.iter()
            .map(|&id| Tombstone::new(Card(id), Direction::Left))
            .collect()
    }

    fn never_asked() -> std::future::Ready<bool> {
        panic!("confirm must not be called for this strategy")
    }

    #[test]
    fn clear_tombstones_proceeds_without_survivors() {
        let decision = block_on(decide(
            ReplacementStrategy::ClearTombstones,
            &tombstones(&['a', 'b']),
            &[Card('a')],
            never_asked,
        ));
        assert_eq!(decision, ReplacementDecision::clear_all());
    }

    #[test]
    fn preserve_valid_keeps_ids_in_new_set() {
        let decision = block_on(decide(
            ReplacementStrategy::PreserveValid,
            &tombstones(&['a', 'b']),
            &[Card('a'), Card('c')],
            never_asked,
        ));
        assert!(decision.proceed);
        assert!(decision.survives(&'a'));
        assert!(!decision.survives(&'b'));
        assert_eq!(decision.surviving.len(), 1);
    }

    #[test]
    fn block_if_present_abandons() {
        let decision = block_on(decide(
            ReplacementStrategy::BlockIfPresent,
            &tombstones(&['a']),
            &[Card('a')],
            never_asked,
        ));
        assert!(!decision.proceed);
        assert!(!decision.survives(&'a'));
    }

    #[test]
    fn ask_user_follows_confirmation() {
        let stones = tombstones(&['a']);
        let yes = block_on(decide(
            ReplacementStrategy::AskUser,
            &stones,
            &[Card('a')],
            || ready(true),
        ));
        assert_eq!(yes, ReplacementDecision::clear_all());

        let no = block_on(decide(
            ReplacementStrategy::AskUser,
            &stones,
            &[Card('a')],
            || ready(false),
        ));
        assert_eq!(no, ReplacementDecision::abandon());
    }

    #[test]
    fn partition_splits_survivors_from_evictees_in_order() {
        let decision = block_on(decide(
            ReplacementStrategy::PreserveValid,
            &tombstones(&['a', 'b', 'c', 'd']),
            &[Card('d'), Card('b')],
            never_asked,
        ));
        let (kept, evicted) = decision.partition(tombstones(&['a', 'b', 'c', 'd']));
        let ids = |stones: Vec<Tombstone<Card>>| -> Vec<char> {
            stones.into_iter().map(|t| t.id).collect()
        };
        assert_eq!(ids(kept), vec!['b', 'd']);
        assert_eq!(ids(evicted), vec!['a', 'c']);

        let (kept, evicted) =
            ReplacementDecision::clear_all().partition(tombstones(&['a', 'b']));
        assert!(kept.is_empty());
        assert_eq!(evicted.len(), 2);
    }
}
