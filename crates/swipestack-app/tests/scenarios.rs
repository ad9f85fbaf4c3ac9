//! End-to-end controller scenarios through the shared handle.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use assert_matches::assert_matches;
use swipestack_app::{
    ReplacementOutcome, ReplacementStrategy, StackChange, StackError, UndoSettings,
};
use swipestack_core::{Direction, SourceError};
use swipestack_testkit::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("swipestack_app=debug")
        .try_init();
}

fn ids<'a>(cards: impl IntoIterator<Item = &'a TestCard>) -> Vec<u64> {
    cards.into_iter().map(|card| card.id).collect()
}

#[tokio::test]
async fn window_swipe_and_undo_walkthrough() {
    init_tracing();
    let controller = controller_with_undo(UndoSettings::with_limit(10), RecordingHooks::new());
    let mut stack = controller.write().await;
    stack.set_collection(cards(1..=5)).await;
    assert_eq!(ids(stack.visible_cards()), vec![1, 2, 3]);

    stack.swipe(Direction::Left).unwrap();
    assert_eq!(stack.current_item().map(|c| c.id), Some(2));
    assert_eq!(ids(stack.visible_cards()), vec![2, 3, 4]);
    assert_eq!(stack.swiped_direction(&1), Some(Direction::Left));

    stack.undo().await.unwrap();
    assert_eq!(stack.current_item().map(|c| c.id), Some(1));
    assert!(!stack.can_undo());

    let positions: Vec<(usize, u64)> = stack
        .visible_cards_with_positions()
        .into_iter()
        .map(|(depth, card)| (depth, card.id))
        .collect();
    assert_eq!(positions, vec![(0, 1), (1, 2), (2, 3)]);
    assert_eq!(stack.position_in_window(&3), Some(2));
    assert_eq!(stack.position_in_window(&4), None);
}

#[tokio::test]
async fn removing_upcoming_cards_keeps_current() {
    let controller = controller_without_undo(1);
    let mut stack = controller.write().await;
    stack.set_collection(cards(1..=5)).await;

    assert_eq!(stack.remove_cards([2, 3]), 2);
    assert_eq!(stack.current_item().map(|c| c.id), Some(1));
    stack.swipe(Direction::Right);
    assert_eq!(stack.current_item().map(|c| c.id), Some(4));
    assert!(stack.store().check_invariants().is_ok());
}

#[tokio::test]
async fn duplicate_append_is_a_noop() {
    let controller = controller_without_undo(1);
    let mut stack = controller.write().await;
    stack.set_collection(cards(1..=3)).await;

    assert_eq!(stack.append_cards(vec![TestCard::titled(2, "dup")]), 0);
    assert_eq!(stack.card_count(), 3);
    assert_eq!(stack.card(&2).map(|c| c.title.as_str()), Some("card 2"));
}

#[tokio::test]
async fn swipe_then_undo_leaves_error_untouched() {
    let controller = controller_with_undo(UndoSettings::with_limit(3), RecordingHooks::new());
    let mut stack = controller.write().await;
    stack.set_collection(cards(1..=3)).await;
    stack.set_error(StackError::Load(SourceError::other("stale")));

    stack.swipe(Direction::Right);
    stack.undo().await;
    assert_eq!(stack.current_item().map(|c| c.id), Some(1));
    assert_matches!(stack.last_error(), Some(StackError::Load(_)));
}

#[tokio::test]
async fn overflow_evicts_only_the_first_card() {
    let hooks = RecordingHooks::new();
    let controller = controller_with_undo(UndoSettings::with_limit(3), hooks.clone());
    let mut stack = controller.write().await;
    stack.set_collection(cards(1..=6)).await;

    for _ in 0..4 {
        stack.swipe(Direction::Left);
    }
    stack.flush_evictions().await;
    assert_eq!(hooks.evicted_ids(), vec![1]);
    assert_eq!(stack.undoable_count(), 3);
    assert_eq!(stack.pending_evictions(), 0);
}

#[tokio::test]
async fn zero_limit_makes_every_swipe_final() {
    let hooks = RecordingHooks::new();
    let controller = controller_with_undo(UndoSettings::with_limit(0), hooks.clone());
    let mut stack = controller.write().await;
    stack.set_collection(cards(1..=3)).await;

    stack.swipe(Direction::Left);
    stack.swipe(Direction::Left);
    stack.flush_evictions().await;
    assert_eq!(hooks.evicted_ids(), vec![1, 2]);
    assert_eq!(stack.undoable_count(), 0);
    assert!(stack.undo().await.is_none());
}

#[tokio::test]
async fn preserve_valid_keeps_tombstones_still_present() {
    let hooks = RecordingHooks::new();
    let controller = controller_with_undo(
        UndoSettings::with_limit(5).replacement_strategy(ReplacementStrategy::PreserveValid),
        hooks.clone(),
    );
    let mut stack = controller.write().await;
    stack.set_collection(cards(1..=4)).await;
    stack.swipe(Direction::Left);
    stack.swipe(Direction::Left);

    let outcome = stack.set_collection(cards([1, 5, 6])).await;
    assert_eq!(outcome, ReplacementOutcome::Applied { evicted: 1 });
    assert_eq!(hooks.evicted_ids(), vec![2]);
    assert!(stack.is_in_tombstones(&1));

    let undone = stack.undo().await.unwrap();
    assert_eq!(undone.id, 1);
    assert_eq!(stack.current_item().map(|c| c.id), Some(1));
}

#[tokio::test]
async fn ask_user_refusal_changes_nothing() {
    let hooks = RecordingHooks::new();
    let controller = controller_with_undo(
        UndoSettings::with_limit(5).replacement_strategy(ReplacementStrategy::AskUser),
        hooks.clone(),
    );
    let mut stack = controller.write().await;
    stack.set_collection(cards(1..=3)).await;
    stack.swipe(Direction::Right);

    let before = stack.snapshot();
    assert_eq!(
        stack.set_collection(cards(7..=9)).await,
        ReplacementOutcome::Abandoned
    );
    assert_eq!(stack.snapshot(), before);
    assert!(hooks.evictions().is_empty());
}

#[tokio::test]
async fn subscribers_see_changes_in_order() {
    let controller = controller_with_undo(UndoSettings::with_limit(5), RecordingHooks::new());
    let mut changes = controller.read().await.subscribe();
    {
        let mut stack = controller.write().await;
        stack.set_collection(cards(1..=3)).await;
        stack.remove_cards(HashSet::from([3]));
        stack.swipe(Direction::Left);
        stack.undo().await;
    }

    let mut seen = Vec::new();
    while let Ok(change) = changes.try_recv() {
        seen.push(change);
    }
    assert_eq!(
        seen,
        vec![
            StackChange::CollectionReplaced { count: 3 },
            StackChange::Removed { count: 1 },
            StackChange::Swiped {
                id: 1,
                direction: Direction::Left
            },
            StackChange::Undone { id: 1 },
        ]
    );
}
