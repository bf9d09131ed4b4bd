//! Rank mutation: manual moves, full reorder, record-based recalculation, reset.
//!
//! Settlement never touches ranks; these are the only operations that do.

use crate::models::{LadderError, LadderStore, PlayerId};
use std::cmp::Reverse;
use std::collections::HashSet;

/// Swap the player with the one ranked directly above. No-op at rank 1.
pub fn move_up(store: &mut LadderStore, id: PlayerId) -> Result<(), LadderError> {
    let idx = store
        .players
        .iter()
        .position(|p| p.id == id)
        .ok_or(LadderError::PlayerNotFound(id))?;
    if idx > 0 {
        store.players.swap(idx, idx - 1);
        store.renumber();
    }
    Ok(())
}

/// Swap the player with the one ranked directly below. No-op at rank N.
pub fn move_down(store: &mut LadderStore, id: PlayerId) -> Result<(), LadderError> {
    let idx = store
        .players
        .iter()
        .position(|p| p.id == id)
        .ok_or(LadderError::PlayerNotFound(id))?;
    if idx + 1 < store.players.len() {
        store.players.swap(idx, idx + 1);
        store.renumber();
    }
    Ok(())
}

/// Assign ranks 1..N positionally from a full permutation of the current
/// player ids (the validated entry point for drag-and-drop reordering).
///
/// Fails with `InvalidOrder` and leaves ranks unchanged if the input is
/// missing an id, repeats one, or names an unknown one.
pub fn reorder(store: &mut LadderStore, new_order: &[PlayerId]) -> Result<(), LadderError> {
    if new_order.len() != store.players.len() {
        return Err(LadderError::InvalidOrder);
    }
    let mut seen = HashSet::with_capacity(new_order.len());
    for &id in new_order {
        if !seen.insert(id) || store.player(id).is_none() {
            return Err(LadderError::InvalidOrder);
        }
    }
    let mut reordered = Vec::with_capacity(store.players.len());
    for &id in new_order {
        let idx = store.players.iter().position(|p| p.id == id).unwrap();
        reordered.push(store.players.remove(idx));
    }
    store.players = reordered;
    store.renumber();
    Ok(())
}

/// Re-sort the ladder by record: most wins first, fewest losses as the
/// tiebreak. The sort is stable, so equal records keep their current order.
pub fn recalculate_by_record(store: &mut LadderStore) {
    store.players.sort_by_key(|p| (Reverse(p.wins), p.losses));
    store.renumber();
}

/// Zero every record and restore ranks to original join order (ascending
/// player id; ids are assigned monotonically at creation).
pub fn reset_all(store: &mut LadderStore) {
    store.players.sort_by_key(|p| p.id);
    for p in &mut store.players {
        p.wins = 0;
        p.losses = 0;
    }
    store.renumber();
}
