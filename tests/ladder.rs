//! Integration tests for player management and rank mutation.

use pool_ladder_web::persistence::ladder_csv;
use pool_ladder_web::{
    move_down, move_up, recalculate_by_record, record_result, reorder, reset_all, schedule_match,
    LadderError, LadderStore, Player, PlayerId,
};

fn ladder_with(names: &[&str]) -> LadderStore {
    let mut store = LadderStore::new();
    for name in names {
        store.add_player(name).unwrap();
    }
    store
}

fn ids(store: &LadderStore) -> Vec<PlayerId> {
    store.players().iter().map(|p| p.id).collect()
}

/// The set of ranks in use must always be exactly {1..N}.
fn assert_dense_ranks(store: &LadderStore) {
    let mut ranks: Vec<u32> = store.players().iter().map(|p| p.rank).collect();
    ranks.sort_unstable();
    let expected: Vec<u32> = (1..=store.players().len() as u32).collect();
    assert_eq!(ranks, expected);
}

#[test]
fn add_player_appends_at_the_bottom() {
    let store = ladder_with(&["Alice", "Bob", "Carol"]);
    let ranks: Vec<(String, u32)> = store
        .players()
        .iter()
        .map(|p| (p.name.clone(), p.rank))
        .collect();
    assert_eq!(
        ranks,
        vec![
            ("Alice".to_string(), 1),
            ("Bob".to_string(), 2),
            ("Carol".to_string(), 3)
        ]
    );
}

#[test]
fn duplicate_name_is_rejected_case_insensitively() {
    let mut store = ladder_with(&["Carol"]);
    assert!(matches!(
        store.add_player("carol"),
        Err(LadderError::DuplicateName(_))
    ));
    assert_eq!(store.players().len(), 1);
}

#[test]
fn blank_name_is_rejected() {
    let mut store = LadderStore::new();
    assert!(matches!(
        store.add_player("   "),
        Err(LadderError::EmptyName)
    ));
    assert!(store.players().is_empty());
}

#[test]
fn removal_recompacts_ranks_preserving_order() {
    let mut store = ladder_with(&["A", "B", "C", "D", "E"]);
    let third = store.players()[2].id;
    store.remove_player(third).unwrap();

    let names: Vec<&str> = store.players().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "D", "E"]);
    assert_dense_ranks(&store);
    // Players above the removed slot keep their ranks; those below move up one.
    assert_eq!(store.players()[0].rank, 1);
    assert_eq!(store.players()[2].rank, 3);
}

#[test]
fn remove_unknown_player_fails() {
    let mut store = ladder_with(&["A"]);
    assert_eq!(store.remove_player(99), Err(LadderError::PlayerNotFound(99)));
}

#[test]
fn rename_rejects_collisions_and_allows_noop() {
    let mut store = ladder_with(&["Alice", "Bob"]);
    let bob = store.players()[1].id;
    assert!(matches!(
        store.rename_player(bob, "ALICE"),
        Err(LadderError::DuplicateName(_))
    ));
    // Same name after trimming is a no-op, not a duplicate error.
    store.rename_player(bob, "  Bob ").unwrap();
    assert_eq!(store.players()[1].name, "Bob");
}

#[test]
fn rename_updates_names_embedded_in_matches() {
    let mut store = ladder_with(&["Alice", "Bob"]);
    let (alice, bob) = (store.players()[0].id, store.players()[1].id);
    let m = schedule_match(&mut store, alice, bob, "2025-01-01".parse().unwrap())
        .unwrap()
        .id;
    record_result(&mut store, m, 7, 3).unwrap();

    store.rename_player(alice, "Alicia").unwrap();
    let m = store.get_match(m).unwrap();
    assert_eq!(m.player1.name, "Alicia");
    assert_eq!(m.winner_name.as_deref(), Some("Alicia"));
}

#[test]
fn move_up_and_down_swap_adjacent_ranks() {
    let mut store = ladder_with(&["A", "B", "C"]);
    let b = store.players()[1].id;

    move_up(&mut store, b).unwrap();
    let names: Vec<&str> = store.players().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["B", "A", "C"]);
    assert_dense_ranks(&store);

    move_down(&mut store, b).unwrap();
    move_down(&mut store, b).unwrap();
    let names: Vec<&str> = store.players().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "C", "B"]);
}

#[test]
fn move_at_the_edges_is_a_noop() {
    let mut store = ladder_with(&["A", "B"]);
    let (a, b) = (store.players()[0].id, store.players()[1].id);
    move_up(&mut store, a).unwrap();
    move_down(&mut store, b).unwrap();
    assert_eq!(ids(&store), vec![a, b]);
    assert_dense_ranks(&store);
}

#[test]
fn reorder_applies_a_full_permutation() {
    let mut store = ladder_with(&["A", "B", "C"]);
    let before = ids(&store);
    let new_order = vec![before[2], before[0], before[1]];
    reorder(&mut store, &new_order).unwrap();
    assert_eq!(ids(&store), new_order);
    assert_dense_ranks(&store);
}

#[test]
fn reorder_rejects_anything_but_a_permutation() {
    let mut store = ladder_with(&["A", "B", "C"]);
    let before = ids(&store);

    // Missing an id.
    assert_eq!(
        reorder(&mut store, &before[..2]),
        Err(LadderError::InvalidOrder)
    );
    // Duplicate id.
    assert_eq!(
        reorder(&mut store, &[before[0], before[0], before[1]]),
        Err(LadderError::InvalidOrder)
    );
    // Unknown id.
    assert_eq!(
        reorder(&mut store, &[before[0], before[1], 999]),
        Err(LadderError::InvalidOrder)
    );
    // Ranks untouched by the failed attempts.
    assert_eq!(ids(&store), before);
    assert_dense_ranks(&store);
}

#[test]
fn recalculate_sorts_by_wins_then_losses_stably() {
    let mut store = ladder_with(&["A", "B", "C", "D"]);
    let ps = ids(&store);
    // Build records through real matches: B beats A three times, C and D trade wins.
    for _ in 0..3 {
        let m = schedule_match(&mut store, ps[1], ps[0], "2025-02-01".parse().unwrap())
            .unwrap()
            .id;
        record_result(&mut store, m, 5, 2).unwrap();
    }
    let m = schedule_match(&mut store, ps[2], ps[3], "2025-02-02".parse().unwrap())
        .unwrap()
        .id;
    record_result(&mut store, m, 5, 2).unwrap();
    let m = schedule_match(&mut store, ps[3], ps[2], "2025-02-03".parse().unwrap())
        .unwrap()
        .id;
    record_result(&mut store, m, 5, 2).unwrap();

    recalculate_by_record(&mut store);
    let names: Vec<&str> = store.players().iter().map(|p| p.name.as_str()).collect();
    // B: 3-0. C and D are both 1-1 and keep their prior relative order.
    // A: 0-3 last.
    assert_eq!(names, vec!["B", "C", "D", "A"]);
    assert_dense_ranks(&store);
}

#[test]
fn reset_restores_join_order_and_zeroes_records() {
    let mut store = ladder_with(&["A", "B", "C"]);
    let ps = ids(&store);
    let m = schedule_match(&mut store, ps[2], ps[0], "2025-03-01".parse().unwrap())
        .unwrap()
        .id;
    record_result(&mut store, m, 9, 4).unwrap();
    recalculate_by_record(&mut store);
    assert_ne!(ids(&store), ps);

    reset_all(&mut store);
    assert_eq!(ids(&store), ps);
    assert!(store.players().iter().all(|p| p.wins == 0 && p.losses == 0));
    assert_dense_ranks(&store);
}

#[test]
fn rank_invariant_holds_across_mixed_operations() {
    let mut store = ladder_with(&["A", "B", "C", "D", "E"]);
    assert_dense_ranks(&store);

    let ps = ids(&store);
    move_up(&mut store, ps[3]).unwrap();
    assert_dense_ranks(&store);
    store.remove_player(ps[1]).unwrap();
    assert_dense_ranks(&store);
    store.add_player("F").unwrap();
    assert_dense_ranks(&store);
    let current = ids(&store);
    let mut reversed = current.clone();
    reversed.reverse();
    reorder(&mut store, &reversed).unwrap();
    assert_dense_ranks(&store);
    recalculate_by_record(&mut store);
    assert_dense_ranks(&store);
}

#[test]
fn from_parts_repairs_rank_gaps_and_duplicates() {
    let mut a = Player::new(10, "A", 7);
    let b = Player::new(11, "B", 2);
    let mut c = Player::new(12, "C", 2);
    a.wins = 4;
    c.losses = 1;
    let store = LadderStore::from_parts(vec![a, b, c], Vec::new());

    assert_dense_ranks(&store);
    // Ordered by stored rank (stable for the duplicate), then renumbered.
    let names: Vec<&str> = store.players().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["B", "C", "A"]);
    // Records from the data survive the repair.
    assert_eq!(store.players()[2].wins, 4);
}

#[test]
fn csv_export_lists_players_in_rank_order() {
    let store = ladder_with(&["Alice", "Bob"]);
    let csv = ladder_csv(store.players()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "rank,name,wins,losses,status,lastActiveAt");
    assert!(lines[1].starts_with("1,Alice,0,0,active,"));
    assert!(lines[2].starts_with("2,Bob,0,0,active,"));
}
