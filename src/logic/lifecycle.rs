//! Match lifecycle: scheduling, cancellation, result recording, and edits.
//!
//! Recording a result settles stats (winner +1 win, loser +1 loss, both
//! touched `last_active_at`) but never moves ranks; rank changes are a
//! separate admin action in `ranking`. Editing an already-completed match
//! recomputes settlement as a delta so stats are never double-counted.

use crate::models::{
    LadderError, LadderStore, Match, MatchId, MatchStatus, PlayerId, PlayerRef,
};
use chrono::{NaiveDate, Utc};

/// Partial edit of an existing match. `None` fields keep their current value.
#[derive(Clone, Debug, Default)]
pub struct MatchEdit {
    pub player1_id: Option<PlayerId>,
    pub player2_id: Option<PlayerId>,
    pub date: Option<NaiveDate>,
    pub status: Option<MatchStatus>,
    pub player1_score: Option<i64>,
    pub player2_score: Option<i64>,
}

/// Create a scheduled match between two distinct, existing players.
pub fn schedule_match(
    store: &mut LadderStore,
    player1_id: PlayerId,
    player2_id: PlayerId,
    date: NaiveDate,
) -> Result<&Match, LadderError> {
    if player1_id == player2_id {
        return Err(LadderError::SamePlayer);
    }
    let p1 = player_ref(store, player1_id)?;
    let p2 = player_ref(store, player2_id)?;
    let id = store.take_match_id();
    store.matches.push(Match::new(id, p1, p2, date));
    Ok(store.matches.last().unwrap())
}

/// Cancel (delete) a scheduled match. Completed matches cannot be cancelled,
/// only edited.
pub fn cancel_match(store: &mut LadderStore, id: MatchId) -> Result<(), LadderError> {
    let idx = store
        .matches
        .iter()
        .position(|m| m.id == id)
        .ok_or(LadderError::MatchNotFound(id))?;
    if store.matches[idx].status != MatchStatus::Scheduled {
        return Err(LadderError::InvalidState);
    }
    store.matches.remove(idx);
    Ok(())
}

/// Record the result of a scheduled match: validates scores, completes the
/// match with winner/loser by score comparison, and settles stats.
///
/// Atomic from the caller's view: every check runs before any mutation.
pub fn record_result(
    store: &mut LadderStore,
    id: MatchId,
    score1: i64,
    score2: i64,
) -> Result<&Match, LadderError> {
    let m = store.get_match(id).ok_or(LadderError::MatchNotFound(id))?;
    if m.status != MatchStatus::Scheduled {
        return Err(LadderError::InvalidState);
    }
    let (p1, p2) = m.participants();
    let (s1, s2) = validate_scores(score1, score2)?;
    // Both participants must still be on the ladder for settlement.
    store.player(p1).ok_or(LadderError::PlayerNotFound(p1))?;
    store.player(p2).ok_or(LadderError::PlayerNotFound(p2))?;

    let m = store.match_mut(id).unwrap();
    let (winner, loser) = if s1 > s2 {
        (m.player1.clone(), m.player2.clone())
    } else {
        (m.player2.clone(), m.player1.clone())
    };
    m.status = MatchStatus::Completed;
    m.player1_score = Some(s1);
    m.player2_score = Some(s2);
    m.winner_id = Some(winner.id);
    m.winner_name = Some(winner.name.clone());
    m.loser_id = Some(loser.id);
    m.loser_name = Some(loser.name.clone());
    m.completed_at = Some(Utc::now());

    apply_settlement(store, winner.id, loser.id);
    Ok(store.get_match(id).unwrap())
}

/// Edit an existing match: participants, date, status, and scores.
///
/// Transitioning into `Completed` applies the same score validation and
/// settlement as `record_result`. If the match was already completed, the
/// previous winner/loser increments are reverted before the new ones are
/// applied; transitioning back to `Scheduled` clears the result and reverts
/// settlement.
pub fn edit_match(
    store: &mut LadderStore,
    id: MatchId,
    edit: MatchEdit,
) -> Result<&Match, LadderError> {
    let old = store
        .get_match(id)
        .ok_or(LadderError::MatchNotFound(id))?
        .clone();

    let p1_id = edit.player1_id.unwrap_or(old.player1.id);
    let p2_id = edit.player2_id.unwrap_or(old.player2.id);
    if p1_id == p2_id {
        return Err(LadderError::SamePlayer);
    }
    let p1 = player_ref(store, p1_id)?;
    let p2 = player_ref(store, p2_id)?;

    let new_status = edit.status.unwrap_or(old.status);
    let new_result = if new_status == MatchStatus::Completed {
        let s1 = edit
            .player1_score
            .or(old.player1_score.map(i64::from))
            .ok_or(LadderError::InvalidScore)?;
        let s2 = edit
            .player2_score
            .or(old.player2_score.map(i64::from))
            .ok_or(LadderError::InvalidScore)?;
        let (s1, s2) = validate_scores(s1, s2)?;
        let (winner, loser) = if s1 > s2 {
            (p1.clone(), p2.clone())
        } else {
            (p2.clone(), p1.clone())
        };
        Some((s1, s2, winner, loser))
    } else {
        None
    };

    // Validation done; from here every step succeeds.
    if old.status == MatchStatus::Completed {
        revert_settlement(store, old.winner_id, old.loser_id);
    }

    let m = store.match_mut(id).unwrap();
    m.player1 = p1;
    m.player2 = p2;
    if let Some(date) = edit.date {
        m.date = date;
    }
    match &new_result {
        Some((s1, s2, winner, loser)) => {
            m.status = MatchStatus::Completed;
            m.player1_score = Some(*s1);
            m.player2_score = Some(*s2);
            m.winner_id = Some(winner.id);
            m.winner_name = Some(winner.name.clone());
            m.loser_id = Some(loser.id);
            m.loser_name = Some(loser.name.clone());
            // completed_at is set once, on the first transition to completed.
            if m.completed_at.is_none() {
                m.completed_at = Some(Utc::now());
            }
        }
        None => m.clear_result(),
    }

    if let Some((_, _, winner, loser)) = new_result {
        apply_settlement(store, winner.id, loser.id);
    }
    Ok(store.get_match(id).unwrap())
}

fn player_ref(store: &LadderStore, id: PlayerId) -> Result<PlayerRef, LadderError> {
    let p = store.player(id).ok_or(LadderError::PlayerNotFound(id))?;
    Ok(PlayerRef {
        id: p.id,
        name: p.name.clone(),
    })
}

fn validate_scores(score1: i64, score2: i64) -> Result<(u32, u32), LadderError> {
    if score1 < 0 || score2 < 0 || score1 > u32::MAX as i64 || score2 > u32::MAX as i64 {
        return Err(LadderError::InvalidScore);
    }
    if score1 == score2 {
        return Err(LadderError::TieScore);
    }
    Ok((score1 as u32, score2 as u32))
}

fn apply_settlement(store: &mut LadderStore, winner_id: PlayerId, loser_id: PlayerId) {
    if let Some(w) = store.player_mut(winner_id) {
        w.add_win();
    }
    if let Some(l) = store.player_mut(loser_id) {
        l.add_loss();
    }
}

/// Undo a prior settlement. Participants removed from the ladder since the
/// result was recorded are skipped.
fn revert_settlement(
    store: &mut LadderStore,
    winner_id: Option<PlayerId>,
    loser_id: Option<PlayerId>,
) {
    if let Some(w) = winner_id.and_then(|id| store.player_mut(id)) {
        w.revert_win();
    }
    if let Some(l) = loser_id.and_then(|id| store.player_mut(id)) {
        l.revert_loss();
    }
}
