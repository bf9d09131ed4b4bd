//! Match data structures: scheduled and completed ladder matches.

use crate::models::player::PlayerId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a match.
pub type MatchId = i64;

/// Two-state match lifecycle: a match is scheduled until a result is recorded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Completed,
}

/// Embedded player reference: id plus a denormalized display name.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRef {
    pub id: PlayerId,
    pub name: String,
}

/// A ladder match between two distinct players.
///
/// Invariant: `status == Completed` iff both scores are present and unequal,
/// with `winner_id`/`loser_id` set to the participants by score comparison.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub status: MatchStatus,
    pub player1: PlayerRef,
    pub player2: PlayerRef,
    pub date: NaiveDate,
    pub player1_score: Option<u32>,
    pub player2_score: Option<u32>,
    pub winner_id: Option<PlayerId>,
    pub winner_name: Option<String>,
    pub loser_id: Option<PlayerId>,
    pub loser_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Create a scheduled match with no result.
    pub fn new(id: MatchId, player1: PlayerRef, player2: PlayerRef, date: NaiveDate) -> Self {
        Self {
            id,
            status: MatchStatus::Scheduled,
            player1,
            player2,
            date,
            player1_score: None,
            player2_score: None,
            winner_id: None,
            winner_name: None,
            loser_id: None,
            loser_name: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Participant ids as a pair.
    pub fn participants(&self) -> (PlayerId, PlayerId) {
        (self.player1.id, self.player2.id)
    }

    /// Clear any recorded result, returning the match to the scheduled state.
    pub fn clear_result(&mut self) {
        self.status = MatchStatus::Scheduled;
        self.player1_score = None;
        self.player2_score = None;
        self.winner_id = None;
        self.winner_name = None;
        self.loser_id = None;
        self.loser_name = None;
        self.completed_at = None;
    }
}
