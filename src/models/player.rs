//! Player data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a player (integer ids, assigned at creation, never reused).
pub type PlayerId = i64;

/// Membership status of a player in the league.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl PlayerStatus {
    /// Parse a status string from persisted data; unknown values fall back to `Active`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "inactive" => PlayerStatus::Inactive,
            "suspended" => PlayerStatus::Suspended,
            _ => PlayerStatus::Active,
        }
    }
}

/// A player on the ladder. Serialized in the canonical camelCase wire shape.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Position on the ladder, dense 1..N. Maintained by the store; never edited directly.
    pub rank: u32,
    pub wins: u32,
    pub losses: u32,
    pub status: PlayerStatus,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Player {
    /// Create a new active player with a zero record, joining at the given rank.
    pub fn new(id: PlayerId, name: impl Into<String>, rank: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            rank,
            wins: 0,
            losses: 0,
            status: PlayerStatus::Active,
            created_at: now,
            last_active_at: now,
        }
    }

    /// Record a win; refreshes `last_active_at`.
    pub fn add_win(&mut self) {
        self.wins += 1;
        self.last_active_at = Utc::now();
    }

    /// Record a loss; refreshes `last_active_at`.
    pub fn add_loss(&mut self) {
        self.losses += 1;
        self.last_active_at = Utc::now();
    }

    /// Undo a previously recorded win (delta correction when a result is edited).
    pub fn revert_win(&mut self) {
        self.wins = self.wins.saturating_sub(1);
    }

    /// Undo a previously recorded loss.
    pub fn revert_loss(&mut self) {
        self.losses = self.losses.saturating_sub(1);
    }
}
