//! LadderStore: the owner of the player and match collections.
//!
//! The store keeps the player vector in rank order at all times; ranks are
//! rewritten from positions after every mutation, so the set of ranks in use
//! is always exactly `{1..N}`. Every operation validates fully before
//! mutating, so a failed call leaves the store unchanged.

use crate::models::matches::{Match, MatchId};
use crate::models::player::{Player, PlayerId};

/// Errors from ladder operations. All are local validation/state errors;
/// persistence, auth, and publish failures have their own enums.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LadderError {
    /// Referenced player id does not exist.
    PlayerNotFound(PlayerId),
    /// Referenced match id does not exist.
    MatchNotFound(MatchId),
    /// Player name collides with an existing name (case-insensitive).
    DuplicateName(String),
    /// Player name is empty after trimming.
    EmptyName,
    /// A match references the same player as both participants.
    SamePlayer,
    /// Recorded scores are equal; ladder matches cannot end in a tie.
    TieScore,
    /// A score is missing, negative, or otherwise not a valid score.
    InvalidScore,
    /// The match is in the wrong lifecycle state for this action.
    InvalidState,
    /// A reorder request is not a permutation of the current player ids.
    InvalidOrder,
}

impl LadderError {
    /// Stable machine-readable error kind, surfaced in API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            LadderError::PlayerNotFound(_) | LadderError::MatchNotFound(_) => "not_found",
            LadderError::DuplicateName(_) => "duplicate_name",
            LadderError::EmptyName => "empty_name",
            LadderError::SamePlayer => "same_player",
            LadderError::TieScore => "tie_score",
            LadderError::InvalidScore => "invalid_score",
            LadderError::InvalidState => "invalid_state",
            LadderError::InvalidOrder => "invalid_order",
        }
    }
}

impl std::fmt::Display for LadderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LadderError::PlayerNotFound(_) => write!(f, "Player not found"),
            LadderError::MatchNotFound(_) => write!(f, "Match not found"),
            LadderError::DuplicateName(name) => {
                write!(f, "A player named \"{}\" already exists", name)
            }
            LadderError::EmptyName => write!(f, "Player name must not be empty"),
            LadderError::SamePlayer => write!(f, "A match needs two different players"),
            LadderError::TieScore => write!(f, "Match cannot end in a tie"),
            LadderError::InvalidScore => write!(f, "Scores must be whole numbers 0 or higher"),
            LadderError::InvalidState => write!(f, "Invalid match state for this action"),
            LadderError::InvalidOrder => {
                write!(f, "New order must contain each current player exactly once")
            }
        }
    }
}

impl std::error::Error for LadderError {}

/// In-memory ladder: players in rank order plus the match list.
#[derive(Clone, Debug, Default)]
pub struct LadderStore {
    pub(crate) players: Vec<Player>,
    pub(crate) matches: Vec<Match>,
    next_player_id: PlayerId,
    next_match_id: MatchId,
}

impl LadderStore {
    /// Empty ladder.
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            matches: Vec::new(),
            next_player_id: 1,
            next_match_id: 1,
        }
    }

    /// Build a store from already-normalized records (the load boundary).
    ///
    /// Players are ordered by their stored rank (unranked records last, in
    /// input order) and then renumbered densely, repairing any gaps or
    /// duplicates in the incoming data.
    pub fn from_parts(mut players: Vec<Player>, matches: Vec<Match>) -> Self {
        players.sort_by_key(|p| if p.rank == 0 { u32::MAX } else { p.rank });
        let next_player_id = players.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let next_match_id = matches.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        let mut store = Self {
            players,
            matches,
            next_player_id,
            next_match_id,
        };
        store.renumber();
        store
    }

    /// Players in rank order (read-only view for rendering/serialization).
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// All matches, scheduled and completed.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn get_match(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub(crate) fn match_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    /// Rewrite all ranks from vector positions: dense 1..N.
    pub(crate) fn renumber(&mut self) {
        for (i, p) in self.players.iter_mut().enumerate() {
            p.rank = i as u32 + 1;
        }
    }

    pub(crate) fn take_match_id(&mut self) -> MatchId {
        let id = self.next_match_id;
        self.next_match_id += 1;
        id
    }

    /// Add a player at the bottom of the ladder. Names must be unique
    /// (case-insensitive) and non-empty after trimming.
    pub fn add_player(&mut self, name: &str) -> Result<&Player, LadderError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LadderError::EmptyName);
        }
        if self.players.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
            return Err(LadderError::DuplicateName(name.to_string()));
        }
        let id = self.next_player_id;
        self.next_player_id += 1;
        let rank = self.players.len() as u32 + 1;
        self.players.push(Player::new(id, name, rank));
        Ok(self.players.last().unwrap())
    }

    /// Remove a player and re-compact ranks: everyone previously below moves
    /// up one slot, relative order preserved. Match history is kept.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<(), LadderError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(LadderError::PlayerNotFound(id))?;
        self.players.remove(idx);
        self.renumber();
        Ok(())
    }

    /// Rename a player. No-op when the new name equals the current one after
    /// trimming; the denormalized names embedded in match records are kept in
    /// sync on success.
    pub fn rename_player(&mut self, id: PlayerId, new_name: &str) -> Result<(), LadderError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(LadderError::EmptyName);
        }
        let current = self
            .player(id)
            .ok_or(LadderError::PlayerNotFound(id))?
            .name
            .clone();
        if current == new_name {
            return Ok(());
        }
        let taken = self
            .players
            .iter()
            .any(|p| p.id != id && p.name.eq_ignore_ascii_case(new_name));
        if taken {
            return Err(LadderError::DuplicateName(new_name.to_string()));
        }
        if let Some(p) = self.player_mut(id) {
            p.name = new_name.to_string();
        }
        for m in &mut self.matches {
            if m.player1.id == id {
                m.player1.name = new_name.to_string();
            }
            if m.player2.id == id {
                m.player2.name = new_name.to_string();
            }
            if m.winner_id == Some(id) {
                m.winner_name = Some(new_name.to_string());
            }
            if m.loser_id == Some(id) {
                m.loser_name = Some(new_name.to_string());
            }
        }
        Ok(())
    }
}
