//! Pool ladder league site: library with the ladder core and its collaborators.

pub mod auth;
pub mod logic;
pub mod models;
pub mod persistence;
pub mod publish;

pub use logic::{
    cancel_match, edit_match, move_down, move_up, recalculate_by_record, record_result, reorder,
    reset_all, schedule_match, MatchEdit,
};
pub use models::{
    LadderError, LadderStore, Match, MatchId, MatchStatus, Player, PlayerId, PlayerRef,
    PlayerStatus,
};
