//! Data structures for the ladder: players, matches, and the store that owns them.

mod ladder;
mod matches;
mod player;

pub use ladder::{LadderError, LadderStore};
pub use matches::{Match, MatchId, MatchStatus, PlayerRef};
pub use player::{Player, PlayerId, PlayerStatus};
