//! Ladder business logic: rank mutation, match lifecycle, record normalization.

mod lifecycle;
pub mod normalize;
mod ranking;

pub use lifecycle::{cancel_match, edit_match, record_result, schedule_match, MatchEdit};
pub use ranking::{move_down, move_up, recalculate_by_record, reorder, reset_all};
