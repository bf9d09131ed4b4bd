//! Normalization of persisted records into the canonical shapes.
//!
//! The data files have gone through several site revisions with divergent
//! conventions: snake_case vs camelCase field names, nested
//! (`player1: {id, name}`) vs flat (`player1_id`) participant references,
//! and string vs numeric ids and scores. Everything is unified here, once,
//! at the load boundary; records that cannot resolve to a valid shape are
//! dropped rather than failing the whole batch.

use crate::models::{Match, MatchStatus, Player, PlayerId, PlayerRef, PlayerStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// A scalar that may arrive as a JSON number or a numeric string.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Str(String),
}

impl RawNumber {
    fn as_i64(&self) -> Option<i64> {
        match self {
            RawNumber::Int(n) => Some(*n),
            RawNumber::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            RawNumber::Float(_) => None,
            RawNumber::Str(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    s.parse().ok()
                }
            }
        }
    }
}

/// Player record as found on disk, any revision's shape.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPlayer {
    pub id: Option<RawNumber>,
    pub name: Option<String>,
    pub rank: Option<RawNumber>,
    pub wins: Option<RawNumber>,
    pub losses: Option<RawNumber>,
    pub status: Option<String>,
    #[serde(alias = "createdAt", alias = "created")]
    pub created_at: Option<String>,
    #[serde(alias = "lastActiveAt", alias = "lastActive", alias = "last_active")]
    pub last_active_at: Option<String>,
}

/// Nested participant reference (`player1: {id, name}` shape).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawSide {
    pub id: Option<RawNumber>,
    pub name: Option<String>,
}

/// Match record as found on disk, any revision's shape.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawMatch {
    pub id: Option<RawNumber>,
    pub status: Option<String>,
    pub player1: Option<RawSide>,
    pub player2: Option<RawSide>,
    #[serde(alias = "player1Id")]
    pub player1_id: Option<RawNumber>,
    #[serde(alias = "player1Name")]
    pub player1_name: Option<String>,
    #[serde(alias = "player2Id")]
    pub player2_id: Option<RawNumber>,
    #[serde(alias = "player2Name")]
    pub player2_name: Option<String>,
    #[serde(alias = "match_date", alias = "matchDate")]
    pub date: Option<String>,
    #[serde(alias = "player1Score")]
    pub player1_score: Option<RawNumber>,
    #[serde(alias = "player2Score")]
    pub player2_score: Option<RawNumber>,
    #[serde(alias = "winnerId")]
    pub winner_id: Option<RawNumber>,
    #[serde(alias = "loserId")]
    pub loser_id: Option<RawNumber>,
    #[serde(alias = "createdAt", alias = "created")]
    pub created_at: Option<String>,
    #[serde(alias = "completedAt", alias = "completedDate")]
    pub completed_at: Option<String>,
}

/// Normalize a batch of player records, dropping any that cannot resolve.
/// Ranks are not trusted here; the store renumbers after loading.
pub fn normalize_players(raws: Vec<RawPlayer>) -> Vec<Player> {
    raws.into_iter().filter_map(normalize_player).collect()
}

fn normalize_player(raw: RawPlayer) -> Option<Player> {
    let id = raw.id.as_ref().and_then(RawNumber::as_i64)?;
    let name = raw.name.as_deref().map(str::trim).unwrap_or("");
    if name.is_empty() {
        return None;
    }
    let now = Utc::now();
    Some(Player {
        id,
        name: name.to_string(),
        rank: coerce_count(&raw.rank),
        wins: coerce_count(&raw.wins),
        losses: coerce_count(&raw.losses),
        status: raw
            .status
            .as_deref()
            .map(PlayerStatus::parse)
            .unwrap_or_default(),
        created_at: parse_timestamp(raw.created_at.as_deref()).unwrap_or(now),
        last_active_at: parse_timestamp(raw.last_active_at.as_deref()).unwrap_or(now),
    })
}

/// Normalize a batch of match records against the already-normalized player
/// list (used to resolve missing participant names).
pub fn normalize_matches(raws: Vec<RawMatch>, players: &[Player]) -> Vec<Match> {
    raws.into_iter()
        .filter_map(|raw| normalize_match(raw, players))
        .collect()
}

fn normalize_match(raw: RawMatch, players: &[Player]) -> Option<Match> {
    let id = raw.id.as_ref().and_then(RawNumber::as_i64)?;
    let player1 = resolve_side(&raw.player1, &raw.player1_id, &raw.player1_name, players, 1)?;
    let player2 = resolve_side(&raw.player2, &raw.player2_id, &raw.player2_name, players, 2)?;
    let date = parse_date(raw.date.as_deref())?;

    let score1 = score_of(&raw.player1_score);
    let score2 = score_of(&raw.player2_score);
    let declared_completed = raw
        .status
        .as_deref()
        .map(|s| s.trim().eq_ignore_ascii_case("completed"))
        .unwrap_or(false);

    let created_at = parse_timestamp(raw.created_at.as_deref()).unwrap_or_else(Utc::now);
    let mut m = Match {
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
        created_at,
        completed_at: None,
    };

    // A match is completed iff both scores are present and unequal; winner
    // and loser are recomputed from the scores, never trusted from the file.
    if let (true, Some(s1), Some(s2)) = (declared_completed, score1, score2) {
        if s1 != s2 {
            let (winner, loser) = if s1 > s2 {
                (m.player1.clone(), m.player2.clone())
            } else {
                (m.player2.clone(), m.player1.clone())
            };
            m.status = MatchStatus::Completed;
            m.player1_score = Some(s1);
            m.player2_score = Some(s2);
            m.winner_id = Some(winner.id);
            m.winner_name = Some(winner.name);
            m.loser_id = Some(loser.id);
            m.loser_name = Some(loser.name);
            m.completed_at =
                Some(parse_timestamp(raw.completed_at.as_deref()).unwrap_or(created_at));
        }
    }
    Some(m)
}

fn resolve_side(
    nested: &Option<RawSide>,
    flat_id: &Option<RawNumber>,
    flat_name: &Option<String>,
    players: &[Player],
    slot: u8,
) -> Option<PlayerRef> {
    let id: PlayerId = nested
        .as_ref()
        .and_then(|s| s.id.as_ref())
        .or(flat_id.as_ref())
        .and_then(RawNumber::as_i64)?;
    let name = nested
        .as_ref()
        .and_then(|s| s.name.clone())
        .or_else(|| flat_name.clone())
        .filter(|n| !n.trim().is_empty())
        .or_else(|| players.iter().find(|p| p.id == id).map(|p| p.name.clone()))
        .unwrap_or_else(|| format!("Player {}", slot));
    Some(PlayerRef { id, name })
}

fn coerce_count(raw: &Option<RawNumber>) -> u32 {
    raw.as_ref()
        .and_then(RawNumber::as_i64)
        .filter(|n| *n >= 0)
        .map(|n| n.min(u32::MAX as i64) as u32)
        .unwrap_or(0)
}

fn score_of(raw: &Option<RawNumber>) -> Option<u32> {
    raw.as_ref()
        .and_then(RawNumber::as_i64)
        .filter(|n| *n >= 0 && *n <= u32::MAX as i64)
        .map(|n| n as u32)
}

fn parse_timestamp(s: Option<&str>) -> Option<DateTime<Utc>> {
    let s = s?.trim();
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Dates arrive as plain `YYYY-MM-DD` or as a full timestamp; either works.
fn parse_date(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}
