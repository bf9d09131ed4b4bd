//! Flat-file persistence: `players.json`, `matches.json`, `meta.json` in a
//! data directory, plus the ordered source chain used at startup.
//!
//! Loading is tolerant: missing files mean "not available" (the next source
//! in the chain is tried), and individual records that fail normalization
//! are dropped. Saving always emits the full canonical shapes.

use crate::logic::normalize::{normalize_matches, normalize_players, RawMatch, RawPlayer};
use crate::models::{Match, Player};
use chrono::Utc;
use std::fs;
use std::io;
use std::path::PathBuf;

/// The full persisted collection.
#[derive(Clone, Debug, Default)]
pub struct DataSet {
    pub players: Vec<Player>,
    pub matches: Vec<Match>,
}

/// Errors from the persistence layer.
#[derive(Debug)]
pub enum PersistenceError {
    Io(io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::Io(e) => write!(f, "data file error: {}", e),
            PersistenceError::Json(e) => write!(f, "data file is not valid JSON: {}", e),
            PersistenceError::Csv(e) => write!(f, "csv export failed: {}", e),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<io::Error> for PersistenceError {
    fn from(e: io::Error) -> Self {
        PersistenceError::Io(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Json(e)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(e: csv::Error) -> Self {
        PersistenceError::Csv(e)
    }
}

/// One place data can be loaded from. `Ok(None)` means "not available here,
/// try the next source"; errors are reported but also skip to the next.
pub trait DataSource {
    fn describe(&self) -> String;
    fn load(&self) -> Result<Option<DataSet>, PersistenceError>;
}

/// JSON files in a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn players_path(&self) -> PathBuf {
        self.dir.join("players.json")
    }

    fn matches_path(&self) -> PathBuf {
        self.dir.join("matches.json")
    }

    /// Write the canonical collections plus a `meta.json` update stamp.
    pub fn save(&self, players: &[Player], matches: &[Match]) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.players_path(), serde_json::to_string_pretty(players)?)?;
        fs::write(self.matches_path(), serde_json::to_string_pretty(matches)?)?;
        let meta = serde_json::json!({ "updated": Utc::now().to_rfc3339() });
        fs::write(self.dir.join("meta.json"), serde_json::to_string_pretty(&meta)?)?;
        Ok(())
    }
}

impl DataSource for FileStore {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    /// Load and normalize both collections. A missing players file means
    /// this source has no data; a missing matches file alone yields an
    /// empty match list.
    fn load(&self) -> Result<Option<DataSet>, PersistenceError> {
        let raw_players = match fs::read_to_string(self.players_path()) {
            Ok(text) => serde_json::from_str::<Vec<RawPlayer>>(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let raw_matches = match fs::read_to_string(self.matches_path()) {
            Ok(text) => serde_json::from_str::<Vec<RawMatch>>(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let players = normalize_players(raw_players);
        let matches = normalize_matches(raw_matches, &players);
        Ok(Some(DataSet { players, matches }))
    }
}

/// Try each source in order; the first one with data wins. Sources that
/// error are logged and skipped. Falls back to an empty data set.
pub fn load_chain(sources: &[&dyn DataSource]) -> DataSet {
    for source in sources {
        match source.load() {
            Ok(Some(data)) => {
                log::info!(
                    "Loaded {} player(s), {} match(es) from {}",
                    data.players.len(),
                    data.matches.len(),
                    source.describe()
                );
                return data;
            }
            Ok(None) => log::debug!("No data at {}", source.describe()),
            Err(e) => log::warn!("Skipping {}: {}", source.describe(), e),
        }
    }
    log::info!("No persisted data found, starting empty");
    DataSet::default()
}

/// Render the standings as CSV (rank, name, wins, losses, status, last active).
pub fn ladder_csv(players: &[Player]) -> Result<String, PersistenceError> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(["rank", "name", "wins", "losses", "status", "lastActiveAt"])?;
    for p in players {
        w.write_record([
            p.rank.to_string(),
            p.name.clone(),
            p.wins.to_string(),
            p.losses.to_string(),
            serde_json::to_value(p.status)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            p.last_active_at.to_rfc3339(),
        ])?;
    }
    let bytes = w
        .into_inner()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    String::from_utf8(bytes)
        .map_err(|e| PersistenceError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}
