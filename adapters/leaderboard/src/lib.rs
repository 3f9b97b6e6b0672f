#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Local leaderboard ranking finished Knight Runner runs.
//!
//! Scores are kept best first, ties going to the run that was recorded
//! earlier, and persisted as JSON. A missing or unreadable file yields an
//! empty board rather than an error so a damaged file never blocks play.

use std::{
    cmp::Ordering,
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of entries kept on the board.
pub const MAX_ENTRIES: usize = 50;

/// Longest player name stored, in characters.
pub const MAX_NAME_CHARS: usize = 16;

/// Name recorded when the player leaves the name blank.
pub const DEFAULT_NAME: &str = "Player";

/// One finished run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Player name after trimming and truncation.
    pub name: String,
    /// Survival time in seconds, rounded to one decimal place.
    pub score: f64,
    /// Milliseconds since the Unix epoch at which the run was recorded.
    #[serde(rename = "ts")]
    pub timestamp: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct LeaderboardFile {
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    entries: Vec<ScoreEntry>,
}

/// Older saves hold a bare list of entries.
#[derive(Deserialize)]
#[serde(untagged)]
enum Stored {
    Board(LeaderboardFile),
    Entries(Vec<ScoreEntry>),
}

/// Errors raised while persisting the leaderboard.
#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// The leaderboard file exists but could not be read.
    #[error("failed to read leaderboard from {path}")]
    Read {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The leaderboard file could not be written.
    #[error("failed to write leaderboard to {path}")]
    Write {
        /// File that failed to save.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The board could not be encoded as JSON.
    #[error("failed to encode leaderboard")]
    Encode(#[from] serde_json::Error),
}

/// Ranked list of finished runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Leaderboard {
    file: LeaderboardFile,
}

impl Leaderboard {
    /// Creates an empty leaderboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finished run and returns its 1-based rank, or `None` when it
    /// fell off the end of the board.
    pub fn submit(&mut self, name: &str, score: Duration, timestamp: u64) -> Option<usize> {
        let name = normalize_name(name);
        self.file.last_name = Some(name.clone());

        let entry = ScoreEntry {
            name,
            score: round_score(score),
            timestamp,
        };
        let index = self
            .file
            .entries
            .partition_point(|existing| ranking(existing, &entry) != Ordering::Greater);
        self.file.entries.insert(index, entry);
        self.file.entries.truncate(MAX_ENTRIES);

        (index < MAX_ENTRIES).then_some(index + 1)
    }

    /// Entries ordered best first.
    #[must_use]
    pub fn ranked(&self) -> &[ScoreEntry] {
        &self.file.entries
    }

    /// Name used for the most recent submission.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.file.last_name.as_deref()
    }

    /// Removes every entry while remembering the last name.
    pub fn clear(&mut self) {
        self.file.entries.clear();
    }

    /// Loads a leaderboard from `path`.
    ///
    /// A missing file or one that does not parse yields an empty board.
    pub fn load(path: &Path) -> Result<Self, LeaderboardError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(LeaderboardError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut file = match serde_json::from_str::<Stored>(&raw) {
            Ok(Stored::Board(file)) => file,
            Ok(Stored::Entries(entries)) => LeaderboardFile {
                last_name: None,
                entries,
            },
            Err(error) => {
                warn!(
                    "ignoring unreadable leaderboard {}: {error}",
                    path.display()
                );
                LeaderboardFile::default()
            }
        };
        sort_entries(&mut file.entries);
        file.entries.truncate(MAX_ENTRIES);
        Ok(Self { file })
    }

    /// Writes the leaderboard to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), LeaderboardError> {
        let encoded = serde_json::to_string_pretty(&self.file)?;
        fs::write(path, encoded).map_err(|source| LeaderboardError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return DEFAULT_NAME.to_owned();
    }
    trimmed.chars().take(MAX_NAME_CHARS).collect()
}

fn round_score(score: Duration) -> f64 {
    (score.as_secs_f64() * 10.0).round() / 10.0
}

/// Best first: higher score, then the earlier timestamp.
fn ranking(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.timestamp.cmp(&b.timestamp))
}

fn sort_entries(entries: &mut [ScoreEntry]) {
    entries.sort_by(ranking);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(value: f64) -> Duration {
        Duration::from_secs_f64(value)
    }

    fn scratch_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "knight-runner-leaderboard-{tag}-{}.json",
            std::process::id()
        ))
    }

    #[test]
    fn ranks_by_score_then_earlier_timestamp() {
        let mut board = Leaderboard::new();
        assert_eq!(board.submit("late", secs(12.0), 300), Some(1));
        assert_eq!(board.submit("best", secs(30.04), 100), Some(1));
        assert_eq!(board.submit("early", secs(12.0), 200), Some(2));

        let names: Vec<&str> = board.ranked().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["best", "early", "late"]);
        assert_eq!(board.ranked()[0].score, 30.0);
    }

    #[test]
    fn identical_submissions_rank_below_the_earlier_copy() {
        let mut board = Leaderboard::new();
        assert_eq!(board.submit("Ada", secs(7.0), 50), Some(1));
        assert_eq!(board.submit("Ada", secs(7.0), 50), Some(2));
        assert_eq!(board.submit("Ada", secs(7.0), 50), Some(3));
        assert_eq!(board.submit("Ada", secs(9.0), 50), Some(1));
        assert_eq!(board.ranked().len(), 4);
    }

    #[test]
    fn board_is_capped() {
        let mut board = Leaderboard::new();
        for index in 0..(MAX_ENTRIES as u64 + 5) {
            let _ = board.submit("runner", secs(index as f64), index);
        }
        assert_eq!(board.ranked().len(), MAX_ENTRIES);
        assert_eq!(board.ranked()[0].score, (MAX_ENTRIES + 4) as f64);
        assert_eq!(board.submit("slow", secs(0.0), 999), None);
    }

    #[test]
    fn names_are_trimmed_defaulted_and_truncated() {
        let mut board = Leaderboard::new();
        let _ = board.submit("   ", secs(1.0), 1);
        assert_eq!(board.ranked()[0].name, DEFAULT_NAME);

        let _ = board.submit("  Sir Galahad the Exceedingly Brave ", secs(2.0), 2);
        assert_eq!(board.ranked()[0].name, "Sir Galahad the ");
        assert_eq!(board.last_name(), Some("Sir Galahad the "));
    }

    #[test]
    fn clear_keeps_last_name() {
        let mut board = Leaderboard::new();
        let _ = board.submit("Ada", secs(4.2), 1);
        board.clear();
        assert!(board.ranked().is_empty());
        assert_eq!(board.last_name(), Some("Ada"));
    }

    #[test]
    fn missing_file_loads_empty_board() {
        let path = scratch_file("missing");
        let _ = fs::remove_file(&path);
        let board = Leaderboard::load(&path).expect("missing file is not an error");
        assert!(board.ranked().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty_board() {
        let path = scratch_file("corrupt");
        fs::write(&path, "{ not json").expect("write fixture");
        let board = Leaderboard::load(&path).expect("corrupt file is not an error");
        assert!(board.ranked().is_empty());
        fs::remove_file(&path).expect("remove fixture");
    }

    #[test]
    fn save_then_load_preserves_board() {
        let path = scratch_file("persist");
        let mut board = Leaderboard::new();
        let _ = board.submit("Ada", secs(8.25), 10);
        let _ = board.submit("Grace", secs(3.0), 11);
        board.save(&path).expect("save leaderboard");

        let restored = Leaderboard::load(&path).expect("load leaderboard");
        assert_eq!(restored, board);
        fs::remove_file(&path).expect("remove fixture");
    }

    #[test]
    fn bare_entry_list_is_accepted() {
        let path = scratch_file("legacy");
        fs::write(
            &path,
            r#"[{"name":"Old","score":2.5,"ts":5},{"name":"Older","score":9.1,"ts":1}]"#,
        )
        .expect("write fixture");

        let board = Leaderboard::load(&path).expect("load legacy list");
        let names: Vec<&str> = board.ranked().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Older", "Old"]);
        assert_eq!(board.last_name(), None);
        fs::remove_file(&path).expect("remove fixture");
    }
}
