//! File-backed persistence for roster state and the action journal.
//!
//! Two JSON files in the data directory:
//!
//! - `roster.json`: the roster plus the tracked status message id, written
//!   after every mutation.
//! - `journal.json`: the append-only action journal, rewritten in full on
//!   each append.
//!
//! Loading never fails the caller: a missing file is replaced with freshly
//! written empty defaults, and malformed content falls back to empty
//! defaults the same way. Both cases are visible in the operator log.

use crate::error::Result;
use rollcall_core::{ActionEntry, Participant, Roster, UserId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Roster state as persisted on disk.
///
/// `custom_title` is the empty string when unset and `message_id` is null
/// when no status message is tracked; in memory both are `Option`s.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    participants: Vec<Participant>,
    #[serde(default)]
    queue: Vec<Participant>,
    #[serde(default)]
    payments: Vec<i64>,
    #[serde(default)]
    custom_title: String,
    #[serde(default)]
    message_id: Option<i64>,
}

/// Everything restored from `roster.json` at startup.
#[derive(Debug)]
pub struct PersistedState {
    pub roster: Roster,
    pub message_id: Option<i64>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            roster: Roster::new(),
            message_id: None,
        }
    }
}

/// Storage backend for roster state and the journal.
pub struct Store {
    state_path: PathBuf,
    journal_path: PathBuf,
}

impl Store {
    /// Open storage in the given data directory, creating it if needed.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            state_path: data_dir.as_ref().join("roster.json"),
            journal_path: data_dir.as_ref().join("journal.json"),
        })
    }

    // --- Roster state ---

    /// Load persisted state, substituting empty defaults when the file is
    /// missing or unreadable. A fresh valid file is written in both cases.
    pub fn load_state(&self) -> PersistedState {
        let raw = match std::fs::read_to_string(&self.state_path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(
                    "state file {:?} unavailable ({err}), starting empty",
                    self.state_path
                );
                let state = PersistedState::default();
                self.write_defaults(&state);
                return state;
            }
        };

        match serde_json::from_str::<StateFile>(&raw) {
            Ok(file) => PersistedState {
                roster: Roster::from_parts(
                    file.participants,
                    file.queue,
                    file.payments.into_iter().map(UserId).collect(),
                    if file.custom_title.is_empty() {
                        None
                    } else {
                        Some(file.custom_title)
                    },
                ),
                message_id: file.message_id,
            },
            Err(err) => {
                tracing::error!(
                    "state file {:?} is corrupt ({err}), starting empty",
                    self.state_path
                );
                let state = PersistedState::default();
                self.write_defaults(&state);
                state
            }
        }
    }

    fn write_defaults(&self, state: &PersistedState) {
        if let Err(err) = self.save_state(&state.roster, state.message_id) {
            tracing::error!("failed to write fresh state file: {err}");
        }
    }

    /// Persist the roster and the tracked status message id.
    pub fn save_state(&self, roster: &Roster, message_id: Option<i64>) -> Result<()> {
        let mut payments: Vec<i64> = roster.paid().iter().map(|id| id.0).collect();
        payments.sort_unstable();

        let file = StateFile {
            participants: roster.participants().to_vec(),
            queue: roster.waitlist().to_vec(),
            payments,
            custom_title: roster.title().unwrap_or("").to_string(),
            message_id,
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.state_path, json)?;
        Ok(())
    }

    // --- Action journal ---

    /// Load the journal, falling back to empty on a missing or corrupt file.
    pub fn load_journal(&self) -> Vec<ActionEntry> {
        let raw = match std::fs::read_to_string(&self.journal_path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::error!(
                    "journal file {:?} is corrupt ({err}), treating as empty",
                    self.journal_path
                );
                Vec::new()
            }
        }
    }

    /// Append one entry, rewriting the journal file in full.
    ///
    /// Failures are logged and swallowed: a journal write must never abort
    /// the roster mutation that triggered it.
    pub fn append_journal(&self, entry: ActionEntry) {
        let mut entries = self.load_journal();
        entries.push(entry);
        let json = match serde_json::to_string_pretty(&entries) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!("failed to serialize journal: {err}");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.journal_path, json) {
            tracing::error!("failed to write journal file {:?}: {err}", self.journal_path);
        }
    }

    #[cfg(test)]
    fn state_path(&self) -> &Path {
        &self.state_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_state_file_initializes_and_writes_fresh() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let state = store.load_state();
        assert!(state.roster.participants().is_empty());
        assert_eq!(state.message_id, None);

        // a fresh valid file was written
        let raw = std::fs::read_to_string(store.state_path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(parsed["participants"].as_array().unwrap().is_empty());
    }

    #[test]
    fn corrupt_state_file_falls_back_and_rewrites() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        std::fs::write(store.state_path(), "{not json!").unwrap();

        let state = store.load_state();
        assert!(state.roster.participants().is_empty());

        let raw = std::fs::read_to_string(store.state_path()).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&raw).is_ok());
    }

    #[test]
    fn state_roundtrip() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let mut roster = Roster::new();
        roster.signup(UserId(1), "Alice");
        roster.maybe(UserId(2), "Bob");
        roster.mark_paid(UserId(1));
        roster.set_title("Friday session");
        store.save_state(&roster, Some(42)).unwrap();

        let restored = store.load_state();
        assert_eq!(restored.roster, roster);
        assert_eq!(restored.message_id, Some(42));
    }

    #[test]
    fn empty_title_restores_as_none() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let roster = Roster::new();
        store.save_state(&roster, None).unwrap();

        let restored = store.load_state();
        assert_eq!(restored.roster.title(), None);
    }

    #[test]
    fn journal_append_accumulates() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        store.append_journal(ActionEntry::new("2025-06-01 10:00:00", 1, "A", "Signed up"));
        store.append_journal(ActionEntry::new("2025-06-01 10:01:00", 2, "B", "Signed up"));

        let entries = store.load_journal();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user_id, 1);
        assert_eq!(entries[1].user_id, 2);
    }

    #[test]
    fn corrupt_journal_treated_as_empty() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("journal.json"), "[{broken").unwrap();

        assert!(store.load_journal().is_empty());

        // appending after corruption starts a fresh journal
        store.append_journal(ActionEntry::new("2025-06-01 10:00:00", 1, "A", "Signed up"));
        assert_eq!(store.load_journal().len(), 1);
    }
}
