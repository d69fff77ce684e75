//! Durable journal of commits
//!
//! The engine appends one [`Commit`] per accepted write and applies it only
//! after the append returns. On startup the journal is replayed to rebuild
//! state. [`FileJournal`] writes one JSON object per line and syncs after
//! each commit. A failed append is rolled back to the previous length so the
//! next commit can reuse its sequence number. On load, an unterminated final
//! line (crash mid-write) is truncated; any other unreadable line, including
//! a complete final line, is corruption.

use crate::facts::Commit;
use parking_lot::Mutex;
use pharmtrace_core::LedgerError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Journal failures
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// Underlying file operation failed
    #[error("journal io error: {0}")]
    Io(#[from] std::io::Error),

    /// A commit could not be encoded
    #[error("failed to encode commit: {0}")]
    Encode(#[from] serde_json::Error),

    /// A complete line could not be decoded
    #[error("journal corrupt at line {line}: {reason}")]
    Corrupt {
        /// 1-based line number
        line: usize,
        /// Decoder message
        reason: String,
    },

    /// An append failed and its partial bytes could not be removed
    #[error("journal append failed ({reason}) and rollback failed: {source}")]
    RollbackFailed {
        /// Why the append failed
        reason: String,
        /// Why the rollback failed
        #[source]
        source: std::io::Error,
    },
}

impl JournalError {
    /// Whether the journal may now hold bytes of a commit that was reported as failed
    pub fn leaves_journal_dirty(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }
}

impl From<JournalError> for LedgerError {
    fn from(err: JournalError) -> Self {
        LedgerError::storage(err.to_string())
    }
}

/// Append-only commit log
pub trait Journal: Send {
    /// Persist a commit. Must not return until the commit is durable.
    ///
    /// On error the journal must hold no trace of `commit`, or report
    /// [`JournalError::RollbackFailed`].
    fn append(&mut self, commit: &Commit) -> Result<(), JournalError>;

    /// All durable commits in append order
    fn load(&mut self) -> Result<Vec<Commit>, JournalError>;
}

/// In-memory journal.
///
/// Clones share storage, so a test can "restart" a ledger by opening a new
/// engine over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryJournal {
    commits: Arc<Mutex<Vec<Commit>>>,
}

impl MemoryJournal {
    /// Empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored commits
    pub fn len(&self) -> usize {
        self.commits.lock().len()
    }

    /// Whether nothing has been committed
    pub fn is_empty(&self) -> bool {
        self.commits.lock().is_empty()
    }
}

impl Journal for MemoryJournal {
    fn append(&mut self, commit: &Commit) -> Result<(), JournalError> {
        self.commits.lock().push(commit.clone());
        Ok(())
    }

    fn load(&mut self) -> Result<Vec<Commit>, JournalError> {
        Ok(self.commits.lock().clone())
    }
}

/// JSON-lines journal file
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    file: File,
    #[cfg(test)]
    fail_next_sync: bool,
}

impl FileJournal {
    /// Open (creating if needed) the journal at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            file,
            #[cfg(test)]
            fail_next_sync: false,
        })
    }

    /// Journal file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make the next append fail after its bytes reach the file
    #[cfg(test)]
    pub(crate) fn fail_next_sync(&mut self) {
        self.fail_next_sync = true;
    }

    fn write_line(&mut self, line: &[u8]) -> Result<(), JournalError> {
        self.file.write_all(line)?;
        self.file.flush()?;
        self.sync()?;
        Ok(())
    }

    #[cfg(not(test))]
    fn sync(&mut self) -> std::io::Result<()> {
        self.file.sync_data()
    }

    #[cfg(test)]
    fn sync(&mut self) -> std::io::Result<()> {
        if std::mem::take(&mut self.fail_next_sync) {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "sync failed"));
        }
        self.file.sync_data()
    }

    fn truncate_to(&mut self, len: u64) -> std::io::Result<()> {
        self.file.set_len(len)?;
        self.file.sync_data()
    }
}

impl Journal for FileJournal {
    fn append(&mut self, commit: &Commit) -> Result<(), JournalError> {
        let mut line = serde_json::to_vec(commit)?;
        line.push(b'\n');
        let start = self.file.metadata()?.len();

        let Err(err) = self.write_line(&line) else {
            return Ok(());
        };
        match self.truncate_to(start) {
            Ok(()) => {
                tracing::warn!(
                    path = %self.path.display(),
                    sequence = commit.sequence,
                    error = %err,
                    "rolled back failed journal append"
                );
                Err(err)
            }
            Err(source) => Err(JournalError::RollbackFailed {
                reason: err.to_string(),
                source,
            }),
        }
    }

    fn load(&mut self) -> Result<Vec<Commit>, JournalError> {
        let content = std::fs::read_to_string(&self.path)?;
        let mut commits = Vec::new();
        let mut valid_len = 0usize;
        let mut segments = content.split_inclusive('\n').enumerate().peekable();

        while let Some((index, segment)) = segments.next() {
            let is_last = segments.peek().is_none();
            let text = segment.trim();
            if text.is_empty() {
                valid_len += segment.len();
                continue;
            }
            match serde_json::from_str::<Commit>(text) {
                Ok(commit) => {
                    commits.push(commit);
                    valid_len += segment.len();
                    if is_last && !segment.ends_with('\n') {
                        self.file.write_all(b"\n")?;
                    }
                }
                Err(err) if is_last && !segment.ends_with('\n') => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = index + 1,
                        error = %err,
                        "truncating torn trailing journal entry"
                    );
                    self.truncate_to(valid_len as u64)?;
                }
                Err(err) => {
                    return Err(JournalError::Corrupt {
                        line: index + 1,
                        reason: err.to_string(),
                    })
                }
            }
        }
        Ok(commits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::LedgerFact;
    use pharmtrace_core::Identity;

    fn commit(sequence: u64) -> Commit {
        Commit {
            sequence,
            facts: vec![LedgerFact::NonceConsumed {
                identity: Identity::from_bytes([4u8; 20]),
                consumed: sequence - 1,
            }],
        }
    }

    #[test]
    fn file_journal_round_trips_commits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("journal.jsonl");

        let mut journal = FileJournal::open(&path).unwrap();
        journal.append(&commit(1)).unwrap();
        journal.append(&commit(2)).unwrap();
        drop(journal);

        let mut reopened = FileJournal::open(&path).unwrap();
        assert_eq!(reopened.load().unwrap(), vec![commit(1), commit(2)]);
    }

    #[test]
    fn torn_trailing_line_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let mut journal = FileJournal::open(&path).unwrap();
        journal.append(&commit(1)).unwrap();
        journal.file.write_all(b"{\"sequence\":2,\"fac").unwrap();

        assert_eq!(journal.load().unwrap(), vec![commit(1)]);

        journal.append(&commit(2)).unwrap();
        assert_eq!(journal.load().unwrap(), vec![commit(1), commit(2)]);
    }

    #[test]
    fn corrupt_middle_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        std::fs::write(&path, "not json\n").unwrap();
        let mut journal = FileJournal::open(&path).unwrap();
        journal.append(&commit(1)).unwrap();

        assert!(matches!(
            journal.load(),
            Err(JournalError::Corrupt { line: 1, .. })
        ));
    }

    #[test]
    fn complete_but_unreadable_last_line_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let mut journal = FileJournal::open(&path).unwrap();
        journal.append(&commit(1)).unwrap();
        journal.file.write_all(b"{\"sequence\":2,\"facts\":7}\n").unwrap();

        assert!(matches!(
            journal.load(),
            Err(JournalError::Corrupt { line: 2, .. })
        ));
        // Nothing was truncated
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("{\"sequence\":2,\"facts\":7}\n"));
    }

    #[test]
    fn failed_append_is_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let mut journal = FileJournal::open(&path).unwrap();
        journal.append(&commit(1)).unwrap();
        let before = std::fs::metadata(&path).unwrap().len();

        journal.fail_next_sync();
        assert!(matches!(journal.append(&commit(2)), Err(JournalError::Io(_))));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), before);

        journal.append(&commit(2)).unwrap();
        drop(journal);
        let mut reopened = FileJournal::open(&path).unwrap();
        assert_eq!(reopened.load().unwrap(), vec![commit(1), commit(2)]);
    }

    #[test]
    fn memory_journal_clones_share_storage() {
        let mut journal = MemoryJournal::new();
        let observer = journal.clone();
        journal.append(&commit(1)).unwrap();
        assert_eq!(observer.len(), 1);
    }
}
