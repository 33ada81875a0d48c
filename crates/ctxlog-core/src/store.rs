//! Capacity-bounded, file-backed record store.
//!
//! Each store keeps its records in memory behind a single `RwLock` and
//! mirrors them to one pretty-printed JSON document. Every mutation builds the
//! next record list, persists it atomically (temp file + rename), and only
//! then swaps it in, so a failed write leaves memory and disk unchanged.

use crate::error::ContextError;
use crate::record::{Record, Stamp, StoreKind};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Surfaced when a backing document could not be parsed at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWarning {
    pub kind: StoreKind,
    /// Location of the unreadable document.
    pub path: PathBuf,
    /// Where the unreadable bytes were moved.
    pub preserved_at: PathBuf,
    pub reason: String,
}

impl fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} store at {} could not be read ({}); started empty, original kept at {}",
            self.kind,
            self.path.display(),
            self.reason,
            self.preserved_at.display()
        )
    }
}

/// Result of a successful append.
#[derive(Debug, Clone)]
pub struct AppendOutcome<R> {
    pub record: R,
    /// Records dropped from the front to stay within capacity.
    pub evicted: usize,
}

#[derive(Debug)]
struct StoreState<R> {
    /// Chronological, oldest first.
    records: Vec<R>,
    next_seq: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl<R: Record> StoreState<R> {
    fn from_records(records: Vec<R>) -> Self {
        let next_seq = records
            .iter()
            .map(|record| record.stamp().seq)
            .max()
            .map_or(1, |seq| seq + 1);
        let last_timestamp = records.iter().map(|record| record.stamp().timestamp).max();
        Self {
            records,
            next_seq,
            last_timestamp,
        }
    }
}

/// File-backed store holding at most `capacity` records of one kind.
#[derive(Debug)]
pub struct BoundedStore<R: Record> {
    path: PathBuf,
    capacity: usize,
    state: RwLock<StoreState<R>>,
}

impl<R: Record> BoundedStore<R> {
    /// Open the store's document under `root`.
    ///
    /// A missing document yields an empty store. An unparsable document is
    /// moved aside and reported through the returned warning.
    pub fn open(
        root: &Path,
        capacity: usize,
        now: DateTime<Utc>,
    ) -> Result<(Self, Option<StoreWarning>), ContextError> {
        if capacity == 0 {
            return Err(ContextError::validation("store capacity must be at least 1"));
        }
        let path = root.join(R::KIND.file_name());
        let (mut records, warning) = load_document::<R>(&path, now)?;
        if records.len() > capacity {
            let excess = records.len() - capacity;
            records.drain(..excess);
            info!(
                "trimmed store to capacity on load (store={}, dropped={excess})",
                R::KIND
            );
        }
        info!(
            "opened {} store (path={}, records={})",
            R::KIND,
            path.display(),
            records.len()
        );
        let store = Self {
            path,
            capacity,
            state: RwLock::new(StoreState::from_records(records)),
        };
        Ok((store, warning))
    }

    pub fn kind(&self) -> StoreKind {
        R::KIND
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stamp, build, append and persist a record, evicting the oldest
    /// records beyond capacity.
    ///
    /// The timestamp is `now`, clamped so it never precedes the previous
    /// record in this store.
    pub fn append_with<F>(&self, now: DateTime<Utc>, build: F) -> Result<AppendOutcome<R>, ContextError>
    where
        F: FnOnce(Stamp) -> R,
    {
        let mut state = self.state.write();
        let timestamp = match state.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        let stamp = Stamp {
            seq: state.next_seq,
            timestamp,
        };
        let record = build(stamp);

        let mut next = Vec::with_capacity(state.records.len() + 1);
        next.extend(state.records.iter().cloned());
        next.push(record.clone());
        let evicted = next.len().saturating_sub(self.capacity);
        next.drain(..evicted);

        self.write(&next)?;
        state.records = next;
        state.next_seq = stamp.seq + 1;
        state.last_timestamp = Some(timestamp);
        if evicted > 0 {
            info!("evicted oldest records (store={}, evicted={evicted})", R::KIND);
        }
        debug!(
            "appended record (store={}, seq={}, size={})",
            R::KIND,
            stamp.seq,
            state.records.len()
        );
        Ok(AppendOutcome { record, evicted })
    }

    /// Records newest first, optionally capped.
    pub fn list(&self, limit: Option<usize>) -> Vec<R> {
        let state = self.state.read();
        let limit = limit.unwrap_or(state.records.len());
        state.records.iter().rev().take(limit).cloned().collect()
    }

    /// Consistent chronological copy of every record.
    pub fn snapshot(&self) -> Vec<R> {
        self.state.read().records.clone()
    }

    /// Rewrite the backing document from the in-memory records.
    pub fn persist(&self) -> Result<(), ContextError> {
        let state = self.state.write();
        self.write(&state.records)
    }

    /// Replace every record with `records`, keeping the sequence counter.
    ///
    /// Used to put back an earlier snapshot after a dependent write failed.
    pub fn replace_all(&self, records: Vec<R>) -> Result<(), ContextError> {
        let mut state = self.state.write();
        self.write(&records)?;
        debug!(
            "replaced store contents (store={}, size={})",
            R::KIND,
            records.len()
        );
        state.records = records;
        Ok(())
    }

    /// Remove every record stamped at or before `cutoff`.
    pub fn remove_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, ContextError> {
        let mut state = self.state.write();
        let retained: Vec<R> = state
            .records
            .iter()
            .filter(|record| record.stamp().timestamp > cutoff)
            .cloned()
            .collect();
        let removed = state.records.len() - retained.len();
        if removed == 0 {
            return Ok(0);
        }
        self.write(&retained)?;
        state.records = retained;
        Ok(removed)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Atomically replace the backing document with `records`.
    fn write(&self, records: &[R]) -> Result<(), ContextError> {
        let payload = serde_json::to_vec_pretty(records)?;
        let temp_path = self.temp_path();
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            file.write_all(&payload)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        sync_parent(&self.path)?;
        Ok(())
    }
}

/// Flush the directory entry so a completed rename survives power loss.
#[cfg(unix)]
fn sync_parent(path: &Path) -> std::io::Result<()> {
    match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => fs::File::open(parent)?.sync_all(),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Read a store document, preserving it aside if it does not parse.
fn load_document<R: Record>(
    path: &Path,
    now: DateTime<Utc>,
) -> Result<(Vec<R>, Option<StoreWarning>), ContextError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("no document yet (path={})", path.display());
            return Ok((Vec::new(), None));
        }
        Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
            return quarantine::<R>(path, now, err.to_string());
        }
        Err(err) => return Err(ContextError::Io(err)),
    };
    if contents.trim().is_empty() {
        return Ok((Vec::new(), None));
    }
    match serde_json::from_str::<Vec<R>>(&contents) {
        Ok(records) => Ok((records, None)),
        Err(err) => quarantine::<R>(path, now, err.to_string()),
    }
}

/// Move an unreadable document to a side location and report it.
fn quarantine<R: Record>(
    path: &Path,
    now: DateTime<Utc>,
    reason: String,
) -> Result<(Vec<R>, Option<StoreWarning>), ContextError> {
    let preserved_at = preserve_path(path, now);
    fs::rename(path, &preserved_at)?;
    let warning = StoreWarning {
        kind: R::KIND,
        path: path.to_path_buf(),
        preserved_at,
        reason,
    };
    warn!("{warning}");
    Ok((Vec::new(), Some(warning)))
}

/// First free `<name>.corrupt-<timestamp>[-n]` path next to the document.
fn preserve_path(path: &Path, now: DateTime<Utc>) -> PathBuf {
    let stamp = now.format("%Y%m%dT%H%M%SZ");
    let base = format!("{}.corrupt-{stamp}", path.display());
    let mut candidate = PathBuf::from(&base);
    let mut attempt = 1;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{base}-{attempt}"));
        attempt += 1;
    }
    candidate
}
