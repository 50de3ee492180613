//! Persistent coverage ledger.
//!
//! The ledger is the cross-run memory of every checkpoint ever discovered.
//! Entries are stored verbatim, one text line each, in the fixed format
//! `<flag>:<file>:<function>:<line>` where the flag is `'0'` (never hit) or
//! `'1'` (hit at least once). The dedup key is everything after the
//! two-character flag prefix. Entries are only ever appended, and a `'1'`
//! flag is never cleared — merges of already-known checkpoints leave the
//! existing entry untouched.

use std::collections::TryReserveError;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::Registry;

/// Ledger file used when no explicit path is given.
pub const DEFAULT_LEDGER_FILE: &str = "ilc.dat";

/// Width of the `<flag>:` prefix skipped when deriving an entry's key.
const FLAG_PREFIX_LEN: usize = 2;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger file could not be opened for reading; callers fall back to
    /// an empty ledger.
    #[error("cannot open coverage data file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// The ledger file opened but could not be read to the end. Entries
    /// loaded before the failure are released.
    #[error("failed to read coverage data from {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// The ledger file could not be written; this run's coverage data is
    /// lost. Callers treat this as a warning, not an abort.
    #[error("failed to write coverage data to {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    /// The allocator refused to grow the entry list.
    #[error("out of memory while growing the coverage ledger")]
    OutOfMemory(#[from] TryReserveError),
}

/// One persisted checkpoint line, kept verbatim.
///
/// Lines are not validated on load; a malformed line simply never matches any
/// key and rides along until it is persisted back out unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry(String);

impl Entry {
    /// Dedup/search key: the text after the `<flag>:` prefix. `None` for
    /// lines too short to carry a flag.
    pub fn key(&self) -> Option<&str> {
        self.0.get(FLAG_PREFIX_LEN..)
    }

    /// Whether the checkpoint was ever exercised.
    pub fn is_hit(&self) -> bool {
        self.0.starts_with('1')
    }

    /// The verbatim line as persisted.
    pub fn text(&self) -> &str {
        &self.0
    }

    fn mark_hit(&mut self) {
        self.0.replace_range(..1, "1");
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The full checkpoint set, bound to the file it will persist to.
#[derive(Debug)]
pub struct Ledger {
    entries: Vec<Entry>,
    path: PathBuf,
}

impl Ledger {
    /// An empty ledger bound to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self { entries: Vec::new(), path: path.into() }
    }

    /// Load `path`, one entry per line, verbatim and unvalidated. Empty lines
    /// are dropped. [`LedgerError::Open`] is recoverable; anything that fails
    /// after a successful open is [`LedgerError::Read`] and releases
    /// everything loaded so far.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LedgerError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut ledger = Self::empty(path);
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| LedgerError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            if line.is_empty() {
                continue;
            }
            ledger.append(line)?;
        }
        Ok(ledger)
    }

    /// Resolve and load the ledger at startup: the explicit path if given,
    /// else [`DEFAULT_LEDGER_FILE`]. A file that cannot be opened yields an
    /// empty ledger bound to that path (it will be created on persist); a
    /// read failure after a successful open is fatal.
    pub fn open(explicit: Option<&Path>) -> Result<Self, LedgerError> {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_FILE));
        match Self::load(&path) {
            Ok(ledger) => Ok(ledger),
            Err(LedgerError::Open { .. }) => Ok(Self::empty(path)),
            Err(err) => Err(err),
        }
    }

    /// Linear scan for the entry whose key equals `key` exactly
    /// (case-sensitive, whole-string).
    pub fn search(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key() == Some(key))
    }

    /// Append one verbatim entry line.
    pub fn append(&mut self, line: String) -> Result<(), LedgerError> {
        self.entries.try_reserve(1)?;
        self.entries.push(Entry(line));
        Ok(())
    }

    /// Fold one parse pass's discoveries in. New keys are appended with flag
    /// `'0'` in discovery order; keys already present are left untouched, so
    /// a `'1'` flag set by an earlier run survives. The merge is atomic per
    /// entry, not per call: entries appended before a failure remain.
    ///
    /// Returns the number of entries appended.
    pub fn merge(&mut self, registry: &Registry, file_name: &str) -> Result<usize, LedgerError> {
        let mut appended = 0;
        for func in registry.functions() {
            for marker in &func.markers {
                let key = format!("{file_name}:{}:{}", func.name, marker.line);
                if self.search(&key).is_none() {
                    self.append(format!("0:{key}"))?;
                    appended += 1;
                }
            }
        }
        Ok(appended)
    }

    /// Record a run-time hit for `key`, flipping the entry's flag to `'1'`
    /// in place. Unknown keys are silently ignored.
    pub fn mark_hit(&mut self, key: &str) {
        if let Some(ix) = self.search(key) {
            self.entries[ix].mark_hit();
        }
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The file this ledger persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every entry, one per line, in insertion order to the bound
    /// path, consuming the ledger. A failure here loses this run's coverage
    /// data; the caller decides whether that is worth more than a warning.
    pub fn persist(self) -> Result<(), LedgerError> {
        let Ledger { entries, path } = self;
        let file = File::create(&path).map_err(|source| LedgerError::Write {
            path: path.clone(),
            source,
        })?;

        let mut out = BufWriter::new(file);
        for entry in &entries {
            writeln!(out, "{entry}").map_err(|source| LedgerError::Write {
                path: path.clone(),
                source,
            })?;
        }
        out.flush().map_err(|source| LedgerError::Write { path, source })
    }
}
