//! Data model for discovered coverage checkpoints.
//!
//! One parse pass over one source file accumulates its discoveries in a
//! [`Registry`]: one [`FunctionRecord`] per function that contains at least a
//! marker, each holding its [`MarkerRecord`]s in discovery order. The
//! registry is transient — after a successful pass the driver merges it into
//! the persistent ledger and drops it.

use std::collections::TryReserveError;

use thiserror::Error;

/// Error type for registry mutations.
///
/// Either variant is fatal to the parse pass that triggered it; records
/// committed before the failure stay valid and are discarded wholesale by the
/// caller.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The configured checkpoint cap was reached.
    #[error("checkpoint limit reached ({0})")]
    LimitReached(usize),

    /// The allocator refused to grow a record collection or name buffer.
    #[error("out of memory while recording checkpoints")]
    OutOfMemory(#[from] TryReserveError),
}

/// A single marker occurrence inside a function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MarkerRecord {
    /// 1-based source line the marker tag appeared on.
    pub line: u64,
}

/// All markers discovered in one function during the current pass.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FunctionRecord {
    /// Function name as written in the source (case-sensitive).
    pub name: String,
    /// Number of markers recorded; always equals `markers.len()`.
    pub hits: u64,
    /// Marker occurrences in discovery order. Lines are strictly increasing
    /// because the scan is sequential.
    pub markers: Vec<MarkerRecord>,
}

/// Per-file accumulator for functions and their markers.
///
/// Functions appear in the order their first marker was discovered.
#[derive(Debug, Default)]
pub struct Registry {
    functions: Vec<FunctionRecord>,
    limit: Option<usize>,
    total: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that refuses to record more than `limit` checkpoints in
    /// total, bounding work on pathological inputs.
    pub fn with_limit(limit: usize) -> Self {
        Self { functions: Vec::new(), limit: Some(limit), total: 0 }
    }

    /// Record one marker for `name` at `line`, creating the function record
    /// on first sight (exact, case-sensitive name match, linear scan).
    pub fn record(&mut self, name: &str, line: u64) -> Result<(), RegistryError> {
        if let Some(limit) = self.limit {
            if self.total >= limit {
                return Err(RegistryError::LimitReached(limit));
            }
        }

        let ix = match self.functions.iter().position(|f| f.name == name) {
            Some(ix) => ix,
            None => {
                self.functions.try_reserve(1)?;
                let mut owned = String::new();
                owned.try_reserve(name.len())?;
                owned.push_str(name);
                self.functions.push(FunctionRecord {
                    name: owned,
                    hits: 0,
                    markers: Vec::new(),
                });
                self.functions.len() - 1
            }
        };

        let func = &mut self.functions[ix];
        func.markers.try_reserve(1)?;
        func.markers.push(MarkerRecord { line });
        func.hits += 1;
        self.total += 1;
        Ok(())
    }

    /// Function records in discovery order.
    pub fn functions(&self) -> &[FunctionRecord] {
        &self.functions
    }

    /// Look up a function record by exact name.
    pub fn find(&self, name: &str) -> Option<&FunctionRecord> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Total number of markers recorded across all functions.
    pub fn total_markers(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
