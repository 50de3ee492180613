//! ilc-core
//!
//! Core library for comment-marker driven coverage instrumentation of C
//! sources.
//!
//! The pipeline: the scanner turns one source file into a token stream while
//! echoing the text it consumes; the syntax walker understands just enough of
//! C's grammar to find markers inside function bodies, recording each in a
//! transient registry and splicing a run-time check call into the echoed
//! output; the ledger keeps every checkpoint ever discovered across runs,
//! with a sticky hit flag per checkpoint.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends.

pub mod ledger;
pub mod model;
pub mod parse;
pub mod scan;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
