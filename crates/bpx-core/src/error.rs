//! Error taxonomy for bpx-core.
//!
//! Only two conditions are real errors: a payload that does not parse
//! ([`DocumentError`]) and a dump that cannot be read ([`LoadError`]).
//! Dangling references, malformed reference tokens, stale search results and
//! buffer contention are expected states and are expressed as absence
//! (`None`, dropped entries, undelivered outcomes) rather than as errors.

use crate::types::Guid;
use std::path::PathBuf;

/// A record's payload could not be parsed.
///
/// Fatal for that record only: it is left out of search and of the reference
/// graph, and everything else keeps loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("malformed document {guid} at line {line}, column {column}: {message}")]
    Malformed {
        guid: String,
        line: usize,
        column: usize,
        message: String,
    },
}

/// Failure to read or admit records from a dump.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read dump {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dump itself is corrupt (as opposed to one record's payload).
    #[error("dump line {line}: {message}")]
    BadLine { line: usize, message: String },

    #[error("record {name:?} has an invalid guid {guid:?}")]
    BadGuid { guid: String, name: String },

    #[error("duplicate guid {guid} (already loaded as {first:?})")]
    DuplicateGuid { guid: Guid, first: String },

    #[error(transparent)]
    Document(#[from] DocumentError),
}
