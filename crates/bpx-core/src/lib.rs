//! bpx-core: blueprint explorer core library.
//!
//! This crate exposes the document model, the reference graph and the search
//! engine as public modules, plus the record table that ties them together.
//!
//! # Architecture
//!
//! ```text
//! Loader ──► BlueprintDb ──► MatchEngine ──► SearchScheduler ──► front end
//!               │
//!               └──► Document model ──► Reference graph (edges, back-index)
//! ```
//!
//! Searches run on tokio's blocking pool and report back over a `tokio`
//! channel; the front end only issues queries and consumes outcomes.

pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod graph;
pub mod loader;
pub mod matcher;
pub mod reference;
pub mod scheduler;
pub mod types;

pub use db::{BlueprintDb, LoadReport};
pub use error::{DocumentError, LoadError};
pub use matcher::BufferId;
pub use scheduler::{SearchOutcome, SearchScheduler, Searcher};
pub use types::{Blueprint, Guid, RawRecord};
