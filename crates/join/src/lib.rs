//! `parceljoin-join`: property roll to mortgage recording join engine.
//!
//! Pure engine crate: receives two pre-loaded tables, returns one joined
//! table plus a diagnostics summary. No CLI, network or filesystem access.

pub mod address;
pub mod columns;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod model;
pub mod projector;
pub mod records;
pub mod table;

pub use config::{JoinConfig, MatchStrategy, UnmatchedPolicy};
pub use engine::run;
pub use error::JoinError;
pub use model::{JoinResult, JoinSummary, JoinedRecord, TableKind};
pub use table::Table;
