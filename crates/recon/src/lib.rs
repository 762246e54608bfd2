//! `parcelsync-recon` — Property record reconciliation engine.
//!
//! Determines which records in two independently maintained property
//! stores refer to the same real-world property. Pure engine crate:
//! receives pre-loaded snapshots, returns a correspondence report.
//! No CLI, network, or database dependencies.

pub mod block;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod report;
pub mod resolve;
pub mod source;

pub use config::ReconConfig;
pub use engine::run;
pub use error::{NormalizeError, ReconError, SourceReadError};
pub use model::{
    RawRecord, ReconInput, ReconResult, ReconSummary, ReconciliationEntry, SourceSnapshot,
    SourceTag,
};
