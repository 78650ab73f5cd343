//! Idempotent bet execution for the edgebet trading pipeline.
//!
//! This crate turns validated oracle decisions into at most one durable
//! ledger record per market, ever: the engine checks the ledger before
//! any side effect, records the attempt before the order call, and
//! finalizes synchronously after it. Dry runs make no network order call
//! but keep identical bookkeeping.

pub mod engine;
pub mod manifest;

pub use engine::{BetExecutor, OrderPlacer};
pub use manifest::{ManifestEntry, RunManifest};
