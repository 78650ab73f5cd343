//! Durable bet ledger for the edgebet trading pipeline.
//!
//! This crate provides:
//! - The [`Ledger`] trait: the read-then-act contract the execution engine
//!   straddles around every attempt
//! - A PostgreSQL repository with schema management
//! - An in-memory implementation for tests and trial runs
//!
//! The core depends only on the trait; the storage engine is
//! substitutable as long as reads observe prior writes from the same
//! process.

pub mod ledger;
pub mod models;
pub mod repository;

pub use ledger::{Ledger, MemoryLedger};
pub use models::{BetOutcome, BetStatus, ExecutionMode, LedgerEntry, NewLedgerEntry};
pub use repository::LedgerRepository;
