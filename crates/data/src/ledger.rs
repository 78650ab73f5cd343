//! The ledger contract and an in-memory implementation.
//!
//! The ledger is the only state shared across runs. The execution engine
//! straddles it around every attempt: `has_placed_bet` immediately before
//! acting, `record_attempt` before any side effect, `finalize`
//! synchronously after — never batched at end-of-run. The backing store is
//! behind this trait so tests (and `--memory-ledger` runs) can substitute
//! the in-memory implementation without touching the engine.

use crate::models::{BetOutcome, BetStatus, LedgerEntry, NewLedgerEntry};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Durable record of markets already acted upon.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Returns true if a PLACED or SIMULATED entry exists for the ticker.
    async fn has_placed_bet(&self, ticker: &str) -> Result<bool>;

    /// Records a new PENDING attempt and returns its ID.
    async fn record_attempt(&self, entry: &NewLedgerEntry) -> Result<i64>;

    /// Appends the terminal status (and order ID, for real placements) to
    /// an attempt. Each entry is finalized at most once.
    async fn finalize(&self, id: i64, status: BetStatus, order_id: Option<&str>) -> Result<()>;

    /// Returns PLACED entries with no settlement outcome yet.
    async fn open_entries(&self) -> Result<Vec<LedgerEntry>>;

    /// Appends a settlement outcome to a placed entry.
    async fn record_outcome(&self, id: i64, outcome: BetOutcome) -> Result<()>;
}

/// In-memory ledger for tests and trial runs.
///
/// Consistency model matches the contract the engine needs: reads observe
/// every write previously committed from the same process.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    entries: BTreeMap<i64, LedgerEntry>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all entries, in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.inner
            .lock()
            .expect("ledger lock poisoned")
            .entries
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn has_placed_bet(&self, ticker: &str) -> Result<bool> {
        let inner = self.inner.lock().expect("ledger lock poisoned");
        Ok(inner
            .entries
            .values()
            .any(|e| e.ticker == ticker && e.status.counts_as_placed()))
    }

    async fn record_attempt(&self, entry: &NewLedgerEntry) -> Result<i64> {
        let mut inner = self.inner.lock().expect("ledger lock poisoned");
        inner.next_id += 1;
        let id = inner.next_id;

        inner.entries.insert(
            id,
            LedgerEntry {
                id,
                ticker: entry.ticker.clone(),
                side: entry.side.clone(),
                price_cents: entry.price_cents,
                count: entry.count,
                stake_cents: entry.stake_cents,
                mode: entry.mode,
                status: BetStatus::Pending,
                order_id: None,
                outcome: None,
                reasoning: entry.reasoning.clone(),
                confidence: entry.confidence,
                created_at: Utc::now(),
                finalized_at: None,
            },
        );

        Ok(id)
    }

    async fn finalize(&self, id: i64, status: BetStatus, order_id: Option<&str>) -> Result<()> {
        let mut inner = self.inner.lock().expect("ledger lock poisoned");
        let entry = match inner.entries.get_mut(&id) {
            Some(entry) => entry,
            None => bail!("no ledger entry with id {id}"),
        };

        if entry.finalized_at.is_some() {
            bail!("ledger entry {id} is already finalized");
        }

        entry.status = status;
        entry.order_id = order_id.map(str::to_string);
        entry.finalized_at = Some(Utc::now());
        Ok(())
    }

    async fn open_entries(&self) -> Result<Vec<LedgerEntry>> {
        let inner = self.inner.lock().expect("ledger lock poisoned");
        Ok(inner
            .entries
            .values()
            .filter(|e| e.status == BetStatus::Placed && e.outcome.is_none())
            .cloned()
            .collect())
    }

    async fn record_outcome(&self, id: i64, outcome: BetOutcome) -> Result<()> {
        let mut inner = self.inner.lock().expect("ledger lock poisoned");
        let entry = match inner.entries.get_mut(&id) {
            Some(entry) => entry,
            None => bail!("no ledger entry with id {id}"),
        };
        entry.outcome = Some(outcome);
        Ok(())
    }
}
