//! Ledger data models.
//!
//! One [`LedgerEntry`] records one execution attempt for one market.
//! Entries are created PENDING at the moment of attempted execution,
//! finalized exactly once with a terminal status, and never deleted by
//! the core. The idempotency invariant of the whole pipeline: at most one
//! PLACED (or SIMULATED) entry may exist per market ticker, ever.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an attempt was allowed to place a real order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Real order placement.
    Real,
    /// Dry run: full bookkeeping, no order call.
    DryRun,
}

impl ExecutionMode {
    /// Database string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::DryRun => "dry_run",
        }
    }

    /// Parses the database string representation.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "real" => Some(Self::Real),
            "dry_run" => Some(Self::DryRun),
            _ => None,
        }
    }
}

/// Lifecycle status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetStatus {
    /// Attempt recorded, outcome not yet known. A row stuck here marks a
    /// crash between order placement and finalize.
    Pending,
    /// Real order accepted by the exchange.
    Placed,
    /// Dry run: we decided to bet but made no order call.
    Simulated,
    /// Order call errored. Never retried within the same run.
    Failed,
    /// A placed/simulated entry already existed for this market.
    SkippedDuplicate,
}

impl BetStatus {
    /// Database string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Placed => "placed",
            Self::Simulated => "simulated",
            Self::Failed => "failed",
            Self::SkippedDuplicate => "skipped_duplicate",
        }
    }

    /// Parses the database string representation.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "placed" => Some(Self::Placed),
            "simulated" => Some(Self::Simulated),
            "failed" => Some(Self::Failed),
            "skipped_duplicate" => Some(Self::SkippedDuplicate),
            _ => None,
        }
    }

    /// Returns true for statuses a finalized entry may carry.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if this status blocks future attempts on the ticker.
    ///
    /// SIMULATED counts: two back-to-back dry runs must not record the
    /// same market twice.
    #[must_use]
    pub fn counts_as_placed(self) -> bool {
        matches!(self, Self::Placed | Self::Simulated)
    }
}

/// Settlement outcome of a placed bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetOutcome {
    /// The bet side matched the market result.
    Won,
    /// The bet side lost.
    Lost,
    /// The market was voided/canceled.
    Void,
}

impl BetOutcome {
    /// Database string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Void => "void",
        }
    }

    /// Parses the database string representation.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "won" => Some(Self::Won),
            "lost" => Some(Self::Lost),
            "void" => Some(Self::Void),
            _ => None,
        }
    }
}

/// Fields of a new attempt, recorded before any side effect.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    /// Market ticker.
    pub ticker: String,

    /// Side bought ("yes"/"no").
    pub side: String,

    /// Limit price in cents.
    pub price_cents: i32,

    /// Contracts.
    pub count: i32,

    /// Stake in cents.
    pub stake_cents: i64,

    /// Execution mode of the run that made the attempt.
    pub mode: ExecutionMode,

    /// Oracle reasoning, for human review.
    pub reasoning: Option<String>,

    /// Oracle confidence.
    pub confidence: Option<f64>,
}

/// One durable ledger record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Ledger-assigned ID.
    pub id: i64,

    /// Market ticker.
    pub ticker: String,

    /// Side bought ("yes"/"no").
    pub side: String,

    /// Limit price in cents.
    pub price_cents: i32,

    /// Contracts.
    pub count: i32,

    /// Stake in cents.
    pub stake_cents: i64,

    /// Execution mode.
    pub mode: ExecutionMode,

    /// Current status.
    pub status: BetStatus,

    /// Exchange order ID for placed bets.
    pub order_id: Option<String>,

    /// Settlement outcome, appended by the settlement sweep.
    pub outcome: Option<BetOutcome>,

    /// Oracle reasoning.
    pub reasoning: Option<String>,

    /// Oracle confidence.
    pub confidence: Option<f64>,

    /// When the attempt was recorded.
    pub created_at: DateTime<Utc>,

    /// When the terminal status was written.
    pub finalized_at: Option<DateTime<Utc>>,
}
