//! Run manifest: what this run did, entry by entry.
//!
//! A completed run always yields a manifest — even when zero trades were
//! placed — so a human reviewer can distinguish "we decided to bet but
//! didn't" from "we never evaluated this market".

use edgebet_data::BetStatus;

/// One ledger entry created during the run.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    /// Market ticker.
    pub ticker: String,

    /// Side bought ("yes"/"no").
    pub side: String,

    /// Terminal status written to the ledger.
    pub status: BetStatus,

    /// Actual cost committed, in cents (price * contracts).
    pub stake_cents: i64,

    /// Contracts.
    pub count: i32,

    /// Exchange order ID for real placements.
    pub order_id: Option<String>,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunManifest {
    /// Every ledger entry created during the run.
    pub entries: Vec<ManifestEntry>,

    /// Decisions rejected by policy before any attempt was recorded.
    pub policy_rejections: u32,
}

impl RunManifest {
    fn count(&self, status: BetStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Number of real orders placed.
    #[must_use]
    pub fn placed(&self) -> usize {
        self.count(BetStatus::Placed)
    }

    /// Number of simulated (dry-run) bets.
    #[must_use]
    pub fn simulated(&self) -> usize {
        self.count(BetStatus::Simulated)
    }

    /// Number of failed order attempts.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(BetStatus::Failed)
    }

    /// Number of duplicate skips.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(BetStatus::SkippedDuplicate)
    }

    /// Formats a one-block summary for logging.
    #[must_use]
    pub fn format_summary(&self) -> String {
        let mut lines = vec![format!(
            "Run manifest: {} placed, {} simulated, {} failed, {} skipped, {} rejected by policy",
            self.placed(),
            self.simulated(),
            self.failed(),
            self.skipped(),
            self.policy_rejections
        )];

        for entry in &self.entries {
            let order = entry
                .order_id
                .as_deref()
                .map(|id| format!(" order={id}"))
                .unwrap_or_default();
            lines.push(format!(
                "  {} {} x{} @ {}c -> {}{}",
                entry.ticker,
                entry.side,
                entry.count,
                if entry.count > 0 {
                    entry.stake_cents / entry.count as i64
                } else {
                    0
                },
                entry.status.as_str(),
                order
            ));
        }

        lines.join("\n")
    }
}
