//! The bet execution engine.
//!
//! State machine per decision:
//!
//! ```text
//! RECEIVED -> (ledger check) -> SKIPPED_DUPLICATE   [has_placed_bet]
//! RECEIVED -> (ledger check) -> ATTEMPTING -> PLACED     [order ok, !dry_run]
//! RECEIVED -> (ledger check) -> ATTEMPTING -> SIMULATED  [dry_run: no order call]
//! RECEIVED -> (ledger check) -> ATTEMPTING -> FAILED     [order call errored]
//! ```
//!
//! Transitions are strictly sequential per decision, and decisions are
//! processed serially: with a single process and at most a handful of
//! decisions per run, serial execution is what keeps the per-ticker
//! check-then-write effectively atomic. Every terminal state writes
//! exactly one finalized ledger entry. A failed order is recorded FAILED
//! and never retried within the same run — an automatic retry could place
//! a duplicate live order.
//!
//! The engine checks the ledger before any side effect, records a PENDING
//! row before the order call, and finalizes synchronously after it. A
//! crash strictly between a successful order call and the finalize write
//! can leave a live position recorded only as PENDING; the window is
//! deliberately narrow but closing it entirely would need two-phase
//! commit across the exchange and the ledger store.

use crate::manifest::{ManifestEntry, RunManifest};
use anyhow::Result;
use async_trait::async_trait;
use edgebet_core::TradingConfig;
use edgebet_data::{BetStatus, ExecutionMode, Ledger, NewLedgerEntry};
use edgebet_kalshi::error::Result as KalshiResult;
use edgebet_kalshi::types::{Order, OrderRequest};
use edgebet_kalshi::KalshiClient;
use edgebet_oracle::Decision;
use edgebet_strategy::Candidate;
use std::collections::HashMap;
use std::sync::Arc;

/// The seam over real order submission, so tests can count calls.
#[async_trait]
pub trait OrderPlacer: Send + Sync {
    /// Submits an order to the exchange.
    async fn place_order(&self, request: &OrderRequest) -> KalshiResult<Order>;
}

#[async_trait]
impl OrderPlacer for KalshiClient {
    async fn place_order(&self, request: &OrderRequest) -> KalshiResult<Order> {
        self.submit_order(request).await
    }
}

#[async_trait]
impl<P: OrderPlacer + ?Sized> OrderPlacer for Arc<P> {
    async fn place_order(&self, request: &OrderRequest) -> KalshiResult<Order> {
        (**self).place_order(request).await
    }
}

/// Turns oracle decisions into at most one durable ledger record each.
pub struct BetExecutor<P: OrderPlacer> {
    placer: P,
    ledger: Arc<dyn Ledger>,
    config: TradingConfig,
}

impl<P: OrderPlacer> BetExecutor<P> {
    /// Creates an executor.
    ///
    /// `config.dry_run` is read from here for the whole run; it is never
    /// re-read mid-run.
    pub fn new(placer: P, ledger: Arc<dyn Ledger>, config: TradingConfig) -> Self {
        Self {
            placer,
            ledger,
            config,
        }
    }

    /// Executes all decisions against the ledger.
    ///
    /// Per-decision failures (order rejections, network errors) are
    /// isolated and recorded; only a ledger failure aborts, because
    /// without the ledger the idempotency guarantee is gone.
    ///
    /// # Errors
    /// Returns an error only when a ledger read or write fails.
    pub async fn execute_all(
        &self,
        decisions: &[Decision],
        candidates: &[Candidate],
    ) -> Result<RunManifest> {
        let by_ticker: HashMap<&str, &Candidate> =
            candidates.iter().map(|c| (c.ticker(), c)).collect();

        let mut manifest = RunManifest::default();

        for decision in decisions {
            match self.execute_one(decision, &by_ticker, &mut manifest).await? {
                Executed::Recorded => {}
                Executed::PolicyRejected(reason) => {
                    tracing::info!(
                        ticker = %decision.ticker,
                        %reason,
                        "decision rejected by policy"
                    );
                    manifest.policy_rejections += 1;
                }
            }
        }

        tracing::info!("\n{}", manifest.format_summary());
        Ok(manifest)
    }

    async fn execute_one(
        &self,
        decision: &Decision,
        candidates: &HashMap<&str, &Candidate>,
        manifest: &mut RunManifest,
    ) -> Result<Executed> {
        let Some(candidate) = candidates.get(decision.ticker.as_str()) else {
            return Ok(Executed::PolicyRejected(
                "no candidate for decision ticker".to_string(),
            ));
        };

        // Policy gates: these produce no ledger entry, because no attempt
        // was ever made.
        let required_confidence = if candidate.long_shot {
            self.config.longshot_min_confidence
        } else {
            self.config.min_confidence
        };
        if decision.confidence < required_confidence {
            return Ok(Executed::PolicyRejected(format!(
                "confidence {:.2} below required {:.2}",
                decision.confidence, required_confidence
            )));
        }

        let Some(price_cents) = candidate.market.ask_for(decision.side) else {
            return Ok(Executed::PolicyRejected(format!(
                "no ask quoted for side {}",
                decision.side.as_api_str()
            )));
        };

        let stake_budget = decision
            .stake_hint_cents
            .unwrap_or(self.config.stake_cents)
            .min(self.config.max_stake_cents);
        let count = stake_budget / price_cents as i64;
        if count < 1 {
            return Ok(Executed::PolicyRejected(format!(
                "price {price_cents}c too high for stake {stake_budget}c"
            )));
        }
        let count = count as i32;
        let cost_cents = count as i64 * price_cents as i64;

        // The duplicate check is the idempotency linchpin: it happens
        // before any side effect, so a terminated run leaves unprocessed
        // markets re-evaluable, never double-counted.
        if self.ledger.has_placed_bet(&decision.ticker).await? {
            tracing::info!(ticker = %decision.ticker, "already placed, skipping");
            let id = self
                .ledger
                .record_attempt(&self.new_entry(decision, price_cents, count, cost_cents))
                .await?;
            self.ledger
                .finalize(id, BetStatus::SkippedDuplicate, None)
                .await?;
            manifest.entries.push(self.manifest_entry(
                decision,
                BetStatus::SkippedDuplicate,
                cost_cents,
                count,
                None,
            ));
            return Ok(Executed::Recorded);
        }

        let id = self
            .ledger
            .record_attempt(&self.new_entry(decision, price_cents, count, cost_cents))
            .await?;

        if self.config.dry_run {
            tracing::info!(
                ticker = %decision.ticker,
                side = decision.side.as_api_str(),
                count,
                price_cents,
                "dry run: simulating order"
            );
            self.ledger.finalize(id, BetStatus::Simulated, None).await?;
            manifest.entries.push(self.manifest_entry(
                decision,
                BetStatus::Simulated,
                cost_cents,
                count,
                None,
            ));
            return Ok(Executed::Recorded);
        }

        let request = OrderRequest::buy(&decision.ticker, decision.side, price_cents, count as u32)
            .with_client_order_id(uuid::Uuid::new_v4().to_string());

        match self.placer.place_order(&request).await {
            Ok(order) => {
                tracing::info!(
                    ticker = %decision.ticker,
                    order_id = %order.order_id,
                    count,
                    price_cents,
                    "order placed"
                );
                self.ledger
                    .finalize(id, BetStatus::Placed, Some(&order.order_id))
                    .await?;
                manifest.entries.push(self.manifest_entry(
                    decision,
                    BetStatus::Placed,
                    cost_cents,
                    count,
                    Some(order.order_id),
                ));
            }
            Err(e) => {
                tracing::warn!(ticker = %decision.ticker, error = %e, "order placement failed");
                self.ledger.finalize(id, BetStatus::Failed, None).await?;
                manifest.entries.push(self.manifest_entry(
                    decision,
                    BetStatus::Failed,
                    cost_cents,
                    count,
                    None,
                ));
            }
        }

        Ok(Executed::Recorded)
    }

    fn new_entry(
        &self,
        decision: &Decision,
        price_cents: u32,
        count: i32,
        cost_cents: i64,
    ) -> NewLedgerEntry {
        NewLedgerEntry {
            ticker: decision.ticker.clone(),
            side: decision.side.as_api_str().to_string(),
            price_cents: price_cents as i32,
            count,
            stake_cents: cost_cents,
            mode: if self.config.dry_run {
                ExecutionMode::DryRun
            } else {
                ExecutionMode::Real
            },
            reasoning: decision.reasoning.clone(),
            confidence: Some(decision.confidence),
        }
    }

    fn manifest_entry(
        &self,
        decision: &Decision,
        status: BetStatus,
        stake_cents: i64,
        count: i32,
        order_id: Option<String>,
    ) -> ManifestEntry {
        ManifestEntry {
            ticker: decision.ticker.clone(),
            side: decision.side.as_api_str().to_string(),
            status,
            stake_cents,
            count,
            order_id,
        }
    }
}

enum Executed {
    Recorded,
    PolicyRejected(String),
}
