//! The full pipeline: settle open bets, fetch and filter markets, ask the
//! oracle, execute decisions against the ledger.

use crate::commands::{analysis_window, build_client, settle};
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use edgebet_core::ConfigLoader;
use edgebet_data::{Ledger, LedgerRepository, MemoryLedger};
use edgebet_execution::BetExecutor;
use edgebet_oracle::{DecisionOracle, LlmOracle, OpenPosition};
use edgebet_strategy::{filter_candidates, select_for_oracle};
use std::sync::Arc;
use tracing::{info, warn};

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Config file path.
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Use an in-memory ledger (entries do not survive the process).
    #[arg(long)]
    pub memory_ledger: bool,
}

/// Runs the pipeline once.
pub async fn run(args: RunArgs) -> Result<()> {
    let mut config = ConfigLoader::load_from(&args.config)?;

    // DRY_RUN is read once here; nothing re-reads it mid-run.
    if let Ok(raw) = std::env::var("DRY_RUN") {
        config.trading.dry_run =
            matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }
    if config.trading.dry_run {
        info!("dry run enabled: no real orders will be placed");
    }

    // All configuration errors surface before the first network call.
    let client = Arc::new(build_client(&config)?);
    let oracle = LlmOracle::from_config(&config.oracle)?;

    let ledger: Arc<dyn Ledger> = if args.memory_ledger {
        info!("using in-memory ledger");
        Arc::new(MemoryLedger::new())
    } else {
        let repository =
            LedgerRepository::connect(&config.ledger.database_url, config.ledger.max_connections)
                .await?;
        repository.ensure_schema().await?;
        Arc::new(repository)
    };

    // Settle open bets first so the portfolio context is current.
    let settled = settle::sweep(&client, ledger.as_ref()).await?;
    if settled > 0 {
        info!(settled, "recorded settlement outcomes");
    }

    let now = Utc::now();
    let (closing_after, closing_before) = analysis_window(&config.trading, now);
    info!(%closing_after, %closing_before, "fetching markets in analysis window");

    // FeedUnavailable propagates: nothing is traded on an incomplete feed.
    let markets = client.list_open_markets(closing_after, closing_before).await?;
    info!(markets = markets.len(), "markets in window");

    let candidates = filter_candidates(markets, now, &config.trading);
    info!(candidates = candidates.len(), "tradeable candidates");

    let batch = select_for_oracle(candidates, config.trading.max_oracle_candidates);
    if batch.is_empty() {
        info!("no tradeable candidates; run complete");
        return Ok(());
    }

    let portfolio: Vec<OpenPosition> = ledger
        .open_entries()
        .await?
        .into_iter()
        .map(|entry| OpenPosition {
            ticker: entry.ticker,
            side: entry.side,
            title: None,
        })
        .collect();

    // An oracle failure skips this run's batch; the run still completes.
    let decisions = match oracle.decide(&batch, &portfolio).await {
        Ok(decisions) => decisions,
        Err(e) => {
            warn!(error = %e, "oracle failed; no decisions this run");
            Vec::new()
        }
    };
    info!(decisions = decisions.len(), "validated oracle decisions");

    if !config.trading.dry_run && !decisions.is_empty() {
        match client.get_balance().await {
            Ok(balance) if balance.total_equity_cents() < config.trading.min_balance_cents => {
                warn!(
                    equity_cents = balance.total_equity_cents(),
                    required_cents = config.trading.min_balance_cents,
                    "balance below minimum; skipping execution"
                );
                return Ok(());
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "balance check failed; skipping execution");
                return Ok(());
            }
        }
    }

    let executor = BetExecutor::new(client.clone(), ledger, config.trading.clone());
    let manifest = executor.execute_all(&decisions, &batch).await?;

    println!("{}", manifest.format_summary());
    Ok(())
}
