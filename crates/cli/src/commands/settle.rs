//! Settlement sweep: check open bets against market results.

use anyhow::Result;
use clap::Args;
use edgebet_core::ConfigLoader;
use edgebet_data::{BetOutcome, Ledger, LedgerRepository};
use edgebet_kalshi::{KalshiClient, MarketResult};
use tracing::{info, warn};

/// Arguments for the settle command.
#[derive(Args, Debug)]
pub struct SettleArgs {
    /// Config file path.
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,
}

/// Runs the settlement sweep standalone.
pub async fn run(args: SettleArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config)?;
    let client = crate::commands::build_client(&config)?;

    let repository =
        LedgerRepository::connect(&config.ledger.database_url, config.ledger.max_connections)
            .await?;
    repository.ensure_schema().await?;

    let updated = sweep(&client, &repository).await?;
    println!("{updated} bet(s) settled");
    Ok(())
}

/// Checks every open placed bet against the exchange and records the
/// outcome for markets that have settled. Fetch failures leave the bet
/// open for the next sweep.
pub(crate) async fn sweep(client: &KalshiClient, ledger: &dyn Ledger) -> Result<u32> {
    let open = ledger.open_entries().await?;
    if open.is_empty() {
        return Ok(0);
    }
    info!(open = open.len(), "checking open bets for settlement");

    let mut updated = 0;
    for entry in open {
        let market = match client.get_market(&entry.ticker).await {
            Ok(market) => market,
            Err(e) => {
                warn!(ticker = %entry.ticker, error = %e, "could not fetch market; leaving open");
                continue;
            }
        };

        if !market.status.is_terminal() {
            continue;
        }

        let Some(result) = market.settlement() else {
            warn!(
                ticker = %entry.ticker,
                result = ?market.result,
                "terminal market without a recognizable result; leaving open"
            );
            continue;
        };

        let outcome = match result {
            MarketResult::Void => BetOutcome::Void,
            MarketResult::Yes if entry.side == "yes" => BetOutcome::Won,
            MarketResult::No if entry.side == "no" => BetOutcome::Won,
            _ => BetOutcome::Lost,
        };

        ledger.record_outcome(entry.id, outcome).await?;
        info!(
            ticker = %entry.ticker,
            side = %entry.side,
            outcome = outcome.as_str(),
            "bet settled"
        );
        updated += 1;
    }

    Ok(updated)
}
