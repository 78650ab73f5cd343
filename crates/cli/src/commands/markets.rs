//! Fetch and filter markets without evaluating or trading anything.

use crate::commands::{analysis_window, build_client};
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use edgebet_core::ConfigLoader;
use edgebet_oracle::format_candidate;
use edgebet_strategy::filter_candidates;

/// Arguments for the markets command.
#[derive(Args, Debug)]
pub struct MarketsArgs {
    /// Config file path.
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,
}

/// Prints the candidate table for the current analysis window.
pub async fn run(args: MarketsArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config)?;
    let client = build_client(&config)?;

    let now = Utc::now();
    let (closing_after, closing_before) = analysis_window(&config.trading, now);

    let markets = client.list_open_markets(closing_after, closing_before).await?;
    let total = markets.len();
    let candidates = filter_candidates(markets, now, &config.trading);

    println!(
        "{} markets in window, {} tradeable candidates\n",
        total,
        candidates.len()
    );
    for candidate in &candidates {
        println!("{}", format_candidate(candidate));
    }

    Ok(())
}
