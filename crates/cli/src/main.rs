use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "edgebet")]
#[command(about = "LLM-driven expected-value betting pipeline for Kalshi", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: settle, fetch, filter, decide, execute
    Run(commands::run::RunArgs),
    /// Fetch and filter markets, print the candidate table
    Markets(commands::markets::MarketsArgs),
    /// Check open bets against market results and record outcomes
    Settle(commands::settle::SettleArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // A completed run exits 0 even with zero trades; configuration and
    // feed-availability errors propagate and exit non-zero.
    match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
        Commands::Markets(args) => commands::markets::run(args).await,
        Commands::Settle(args) => commands::settle::run(args).await,
    }
}
