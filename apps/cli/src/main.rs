mod main_lib;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use main_lib::{build_converter, init_tracing, LogFormat, Provider};

use barfeed_market_data::UNKNOWN_EXCHANGE;

#[derive(Debug, Parser)]
#[command(name = "barfeed", version, about = "Historical crypto price bars")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch the price bar of a pair at a timestamp
    Bar {
        #[arg(long, value_enum, default_value = "coinmarketcap")]
        provider: Provider,
        /// Base asset ticker, e.g. BTC
        #[arg(long)]
        from: String,
        /// Quote asset ticker, e.g. USD
        #[arg(long)]
        to: String,
        /// RFC 3339 timestamp, e.g. 2020-06-01T00:00:00Z
        #[arg(long)]
        timestamp: DateTime<Utc>,
        /// Exchange hint, ignored by providers that don't route per exchange
        #[arg(long, default_value = UNKNOWN_EXCHANGE)]
        exchange: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());
    let cli = Cli::parse();

    match cli.command {
        Command::Bar {
            provider,
            from,
            to,
            timestamp,
            exchange,
        } => {
            let converter = build_converter(provider)?;
            tracing::info!(
                "Fetching {}/{} at {} from {}",
                from,
                to,
                timestamp,
                converter.name()
            );
            match converter
                .get_historic_bar(timestamp, &from, &to, &exchange)
                .await?
            {
                Some(bar) => println!("{}", serde_json::to_string_pretty(&bar)?),
                None => println!("no price data"),
            }
        }
    }
    Ok(())
}
