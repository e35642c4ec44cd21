use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use futures_util::future::join_all;

use health_bridge::config::load_config;
use health_bridge::health::{probe_once, probes};

#[derive(Parser)]
#[command(name = "health-cli")]
#[command(about = "Inspect health sources and the gauges a bridge exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the health gauges a running bridge currently exports
    Gauges {
        /// Base URL of the bridge's metrics endpoint
        #[arg(short, long, default_value = "http://localhost:9090")]
        url: String,
    },
    /// Evaluate every configured source once and print the snapshots
    Check {
        /// Path to the TOML configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Gauges { url } => {
            let res = reqwest::get(format!("{}/metrics", url.trim_end_matches('/'))).await?;
            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: metrics endpoint returned status {}", status);
                return Ok(());
            }

            let body = res.text().await?;
            let gauges: Vec<&str> = body
                .lines()
                .filter(|line| line.starts_with("health_indicator"))
                .collect();
            if gauges.is_empty() {
                println!("No health gauges exported yet");
            }
            for line in gauges {
                println!("{}", line);
            }
        }
        Commands::Check { config } => {
            let config = load_config(&config)?;
            let timeout = Duration::from_secs(config.poller.period_secs);
            let sources = probes::build_sources(&config.sources);

            let snapshots = join_all(
                sources
                    .iter()
                    .map(|(id, source)| probe_once(id, source.clone(), timeout)),
            )
            .await;

            println!("{}", serde_json::to_string_pretty(&snapshots)?);
        }
    }

    Ok(())
}
