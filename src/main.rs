use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use brain_sdk::brain::{DiscoveryEngine, HttpRestClient, MdnsBrowser, local_interfaces};
use brain_sdk::Config;

/// Brain SDK - find and inspect brains on the local network
#[derive(Parser)]
#[command(name = "brain-sdk", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the first compatible brain as JSON
    Discover {
        /// Only browse on this network interface
        #[arg(short, long, env = "BRAIN_SDK_INTERFACE")]
        interface: Option<String>,

        /// Give up after this many milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Race discovery across every local IPv4 interface
        #[arg(long, conflicts_with = "interface")]
        all_interfaces: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,brain_sdk=info",
        1 => "info,brain_sdk=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;

    match cli.command {
        Command::Discover {
            interface,
            timeout_ms,
            all_interfaces,
        } => {
            let timeout = timeout_ms.map_or(config.discovery.lookup_duration, Duration::from_millis);
            let engine = DiscoveryEngine::new(
                Arc::new(MdnsBrowser),
                Arc::new(HttpRestClient::new(config.brain.request_timeout)),
                &config.discovery.version_satisfaction,
            )?;

            let record = if all_interfaces {
                let interfaces = local_interfaces();
                tracing::debug!(?interfaces, "racing discovery across interfaces");
                engine.find_first_brain_on_any(&interfaces, timeout).await?
            } else {
                let interface = interface.or_else(|| config.discovery.interface.clone());
                engine.find_first_brain(interface.as_deref(), timeout).await?
            };

            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
