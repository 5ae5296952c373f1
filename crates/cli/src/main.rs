//! Meridian DNS: a forwarding resolver with tiered caching, domain
//! blocking, alternative-naming dispatch and adaptive upstream selection.

mod bootstrap;
mod server;

use clap::Parser;
use meridian_dns_domain::CliOverrides;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "meridian-dns")]
#[command(version)]
#[command(about = "Forwarding DNS resolver with tiered caching and adaptive upstream selection")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Bind address (overrides the configuration file)
    #[arg(short, long)]
    bind: Option<String>,

    /// Listen port (overrides the configuration file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bootstrap::load_config(
        cli.config.as_deref(),
        CliOverrides {
            bind_address: cli.bind,
            port: cli.port,
        },
    )?;
    bootstrap::init_logging(&config);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            signal_token.cancel();
        }
    });

    server::start(config, shutdown).await
}
