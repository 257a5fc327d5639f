use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use packsync::cli::{Cli, Commands};
use packsync::{AppContext, commands};
use packsync_extensions::http::{HttpConfig, PackClient};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let cx = AppContext::new(build_client(&cli)?);
    debug!(base_url = %cx.client.config().base_url(), "Using pack server");

    match cli.command {
        Commands::Show(args) => commands::handle_show(args, &cx).await?,
        Commands::Library => commands::handle_library(&cx).await?,
        Commands::Edit(args) => commands::handle_edit(args, &cx).await?,
        Commands::Create(args) => commands::handle_create(args, &cx).await?,
        Commands::Resume(args) => commands::handle_resume(args, &cx).await?,
    }

    Ok(())
}

/// `RUST_LOG` wins if set. Otherwise `-v` raises the level from WARN, and `--quiet`
/// limits output to errors.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(cli: &Cli) -> Result<PackClient> {
    let url = cli
        .api_url
        .as_deref()
        .context("No pack server configured. Pass --api-url or set PACKSYNC_API_URL.")?;
    let token = cli
        .token
        .clone()
        .context("No API token configured. Pass --token or set PACKSYNC_TOKEN.")?;

    let config = HttpConfig::new(url, token)?.timeout(Duration::from_secs(cli.timeout_secs));
    Ok(PackClient::new(config)?)
}
