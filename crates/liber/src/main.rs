//! Liber: book lending for the office shelf.
//!
//! Main entry point: configuration from flags and environment, tracing
//! setup, and server wiring.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use liber_oauth::OAuthConfig;
use liber_server::{AppState, Server, ServerConfig};
use liber_store::LibraryStore;

/// Liber: book lending for the office shelf
#[derive(Parser)]
#[command(name = "liber")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Address to bind the server to
    #[arg(long, env = "LIBER_BIND", default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Path to the SQLite database
    #[arg(long, env = "LIBER_DATABASE", default_value = "liber.db")]
    database: PathBuf,

    /// Public base URL baked into QR deep links
    #[arg(long, env = "LIBER_PUBLIC_BASE_URL", default_value = "http://localhost:8000")]
    public_base_url: String,

    /// Identity provider tenant
    #[arg(long, env = "LIBER_TENANT_ID", default_value = "common")]
    tenant_id: String,

    /// Identity provider application (client) id
    #[arg(long, env = "LIBER_CLIENT_ID")]
    client_id: String,

    /// Identity provider client secret
    #[arg(long, env = "LIBER_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Redirect URI registered with the provider.
    /// Defaults to {public_base_url}/auth/callback/
    #[arg(long, env = "LIBER_REDIRECT_URI")]
    redirect_uri: Option<String>,

    /// Directory for rotating JSON log files
    #[arg(long, env = "LIBER_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing: console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "liber=debug,liber_store=debug,liber_oauth=debug,liber_server=debug,tower_http=debug,info"
    } else {
        "liber=info,liber_store=info,liber_oauth=info,liber_server=info,warn"
    };

    let file_appender = tracing_appender::rolling::daily(&cli.log_dir, "liber.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "liber=trace,liber_store=trace,liber_oauth=trace,liber_server=trace,info",
                )),
        )
        .init();

    let base_url = cli.public_base_url.trim_end_matches('/').to_string();
    let oauth = OAuthConfig {
        tenant_id: cli.tenant_id,
        client_id: cli.client_id,
        client_secret: cli.client_secret,
        redirect_uri: cli
            .redirect_uri
            .unwrap_or_else(|| format!("{base_url}/auth/callback/")),
    };

    let store = LibraryStore::open(&cli.database)
        .with_context(|| format!("opening database at {}", cli.database.display()))?;

    let config = ServerConfig::new(base_url).with_bind_address(cli.bind);
    let state = AppState::new(store, oauth, config);

    tracing::info!(bind = %cli.bind, "liber starting");
    Server::from_state(state).run().await?;

    Ok(())
}
