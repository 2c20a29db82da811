use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use maas_server::config::MaasServerConfig;
use maas_server::AppState;
use maas_store_memory::MemoryStore;

/// Subscription Selector HTTP server.
#[derive(Parser, Debug)]
#[command(name = "maas-server", about = "Standalone HTTP server for the Subscription Selector")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "maas-server.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config: MaasServerConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(path = %cli.config, "config file not found, using defaults");
        toml::from_str("")?
    };

    // No real cluster API client is in scope (§1); the standalone binary
    // backs the selector with an empty in-memory snapshot that a sidecar
    // informer process would otherwise keep populated via watch.
    let subscriptions = Arc::new(MemoryStore::new());
    let state = AppState { subscriptions };
    let app = maas_server::api::router(state);

    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "maas-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("maas-server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
