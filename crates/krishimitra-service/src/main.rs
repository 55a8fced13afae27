//! KrishiMitra Service - HTTP API for the agricultural assistant.
//!
//! Run with: `cargo run -p krishimitra-service`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use krishimitra_service::{AppState, Config, RateLimitState, app, config::default_config_path};
use krishimitra_store::RecordStore;

/// KrishiMitra Service - HTTP REST API for farmers.
#[derive(Parser, Debug)]
#[command(name = "krishimitra-service")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long, global = true)]
    bind: Option<String>,

    /// Price seed file, CSV or JSON (overrides config).
    #[arg(short, long, global = true)]
    prices: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the service in the foreground (default behavior).
    Run,

    /// Validate the configuration and price seed file, then exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Some(Command::CheckConfig) => check_config(&args),
        Some(Command::Run) | None => run_server(args).await,
    }
}

/// Load the config file and apply CLI overrides.
fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(prices) = &args.prices {
        config.prices.seed_file = Some(prices.clone());
    }

    config.validate()?;
    Ok(config)
}

fn load_store(config: &Config) -> anyhow::Result<RecordStore> {
    match &config.prices.seed_file {
        Some(path) => RecordStore::load(path)
            .with_context(|| format!("loading price seed file {}", path.display())),
        None => {
            info!("No price seed file configured, using sample data");
            Ok(RecordStore::sample())
        }
    }
}

fn check_config(args: &Args) -> anyhow::Result<()> {
    let source = args.config.clone().unwrap_or_else(default_config_path);
    let config = resolve_config(args)?;
    let store = load_store(&config)?;

    println!("Configuration OK ({})", source.display());
    println!("  bind:       {}", config.server.bind);
    println!("  records:    {}", store.len());
    println!("  sessions:   up to {}", config.chat.max_sessions);
    println!(
        "  rate limit: {}",
        if config.security.rate_limit_enabled {
            format!(
                "{} requests / {}s",
                config.security.rate_limit_requests, config.security.rate_limit_window_secs
            )
        } else {
            "disabled".to_string()
        }
    );
    Ok(())
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("krishimitra_service=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = resolve_config(&args)?;
    let store = load_store(&config)?;
    info!("Loaded {} price records", store.len());

    let addr: SocketAddr = config.server.bind.parse()?;
    let window_secs = config.security.rate_limit_window_secs;
    let state = AppState::new(store, config);

    // Periodically drop stale rate limit entries
    let rate_limits = Arc::new(RateLimitState::new());
    if state.config.security.rate_limit_enabled {
        let rate_limits = Arc::clone(&rate_limits);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(window_secs.max(1)));
            loop {
                interval.tick().await;
                rate_limits.cleanup(window_secs).await;
            }
        });
    }

    // Periodically close chat sessions nobody has touched in a while
    let sweep_state = Arc::clone(&state);
    let sweep_every = state
        .config
        .chat
        .session_idle_timeout()
        .min(Duration::from_secs(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            sweep_state.sessions.evict_idle().await;
        }
    });

    let app = app(Arc::clone(&state), rate_limits);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    state.sessions.close_all().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
