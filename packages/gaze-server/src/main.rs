use std::fs::File;
use std::io::{self, BufReader};
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use gaze_server::cli::{Cli, Commands};
use gaze_server::handlers::{subscribe_device, unsubscribe_device};
use gaze_server::replay::replay;
use gaze_server::{build_router, AppState, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so `config` and `replay` output stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gaze_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env()?;

    match cli.command {
        Some(Commands::Config) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Some(Commands::Replay { input }) => {
            let file = File::open(&input)?;
            let count = replay(BufReader::new(file), io::stdout().lock(), config.filter)?;
            info!("Replayed {} samples from {}", count, input.display());
            Ok(())
        }
        Some(Commands::Serve { port, bind, device }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(device) = device {
                config.device = device;
            }
            run_server(config).await
        }
        None => run_server(config).await,
    }
}

async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("🚀 Starting Gaze Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Device: {}", config.device.as_str());
    info!(
        "Filter: min_cutoff={} beta={} derivative_cutoff={} velocity_threshold={}",
        config.filter.smoother.min_cutoff,
        config.filter.smoother.beta,
        config.filter.smoother.derivative_cutoff,
        config.filter.velocity_threshold
    );

    let addr: SocketAddr = config.bind_address().parse()?;
    let state = Arc::new(AppState::from_config(config)?);

    subscribe_device(&state).await?;

    let app = build_router(state.clone());

    info!("🎯 Gaze Server listening on {}", addr);
    info!("📡 WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = unsubscribe_device(&state).await {
        error!("Failed to unsubscribe device: {}", e);
    }
    info!("👋 Gaze Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
