use crate::cli::ServeArgs;
use crate::config::{ServerOverrides, build_config};
use crate::error::{Result, ServerError};
use crate::server::{AppState, router};
use crate::utils::progress::CliProgressHandler;
use quantumwaste::engine::predictor::DifficultyPredictor;
use quantumwaste::engine::progress::ProgressReporter;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub async fn run(args: ServeArgs) -> Result<()> {
    let app_config = build_config(
        &args.config,
        ServerOverrides {
            host: args.host,
            port: args.port,
        },
    )?;
    let simulation = app_config.simulation;

    println!(
        "Preparing difficulty predictor in {}...",
        simulation.model_dir().display()
    );
    let model_config = simulation.model.clone();
    let progress_handler = CliProgressHandler::new();
    let predictor = tokio::task::spawn_blocking(move || {
        let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
        DifficultyPredictor::bootstrap(&model_config, &reporter)
    })
    .await
    .map_err(|e| ServerError::Other(anyhow::anyhow!("Bootstrap task failed: {}", e)))??;

    let app = router(AppState::new(predictor, simulation));

    let addr = format!("{}:{}", app_config.host, app_config.port);
    let listener = TcpListener::bind(addr.as_str()).await?;
    let local = listener.local_addr()?;
    info!(%local, "QuantumWaste API listening.");
    println!("Serving QuantumWaste API on http://{}", local);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for the shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received; draining connections.");
}
