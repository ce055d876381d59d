use server_http::{AppState, build_router};
use shared::config::Config;
use storage_engine::UnifiedStorageFactory;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if exists) before the filter reads RUST_LOG
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting cachegate HTTP Server...");

    match dotenv {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    // Load configuration from environment variables
    let config = Config::from_env();

    // One long-lived client per backend, shared by every request
    info!("Connecting cache backends...");
    let state = match AppState::from_config(&config, &UnifiedStorageFactory).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize cache backends: {}", e);
            std::process::exit(1);
        }
    };

    // Build router
    let router = build_router(state, &config);

    // Start server
    let address = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", address, e);
            std::process::exit(1);
        }
    };

    info!("HTTP Server listening on http://{}", address);
    info!("Try: curl 'http://{}/cache/user:1?cache=redis'", address);

    // Graceful shutdown handler
    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete.");
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
