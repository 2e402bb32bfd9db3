use library_lending::{
    adapters::{flat_file::FlatFileLibraryStore, system::SystemClock},
    api::{handlers::AppState, router::create_router},
    application::lending::{ServiceDependencies, load_library, save_library},
    config::AppConfig,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_lending=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    // Initialize adapters
    let store = Arc::new(FlatFileLibraryStore::new(config.data_dir.clone()));
    tracing::info!("Data directory: {}", store.dir().display());

    let library = load_library(&*store, config.seed)
        .await
        .expect("Failed to load library data");

    // Create service dependencies
    let service_deps = ServiceDependencies {
        library: Arc::new(Mutex::new(library)),
        store,
        clock: Arc::new(SystemClock),
    };

    // Create application state
    let app_state = Arc::new(AppState {
        service_deps: service_deps.clone(),
    });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    // Persist everything on the way out
    if let Err(e) = save_library(&service_deps).await {
        tracing::error!("Failed to save library data: {:?}", e);
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
