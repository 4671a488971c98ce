use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use todo_api::{
    auth::{PasswordService, TokenService},
    config::AppConfig,
    create_router, db, AppState,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("todo_api=debug")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Todo API - Starting...");

    // Missing JWT_SECRET or database settings stop the process here
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    });
    tracing::debug!("Loaded configuration: {:?}", config);

    tracing::info!("Opening record stores...");
    let stores = db::open_stores(&config.store)
        .await
        .expect("Failed to open record stores");

    let passwords =
        PasswordService::new(config.hashing).expect("Invalid password hashing parameters");
    let tokens = Arc::new(TokenService::new(&config.jwt_secret));

    let state = AppState::new(stores.users, stores.todos, passwords, tokens);
    let app = create_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Todo API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Todo API stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
