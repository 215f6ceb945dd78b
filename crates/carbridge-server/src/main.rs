mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use carbridge_encar::{
    EncarClient, EncarClientConfig, EncarExtractor, RateProvider, RateProviderConfig,
};
use carbridge_import::{ImportConfig, ImportCoordinator};

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(carbridge_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = carbridge_db::PoolConfig::from_app_config(&config);
    let pool = carbridge_db::connect_pool(&config.database_url, pool_config).await?;
    carbridge_db::run_migrations(&pool).await?;

    let rates = Arc::new(RateProvider::new(RateProviderConfig::from_app_config(
        &config,
    ))?);
    let client = EncarClient::new(EncarClientConfig::from_app_config(&config))?;
    let extractor = Arc::new(EncarExtractor::new(client, rates));
    let importer = Arc::new(ImportCoordinator::new(
        pool.clone(),
        extractor,
        ImportConfig::from_app_config(&config),
    ));

    let auth = AuthState::from_env(matches!(
        config.env,
        carbridge_core::Environment::Development
    ))?;
    let app = build_app(AppState { pool, importer }, auth);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
