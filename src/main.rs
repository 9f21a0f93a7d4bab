//! Song Guess Back binary entrypoint wiring the REST API to the configured storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use song_guess_back::{
    config::AppConfig,
    dao::game_store::{GameStore, memory::InMemoryGameStore, seed_catalog},
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = build_state(config).await?;
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the storage backend from `STORAGE_BACKEND` and build the shared state around it.
async fn build_state(config: AppConfig) -> anyhow::Result<SharedState> {
    let default_backend = if cfg!(feature = "mongo-store") {
        "mongo"
    } else {
        "memory"
    };
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| default_backend.into());

    match backend.as_str() {
        "memory" => {
            let store = InMemoryGameStore::new();
            if let Some(catalog) = config.load_catalog() {
                seed_catalog(&store, catalog)
                    .await
                    .context("seeding in-memory catalog")?;
            } else {
                warn!("in-memory store started without a song catalog");
            }
            info!("using in-memory storage");
            Ok(AppState::with_store(config, Arc::new(store)).await)
        }
        #[cfg(feature = "mongo-store")]
        "mongo" => {
            let state = AppState::new(config);
            tokio::spawn(song_guess_back::services::storage_supervisor::run(
                state.clone(),
                Default::default(),
                connect_mongo,
            ));
            info!("using MongoDB storage; starting in degraded mode until connected");
            Ok(state)
        }
        other => anyhow::bail!("unsupported STORAGE_BACKEND `{other}`"),
    }
}

#[cfg(feature = "mongo-store")]
async fn connect_mongo()
-> Result<Arc<dyn GameStore>, song_guess_back::dao::storage::StorageError> {
    use song_guess_back::dao::game_store::mongodb::{MongoConfig, MongoGameStore};

    let config = MongoConfig::from_env().await?;
    let store = MongoGameStore::connect(config).await?;
    Ok(Arc::new(store))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
