//! Game Rank binary entrypoint wiring configuration, storage and the HTTP server.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use game_rank::{
    config::{AppConfig, StoreKind},
    dao::game_store::memory::MemoryGameStore,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let port = config.port;
    let app_state = build_state(config).await?;
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the configured storage backend. MongoDB is connected in the
/// background, so the server starts in degraded mode until it is reachable.
async fn build_state(config: AppConfig) -> anyhow::Result<SharedState> {
    match config.store {
        StoreKind::Memory => {
            info!("using in-memory storage");
            Ok(AppState::with_store(config, Arc::new(MemoryGameStore::new())))
        }
        #[cfg(feature = "mongo-store")]
        StoreKind::Mongo => {
            let mongo = game_rank::dao::game_store::mongodb::MongoConfig::from_env()
                .await
                .context("reading MongoDB configuration")?;
            let state = AppState::new(config);
            tokio::spawn(mongo_supervisor(state.clone(), mongo));
            Ok(state)
        }
        #[cfg(not(feature = "mongo-store"))]
        StoreKind::Mongo => {
            error!("built without the mongo-store feature; falling back to in-memory storage");
            Ok(AppState::with_store(config, Arc::new(MemoryGameStore::new())))
        }
    }
}

#[cfg(feature = "mongo-store")]
async fn mongo_supervisor(
    state: SharedState,
    mongo: game_rank::dao::game_store::mongodb::MongoConfig,
) {
    use game_rank::{
        dao::{
            game_store::{GameStore, mongodb::MongoGameStore},
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    storage_supervisor::run(state, move || {
        let mongo = mongo.clone();
        async move {
            let store = MongoGameStore::connect(mongo)
                .await
                .inspect_err(|err| error!(error = %err, "MongoDB connection failed"))
                .map_err(StorageError::from)?;
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn GameStore>)
        }
    })
    .await;
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

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
