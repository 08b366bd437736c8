//! memory-match-back binary entrypoint wiring the REST, SSE and score store layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "couch-store")]
use memory_match_back::dao::score_store::couchdb::{CouchConfig, CouchScoreStore};
#[cfg(feature = "mongo-store")]
use memory_match_back::dao::score_store::mongodb::{MongoConfig, MongoScoreStore};
use memory_match_back::{
    config::AppConfig,
    dao::{
        score_store::{ScoreStore, memory::InMemoryScoreStore},
        storage::StorageError,
    },
    routes,
    services::{session_service, storage_supervisor},
    state::{AppState, SharedState},
};

const STORE_ENV: &str = "MEMORY_MATCH_STORE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());

    spawn_score_store(app_state.clone()).await?;
    tokio::spawn(session_service::refresh_on_load(app_state.clone()));

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

/// Pick the score backend from `MEMORY_MATCH_STORE` and hand it to the supervisor.
async fn spawn_score_store(state: SharedState) -> anyhow::Result<()> {
    let backend = env::var(STORE_ENV).unwrap_or_else(|_| "memory".into());
    match backend.as_str() {
        #[cfg(feature = "mongo-store")]
        "mongo" => {
            let config = MongoConfig::from_env()
                .await
                .context("reading MongoDB configuration")?;
            info!(database = %config.database_name, "using MongoDB score store");
            tokio::spawn(storage_supervisor::run(state, move || {
                let config = config.clone();
                async move {
                    let store = MongoScoreStore::connect(config).await?;
                    Ok::<_, StorageError>(Arc::new(store) as Arc<dyn ScoreStore>)
                }
            }));
        }
        #[cfg(feature = "couch-store")]
        "couch" => {
            let config = CouchConfig::from_env().context("reading CouchDB configuration")?;
            info!(database = %config.database, "using CouchDB score store");
            tokio::spawn(storage_supervisor::run(state, move || {
                let config = config.clone();
                async move {
                    let store = CouchScoreStore::connect(config).await?;
                    Ok::<_, StorageError>(Arc::new(store) as Arc<dyn ScoreStore>)
                }
            }));
        }
        "memory" => {
            warn!("using in-memory score store; scores are lost on restart");
            let store = InMemoryScoreStore::new();
            tokio::spawn(storage_supervisor::run(state, move || {
                let store = store.clone();
                async move { Ok::<_, StorageError>(Arc::new(store) as Arc<dyn ScoreStore>) }
            }));
        }
        other => bail!("unsupported {STORE_ENV} value `{other}`"),
    }
    Ok(())
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
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
