//! Pokémory backend entrypoint wiring the REST, SSE and storage layers.

use std::{env, net::SocketAddr, time::Duration};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pokemory_back::{
    config::AppConfig,
    dao::{models::PokemonEntity, store::memory::MemoryStore},
    routes,
    services::{round_service, sse_service},
    state::{AppState, SharedState, Stores},
};

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());

    tokio::spawn(sse_service::relay_system_status(app_state.clone()));
    tokio::spawn(prune_rounds(app_state.clone()));
    start_storage(&app_state).await;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Use MongoDB when `MONGO_URI` is set, the in-memory store otherwise.
async fn start_storage(state: &SharedState) {
    #[cfg(feature = "mongo-store")]
    {
        if env::var_os("MONGO_URI").is_some() {
            tokio::spawn(run_mongo_supervisor(state.clone()));
            return;
        }
    }

    let roster = state.config().roster().iter().cloned().map(PokemonEntity::from);
    state
        .install_stores(Stores::shared(MemoryStore::with_pokemons(roster)))
        .await;
    info!(
        pokemons = state.config().roster().len(),
        "MONGO_URI not set; using in-memory storage"
    );
}

/// Keep MongoDB connected in the background, seeding the Pokémon collection on each connection.
#[cfg(feature = "mongo-store")]
async fn run_mongo_supervisor(state: SharedState) {
    use pokemory_back::{
        dao::{
            storage::StorageError,
            store::mongodb::{MongoConfig, MongoStore},
        },
        services::storage_supervisor,
    };

    let roster = state.config().roster().to_vec();
    storage_supervisor::run(state, move || {
        let roster = roster.clone();
        async move {
            let config = MongoConfig::from_env().await?;
            let store = MongoStore::connect(config).await?;
            round_service::seed_pokemons(&store, &roster).await?;
            Ok::<_, StorageError>(Stores::shared(store))
        }
    })
    .await;
}

/// Periodically drop rounds nobody can reach any more.
async fn prune_rounds(state: SharedState) {
    let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
    loop {
        ticker.tick().await;
        let removed = round_service::prune_expired(&state);
        debug!(removed, live = state.rounds().len(), "round pruning pass");
    }
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
