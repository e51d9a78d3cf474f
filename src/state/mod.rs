/// Pure memory board state machine.
pub mod board;
/// Deck dealing.
pub mod deck;
/// Domain Pokémon and scores.
pub mod game;
/// Seconds to calendar interval codec.
pub mod interval;
/// Round runtime around a board.
pub mod round;
mod sse;
/// Countdown readings.
pub mod timer;

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::store::{PokemonStore, ScoreStore},
    error::ServiceError,
    services::score_submission::{self, ScoreSink},
};

pub use self::sse::SseHub;
use self::round::Round;

/// State handle shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;

/// Storage handles installed together, usually backed by the same database.
#[derive(Clone)]
pub struct Stores {
    /// Pokémon catalogue.
    pub pokemons: Arc<dyn PokemonStore>,
    /// Leaderboard.
    pub scores: Arc<dyn ScoreStore>,
}

impl Stores {
    /// Use a single backend for both concerns.
    pub fn shared<S>(store: S) -> Self
    where
        S: PokemonStore + ScoreStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            pokemons: store.clone(),
            scores: store,
        }
    }
}

/// Central application state: storage handles, live rounds and the event hub.
pub struct AppState {
    config: AppConfig,
    stores: RwLock<Option<Stores>>,
    sse: SseHub,
    rounds: DashMap<Uuid, Arc<Round>>,
    score_sink: Arc<dyn ScoreSink>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new_cyclic(|weak: &Weak<AppState>| Self {
            score_sink: score_submission::sink_for(&config, weak.clone()),
            config,
            stores: RwLock::new(None),
            sse: SseHub::new(),
            rounds: DashMap::new(),
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain the current storage handles, if installed.
    pub async fn stores(&self) -> Option<Stores> {
        let guard = self.stores.read().await;
        guard.as_ref().cloned()
    }

    /// Pokémon store, or [`ServiceError::Degraded`] when storage is missing.
    pub async fn require_pokemon_store(&self) -> Result<Arc<dyn PokemonStore>, ServiceError> {
        self.stores()
            .await
            .map(|stores| stores.pokemons)
            .ok_or(ServiceError::Degraded)
    }

    /// Score store, or [`ServiceError::Degraded`] when storage is missing.
    pub async fn require_score_store(&self) -> Result<Arc<dyn ScoreStore>, ServiceError> {
        self.stores()
            .await
            .map(|stores| stores.scores)
            .ok_or(ServiceError::Degraded)
    }

    /// Install storage handles and leave degraded mode.
    pub async fn install_stores(&self, stores: Stores) {
        {
            let mut guard = self.stores.write().await;
            *guard = Some(stores);
        }
        self.update_degraded(false);
    }

    /// Remove the storage handles and enter degraded mode.
    pub async fn clear_stores(&self) {
        {
            let mut guard = self.stores.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Registry of live rounds keyed by their identifier.
    pub fn rounds(&self) -> &DashMap<Uuid, Arc<Round>> {
        &self.rounds
    }

    /// Destination of the scores of won rounds.
    pub fn score_sink(&self) -> Arc<dyn ScoreSink> {
        self.score_sink.clone()
    }
}
