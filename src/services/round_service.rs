use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::{
    dao::{models::PokemonEntity, storage::StorageResult, store::PokemonStore},
    dto::{
        round::{ClickResponse, CreateRoundRequest, RoundSnapshot},
        validation::validate_pseudonym,
    },
    error::ServiceError,
    services::round_events::RoundEvents,
    state::{SharedState, deck::build_deck_by, game::Pokemon, round::Round},
};

/// Largest deck a client may ask for.
pub const MAX_PAIRS: usize = 64;

/// Deal a new round from Pokémon sampled in storage and register it.
pub async fn create_round(
    state: &SharedState,
    request: CreateRoundRequest,
) -> Result<RoundSnapshot, ServiceError> {
    prune_expired(state);

    let pairs = request
        .pairs
        .unwrap_or_else(|| state.config().round().pair_count);
    if pairs == 0 || pairs > MAX_PAIRS {
        return Err(ServiceError::InvalidInput(format!(
            "pairs must be between 1 and {MAX_PAIRS} (got {pairs})"
        )));
    }

    let pseudonym = match request.pseudonym.as_deref() {
        None => None,
        Some(raw) => match validate_pseudonym(Some(raw)) {
            Ok(pseudonym) => Some(pseudonym),
            Err(err) => {
                let mut errors = ValidationErrors::new();
                errors.add("pseudonym", err);
                return Err(ServiceError::Validation(errors));
            }
        },
    };

    let store = state.require_pokemon_store().await?;
    let pokemons: Vec<Pokemon> = store
        .find_random(pairs)
        .await?
        .into_iter()
        .map(Pokemon::from)
        .collect();
    if pokemons.is_empty() {
        warn!("pokemon source is empty; cannot deal a round");
        return Err(ServiceError::NoCards);
    }

    let deck = build_deck_by(&pokemons, pairs, &mut rand::rng(), |pokemon| {
        pokemon.name.clone()
    })?;

    let observer = Arc::new(RoundEvents::new(Arc::downgrade(state)));
    let round = Round::new(pseudonym, deck, state.config().round().settings(), observer);
    state.rounds().insert(round.id(), round.clone());
    info!(round_id = %round.id(), pairs, "round created");

    Ok(round.view().await.into())
}

/// Current state of a round.
pub async fn get_round(state: &SharedState, id: Uuid) -> Result<RoundSnapshot, ServiceError> {
    let round = find_round(state, id)?;
    Ok(round.view().await.into())
}

/// Leave the start screen and launch the countdown. Starting twice is a no-op.
pub async fn start_round(state: &SharedState, id: Uuid) -> Result<RoundSnapshot, ServiceError> {
    let round = find_round(state, id)?;
    Ok(round.start().await.into())
}

/// Click the card at `slot`.
pub async fn click_card(
    state: &SharedState,
    id: Uuid,
    slot: usize,
) -> Result<ClickResponse, ServiceError> {
    let round = find_round(state, id)?;
    let (outcome, view) = round.click(slot).await?;
    Ok(ClickResponse {
        outcome: outcome.into(),
        round: view.into(),
    })
}

/// Drop ended and abandoned rounds past their retention period. Returns how many were removed.
pub fn prune_expired(state: &SharedState) -> usize {
    let retention = state.config().round().ended_round_retention;
    let now = Instant::now();
    let before = state.rounds().len();
    state
        .rounds()
        .retain(|_, round| !round.is_expired(now, retention));
    let removed = before.saturating_sub(state.rounds().len());
    if removed > 0 {
        debug!(removed, "pruned expired rounds");
    }
    removed
}

/// Fill an empty Pokémon store with `roster`. Returns the number of records written.
pub async fn seed_pokemons(store: &dyn PokemonStore, roster: &[Pokemon]) -> StorageResult<usize> {
    if !store.find_random(1).await?.is_empty() {
        return Ok(0);
    }

    for pokemon in roster {
        store
            .save_pokemon(PokemonEntity::from(pokemon.clone()))
            .await?;
    }
    info!(count = roster.len(), "seeded pokemon store");
    Ok(roster.len())
}

fn find_round(state: &SharedState, id: Uuid) -> Result<Arc<Round>, ServiceError> {
    state
        .rounds()
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| ServiceError::NotFound(format!("round {id} not found")))
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use tokio::sync::broadcast::error::RecvError;

    use super::*;
    use crate::{
        config::{AppConfig, RoundConfig},
        dao::store::{ScoreStore, memory::MemoryStore},
        dto::round::{CardFaceDto, ClickOutcomeDto, OutcomeDto, RoundPhaseDto},
        dto::sse::ServerEvent,
        services::sse_events::{EVENT_ROUND_ENDED, EVENT_SCORE_SETTLED},
        state::{AppState, Stores},
    };

    fn roster(count: u32) -> Vec<Pokemon> {
        (1..=count)
            .map(|id| Pokemon {
                id,
                name: format!("mon{id}"),
                display_name: format!("Mon {id}"),
                image_url: format!("https://img.example/{id}.png"),
            })
            .collect()
    }

    fn config(max_secs: u64) -> AppConfig {
        AppConfig::default().with_round(RoundConfig {
            pair_count: 4,
            max_allowed_time: Duration::from_secs(max_secs),
            unreveal_delay: Duration::from_millis(600),
            timer_tick: Duration::from_millis(400),
            ended_round_retention: Duration::from_secs(60),
        })
    }

    async fn state_with_roster(config: AppConfig, count: u32) -> (SharedState, MemoryStore) {
        let state = AppState::new(config);
        let store = MemoryStore::with_pokemons(roster(count).into_iter().map(PokemonEntity::from));
        state.install_stores(Stores::shared(store.clone())).await;
        (state, store)
    }

    /// Reveal the whole deck by probing the snapshot returned after each click.
    async fn pair_slots(state: &SharedState, id: Uuid, cards: usize) -> Vec<(usize, usize)> {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for slot in 0..cards {
            let response = click_card(state, id, slot).await.unwrap();
            let name = response.round.cards[slot]
                .pokemon
                .as_ref()
                .map(|pokemon| pokemon.name.clone())
                .unwrap();
            by_name.entry(name).or_default().push(slot);
            // Hide it again so the next click starts from a clean board.
            click_card(state, id, slot).await.unwrap();
        }
        by_name.into_values().map(|slots| (slots[0], slots[1])).collect()
    }

    async fn next_event(
        events: &mut tokio::sync::broadcast::Receiver<ServerEvent>,
        name: &str,
    ) -> ServerEvent {
        loop {
            match events.recv().await {
                Ok(event) if event.event.as_deref() == Some(name) => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("event stream closed before {name}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn winning_round_submits_the_score() {
        let (state, store) = state_with_roster(config(180), 10).await;
        let mut events = state.public_sse().subscribe();

        let created = create_round(
            &state,
            CreateRoundRequest {
                pseudonym: Some(" Red ".into()),
                pairs: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(created.cards.len(), 8);
        assert_eq!(created.phase, RoundPhaseDto::Ready);
        assert!(created.cards.iter().all(|card| card.pokemon.is_none()));

        start_round(&state, created.id).await.unwrap();
        let pairs = pair_slots(&state, created.id, 8).await;
        tokio::time::sleep(Duration::from_millis(36_200)).await;

        let mut last = None;
        for (first, second) in pairs {
            click_card(&state, created.id, first).await.unwrap();
            let response = click_card(&state, created.id, second).await.unwrap();
            assert_eq!(response.outcome, ClickOutcomeDto::Matched);
            last = Some(response.round);
        }

        let round = last.unwrap();
        assert_eq!(round.phase, RoundPhaseDto::Ended);
        let result = round.result.unwrap();
        assert_eq!(result.outcome, OutcomeDto::Victory);
        assert_eq!(result.elapsed_seconds, 37);
        assert!(round.cards.iter().all(|card| card.face == CardFaceDto::Locked));

        let ended = next_event(&mut events, EVENT_ROUND_ENDED).await;
        assert!(ended.data.contains("\"submitting\":true"));
        let settled = next_event(&mut events, EVENT_SCORE_SETTLED).await;
        assert!(settled.data.contains("\"saved\":true"));

        let scores = store.find_best_scores(5).await.unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].pseudonym, "Red");
        assert_eq!(scores[0].time_seconds, 37);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_round_is_a_defeat_without_submission() {
        let (state, store) = state_with_roster(config(3), 10).await;
        let mut events = state.public_sse().subscribe();

        let created = create_round(
            &state,
            CreateRoundRequest {
                pseudonym: Some("Blue".into()),
                pairs: Some(2),
            },
        )
        .await
        .unwrap();
        start_round(&state, created.id).await.unwrap();

        let ended = next_event(&mut events, EVENT_ROUND_ENDED).await;
        assert!(ended.data.contains("\"outcome\":\"defeat\""));
        assert!(ended.data.contains("\"submitting\":false"));

        let round = get_round(&state, created.id).await.unwrap();
        assert_eq!(round.result.unwrap().outcome, OutcomeDto::Defeat);
        assert_eq!(round.remaining_pairs, 2);

        let click = click_card(&state, created.id, 0).await.unwrap();
        assert_eq!(click.outcome, ClickOutcomeDto::Ignored);
        assert!(store.find_best_scores(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insufficient_source_is_surfaced() {
        let (state, _) = state_with_roster(config(180), 3).await;
        let err = create_round(&state, CreateRoundRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Deck(crate::state::deck::DeckError::InsufficientSource {
                requested: 4,
                available: 3
            })
        ));
    }

    #[tokio::test]
    async fn empty_source_means_no_cards() {
        let (state, _) = state_with_roster(config(180), 0).await;
        let err = create_round(&state, CreateRoundRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoCards));
    }

    #[tokio::test]
    async fn degraded_mode_refuses_new_rounds() {
        let state = AppState::new(config(180));
        let err = create_round(&state, CreateRoundRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let (state, _) = state_with_roster(config(180), 10).await;
        let err = create_round(
            &state,
            CreateRoundRequest {
                pseudonym: None,
                pairs: Some(0),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = create_round(
            &state,
            CreateRoundRequest {
                pseudonym: Some(" ?! ".into()),
                pairs: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let created = create_round(&state, CreateRoundRequest::default())
            .await
            .unwrap();
        let err = click_card(&state, created.id, 99).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = get_round(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_rounds_are_pruned() {
        let (state, _) = state_with_roster(config(180), 10).await;
        let created = create_round(&state, CreateRoundRequest::default())
            .await
            .unwrap();
        assert_eq!(prune_expired(&state), 0);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(prune_expired(&state), 1);
        assert!(get_round(&state, created.id).await.is_err());
    }

    #[tokio::test]
    async fn seeding_only_fills_empty_stores() {
        let store = MemoryStore::new();
        assert_eq!(seed_pokemons(&store, &roster(5)).await.unwrap(), 5);
        assert_eq!(seed_pokemons(&store, &roster(5)).await.unwrap(), 0);
        assert_eq!(store.find_random(10).await.unwrap().len(), 5);
    }
}
