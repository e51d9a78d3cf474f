//! Runtime wrapper driving a [`Board`]: timer task, delayed unreveal and end notification.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::{Mutex, watch},
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::{
    board::{
        Board, BoardError, BoardEvent, BoardLimits, BoardMode, BoardPhase, Card, CardFace,
        ClickOutcome, Effect, RoundResult,
    },
    game::Pokemon,
    timer::{RoundClock, TimerReading},
};

/// Receives everything a round wants to tell the outside world.
///
/// Calls happen while the round is locked, so implementations must not block.
pub trait RoundObserver: Send + Sync {
    /// A timer tick was computed, right before the expiry check.
    fn timer_ticked(&self, round_id: Uuid, reading: &TimerReading);
    /// A mismatched pair was turned face down again.
    fn cards_hidden(&self, round_id: Uuid, first: usize, second: usize);
    /// The round reached its terminal state.
    fn round_ended(&self, round_id: Uuid, result: RoundResult, pseudonym: Option<&str>);
}

/// Timing configuration of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSettings {
    /// Limits enforced by the board.
    pub limits: BoardLimits,
    /// Period of the countdown refresh.
    pub tick_interval: Duration,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            limits: BoardLimits::default(),
            tick_interval: Duration::from_millis(400),
        }
    }
}

/// Card as seen from outside the round: hidden cards carry no Pokémon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    /// Board position.
    pub slot: usize,
    /// Card state.
    pub face: CardFace,
    /// Pokémon shown when the card is face up.
    pub pokemon: Option<Pokemon>,
}

/// Point-in-time copy of a round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundView {
    /// Round identifier.
    pub id: Uuid,
    /// Player pseudonym, if one was given.
    pub pseudonym: Option<String>,
    /// Lifecycle phase.
    pub phase: BoardPhase,
    /// Input mode.
    pub mode: BoardMode,
    /// Pairs left to match.
    pub remaining_pairs: usize,
    /// Pairs dealt.
    pub total_pairs: usize,
    /// Cards in slot order.
    pub cards: Vec<CardView>,
    /// Countdown values.
    pub timer: TimerReading,
}

#[derive(Debug, Clone, Copy)]
struct Ended {
    result: RoundResult,
    at: Instant,
}

struct RoundInner {
    board: Board,
    clock: Option<RoundClock>,
    stop_timer: Option<watch::Sender<bool>>,
}

/// One round of the memory game and the tasks attached to it.
pub struct Round {
    id: Uuid,
    pseudonym: Option<String>,
    pokemons: Vec<Pokemon>,
    settings: RoundSettings,
    created_at: Instant,
    started: AtomicBool,
    inner: Mutex<RoundInner>,
    ended: watch::Sender<Option<Ended>>,
    observer: Arc<dyn RoundObserver>,
}

impl Round {
    /// Lay out a shuffled deck of Pokémon on a fresh board.
    pub fn new(
        pseudonym: Option<String>,
        deck: Vec<Pokemon>,
        settings: RoundSettings,
        observer: Arc<dyn RoundObserver>,
    ) -> Arc<Self> {
        let board = Board::new(deck.iter().map(|pokemon| pokemon.name.clone()), settings.limits);
        let (ended, _rx) = watch::channel(None);

        Arc::new(Self {
            id: Uuid::new_v4(),
            pseudonym,
            pokemons: deck,
            settings,
            created_at: Instant::now(),
            started: AtomicBool::new(false),
            inner: Mutex::new(RoundInner {
                board,
                clock: None,
                stop_timer: None,
            }),
            ended,
            observer,
        })
    }

    /// Round identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Leave the start screen: capture the start instant and launch the timer.
    pub async fn start(self: &Arc<Self>) -> RoundView {
        let mut inner = self.inner.lock().await;
        if let Ok(transition) = inner.board.handle(BoardEvent::Start) {
            self.run_effects(&mut inner, transition.effects);
        }
        self.view_locked(&inner)
    }

    /// Forward a click on `slot` to the board.
    pub async fn click(
        self: &Arc<Self>,
        slot: usize,
    ) -> Result<(ClickOutcome, RoundView), BoardError> {
        let mut inner = self.inner.lock().await;
        let elapsed_ms = inner
            .clock
            .map(|clock| clock.reading().elapsed_ms)
            .unwrap_or(0);
        let transition = inner.board.handle(BoardEvent::Click { slot, elapsed_ms })?;
        debug!(round_id = %self.id, slot, outcome = ?transition.click, "card clicked");
        self.run_effects(&mut inner, transition.effects);
        Ok((transition.click, self.view_locked(&inner)))
    }

    /// Snapshot the round.
    pub async fn view(&self) -> RoundView {
        let inner = self.inner.lock().await;
        self.view_locked(&inner)
    }

    /// Wait until the round has ended and return its result.
    pub async fn finished(&self) -> Option<RoundResult> {
        let mut rx = self.ended.subscribe();
        let ended = rx.wait_for(Option::is_some).await.ok()?;
        (*ended).map(|ended| ended.result)
    }

    /// Whether the round can be dropped from the registry.
    ///
    /// Ended rounds are kept for `retention` after their end, rounds never started for
    /// `retention` after their creation. Running rounds are always kept.
    pub fn is_expired(&self, now: Instant, retention: Duration) -> bool {
        if let Some(ended) = *self.ended.borrow() {
            return now.saturating_duration_since(ended.at) >= retention;
        }
        !self.started.load(Ordering::Acquire)
            && now.saturating_duration_since(self.created_at) >= retention
    }

    fn run_effects(self: &Arc<Self>, inner: &mut RoundInner, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartTimer => {
                    let clock = RoundClock::start(self.settings.limits.max_allowed);
                    let (stop_tx, stop_rx) = watch::channel(false);
                    inner.clock = Some(clock);
                    inner.stop_timer = Some(stop_tx);
                    self.started.store(true, Ordering::Release);
                    tokio::spawn(run_ticker(self.clone(), stop_rx));
                    info!(round_id = %self.id, pairs = inner.board.total_pairs(), "round started");
                }
                Effect::ScheduleUnreveal {
                    first,
                    second,
                    delay,
                } => {
                    let round = self.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        round.unreveal(first, second).await;
                    });
                }
                Effect::StopTimer => {
                    if let Some(stop) = inner.stop_timer.take() {
                        let _ = stop.send(true);
                    }
                }
                Effect::RoundEnded(result) => {
                    self.ended.send_replace(Some(Ended {
                        result,
                        at: Instant::now(),
                    }));
                    info!(
                        round_id = %self.id,
                        outcome = ?result.outcome,
                        elapsed_seconds = result.elapsed_seconds,
                        "round ended"
                    );
                    self.observer
                        .round_ended(self.id, result, self.pseudonym.as_deref());
                }
            }
        }
    }

    async fn unreveal(self: &Arc<Self>, first: usize, second: usize) {
        let mut inner = self.inner.lock().await;
        let was_waiting = inner.board.mode() == BoardMode::Waiting;
        let Ok(transition) = inner
            .board
            .handle(BoardEvent::UnrevealElapsed { first, second })
        else {
            return;
        };
        if was_waiting && inner.board.mode() == BoardMode::Accepting {
            self.observer.cards_hidden(self.id, first, second);
        }
        self.run_effects(&mut inner, transition.effects);
    }

    /// Publish a reading and run the expiry check. Returns false once the round is over.
    async fn tick(self: &Arc<Self>) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(clock) = inner.clock else {
            return false;
        };
        if inner.board.phase() != BoardPhase::Playing {
            return false;
        }

        let reading = clock.reading();
        self.observer.timer_ticked(self.id, &reading);
        if let Ok(transition) = inner.board.handle(BoardEvent::Tick {
            elapsed_ms: reading.elapsed_ms,
        }) {
            self.run_effects(&mut inner, transition.effects);
        }

        inner.board.phase() == BoardPhase::Playing
    }

    fn view_locked(&self, inner: &RoundInner) -> RoundView {
        let board = &inner.board;
        let cap = self.settings.limits.max_allowed;
        let timer = match (board.phase(), inner.clock) {
            (BoardPhase::Playing, Some(clock)) => clock.reading(),
            _ => TimerReading::at(Duration::from_millis(board.elapsed_ms()), cap),
        };

        RoundView {
            id: self.id,
            pseudonym: self.pseudonym.clone(),
            phase: board.phase(),
            mode: board.mode(),
            remaining_pairs: board.remaining_pairs(),
            total_pairs: board.total_pairs(),
            cards: board
                .cards()
                .iter()
                .map(|card| self.card_view(card))
                .collect(),
            timer,
        }
    }

    fn card_view(&self, card: &Card) -> CardView {
        let pokemon = match card.face {
            CardFace::Hidden => None,
            _ => self.pokemons.get(card.slot).cloned(),
        };
        CardView {
            slot: card.slot,
            face: card.face,
            pokemon,
        }
    }
}

/// Repeating countdown task. Exits when signalled or once the round is no longer playing.
async fn run_ticker(round: Arc<Round>, mut stop: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(round.settings.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the countdown starts one period later.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if !round.tick().await {
                    break;
                }
            }
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }
    debug!(round_id = %round.id, "round timer stopped");
}
