use std::time::Duration;

use thiserror::Error;

/// Visible face of a single card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFace {
    /// Face down.
    Hidden,
    /// Face up and not yet matched.
    Revealed,
    /// Matched with its pair; stays face up until the round is discarded.
    Locked,
}

/// Card dealt on the board for the duration of one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Identity token shared by exactly two cards of the round.
    pub identity: String,
    /// Position of the card on the board.
    pub slot: usize,
    /// Current face.
    pub face: CardFace,
}

/// Whether the board accepts card clicks right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardMode {
    /// Clicks are processed.
    Accepting,
    /// A mismatch is on display; clicks are ignored until both cards are hidden again.
    Waiting,
}

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every pair was matched before the time cap.
    Victory,
    /// The time cap was exceeded with pairs left on the board.
    Defeat,
}

/// Frozen result of a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundResult {
    /// Elapsed time rounded up to whole seconds.
    pub elapsed_seconds: u64,
    /// Victory or defeat.
    pub outcome: Outcome,
}

/// Lifecycle of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardPhase {
    /// Cards are dealt, the start screen is showing and the timer is not running.
    Ready,
    /// The timer is running and clicks are processed.
    Playing,
    /// Terminal state; no card transition is accepted anymore.
    Ended(RoundResult),
}

/// Timing limits applied to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLimits {
    /// Elapsed time after which the round is lost.
    pub max_allowed: Duration,
    /// Delay before a mismatched pair is hidden again.
    pub unreveal_delay: Duration,
}

impl Default for BoardLimits {
    fn default() -> Self {
        Self {
            max_allowed: Duration::from_secs(3 * 60),
            unreveal_delay: Duration::from_millis(600),
        }
    }
}

/// Inputs accepted by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    /// Leave the start screen and begin timing.
    Start,
    /// Player clicked the card at `slot`, `elapsed_ms` after the start.
    Click {
        /// Targeted card.
        slot: usize,
        /// Time observed by the caller when the click was handled.
        elapsed_ms: u64,
    },
    /// The delay armed after a mismatch has expired.
    UnrevealElapsed {
        /// Card that was pending when the mismatch happened.
        first: usize,
        /// Card whose reveal caused the mismatch.
        second: usize,
    },
    /// Periodic timer update.
    Tick {
        /// Time elapsed since the start.
        elapsed_ms: u64,
    },
}

/// Side effects the runtime must carry out after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Start the repeating timer.
    StartTimer,
    /// Arm a one-shot delay that feeds [`BoardEvent::UnrevealElapsed`] back.
    ScheduleUnreveal {
        /// Previously pending card.
        first: usize,
        /// Card revealed second.
        second: usize,
        /// How long to wait.
        delay: Duration,
    },
    /// Stop the repeating timer. Emitted once per round.
    StopTimer,
    /// The round reached its terminal state. Emitted once per round.
    RoundEnded(RoundResult),
}

/// Summary of what a click did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Nothing changed (waiting, locked card, round not running).
    Ignored,
    /// The card was turned face up and is now pending.
    Revealed,
    /// The pending card was turned face down again.
    Hidden,
    /// The card matched the pending one; both are locked.
    Matched,
    /// The card did not match; both will be hidden after the delay.
    Mismatched,
}

/// Errors raised for events that cannot target this board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// The slot does not exist on the board.
    #[error("no card at slot {slot} (board has {len} cards)")]
    UnknownSlot {
        /// Requested slot.
        slot: usize,
        /// Number of cards on the board.
        len: usize,
    },
}

/// Result of a transition: what happened and what the runtime has to do about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Click summary, [`ClickOutcome::Ignored`] for non-click events that changed nothing.
    pub click: ClickOutcome,
    /// Effects to perform, in order.
    pub effects: Vec<Effect>,
}

impl Transition {
    fn ignored() -> Self {
        Self {
            click: ClickOutcome::Ignored,
            effects: Vec::new(),
        }
    }
}

/// Board of a memory round: the card faces, the pending card and the pair counter.
#[derive(Debug, Clone)]
pub struct Board {
    cards: Vec<Card>,
    pending: Option<usize>,
    remaining_pairs: usize,
    mode: BoardMode,
    phase: BoardPhase,
    elapsed_ms: u64,
    limits: BoardLimits,
}

impl Board {
    /// Lay out a shuffled deck of identities, all face down.
    pub fn new<I, S>(deck: I, limits: BoardLimits) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cards: Vec<Card> = deck
            .into_iter()
            .enumerate()
            .map(|(slot, identity)| Card {
                identity: identity.into(),
                slot,
                face: CardFace::Hidden,
            })
            .collect();
        let remaining_pairs = cards.len() / 2;

        Self {
            cards,
            pending: None,
            remaining_pairs,
            mode: BoardMode::Accepting,
            phase: BoardPhase::Ready,
            elapsed_ms: 0,
            limits,
        }
    }

    /// All cards in slot order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Slot of the card waiting for its pair, if any.
    pub fn pending(&self) -> Option<usize> {
        self.pending
    }

    /// Number of pairs still to be matched.
    pub fn remaining_pairs(&self) -> usize {
        self.remaining_pairs
    }

    /// Number of pairs dealt.
    pub fn total_pairs(&self) -> usize {
        self.cards.len() / 2
    }

    /// Current input mode.
    pub fn mode(&self) -> BoardMode {
        self.mode
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> BoardPhase {
        self.phase
    }

    /// Last elapsed time fed to the board.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Result of the round once it has ended.
    pub fn result(&self) -> Option<RoundResult> {
        match self.phase {
            BoardPhase::Ended(result) => Some(result),
            _ => None,
        }
    }

    /// Apply an event and return the effects the runtime has to execute.
    pub fn handle(&mut self, event: BoardEvent) -> Result<Transition, BoardError> {
        match event {
            BoardEvent::Start => Ok(self.start()),
            BoardEvent::Click { slot, elapsed_ms } => self.click(slot, elapsed_ms),
            BoardEvent::UnrevealElapsed { first, second } => self.unreveal(first, second),
            BoardEvent::Tick { elapsed_ms } => Ok(self.tick(elapsed_ms)),
        }
    }

    fn start(&mut self) -> Transition {
        if self.phase != BoardPhase::Ready {
            return Transition::ignored();
        }

        self.phase = BoardPhase::Playing;
        self.elapsed_ms = 0;
        Transition {
            click: ClickOutcome::Ignored,
            effects: vec![Effect::StartTimer],
        }
    }

    fn click(&mut self, slot: usize, elapsed_ms: u64) -> Result<Transition, BoardError> {
        self.ensure_slot(slot)?;

        if self.phase != BoardPhase::Playing {
            return Ok(Transition::ignored());
        }
        self.record_elapsed(elapsed_ms);

        if self.mode == BoardMode::Waiting || self.cards[slot].face == CardFace::Locked {
            return Ok(Transition::ignored());
        }

        if self.cards[slot].face == CardFace::Revealed {
            self.cards[slot].face = CardFace::Hidden;
            self.pending = None;
            return Ok(Transition {
                click: ClickOutcome::Hidden,
                effects: Vec::new(),
            });
        }

        self.cards[slot].face = CardFace::Revealed;

        let Some(first) = self.pending else {
            self.pending = Some(slot);
            return Ok(Transition {
                click: ClickOutcome::Revealed,
                effects: Vec::new(),
            });
        };

        if self.cards[first].identity == self.cards[slot].identity {
            self.cards[first].face = CardFace::Locked;
            self.cards[slot].face = CardFace::Locked;
            self.pending = None;
            self.remaining_pairs = self.remaining_pairs.saturating_sub(1);

            let mut effects = Vec::new();
            self.evaluate_end(&mut effects);
            return Ok(Transition {
                click: ClickOutcome::Matched,
                effects,
            });
        }

        self.mode = BoardMode::Waiting;
        Ok(Transition {
            click: ClickOutcome::Mismatched,
            effects: vec![Effect::ScheduleUnreveal {
                first,
                second: slot,
                delay: self.limits.unreveal_delay,
            }],
        })
    }

    fn unreveal(&mut self, first: usize, second: usize) -> Result<Transition, BoardError> {
        self.ensure_slot(first)?;
        self.ensure_slot(second)?;

        if matches!(self.phase, BoardPhase::Ended(_)) {
            return Ok(Transition::ignored());
        }

        for slot in [first, second] {
            if self.cards[slot].face == CardFace::Revealed {
                self.cards[slot].face = CardFace::Hidden;
            }
        }
        self.pending = None;
        self.mode = BoardMode::Accepting;

        Ok(Transition::ignored())
    }

    fn tick(&mut self, elapsed_ms: u64) -> Transition {
        if self.phase != BoardPhase::Playing {
            return Transition::ignored();
        }

        self.record_elapsed(elapsed_ms);
        let mut effects = Vec::new();
        self.evaluate_end(&mut effects);
        Transition {
            click: ClickOutcome::Ignored,
            effects,
        }
    }

    /// Decide whether the round is over. Only ever fires once since it leaves `Playing`.
    fn evaluate_end(&mut self, effects: &mut Vec<Effect>) {
        if self.phase != BoardPhase::Playing {
            return;
        }

        let outcome = if self.remaining_pairs == 0 {
            Outcome::Victory
        } else if u128::from(self.elapsed_ms) > self.limits.max_allowed.as_millis() {
            Outcome::Defeat
        } else {
            return;
        };

        let result = RoundResult {
            elapsed_seconds: self.elapsed_ms.div_ceil(1000),
            outcome,
        };
        self.phase = BoardPhase::Ended(result);
        effects.push(Effect::StopTimer);
        effects.push(Effect::RoundEnded(result));
    }

    fn record_elapsed(&mut self, elapsed_ms: u64) {
        self.elapsed_ms = self.elapsed_ms.max(elapsed_ms);
    }

    fn ensure_slot(&self, slot: usize) -> Result<(), BoardError> {
        if slot < self.cards.len() {
            Ok(())
        } else {
            Err(BoardError::UnknownSlot {
                slot,
                len: self.cards.len(),
            })
        }
    }
}
