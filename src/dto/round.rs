use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    board::{BoardMode, BoardPhase, CardFace, ClickOutcome, Outcome},
    game::Pokemon,
    round::{CardView, RoundView},
    timer::TimerReading,
};

/// Payload of `POST /rounds`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateRoundRequest {
    /// Pseudonym the score is submitted under when the round is won.
    #[serde(default)]
    pub pseudonym: Option<String>,
    /// Number of pairs to deal, the configured default when omitted.
    #[serde(default)]
    pub pairs: Option<usize>,
}

/// Face of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CardFaceDto {
    /// Face down.
    Hidden,
    /// Face up, waiting for its pair.
    Revealed,
    /// Matched.
    Locked,
}

impl From<CardFace> for CardFaceDto {
    fn from(value: CardFace) -> Self {
        match value {
            CardFace::Hidden => Self::Hidden,
            CardFace::Revealed => Self::Revealed,
            CardFace::Locked => Self::Locked,
        }
    }
}

/// Pokémon printed on a face-up card.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PokemonDto {
    /// National Pokédex number.
    pub id: u32,
    /// Unique lowercase name, also the pairing key.
    pub name: String,
    /// Name shown to players.
    pub display_name: String,
    /// Sprite location.
    pub image_url: String,
}

impl From<Pokemon> for PokemonDto {
    fn from(value: Pokemon) -> Self {
        Self {
            id: value.id,
            name: value.name,
            display_name: value.display_name,
            image_url: value.image_url,
        }
    }
}

/// Card as exposed to clients. Hidden cards carry no Pokémon.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CardSnapshot {
    /// Position in the deck.
    pub slot: usize,
    /// Current face.
    pub face: CardFaceDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Absent while the card is face down.
    pub pokemon: Option<PokemonDto>,
}

impl From<CardView> for CardSnapshot {
    fn from(value: CardView) -> Self {
        Self {
            slot: value.slot,
            face: value.face.into(),
            pokemon: value.pokemon.map(Into::into),
        }
    }
}

/// Countdown of a round.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimerSnapshot {
    /// Milliseconds since the start.
    pub elapsed_ms: u64,
    /// Milliseconds before the cap, never negative.
    pub remaining_ms: u64,
    /// Remaining share of the cap, from 1 down to 0.
    pub ratio: f64,
    /// Remaining time as `MM:SS`.
    pub label: String,
}

impl From<TimerReading> for TimerSnapshot {
    fn from(value: TimerReading) -> Self {
        Self {
            elapsed_ms: value.elapsed_ms,
            remaining_ms: value.remaining_ms,
            ratio: value.ratio,
            label: value.label,
        }
    }
}

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeDto {
    /// Every pair matched in time.
    Victory,
    /// The time cap was exceeded.
    Defeat,
}

impl From<Outcome> for OutcomeDto {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Victory => Self::Victory,
            Outcome::Defeat => Self::Defeat,
        }
    }
}

/// Frozen result of an ended round.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct RoundResultDto {
    /// Victory or defeat.
    pub outcome: OutcomeDto,
    /// Elapsed time rounded up to whole seconds.
    pub elapsed_seconds: u64,
}

/// Lifecycle of a round as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhaseDto {
    /// Start screen.
    Ready,
    /// Countdown running.
    Playing,
    /// Result available.
    Ended,
}

/// Full state of a round.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundSnapshot {
    /// Round identifier.
    pub id: Uuid,
    /// Pseudonym the score is submitted under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pseudonym: Option<String>,
    /// Lifecycle phase.
    pub phase: RoundPhaseDto,
    /// True while a mismatched pair is waiting to be hidden; clicks are ignored meanwhile.
    pub waiting: bool,
    /// Pairs left to match.
    pub remaining_pairs: usize,
    /// Pairs dealt.
    pub total_pairs: usize,
    /// Cards in slot order.
    pub cards: Vec<CardSnapshot>,
    /// Countdown values.
    pub timer: TimerSnapshot,
    /// Present once the round has ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RoundResultDto>,
}

impl From<RoundView> for RoundSnapshot {
    fn from(value: RoundView) -> Self {
        let (phase, result) = match value.phase {
            BoardPhase::Ready => (RoundPhaseDto::Ready, None),
            BoardPhase::Playing => (RoundPhaseDto::Playing, None),
            BoardPhase::Ended(result) => (
                RoundPhaseDto::Ended,
                Some(RoundResultDto {
                    outcome: result.outcome.into(),
                    elapsed_seconds: result.elapsed_seconds,
                }),
            ),
        };

        Self {
            id: value.id,
            pseudonym: value.pseudonym,
            phase,
            waiting: value.mode == BoardMode::Waiting,
            remaining_pairs: value.remaining_pairs,
            total_pairs: value.total_pairs,
            cards: value.cards.into_iter().map(Into::into).collect(),
            timer: value.timer.into(),
            result,
        }
    }
}

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClickOutcomeDto {
    /// Nothing changed.
    Ignored,
    /// The card is face up and pending.
    Revealed,
    /// The pending card was turned back.
    Hidden,
    /// The pair was locked.
    Matched,
    /// Both cards will be hidden after the delay.
    Mismatched,
}

impl From<ClickOutcome> for ClickOutcomeDto {
    fn from(value: ClickOutcome) -> Self {
        match value {
            ClickOutcome::Ignored => Self::Ignored,
            ClickOutcome::Revealed => Self::Revealed,
            ClickOutcome::Hidden => Self::Hidden,
            ClickOutcome::Matched => Self::Matched,
            ClickOutcome::Mismatched => Self::Mismatched,
        }
    }
}

/// Response of `POST /rounds/{id}/cards/{slot}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClickResponse {
    /// Effect of the click.
    pub outcome: ClickOutcomeDto,
    /// Round after the click.
    pub round: RoundSnapshot,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::board::RoundResult;

    fn view(phase: BoardPhase) -> RoundView {
        RoundView {
            id: Uuid::nil(),
            pseudonym: None,
            phase,
            mode: BoardMode::Accepting,
            remaining_pairs: 1,
            total_pairs: 1,
            cards: vec![
                CardView {
                    slot: 0,
                    face: CardFace::Hidden,
                    pokemon: None,
                },
                CardView {
                    slot: 1,
                    face: CardFace::Revealed,
                    pokemon: Some(Pokemon {
                        id: 25,
                        name: "pikachu".into(),
                        display_name: "Pikachu".into(),
                        image_url: "https://img.example/25.png".into(),
                    }),
                },
            ],
            timer: TimerReading::at(Duration::from_secs(1), Duration::from_secs(180)),
        }
    }

    #[test]
    fn hidden_cards_serialise_without_identity() {
        let snapshot = RoundSnapshot::from(view(BoardPhase::Playing));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["cards"][0].get("pokemon").is_none());
        assert_eq!(json["cards"][0]["face"], "hidden");
        assert_eq!(json["cards"][1]["pokemon"]["name"], "pikachu");
        assert_eq!(json["phase"], "playing");
        assert!(json.get("result").is_none());
    }

    #[test]
    fn ended_round_exposes_result() {
        let result = RoundResult {
            elapsed_seconds: 12,
            outcome: Outcome::Defeat,
        };
        let json = serde_json::to_value(RoundSnapshot::from(view(BoardPhase::Ended(result)))).unwrap();
        assert_eq!(json["phase"], "ended");
        assert_eq!(json["result"]["outcome"], "defeat");
        assert_eq!(json["result"]["elapsed_seconds"], 12);
    }
}
