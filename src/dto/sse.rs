use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::dto::round::{OutcomeDto, TimerSnapshot};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE `event` field.
    pub event: Option<String>,
    /// JSON payload.
    pub data: String,
    /// Round the event is about, `None` for process-wide events.
    pub round_id: Option<Uuid>,
}

impl ServerEvent {
    /// Event with a preformatted data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self {
            event,
            data,
            round_id: None,
        }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self::new(event.into(), serde_json::to_string(payload)?))
    }

    /// Tag the event with the round it concerns.
    pub fn for_round(mut self, round_id: Uuid) -> Self {
        self.round_id = Some(round_id);
        self
    }

    /// Whether a subscriber following `filter` should receive this event.
    pub fn visible_to(&self, filter: Option<Uuid>) -> bool {
        match (filter, self.round_id) {
            (Some(wanted), Some(round_id)) => wanted == round_id,
            _ => true,
        }
    }
}

/// Query string of `/sse/public`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PublicStreamQuery {
    /// Only forward events of this round. Process-wide events are always forwarded.
    pub round_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// Whether storage is missing.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Countdown refresh of a running round.
pub struct RoundTickEvent {
    /// Round the countdown belongs to.
    pub round_id: Uuid,
    /// Countdown values.
    #[serde(flatten)]
    pub timer: TimerSnapshot,
}

#[derive(Debug, Serialize, ToSchema)]
/// A mismatched pair was turned face down again.
pub struct CardsHiddenEvent {
    /// Round identifier.
    pub round_id: Uuid,
    /// Slot revealed first.
    pub first: usize,
    /// Slot revealed second.
    pub second: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// A round reached its terminal state.
pub struct RoundEndedEvent {
    /// Round identifier.
    pub round_id: Uuid,
    /// Victory or defeat.
    pub outcome: OutcomeDto,
    /// Frozen elapsed time.
    pub elapsed_seconds: u64,
    /// Whether the time is being submitted to the leaderboard.
    pub submitting: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// A score submission started.
pub struct ScorePendingEvent {
    /// Round the time comes from.
    pub round_id: Uuid,
    /// Submitted pseudonym.
    pub pseudonym: String,
    /// Submitted time.
    pub time_seconds: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// A score submission finished, successfully or not.
pub struct ScoreSettledEvent {
    /// Round the time comes from.
    pub round_id: Uuid,
    /// Whether the score was stored.
    pub saved: bool,
}
