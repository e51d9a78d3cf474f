use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::sse::{
        CardsHiddenEvent, RoundEndedEvent, RoundTickEvent, ScorePendingEvent, ScoreSettledEvent,
        ServerEvent, SystemStatus,
    },
    state::{SharedState, SseHub, board::RoundResult, timer::TimerReading},
};

/// Countdown refresh.
pub const EVENT_ROUND_TICK: &str = "round.tick";
/// Mismatched pair turned back.
pub const EVENT_CARDS_HIDDEN: &str = "round.cards_hidden";
/// Victory or defeat.
pub const EVENT_ROUND_ENDED: &str = "round.ended";
/// Score hand-off started.
pub const EVENT_SCORE_PENDING: &str = "score.pending";
/// Score hand-off finished.
pub const EVENT_SCORE_SETTLED: &str = "score.settled";
/// Degraded flag changed.
pub const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the countdown of a running round.
pub fn broadcast_round_tick(hub: &SseHub, round_id: Uuid, reading: &TimerReading) {
    let payload = RoundTickEvent {
        round_id,
        timer: reading.clone().into(),
    };
    match ServerEvent::json(Some(EVENT_ROUND_TICK.to_string()), &payload) {
        Ok(event) => hub.broadcast_tick(event.for_round(round_id)),
        Err(err) => warn!(error = %err, "failed to serialize round tick"),
    }
}

/// Broadcast that a mismatched pair went face down.
pub fn broadcast_cards_hidden(hub: &SseHub, round_id: Uuid, first: usize, second: usize) {
    let payload = CardsHiddenEvent {
        round_id,
        first,
        second,
    };
    send_public_event(hub, EVENT_CARDS_HIDDEN, Some(round_id), &payload);
}

/// Broadcast the end of a round.
pub fn broadcast_round_ended(hub: &SseHub, round_id: Uuid, result: RoundResult, submitting: bool) {
    let payload = RoundEndedEvent {
        round_id,
        outcome: result.outcome.into(),
        elapsed_seconds: result.elapsed_seconds,
        submitting,
    };
    send_public_event(hub, EVENT_ROUND_ENDED, Some(round_id), &payload);
}

/// Broadcast that a score is on its way to the leaderboard.
pub fn broadcast_score_pending(hub: &SseHub, round_id: Uuid, pseudonym: &str, time_seconds: u64) {
    let payload = ScorePendingEvent {
        round_id,
        pseudonym: pseudonym.to_owned(),
        time_seconds,
    };
    send_public_event(hub, EVENT_SCORE_PENDING, Some(round_id), &payload);
}

/// Broadcast that a score submission is over.
pub fn broadcast_score_settled(hub: &SseHub, round_id: Uuid, saved: bool) {
    let payload = ScoreSettledEvent { round_id, saved };
    send_public_event(hub, EVENT_SCORE_SETTLED, Some(round_id), &payload);
}

/// Broadcast the degraded flag.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_public_event(
        state.public_sse(),
        EVENT_SYSTEM_STATUS,
        None,
        &SystemStatus { degraded },
    );
}

fn send_public_event(
    hub: &SseHub,
    event: &str,
    round_id: Option<Uuid>,
    payload: &impl Serialize,
) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(mut event) => {
            event.round_id = round_id;
            hub.broadcast(event);
        }
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
