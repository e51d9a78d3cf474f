use std::sync::Weak;

use tracing::info;
use uuid::Uuid;

use crate::{
    services::{
        score_submission::{self, ScoreSubmission},
        sse_events,
    },
    state::{
        AppState,
        board::{Outcome, RoundResult},
        round::RoundObserver,
        timer::TimerReading,
    },
};

/// Bridges round notifications to the public SSE stream and the score sink.
pub struct RoundEvents {
    state: Weak<AppState>,
}

impl RoundEvents {
    /// Observer publishing through `state` while it is alive.
    pub fn new(state: Weak<AppState>) -> Self {
        Self { state }
    }
}

impl RoundObserver for RoundEvents {
    fn timer_ticked(&self, round_id: Uuid, reading: &TimerReading) {
        if let Some(state) = self.state.upgrade() {
            sse_events::broadcast_round_tick(state.public_sse(), round_id, reading);
        }
    }

    fn cards_hidden(&self, round_id: Uuid, first: usize, second: usize) {
        if let Some(state) = self.state.upgrade() {
            sse_events::broadcast_cards_hidden(state.public_sse(), round_id, first, second);
        }
    }

    fn round_ended(&self, round_id: Uuid, result: RoundResult, pseudonym: Option<&str>) {
        let Some(state) = self.state.upgrade() else {
            return;
        };

        let submission = match (result.outcome, pseudonym) {
            (Outcome::Victory, Some(pseudonym)) => Some(ScoreSubmission {
                pseudonym: pseudonym.to_owned(),
                elapsed_seconds: result.elapsed_seconds,
            }),
            (Outcome::Victory, None) => {
                info!(%round_id, "round won without a pseudonym; score not submitted");
                None
            }
            (Outcome::Defeat, _) => None,
        };

        sse_events::broadcast_round_ended(
            state.public_sse(),
            round_id,
            result,
            submission.is_some(),
        );
        if let Some(submission) = submission {
            score_submission::spawn_submission(&state, round_id, submission);
        }
    }
}
