//! Hand-off of a won round's time to the leaderboard.
//!
//! Submissions are fire-and-forget: they run on their own task, failures are logged and
//! swallowed, and nothing is retried.

use std::sync::{Arc, Weak};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::{
    config::AppConfig,
    dto::score::SaveScoreForm,
    error::ServiceError,
    services::{score_service, sse_events},
    state::{AppState, SharedState},
};

/// Fields sent to the leaderboard when a round is won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSubmission {
    /// Pseudonym the round was played under.
    pub pseudonym: String,
    /// Frozen round time in whole seconds.
    pub elapsed_seconds: u64,
}

impl ScoreSubmission {
    /// Form fields exactly as `/save-score` expects them.
    pub fn to_form(&self) -> SaveScoreForm {
        SaveScoreForm {
            pseudonym: Some(self.pseudonym.clone()),
            time: Some(self.elapsed_seconds.to_string()),
        }
    }
}

/// Why a submission did not land.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("score rejected: {0}")]
    /// The fields failed validation.
    Rejected(ValidationErrors),
    #[error("score not persisted: {0}")]
    /// Storage refused or is missing.
    Persistence(String),
    #[error("application state is gone")]
    /// The application is shutting down.
    Shutdown,
    #[error("score endpoint unreachable: {0}")]
    /// The remote endpoint could not be reached.
    Transport(String),
    #[error("score endpoint answered {status}")]
    /// The remote endpoint answered with a non-success status.
    Status {
        /// HTTP status code.
        status: u16,
    },
}

/// Destination of score submissions.
pub trait ScoreSink: Send + Sync {
    /// Deliver one submission.
    fn submit(&self, submission: ScoreSubmission) -> BoxFuture<'static, Result<(), SubmissionError>>;
}

/// Saves scores in-process through the same validation as the HTTP endpoint.
pub struct StoreScoreSink {
    state: Weak<AppState>,
}

impl StoreScoreSink {
    /// Sink saving through `state`, a no-op once it is dropped.
    pub fn new(state: Weak<AppState>) -> Self {
        Self { state }
    }
}

impl ScoreSink for StoreScoreSink {
    fn submit(&self, submission: ScoreSubmission) -> BoxFuture<'static, Result<(), SubmissionError>> {
        let state = self.state.clone();
        Box::pin(async move {
            let state = state.upgrade().ok_or(SubmissionError::Shutdown)?;
            match score_service::save_score(&state, submission.to_form()).await {
                Ok(_) => Ok(()),
                Err(ServiceError::Validation(errors)) => Err(SubmissionError::Rejected(errors)),
                Err(other) => Err(SubmissionError::Persistence(other.to_string())),
            }
        })
    }
}

/// Posts scores as a url-encoded form to a remote `/save-score` endpoint.
#[cfg(feature = "score-client")]
pub struct HttpScoreSink {
    client: reqwest::Client,
    endpoint: String,
}

#[cfg(feature = "score-client")]
impl HttpScoreSink {
    /// Sink posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[cfg(feature = "score-client")]
impl ScoreSink for HttpScoreSink {
    fn submit(&self, submission: ScoreSubmission) -> BoxFuture<'static, Result<(), SubmissionError>> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        Box::pin(async move {
            let response = client
                .post(&endpoint)
                .form(&submission.to_form())
                .send()
                .await
                .map_err(|err| SubmissionError::Transport(err.to_string()))?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(SubmissionError::Status {
                    status: status.as_u16(),
                })
            }
        })
    }
}

/// Pick the sink matching the configuration.
pub fn sink_for(config: &AppConfig, state: Weak<AppState>) -> Arc<dyn ScoreSink> {
    match config.score_endpoint() {
        #[cfg(feature = "score-client")]
        Some(endpoint) => {
            info!(endpoint, "scores are posted to a remote endpoint");
            Arc::new(HttpScoreSink::new(endpoint))
        }
        #[cfg(not(feature = "score-client"))]
        Some(endpoint) => {
            warn!(
                endpoint,
                "score endpoint configured but the HTTP client is not built in; saving locally"
            );
            Arc::new(StoreScoreSink::new(state))
        }
        None => Arc::new(StoreScoreSink::new(state)),
    }
}

/// Publish `score.pending`, submit on a separate task, then publish `score.settled`.
pub fn spawn_submission(
    state: &SharedState,
    round_id: Uuid,
    submission: ScoreSubmission,
) -> JoinHandle<()> {
    spawn_submission_to(state, state.score_sink(), round_id, submission)
}

/// Same as [`spawn_submission`] with an explicit sink.
pub fn spawn_submission_to(
    state: &SharedState,
    sink: Arc<dyn ScoreSink>,
    round_id: Uuid,
    submission: ScoreSubmission,
) -> JoinHandle<()> {
    sse_events::broadcast_score_pending(
        state.public_sse(),
        round_id,
        &submission.pseudonym,
        submission.elapsed_seconds,
    );

    let state = Arc::downgrade(state);
    tokio::spawn(async move {
        let saved = match sink.submit(submission.clone()).await {
            Ok(()) => {
                info!(
                    %round_id,
                    pseudonym = %submission.pseudonym,
                    time_seconds = submission.elapsed_seconds,
                    "score submitted"
                );
                true
            }
            Err(err) => {
                warn!(%round_id, error = %err, "score submission failed");
                false
            }
        };

        if let Some(state) = state.upgrade() {
            sse_events::broadcast_score_settled(state.public_sse(), round_id, saved);
        }
    })
}
