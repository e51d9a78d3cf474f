use axum::{
    Form, Json, Router,
    extract::{Query, State, rejection::FormRejection},
    http::StatusCode,
    routing::{get, post},
};
use tracing::debug;

use crate::{
    dto::score::{SaveScoreForm, ScoreSummary, ScoresQuery},
    error::AppError,
    services::score_service,
    state::SharedState,
};

/// Routes handling the leaderboard.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/save-score", post(save_score))
        .route("/scores", get(list_scores))
}

/// Validate and store a completion time.
#[utoipa::path(
    post,
    path = "/save-score",
    tag = "scores",
    request_body(content = SaveScoreForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Score saved"),
        (status = 422, description = "Invalid fields, nothing saved"),
        (status = 500, description = "Score could not be persisted")
    )
)]
pub async fn save_score(
    State(state): State<SharedState>,
    form: Result<Form<SaveScoreForm>, FormRejection>,
) -> Result<StatusCode, AppError> {
    // An unreadable body is validated like an empty one so the client gets the field errors.
    let form = form
        .map(|Form(form)| form)
        .unwrap_or_else(|rejection| {
            debug!(error = %rejection, "unreadable score form");
            SaveScoreForm::default()
        });
    score_service::save_score(&state, form).await?;
    Ok(StatusCode::OK)
}

/// Best completion times, fastest first.
#[utoipa::path(
    get,
    path = "/scores",
    tag = "scores",
    params(ScoresQuery),
    responses(
        (status = 200, description = "Leaderboard", body = [ScoreSummary])
    )
)]
pub async fn list_scores(
    State(state): State<SharedState>,
    Query(query): Query<ScoresQuery>,
) -> Json<Vec<ScoreSummary>> {
    Json(score_service::best_scores(&state, query.limit).await)
}
