use std::convert::Infallible;

use axum::{
    Router,
    extract::{Query, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{dto::sse::PublicStreamQuery, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/public",
    tag = "sse",
    params(PublicStreamQuery),
    responses((status = 200, description = "Public SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream countdown ticks, round results and score hand-offs to connected frontends.
pub async fn public_stream(
    State(state): State<SharedState>,
    Query(query): Query<PublicStreamQuery>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let subscription = sse_service::subscribe_public(&state, query.round_id);
    info!(round_id = ?query.round_id, "New public SSE connection");
    sse_service::to_sse_stream(subscription, sse_service::handshake(&state))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/public", get(public_stream))
}
