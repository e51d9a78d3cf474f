use axum::Router;

use crate::state::SharedState;

/// Swagger UI.
pub mod docs;
/// `/healthcheck`.
pub mod health;
/// Round lifecycle endpoints.
pub mod rounds;
/// Leaderboard endpoints.
pub mod scores;
/// Event stream.
pub mod sse;

/// Compose all route trees and wire in the shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(sse::router())
        .merge(scores::router())
        .merge(rounds::router())
        .merge(docs::router())
        .with_state(state)
}
