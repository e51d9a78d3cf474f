use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the Pokémory back-end.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::scores::save_score,
        crate::routes::scores::list_scores,
        crate::routes::rounds::create_round,
        crate::routes::rounds::get_round,
        crate::routes::rounds::start_round,
        crate::routes::rounds::click_card,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::score::SaveScoreForm,
            crate::dto::score::ScoreSummary,
            crate::state::interval::Interval,
            crate::dto::round::CreateRoundRequest,
            crate::dto::round::RoundSnapshot,
            crate::dto::round::CardSnapshot,
            crate::dto::round::ClickResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::RoundTickEvent,
            crate::dto::sse::CardsHiddenEvent,
            crate::dto::sse::RoundEndedEvent,
            crate::dto::sse::ScorePendingEvent,
            crate::dto::sse::ScoreSettledEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "scores", description = "Leaderboard submission and listing"),
        (name = "rounds", description = "Memory rounds: deal, start and click"),
    )
)]
pub struct ApiDoc;
