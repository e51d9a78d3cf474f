/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Bridge from round notifications to SSE and score submission.
pub mod round_events;
/// Round lifecycle: dealing, starting, clicking and eviction.
pub mod round_service;
/// Leaderboard validation, persistence and listing.
pub mod score_service;
/// Fire-and-forget submission of won rounds.
pub mod score_submission;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
