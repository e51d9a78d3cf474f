/// Health check body.
pub mod health;
/// Round requests and snapshots.
pub mod round;
/// Leaderboard forms and entries.
pub mod score;
/// Server-sent event payloads.
pub mod sse;
/// Field validation of submitted scores.
pub mod validation;
