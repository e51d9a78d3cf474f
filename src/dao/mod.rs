/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Pokémon and score persistence backends.
pub mod store;
