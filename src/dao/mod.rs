//! Persistence: entities, the storage trait and its backends.

/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Tournament data storage and retrieval operations.
pub mod tournament_store;
/// Staged writes committed or discarded by the caller.
pub mod unit_of_work;
