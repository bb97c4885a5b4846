//! MongoDB backend, enabled by the `mongo-store` feature.

mod config;
mod connection;
mod error;
mod models;
/// [`TournamentStore`](super::TournamentStore) implementation over MongoDB collections.
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoTournamentStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::Duplicate { entity, key } => StorageError::Duplicate { entity, key },
            err => StorageError::unavailable(err.to_string(), err),
        }
    }
}
