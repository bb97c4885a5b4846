//! Failures of the MongoDB backend before they are folded into `StorageError`.

use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;
use uuid::Uuid;

/// Result alias of the MongoDB backend.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Errors raised while talking to MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// A required environment variable is unset.
    #[error("environment variable `{var}` is not set")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// The connection string cannot be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Rejected connection string.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver refused the options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The database never answered during startup.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings tried before giving up.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A periodic ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An index could not be created.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection involved.
        collection: &'static str,
        /// Indexed field.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A write hit a unique index.
    #[error("{entity} `{key}` already exists")]
    Duplicate {
        /// Kind of record.
        entity: &'static str,
        /// Conflicting unique value.
        key: String,
    },
    /// A write failed.
    #[error("failed to write `{id}` into `{collection}`")]
    Save {
        /// Collection involved.
        collection: &'static str,
        /// Document identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A single-document read failed.
    #[error("failed to load `{id}` from `{collection}`")]
    Load {
        /// Collection involved.
        collection: &'static str,
        /// Document identifier.
        id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A listing failed.
    #[error("failed to list `{collection}`")]
    List {
        /// Collection involved.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A delete failed.
    #[error("failed to delete `{id}` from `{collection}`")]
    Delete {
        /// Collection involved.
        collection: &'static str,
        /// Document identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The insertion counter could not be advanced.
    #[error("failed to advance counter `{counter}`")]
    Sequence {
        /// Counter name.
        counter: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A stored document does not map back to an entity.
    #[error("document `{id}` in `{collection}` is invalid: {reason}")]
    Decode {
        /// Collection involved.
        collection: &'static str,
        /// Document identifier.
        id: String,
        /// Why decoding failed.
        reason: String,
    },
}

/// Whether a write was rejected by a unique index.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(failure)) => {
            failure.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}
