//! Connection settings of the MongoDB backend, read from the environment.

use std::env;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const URI_ENV: &str = "MONGO_URI";
const DATABASE_ENV: &str = "MONGO_DB";
/// Database used when `MONGO_DB` is unset or blank.
const DEFAULT_DATABASE: &str = "tournament";
/// Reported to the server unless the connection string names the application itself.
const APP_NAME: &str = "tournament-back";

/// Parsed driver options plus the database holding the tournament collections.
#[derive(Clone)]
pub struct MongoConfig {
    /// Options parsed from the connection string.
    pub options: ClientOptions,
    /// Database holding teams, matches, goals and access records.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse `uri`; a missing or blank `database` falls back to `tournament`.
    pub async fn from_uri(uri: &str, database: Option<&str>) -> MongoResult<Self> {
        let database_name = database
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DATABASE)
            .to_owned();
        let mut options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;
        options.app_name.get_or_insert_with(|| APP_NAME.to_owned());

        Ok(Self {
            options,
            database_name,
        })
    }

    /// Read `MONGO_URI` (required) and `MONGO_DB` (optional).
    pub async fn from_env() -> MongoResult<Self> {
        let uri = env::var(URI_ENV).map_err(|_| MongoDaoError::MissingEnvVar { var: URI_ENV })?;
        let database = env::var(DATABASE_ENV).ok();
        Self::from_uri(&uri, database.as_deref()).await
    }
}
