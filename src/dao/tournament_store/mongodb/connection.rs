//! First connection to the tournament database, retried while the server starts up.

use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::{info, warn};

use super::error::{MongoDaoError, MongoResult};

const MAX_PING_ATTEMPTS: u32 = 10;
const FIRST_DELAY: Duration = Duration::from_millis(250);
const MAX_DELAY: Duration = Duration::from_secs(5);

/// Doubling wait between ping attempts, capped at [`MAX_DELAY`].
#[derive(Debug)]
struct Backoff {
    failures: u32,
    delay: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            failures: 0,
            delay: FIRST_DELAY,
        }
    }

    /// Record a failed ping; `None` once every attempt is spent.
    fn after_failure(&mut self) -> Option<Duration> {
        self.failures += 1;
        if self.failures >= MAX_PING_ATTEMPTS {
            return None;
        }
        let wait = self.delay;
        self.delay = (self.delay * 2).min(MAX_DELAY);
        Some(wait)
    }
}

/// Build a client and wait until the tournament database answers a ping.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut backoff = Backoff::new();
    while let Err(source) = database.run_command(doc! { "ping": 1 }).await {
        let Some(wait) = backoff.after_failure() else {
            return Err(MongoDaoError::InitialPing {
                attempts: backoff.failures,
                source,
            });
        };
        warn!(
            database = database_name,
            failures = backoff.failures,
            retry_in_ms = wait.as_millis() as u64,
            error = %source,
            "tournament database not answering yet"
        );
        sleep(wait).await;
    }

    info!(
        database = database_name,
        attempts = backoff.failures + 1,
        "tournament database answered"
    );
    Ok((client, database))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_double_until_the_cap_then_give_up() {
        let mut backoff = Backoff::new();
        let waits: Vec<u64> = std::iter::from_fn(|| backoff.after_failure())
            .map(|wait| wait.as_millis() as u64)
            .collect();
        assert_eq!(
            waits,
            [250, 500, 1000, 2000, 4000, 5000, 5000, 5000, 5000]
        );
        assert_eq!(backoff.failures, MAX_PING_ATTEMPTS);
    }
}
