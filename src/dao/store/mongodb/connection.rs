//! Opening a MongoDB client and waiting for the server to answer.

use std::time::Duration;

use mongodb::{Client, Database, bson::doc};
use tokio::time::sleep;
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

/// How long [`open`] keeps pinging a server that is still starting up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectBackoff {
    /// Pings sent before giving up, at least one.
    pub attempts: u32,
    /// Wait after the first failed ping.
    pub initial: Duration,
    /// Upper bound of the doubling wait.
    pub max: Duration,
}

impl Default for ConnectBackoff {
    fn default() -> Self {
        Self {
            attempts: 10,
            initial: Duration::from_millis(250),
            max: Duration::from_secs(5),
        }
    }
}

impl ConnectBackoff {
    /// Waits between consecutive pings; one fewer than the number of attempts.
    fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let max = self.max;
        let waits = self.attempts.saturating_sub(1) as usize;
        std::iter::successors(Some(self.initial.min(max)), move |delay| Some((*delay * 2).min(max)))
            .take(waits)
    }
}

/// Build the client for `config` and return once the database answers a ping.
pub async fn open(config: &MongoConfig) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut delays = config.backoff.delays();
    let mut attempt = 0;
    loop {
        attempt += 1;
        let Err(source) = database.run_command(doc! { "ping": 1 }).await else {
            return Ok((client, database));
        };

        let Some(delay) = delays.next() else {
            return Err(MongoDaoError::InitialPing {
                database: config.database_name.clone(),
                attempts: attempt,
                source,
            });
        };
        debug!(
            attempt,
            database = %config.database_name,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "MongoDB not answering yet"
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_up_to_the_cap() {
        let backoff = ConnectBackoff {
            attempts: 6,
            initial: Duration::from_millis(500),
            max: Duration::from_secs(3),
        };
        let delays: Vec<_> = backoff.delays().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![500, 1_000, 2_000, 3_000, 3_000]);
    }

    #[test]
    fn single_attempt_never_waits() {
        for attempts in [0, 1] {
            let backoff = ConnectBackoff {
                attempts,
                ..ConnectBackoff::default()
            };
            assert_eq!(backoff.delays().count(), 0);
        }
    }
}
