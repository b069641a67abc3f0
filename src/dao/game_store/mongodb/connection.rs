use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::error::{MongoDaoError, MongoResult};

const MAX_PING_ATTEMPTS: u32 = 10;
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(250);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Build a client, wait until the server answers a ping and check that it can
/// run the transactions rank updates depend on.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    wait_for_ping(&database).await?;
    warn_without_replica_set(&database).await;

    Ok((client, database))
}

async fn wait_for_ping(database: &Database) -> MongoResult<()> {
    let mut attempts = 0;
    let mut delay = FIRST_RETRY_DELAY;

    loop {
        let Err(err) = database.run_command(doc! { "ping": 1 }).await else {
            return Ok(());
        };

        attempts += 1;
        if attempts >= MAX_PING_ATTEMPTS {
            return Err(MongoDaoError::InitialPing {
                attempts,
                source: err,
            });
        }
        debug!(attempts, error = %err, "MongoDB ping failed; retrying");
        sleep(delay).await;
        delay = (delay * 2).min(MAX_RETRY_DELAY);
    }
}

/// Standalone servers reject multi-document transactions.
async fn warn_without_replica_set(database: &Database) {
    match database.run_command(doc! { "hello": 1 }).await {
        Ok(reply) if reply.contains_key("setName") => {}
        Ok(_) => warn!(
            database = database.name(),
            "MongoDB is not a replica set; rank updates will fail"
        ),
        Err(err) => debug!(error = %err, "MongoDB hello command failed"),
    }
}
