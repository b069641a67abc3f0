//! Demo users shown on the home page.

use rand::{Rng, seq::IndexedRandom};
use tracing::{debug, info};

use crate::{
    dao::{
        game_store::GameStore,
        models::{NewUser, UserEntity},
    },
    dto::validation::parse_integer,
    error::ServiceError,
};

/// Names picked from when a random user is inserted.
pub const SAMPLE_NAMES: [&str; 12] = [
    "Alice", "Bob", "Charlie", "Diana", "Eve", "Frank", "Grace", "Heidi", "Ivan", "Judy",
    "Mallory", "Niaj",
];
const MIN_AGE: i64 = 18;
const MAX_AGE: i64 = 77;

pub async fn list_users(store: &dyn GameStore) -> Result<Vec<UserEntity>, ServiceError> {
    Ok(store.list_users().await?)
}

/// Insert the two fixed demo users and return the full list.
pub async fn seed_users(store: &dyn GameStore) -> Result<Vec<UserEntity>, ServiceError> {
    for (name, age) in [("Alice", 25), ("Bob", 30)] {
        store.insert_user(NewUser::new(name, age)).await?;
    }
    info!("demo users seeded");
    list_users(store).await
}

/// Insert a user with a sample name and an age in `18..=77`.
pub async fn add_random_user(store: &dyn GameStore) -> Result<Vec<UserEntity>, ServiceError> {
    let user = {
        let mut rng = rand::rng();
        let name = SAMPLE_NAMES.choose(&mut rng).copied().unwrap_or("Alice");
        NewUser::new(name, rng.random_range(MIN_AGE..=MAX_AGE))
    };

    let user = store.insert_user(user).await?;
    debug!(user_id = user.id, name = %user.name, "random user added");
    list_users(store).await
}

/// Delete the user named by the raw `id` query value.
///
/// A missing or non-integer id is rejected before storage is touched. Deleting
/// an id that does not exist is not an error.
pub async fn delete_user(
    store: &dyn GameStore,
    raw_id: Option<&str>,
) -> Result<Vec<UserEntity>, ServiceError> {
    let raw_id = raw_id
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| ServiceError::InvalidInput("missing id".into()))?;
    let id = parse_integer(raw_id).ok_or_else(|| ServiceError::InvalidInput("invalid id".into()))?;

    let deleted = store.delete_user(id).await?;
    debug!(user_id = id, deleted, "user delete requested");
    list_users(store).await
}
