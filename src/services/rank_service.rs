//! Ranked list engine: the insertion and reorder policies.
//!
//! Both policies validate their raw input first (nothing reaches storage
//! until it passes) and then delegate to one transactional [`GameStore`]
//! call, returning the fresh ordered list on success.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::{
    dao::{game_store::GameStore, models::GameEntity},
    dto::validation::{
        FieldErrors, message_of, normalize_title, parse_game_id, parse_rank, validate_rank_bounds,
        validate_title,
    },
    error::{STALE_ORDER_MESSAGE, ServiceError},
};

/// Message returned when a reorder carries no ids at all.
pub const EMPTY_ORDER_MESSAGE: &str = "No games were submitted.";

/// Every game, ascending by rank.
pub async fn list_games(store: &dyn GameStore) -> Result<Vec<GameEntity>, ServiceError> {
    Ok(store.list_games().await?)
}

/// Insert a game at a caller-chosen rank.
///
/// Title and rank problems are reported together. A rank inside the current
/// list shifts every game from that rank down by one; `max + 1` appends.
pub async fn add_game(
    store: &dyn GameStore,
    title_raw: &str,
    rank_raw: &str,
) -> Result<Vec<GameEntity>, ServiceError> {
    let title = normalize_title(title_raw);
    let mut errors = FieldErrors::new();
    errors.check("title", validate_title(&title));
    let rank = errors.check("rank", parse_rank(rank_raw));

    let max_rank = store.max_rank().await?;
    let rank = rank.and_then(|rank| {
        errors
            .check("rank", validate_rank_bounds(rank, max_rank))
            .map(|()| rank)
    });

    let Some(rank) = rank.filter(|_| errors.is_empty()) else {
        debug!(?errors, "rejected new game");
        return Err(ServiceError::Validation(errors));
    };

    let inserted = if rank <= max_rank {
        store.insert_game_at_rank(title, rank).await
    } else {
        store.insert_game_append(title, max_rank + 1).await
    };
    let game = inserted.inspect_err(|err| warn!(rank, error = %err, "failed to insert game"))?;
    info!(game_id = game.id, rank = game.rank, "game added");

    list_games(store).await
}

/// Apply a complete top-to-bottom order of game ids.
///
/// The submission must be exactly a permutation of the stored ids. The store
/// re-checks that inside its transaction, so a list changed in between is
/// reported as a conflict rather than half-applied.
pub async fn reorder_games(
    store: &dyn GameStore,
    raw_ids: Vec<String>,
) -> Result<Vec<GameEntity>, ServiceError> {
    if raw_ids.is_empty() {
        return Err(ServiceError::InvalidInput(EMPTY_ORDER_MESSAGE.into()));
    }

    let ids = raw_ids
        .iter()
        .map(|raw| parse_game_id(raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ServiceError::InvalidInput(message_of(err)))?;

    let stored = store.all_game_ids().await?;
    if !is_permutation_of(&ids, &stored) {
        debug!(submitted = ids.len(), stored = stored.len(), "stale reorder rejected");
        return Err(ServiceError::Conflict(STALE_ORDER_MESSAGE.into()));
    }

    let count = ids.len();
    store
        .set_ranks(ids)
        .await
        .inspect_err(|err| warn!(error = %err, "failed to reorder games"))?;
    info!(count, "games reordered");

    list_games(store).await
}

/// Same size, no duplicates, same members.
fn is_permutation_of(ids: &[i64], stored: &BTreeSet<i64>) -> bool {
    ids.len() == stored.len() && ids.iter().copied().collect::<BTreeSet<_>>() == *stored
}
