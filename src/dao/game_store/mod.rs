pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::collections::BTreeSet;

use crate::dao::models::{GameEntity, NewUser, UserEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for the ranked games table and demo users.
///
/// Every mutating game operation is a single transaction: it either commits
/// completely or leaves the table exactly as it was. Ranks stay a dense
/// permutation of `1..=N` across all of them.
pub trait GameStore: Send + Sync {
    /// All games ordered by ascending rank.
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Highest rank currently stored, `0` when the table is empty.
    fn max_rank(&self) -> BoxFuture<'static, StorageResult<i64>>;
    /// Identifiers of every stored game.
    fn all_game_ids(&self) -> BoxFuture<'static, StorageResult<BTreeSet<i64>>>;
    /// Append a game at `rank`, which must be the current maximum plus one.
    fn insert_game_append(
        &self,
        title: String,
        rank: i64,
    ) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Shift every game ranked `>= rank` down by one and insert the new game at `rank`.
    fn insert_game_at_rank(
        &self,
        title: String,
        rank: i64,
    ) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Assign `rank = position + 1` to each id, re-checking the id set in the same transaction.
    fn set_ranks(&self, ordered_ids: Vec<i64>) -> BoxFuture<'static, StorageResult<()>>;

    fn insert_user(&self, user: NewUser) -> BoxFuture<'static, StorageResult<UserEntity>>;
    /// Users, newest first.
    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>>;
    /// Remove a user, reporting whether a row was deleted.
    fn delete_user(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
