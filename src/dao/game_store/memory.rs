//! In-process storage backend used for local runs and tests.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    game_store::GameStore,
    models::{GameEntity, NewUser, UserEntity, first_rank_gap},
    storage::{StorageError, StorageResult},
};

/// Games table guarded by a single lock so each logical operation is one transaction.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    games: RwLock<GameTable>,
    users: DashMap<i64, UserEntity>,
    last_user_id: AtomicI64,
}

/// Rows kept sorted by rank.
#[derive(Debug, Clone, Default)]
struct GameTable {
    rows: Vec<GameEntity>,
    last_id: i64,
}

impl GameTable {
    fn max_rank(&self) -> i64 {
        self.rows.last().map(|game| game.rank).unwrap_or(0)
    }

    fn push(&mut self, title: String, rank: i64) -> GameEntity {
        self.last_id += 1;
        let game = GameEntity {
            id: self.last_id,
            title,
            rank,
        };
        self.rows.push(game.clone());
        self.rows.sort_by_key(|game| game.rank);
        game
    }

    /// Unique-rank constraint: ranks must read `1, 2, ..., N` once sorted.
    fn check_ranks(&self) -> StorageResult<()> {
        match first_rank_gap(&self.rows) {
            Some(game) => Err(StorageError::RankConflict { rank: game.rank }),
            None => Ok(()),
        }
    }
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `mutate` against a staged copy of the table and swap it in only when
    /// the rank constraint still holds.
    async fn transact<T>(
        &self,
        mutate: impl FnOnce(&mut GameTable) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut table = self.inner.games.write().await;
        let mut staged = table.clone();
        let value = mutate(&mut staged)?;
        staged.check_ranks()?;
        *table = staged;
        Ok(value)
    }

    async fn list_games(&self) -> Vec<GameEntity> {
        self.inner.games.read().await.rows.clone()
    }

    async fn max_rank(&self) -> i64 {
        self.inner.games.read().await.max_rank()
    }

    async fn all_game_ids(&self) -> BTreeSet<i64> {
        let table = self.inner.games.read().await;
        table.rows.iter().map(|game| game.id).collect()
    }

    async fn insert_game_append(&self, title: String, rank: i64) -> StorageResult<GameEntity> {
        self.transact(|table| {
            if rank != table.max_rank() + 1 {
                return Err(StorageError::RankConflict { rank });
            }
            Ok(table.push(title, rank))
        })
        .await
    }

    async fn insert_game_at_rank(&self, title: String, rank: i64) -> StorageResult<GameEntity> {
        self.transact(|table| {
            if rank < 1 || rank > table.max_rank() + 1 {
                return Err(StorageError::RankConflict { rank });
            }
            for game in table.rows.iter_mut().filter(|game| game.rank >= rank) {
                game.rank += 1;
            }
            Ok(table.push(title, rank))
        })
        .await
    }

    async fn set_ranks(&self, ordered_ids: Vec<i64>) -> StorageResult<()> {
        self.transact(|table| {
            let positions: HashMap<i64, i64> = ordered_ids
                .iter()
                .enumerate()
                .map(|(index, id)| (*id, index as i64 + 1))
                .collect();
            if positions.len() != ordered_ids.len() || positions.len() != table.rows.len() {
                return Err(StorageError::OrderMismatch);
            }
            for game in table.rows.iter_mut() {
                game.rank = *positions
                    .get(&game.id)
                    .ok_or(StorageError::OrderMismatch)?;
            }
            table.rows.sort_by_key(|game| game.rank);
            Ok(())
        })
        .await
    }

    fn insert_user(&self, user: NewUser) -> UserEntity {
        let id = self.inner.last_user_id.fetch_add(1, Ordering::SeqCst) + 1;
        let entity = UserEntity {
            id,
            name: user.name,
            age: user.age,
        };
        self.inner.users.insert(id, entity.clone());
        entity
    }

    fn list_users(&self) -> Vec<UserEntity> {
        let mut users: Vec<UserEntity> = self
            .inner
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by(|a, b| b.id.cmp(&a.id));
        users
    }
}

impl GameStore for MemoryGameStore {
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_games().await) })
    }

    fn max_rank(&self) -> BoxFuture<'static, StorageResult<i64>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.max_rank().await) })
    }

    fn all_game_ids(&self) -> BoxFuture<'static, StorageResult<BTreeSet<i64>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.all_game_ids().await) })
    }

    fn insert_game_append(
        &self,
        title: String,
        rank: i64,
    ) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game_append(title, rank).await })
    }

    fn insert_game_at_rank(
        &self,
        title: String,
        rank: i64,
    ) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game_at_rank(title, rank).await })
    }

    fn set_ranks(&self, ordered_ids: Vec<i64>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.set_ranks(ordered_ids).await })
    }

    fn insert_user(&self, user: NewUser) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.insert_user(user)) })
    }

    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_users()) })
    }

    fn delete_user(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.users.remove(&id).is_some()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(games: &[GameEntity]) -> Vec<(i64, &str)> {
        games
            .iter()
            .map(|game| (game.rank, game.title.as_str()))
            .collect()
    }

    async fn seeded(titles: &[&str]) -> MemoryGameStore {
        let store = MemoryGameStore::new();
        for (index, title) in titles.iter().enumerate() {
            GameStore::insert_game_append(&store, (*title).into(), index as i64 + 1)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn empty_store_reports_zero_max_rank() {
        let store = MemoryGameStore::new();
        assert_eq!(GameStore::max_rank(&store).await.unwrap(), 0);
        assert!(GameStore::list_games(&store).await.unwrap().is_empty());
        assert!(GameStore::all_game_ids(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_at_rank_shifts_following_games() {
        let store = seeded(&["A", "B", "C"]).await;
        let inserted = GameStore::insert_game_at_rank(&store, "X".into(), 2)
            .await
            .unwrap();
        assert_eq!(inserted.rank, 2);

        let games = GameStore::list_games(&store).await.unwrap();
        assert_eq!(titles(&games), vec![(1, "A"), (2, "X"), (3, "B"), (4, "C")]);
    }

    #[tokio::test]
    async fn ids_are_unique_and_stable_across_shifts() {
        let store = seeded(&["A", "B"]).await;
        let before = GameStore::all_game_ids(&store).await.unwrap();
        let inserted = GameStore::insert_game_at_rank(&store, "C".into(), 1)
            .await
            .unwrap();

        let after = GameStore::all_game_ids(&store).await.unwrap();
        assert!(!before.contains(&inserted.id));
        assert_eq!(after.len(), 3);
        assert!(before.is_subset(&after));
    }

    #[tokio::test]
    async fn append_requires_next_free_rank() {
        let store = seeded(&["A"]).await;
        let err = GameStore::insert_game_append(&store, "B".into(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::RankConflict { rank: 1 }));

        let err = GameStore::insert_game_append(&store, "B".into(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::RankConflict { rank: 3 }));
        assert_eq!(GameStore::list_games(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_beyond_append_slot_leaves_table_untouched() {
        let store = seeded(&["A", "B"]).await;
        let err = GameStore::insert_game_at_rank(&store, "Z".into(), 4)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::RankConflict { rank: 4 }));

        let games = GameStore::list_games(&store).await.unwrap();
        assert_eq!(titles(&games), vec![(1, "A"), (2, "B")]);
    }

    #[tokio::test]
    async fn set_ranks_follows_submitted_order() {
        let store = seeded(&["A", "B", "C"]).await;
        let games = GameStore::list_games(&store).await.unwrap();
        let order = vec![games[2].id, games[0].id, games[1].id];

        GameStore::set_ranks(&store, order).await.unwrap();

        let games = GameStore::list_games(&store).await.unwrap();
        assert_eq!(titles(&games), vec![(1, "C"), (2, "A"), (3, "B")]);
    }

    #[tokio::test]
    async fn set_ranks_with_unknown_or_duplicate_ids_is_rejected_atomically() {
        let store = seeded(&["A", "B"]).await;
        let games = GameStore::list_games(&store).await.unwrap();

        for order in [
            vec![games[1].id, 999],
            vec![games[1].id, games[1].id],
            vec![games[1].id],
            vec![games[1].id, games[0].id, 999],
        ] {
            let err = GameStore::set_ranks(&store, order).await.unwrap_err();
            assert!(matches!(err, StorageError::OrderMismatch));
        }

        let after = GameStore::list_games(&store).await.unwrap();
        assert_eq!(after, games);
    }

    #[tokio::test]
    async fn concurrent_appends_to_the_same_rank_admit_exactly_one() {
        let store = MemoryGameStore::new();
        let first = GameStore::insert_game_append(&store, "Chess".into(), 1);
        let second = GameStore::insert_game_append(&store, "Go".into(), 1);

        let (first, second) = tokio::join!(first, second);
        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| matches!(
            r,
            Err(StorageError::RankConflict { rank: 1 })
        )));

        let games = GameStore::list_games(&store).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].rank, 1);
    }

    #[tokio::test]
    async fn users_are_listed_newest_first() {
        let store = MemoryGameStore::new();
        let alice = GameStore::insert_user(&store, NewUser::new("Alice", 25))
            .await
            .unwrap();
        let bob = GameStore::insert_user(&store, NewUser::new("Bob", 30))
            .await
            .unwrap();

        let users = GameStore::list_users(&store).await.unwrap();
        assert_eq!(users, vec![bob.clone(), alice]);

        assert!(GameStore::delete_user(&store, bob.id).await.unwrap());
        assert!(!GameStore::delete_user(&store, bob.id).await.unwrap());
        assert_eq!(GameStore::list_users(&store).await.unwrap().len(), 1);
    }
}
