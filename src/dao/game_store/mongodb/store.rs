use std::{collections::BTreeSet, sync::Arc};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, ClientSession, Collection, Database,
    bson::doc,
    error::Error as MongoError,
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::warn;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_rank_collision},
    models::{CounterDocument, MongoGameDocument, MongoUserDocument, doc_id},
};
use crate::dao::{
    game_store::GameStore,
    models::{GameEntity, NewUser, UserEntity},
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const USER_COLLECTION_NAME: &str = "users";
const COUNTER_COLLECTION_NAME: &str = "counters";

#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

/// Map a failed write inside a rank transaction, surfacing unique index hits as rank conflicts.
fn write_error(operation: &'static str, rank: i64) -> impl FnOnce(MongoError) -> MongoDaoError {
    move |source| {
        if is_rank_collision(&source) {
            MongoDaoError::RankTaken { rank }
        } else {
            MongoDaoError::Transaction { operation, source }
        }
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"rank": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_rank_unique".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        self.games()
            .await
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "rank",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.database()
            .await
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn users(&self) -> Collection<MongoUserDocument> {
        self.database()
            .await
            .collection::<MongoUserDocument>(USER_COLLECTION_NAME)
    }

    async fn counters(&self) -> Collection<CounterDocument> {
        self.database()
            .await
            .collection::<CounterDocument>(COUNTER_COLLECTION_NAME)
    }

    /// Open a session with a started transaction.
    async fn begin(&self, operation: &'static str) -> MongoResult<ClientSession> {
        let client = {
            let guard = self.inner.state.read().await;
            guard.client.clone()
        };
        let mut session = client
            .start_session()
            .await
            .map_err(|source| MongoDaoError::Transaction { operation, source })?;
        session
            .start_transaction()
            .await
            .map_err(|source| MongoDaoError::Transaction { operation, source })?;
        Ok(session)
    }

    /// Commit on success, abort otherwise.
    async fn finish<T>(
        &self,
        mut session: ClientSession,
        operation: &'static str,
        outcome: MongoResult<T>,
    ) -> MongoResult<T> {
        match outcome {
            Ok(value) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|source| MongoDaoError::Transaction { operation, source })?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    warn!(operation, error = %abort_err, "failed to abort MongoDB transaction");
                }
                Err(err)
            }
        }
    }

    /// Allocate the next id of `sequence`. Runs outside rank transactions so
    /// concurrent inserts never conflict on the counter document.
    async fn next_id(&self, sequence: &'static str) -> MongoResult<i64> {
        let counter = self
            .counters()
            .await
            .find_one_and_update(doc! {"_id": sequence}, doc! {"$inc": {"seq": 1_i64}})
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::NextId { sequence, source })?;

        counter
            .map(|counter| counter.seq)
            .ok_or(MongoDaoError::CounterMissing { sequence })
    }

    async fn max_rank_in(&self, session: &mut ClientSession) -> MongoResult<i64> {
        let top = self
            .games()
            .await
            .find_one(doc! {})
            .sort(doc! {"rank": -1})
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Transaction {
                operation: "max_rank",
                source,
            })?;
        Ok(top.map(|game| game.rank).unwrap_or(0))
    }

    async fn game_ids_in(&self, session: &mut ClientSession) -> MongoResult<BTreeSet<i64>> {
        let ids = self
            .games()
            .await
            .distinct("_id", doc! {})
            .session(&mut *session)
            .await
            .map_err(|source| MongoDaoError::Transaction {
                operation: "game_ids",
                source,
            })?;
        Ok(ids.iter().filter_map(|id| id.as_i64()).collect())
    }

    async fn insert_game_in(
        &self,
        session: &mut ClientSession,
        game: GameEntity,
    ) -> MongoResult<GameEntity> {
        let rank = game.rank;
        let document: MongoGameDocument = game.clone().into();

        self.games()
            .await
            .insert_one(&document)
            .session(&mut *session)
            .await
            .map_err(write_error("insert_game", rank))?;
        Ok(game)
    }

    async fn append_in(
        &self,
        session: &mut ClientSession,
        game: GameEntity,
    ) -> MongoResult<GameEntity> {
        if game.rank != self.max_rank_in(session).await? + 1 {
            return Err(MongoDaoError::RankTaken { rank: game.rank });
        }
        self.insert_game_in(session, game).await
    }

    /// Shifted ranks pass through negative values first: the unique index is
    /// checked per document, so an in-place `$inc` would collide with the
    /// neighbour that has not moved yet.
    async fn shift_and_insert_in(
        &self,
        session: &mut ClientSession,
        game: GameEntity,
    ) -> MongoResult<GameEntity> {
        let rank = game.rank;
        let max = self.max_rank_in(session).await?;
        if rank < 1 || rank > max + 1 {
            return Err(MongoDaoError::RankTaken { rank });
        }

        let games = self.games().await;
        games
            .update_many(
                doc! {"rank": {"$gte": rank}},
                vec![doc! {"$set": {"rank": {"$subtract": [-1_i64, "$rank"]}}}],
            )
            .session(&mut *session)
            .await
            .map_err(write_error("stage_shift", rank))?;
        games
            .update_many(doc! {"rank": {"$lt": 0_i64}}, doc! {"$mul": {"rank": -1_i64}})
            .session(&mut *session)
            .await
            .map_err(write_error("apply_shift", rank))?;

        self.insert_game_in(session, game).await
    }

    async fn set_ranks_in(
        &self,
        session: &mut ClientSession,
        ordered_ids: &[i64],
    ) -> MongoResult<()> {
        let stored = self.game_ids_in(session).await?;
        let submitted: BTreeSet<i64> = ordered_ids.iter().copied().collect();
        if submitted.len() != ordered_ids.len() || submitted != stored {
            return Err(MongoDaoError::OrderMismatch);
        }

        let games = self.games().await;
        games
            .update_many(doc! {}, doc! {"$mul": {"rank": -1_i64}})
            .session(&mut *session)
            .await
            .map_err(write_error("stage_reorder", 0))?;

        for (index, id) in ordered_ids.iter().enumerate() {
            let rank = index as i64 + 1;
            games
                .update_one(doc_id(*id), doc! {"$set": {"rank": rank}})
                .session(&mut *session)
                .await
                .map_err(write_error("apply_reorder", rank))?;
        }
        Ok(())
    }

    async fn insert_game_append(&self, title: String, rank: i64) -> MongoResult<GameEntity> {
        const OPERATION: &str = "insert_game_append";
        let id = self.next_id(GAME_COLLECTION_NAME).await?;
        let mut session = self.begin(OPERATION).await?;
        let outcome = self
            .append_in(&mut session, GameEntity { id, title, rank })
            .await;
        self.finish(session, OPERATION, outcome).await
    }

    async fn insert_game_at_rank(&self, title: String, rank: i64) -> MongoResult<GameEntity> {
        const OPERATION: &str = "insert_game_at_rank";
        let id = self.next_id(GAME_COLLECTION_NAME).await?;
        let mut session = self.begin(OPERATION).await?;
        let outcome = self
            .shift_and_insert_in(&mut session, GameEntity { id, title, rank })
            .await;
        self.finish(session, OPERATION, outcome).await
    }

    async fn set_ranks(&self, ordered_ids: Vec<i64>) -> MongoResult<()> {
        const OPERATION: &str = "set_ranks";
        let mut session = self.begin(OPERATION).await?;
        let outcome = self.set_ranks_in(&mut session, &ordered_ids).await;
        self.finish(session, OPERATION, outcome).await
    }

    async fn list_games(&self) -> MongoResult<Vec<GameEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(doc! {})
            .sort(doc! {"rank": 1})
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn max_rank(&self) -> MongoResult<i64> {
        let top = self
            .games()
            .await
            .find_one(doc! {})
            .sort(doc! {"rank": -1})
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;
        Ok(top.map(|game| game.rank).unwrap_or(0))
    }

    async fn all_game_ids(&self) -> MongoResult<BTreeSet<i64>> {
        let ids = self
            .games()
            .await
            .distinct("_id", doc! {})
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;
        Ok(ids.iter().filter_map(|id| id.as_i64()).collect())
    }

    async fn insert_user(&self, user: NewUser) -> MongoResult<UserEntity> {
        let id = self.next_id(USER_COLLECTION_NAME).await?;
        let entity = UserEntity {
            id,
            name: user.name,
            age: user.age,
        };
        let document: MongoUserDocument = entity.clone().into();

        self.users()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveUser { source })?;
        Ok(entity)
    }

    async fn list_users(&self) -> MongoResult<Vec<UserEntity>> {
        let documents: Vec<MongoUserDocument> = self
            .users()
            .await
            .find(doc! {})
            .sort(doc! {"_id": -1})
            .await
            .map_err(|source| MongoDaoError::ListUsers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListUsers { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_user(&self, id: i64) -> MongoResult<bool> {
        let result = self
            .users()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteUser { id, source })?;
        Ok(result.deleted_count > 0)
    }
}

impl GameStore for MongoGameStore {
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games().await.map_err(Into::into) })
    }

    fn max_rank(&self) -> BoxFuture<'static, StorageResult<i64>> {
        let store = self.clone();
        Box::pin(async move { store.max_rank().await.map_err(Into::into) })
    }

    fn all_game_ids(&self) -> BoxFuture<'static, StorageResult<BTreeSet<i64>>> {
        let store = self.clone();
        Box::pin(async move { store.all_game_ids().await.map_err(Into::into) })
    }

    fn insert_game_append(
        &self,
        title: String,
        rank: i64,
    ) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_game_append(title, rank)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_game_at_rank(
        &self,
        title: String,
        rank: i64,
    ) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_game_at_rank(title, rank)
                .await
                .map_err(Into::into)
        })
    }

    fn set_ranks(&self, ordered_ids: Vec<i64>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.set_ranks(ordered_ids).await.map_err(Into::into) })
    }

    fn insert_user(&self, user: NewUser) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_user(user).await.map_err(Into::into) })
    }

    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_users().await.map_err(Into::into) })
    }

    fn delete_user(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_user(id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
