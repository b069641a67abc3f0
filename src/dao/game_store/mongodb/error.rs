use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server error code reported when a write violates a unique index.
const DUPLICATE_KEY_CODE: i32 = 11000;
const WRITE_CONFLICT_CODE: i32 = 112;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to allocate the next `{sequence}` identifier")]
    NextId {
        sequence: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("identifier sequence `{sequence}` returned no counter")]
    CounterMissing { sequence: &'static str },
    #[error("transaction failed during `{operation}`")]
    Transaction {
        operation: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("rank {rank} is already taken")]
    RankTaken { rank: i64 },
    #[error("submitted order does not match the stored games")]
    OrderMismatch,
    #[error("failed to list games")]
    ListGames {
        #[source]
        source: MongoError,
    },
    #[error("failed to save user")]
    SaveUser {
        #[source]
        source: MongoError,
    },
    #[error("failed to list users")]
    ListUsers {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete user `{id}`")]
    DeleteUser {
        id: i64,
        #[source]
        source: MongoError,
    },
}

/// Whether `err` means another transaction claimed the rank first: a unique
/// index violation, or a write conflict with a concurrent rank transaction.
pub fn is_rank_collision(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(command) => command.code == WRITE_CONFLICT_CODE,
        _ => false,
    }
}
