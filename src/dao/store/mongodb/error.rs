use mongodb::error::{Error as MongoError, ErrorKind, TRANSIENT_TRANSACTION_ERROR, WriteFailure};
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Failures of the MongoDB backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection string did not parse.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// No ping succeeded during startup.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings tried before giving up.
        attempts: u32,
        /// Last driver error.
        #[source]
        source: MongoError,
    },
    /// A periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index creation failed at startup.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection name.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The unique email index rejected the insert.
    #[error("email `{email}` is already registered")]
    DuplicateEmail {
        /// The email already taken.
        email: String,
    },
    /// Inserting a user failed.
    #[error("failed to create user `{email}`")]
    CreateUser {
        /// Email of the user.
        email: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading a user failed.
    #[error("failed to load user `{email}`")]
    LoadUser {
        /// Email looked up.
        email: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The insert-and-flag transaction failed.
    #[error("failed to record attempt for user `{user_id}`")]
    RecordAttempt {
        /// Owner of the attempt.
        user_id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading attempts failed.
    #[error("failed to list attempts for user `{user_id}`")]
    ListAttempts {
        /// Owner of the attempts.
        user_id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A leaderboard aggregation failed.
    #[error("failed to load rankings")]
    LoadRankings {
        /// Driver error.
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    /// Whether the failure aborted a transaction that can safely be retried from scratch.
    pub fn is_transient_transaction(&self) -> bool {
        match self {
            MongoDaoError::RecordAttempt { source, .. } => {
                source.contains_label(TRANSIENT_TRANSACTION_ERROR)
            }
            _ => false,
        }
    }
}

/// Whether the write failed on a unique index.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}
