use std::{collections::HashMap, sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{DateTime, doc},
    error::Error as MongoError,
    options::IndexOptions,
};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        MongoAttemptDocument, MongoTotalRow, MongoUserDocument, doc_id, uuid_as_bson,
        uuid_from_bson,
    },
};
use crate::dao::{
    models::{
        AttemptEntity, NewAttemptEntity, RecordedAttempt, UserBestEntity, UserEntity,
        UserTotalEntity, beats_best,
    },
    storage::StorageResult,
    store::PlankStore,
};

const USER_COLLECTION_NAME: &str = "users";
const ATTEMPT_COLLECTION_NAME: &str = "attempts";
const MAX_TRANSACTION_RETRIES: u32 = 5;

/// MongoDB-backed store. Recording attempts requires a replica set for transactions.
#[derive(Clone)]
pub struct MongoPlankStore {
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
        let database = self.state.read().await.database.clone();
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

impl MongoPlankStore {
    /// Connect to MongoDB and make sure the indexes the queries rely on exist.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let store = Self {
            inner: Arc::new(MongoInner {
                state: RwLock::new(MongoState { client, database }),
                config,
            }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let indexes: [(&'static str, &'static str, IndexModel); 4] = [
            (
                USER_COLLECTION_NAME,
                "email",
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(
                        IndexOptions::builder()
                            .name(Some("user_email_idx".to_owned()))
                            .unique(Some(true))
                            .build(),
                    )
                    .build(),
            ),
            (
                USER_COLLECTION_NAME,
                "created_at",
                IndexModel::builder()
                    .keys(doc! { "created_at": 1 })
                    .options(
                        IndexOptions::builder()
                            .name(Some("user_created_idx".to_owned()))
                            .build(),
                    )
                    .build(),
            ),
            (
                ATTEMPT_COLLECTION_NAME,
                "user_id,attempted_at",
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "attempted_at": -1 })
                    .options(
                        IndexOptions::builder()
                            .name(Some("attempt_user_date_idx".to_owned()))
                            .build(),
                    )
                    .build(),
            ),
            (
                ATTEMPT_COLLECTION_NAME,
                "user_id,duration_seconds",
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "duration_seconds": -1 })
                    .options(
                        IndexOptions::builder()
                            .name(Some("attempt_user_duration_idx".to_owned()))
                            .build(),
                    )
                    .build(),
            ),
        ];

        let database = self.database().await;
        for (collection, index, model) in indexes {
            database
                .collection::<mongodb::bson::Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }
        Ok(())
    }

    async fn database(&self) -> Database {
        self.inner.state.read().await.database.clone()
    }

    async fn client(&self) -> Client {
        self.inner.state.read().await.client.clone()
    }

    async fn users(&self) -> Collection<MongoUserDocument> {
        self.database()
            .await
            .collection::<MongoUserDocument>(USER_COLLECTION_NAME)
    }

    async fn attempts(&self) -> Collection<MongoAttemptDocument> {
        self.database()
            .await
            .collection::<MongoAttemptDocument>(ATTEMPT_COLLECTION_NAME)
    }

    async fn create_user(&self, user: UserEntity) -> MongoResult<()> {
        let email = user.email.clone();
        let document: MongoUserDocument = user.into();
        match self.users().await.insert_one(&document).await {
            Ok(_) => Ok(()),
            Err(source) if is_duplicate_key(&source) => Err(MongoDaoError::DuplicateEmail { email }),
            Err(source) => Err(MongoDaoError::CreateUser { email, source }),
        }
    }

    async fn find_user_by_email(&self, email: String) -> MongoResult<Option<UserEntity>> {
        let document = self
            .users()
            .await
            .find_one(doc! { "email": &email })
            .await
            .map_err(|source| MongoDaoError::LoadUser { email, source })?;
        Ok(document.map(Into::into))
    }

    async fn record_attempt(&self, new: NewAttemptEntity) -> MongoResult<RecordedAttempt> {
        let mut retries = 0;
        loop {
            match self.record_attempt_once(&new).await {
                Err(err) if err.is_transient_transaction() && retries < MAX_TRANSACTION_RETRIES => {
                    retries += 1;
                    debug!(user_id = %new.user_id, retries, "attempt transaction conflicted; retrying");
                }
                other => return other,
            }
        }
    }

    /// Single transactional pass: bump the user revision, compare against the stored
    /// maximum, move the personal-best flag and insert the attempt.
    async fn record_attempt_once(&self, new: &NewAttemptEntity) -> MongoResult<RecordedAttempt> {
        let user_id = new.user_id;
        let wrap = move |source: MongoError| MongoDaoError::RecordAttempt { user_id, source };
        let owner = uuid_as_bson(user_id);

        let users = self.users().await;
        let attempts = self.attempts().await;
        let mut session = self.client().await.start_session().await.map_err(wrap)?;
        session.start_transaction().await.map_err(wrap)?;

        users
            .update_one(doc_id(user_id), doc! { "$inc": { "attempt_revision": 1_i64 } })
            .session(&mut session)
            .await
            .map_err(wrap)?;

        let current_best = attempts
            .find_one(doc! { "user_id": owner })
            .sort(doc! { "duration_seconds": -1 })
            .session(&mut session)
            .await
            .map_err(wrap)?
            .and_then(|best| u32::try_from(best.duration_seconds).ok());
        let is_personal_best = beats_best(current_best, new.duration_seconds);

        let mut superseded = None;
        if is_personal_best {
            superseded = attempts
                .find_one_and_update(
                    doc! { "user_id": owner, "is_personal_best": true },
                    doc! { "$set": { "is_personal_best": false } },
                )
                .session(&mut session)
                .await
                .map_err(wrap)?
                .map(|previous| uuid_from_bson(previous.id));
        }

        let attempt = AttemptEntity {
            id: Uuid::new_v4(),
            user_id,
            duration_seconds: new.duration_seconds,
            attempted_at: new.attempted_at,
            is_personal_best,
        };
        attempts
            .insert_one(MongoAttemptDocument::from(attempt.clone()))
            .session(&mut session)
            .await
            .map_err(wrap)?;

        session.commit_transaction().await.map_err(wrap)?;

        Ok(RecordedAttempt {
            attempt,
            superseded,
        })
    }

    async fn list_attempts(&self, user_id: Uuid) -> MongoResult<Vec<AttemptEntity>> {
        let wrap = move |source: MongoError| MongoDaoError::ListAttempts { user_id, source };
        let documents: Vec<MongoAttemptDocument> = self
            .attempts()
            .await
            .find(doc! { "user_id": uuid_as_bson(user_id) })
            .sort(doc! { "attempted_at": -1 })
            .await
            .map_err(wrap)?
            .try_collect()
            .await
            .map_err(wrap)?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn users_by_registration(&self) -> MongoResult<Vec<MongoUserDocument>> {
        let wrap = |source| MongoDaoError::LoadRankings { source };
        self.users()
            .await
            .find(doc! {})
            .sort(doc! { "created_at": 1, "_id": 1 })
            .await
            .map_err(wrap)?
            .try_collect()
            .await
            .map_err(wrap)
    }

    async fn best_attempts(&self) -> MongoResult<Vec<UserBestEntity>> {
        let wrap = |source| MongoDaoError::LoadRankings { source };
        let flagged: Vec<MongoAttemptDocument> = self
            .attempts()
            .await
            .find(doc! { "is_personal_best": true })
            .await
            .map_err(wrap)?
            .try_collect()
            .await
            .map_err(wrap)?;

        let mut by_user: HashMap<Uuid, AttemptEntity> = HashMap::with_capacity(flagged.len());
        for document in flagged {
            let attempt: AttemptEntity = document.into();
            if let Some(previous) = by_user.insert(attempt.user_id, attempt) {
                warn!(user_id = %previous.user_id, "several attempts flagged as personal best");
            }
        }

        let users = self.users_by_registration().await?;
        Ok(users
            .into_iter()
            .filter_map(|user| {
                let user: UserEntity = user.into();
                by_user.remove(&user.id).map(|best| UserBestEntity {
                    user_id: user.id,
                    display_name: user.display_name,
                    duration_seconds: best.duration_seconds,
                    attempted_at: best.attempted_at,
                })
            })
            .collect())
    }

    async fn total_durations(
        &self,
        from: SystemTime,
        until: SystemTime,
    ) -> MongoResult<Vec<UserTotalEntity>> {
        let wrap = |source| MongoDaoError::LoadRankings { source };
        let pipeline = [
            doc! { "$match": { "attempted_at": {
                "$gte": DateTime::from_system_time(from),
                "$lt": DateTime::from_system_time(until),
            } } },
            doc! { "$group": {
                "_id": "$user_id",
                "total_seconds": { "$sum": { "$toLong": "$duration_seconds" } },
            } },
        ];
        let rows: Vec<MongoTotalRow> = self
            .attempts()
            .await
            .aggregate(pipeline)
            .with_type::<MongoTotalRow>()
            .await
            .map_err(wrap)?
            .try_collect()
            .await
            .map_err(wrap)?;

        let mut totals: HashMap<Uuid, u64> = rows
            .into_iter()
            .map(|row| {
                (
                    uuid_from_bson(row.user_id),
                    u64::try_from(row.total_seconds).unwrap_or_default(),
                )
            })
            .collect();

        let users = self.users_by_registration().await?;
        Ok(users
            .into_iter()
            .filter_map(|user| {
                let user: UserEntity = user.into();
                totals.remove(&user.id).map(|total_seconds| UserTotalEntity {
                    user_id: user.id,
                    display_name: user.display_name,
                    total_seconds,
                })
            })
            .collect())
    }
}

impl PlankStore for MongoPlankStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    fn create_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.create_user(user).await.map_err(Into::into) })
    }

    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_user_by_email(email).await.map_err(Into::into) })
    }

    fn record_attempt(
        &self,
        attempt: NewAttemptEntity,
    ) -> BoxFuture<'static, StorageResult<RecordedAttempt>> {
        let store = self.clone();
        Box::pin(async move { store.record_attempt(attempt).await.map_err(Into::into) })
    }

    fn list_attempts(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<AttemptEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_attempts(user_id).await.map_err(Into::into) })
    }

    fn best_attempts(&self) -> BoxFuture<'static, StorageResult<Vec<UserBestEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.best_attempts().await.map_err(Into::into) })
    }

    fn total_durations(
        &self,
        from: SystemTime,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<UserTotalEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .total_durations(from, until)
                .await
                .map_err(Into::into)
        })
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
