use mongodb::bson::{self, DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{AttemptEntity, UserEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    pub id: bson::Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub created_at: DateTime,
    /// Bumped inside every attempt transaction so concurrent writers for the same user conflict.
    #[serde(default)]
    pub attempt_revision: i64,
}

impl From<UserEntity> for MongoUserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            id: uuid_as_bson(value.id),
            email: value.email,
            password_hash: value.password_hash,
            display_name: value.display_name,
            created_at: DateTime::from_system_time(value.created_at),
            attempt_revision: 0,
        }
    }
}

impl From<MongoUserDocument> for UserEntity {
    fn from(value: MongoUserDocument) -> Self {
        Self {
            id: uuid_from_bson(value.id),
            email: value.email,
            password_hash: value.password_hash,
            display_name: value.display_name,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAttemptDocument {
    #[serde(rename = "_id")]
    pub id: bson::Uuid,
    pub user_id: bson::Uuid,
    pub duration_seconds: i32,
    pub attempted_at: DateTime,
    pub is_personal_best: bool,
}

impl From<AttemptEntity> for MongoAttemptDocument {
    fn from(value: AttemptEntity) -> Self {
        Self {
            id: uuid_as_bson(value.id),
            user_id: uuid_as_bson(value.user_id),
            // Durations are capped at one hour upstream.
            duration_seconds: i32::try_from(value.duration_seconds).unwrap_or(i32::MAX),
            attempted_at: DateTime::from_system_time(value.attempted_at),
            is_personal_best: value.is_personal_best,
        }
    }
}

impl From<MongoAttemptDocument> for AttemptEntity {
    fn from(value: MongoAttemptDocument) -> Self {
        Self {
            id: uuid_from_bson(value.id),
            user_id: uuid_from_bson(value.user_id),
            duration_seconds: u32::try_from(value.duration_seconds).unwrap_or_default(),
            attempted_at: value.attempted_at.to_system_time(),
            is_personal_best: value.is_personal_best,
        }
    }
}

/// Row produced by the per-user duration aggregation.
#[derive(Debug, Deserialize)]
pub struct MongoTotalRow {
    #[serde(rename = "_id")]
    pub user_id: bson::Uuid,
    pub total_seconds: i64,
}

pub fn uuid_as_bson(id: Uuid) -> bson::Uuid {
    bson::Uuid::from_bytes(id.into_bytes())
}

pub fn uuid_from_bson(id: bson::Uuid) -> Uuid {
    Uuid::from_bytes(id.bytes())
}

pub fn doc_id(id: Uuid) -> Document {
    doc! { "_id": uuid_as_bson(id) }
}
