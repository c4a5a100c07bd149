mod config;
mod connection;
mod error;
mod models;
/// Store implementation over a MongoDB database.
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoPlankStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateEmail { email } => {
                StorageError::conflict(format!("email `{email}` already registered"))
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
