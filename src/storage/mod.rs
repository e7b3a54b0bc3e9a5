//! Local persistence. A [`KeyValueStore`] holds opaque strings under keys;
//! [`LocalStore`] layers typed record arrays on top of it.
//!
//! Every read deserializes a whole array and every write serializes it back.
//! There is no indexing and no locking: two concurrent writers of the same
//! key race and the later one wins. This is only meant for the data of a
//! single local user.

pub mod memory;
pub mod sqlite;
pub mod store;

pub use memory::Memory;
pub use sqlite::Sqlite;
pub use store::{LocalStore, StorageKey};

use std::sync::Arc;

use async_trait::async_trait;
use eyre::{Context, Result};

use crate::config::{StorageConfig, ensure_parent_dir, resolve_path};

#[async_trait]
pub trait KeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
    async fn remove_item(&self, key: &str) -> Result<()>;
}

pub type ArcKeyValueStore = Arc<dyn KeyValueStore + Send + Sync>;

pub async fn new_storage(config: &StorageConfig) -> Result<ArcKeyValueStore> {
    let storage: ArcKeyValueStore = match config {
        StorageConfig::Sqlite(sqlite_config) => {
            let path = match sqlite_config.path.as_deref() {
                Some(path) => {
                    let path = resolve_path(path)?;
                    ensure_parent_dir(&path)?;
                    Some(path)
                }
                None => None,
            };
            Arc::new(
                Sqlite::new(path.as_deref())
                    .await
                    .wrap_err("opening sqlite storage")?,
            )
        }
        StorageConfig::Memory => Arc::new(Memory::default()),
    };
    Ok(storage)
}
