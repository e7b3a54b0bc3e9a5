#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

use eyre::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};

use super::ArcKeyValueStore;

/// The fixed keys the AI records are stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    Conversations,
    Messages,
    Templates,
}

impl StorageKey {
    pub const ALL: [StorageKey; 3] = [
        StorageKey::Conversations,
        StorageKey::Messages,
        StorageKey::Templates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Conversations => "ai_conversations",
            StorageKey::Messages => "ai_messages",
            StorageKey::Templates => "ai_prompt_templates",
        }
    }
}

/// Typed view over a [`super::KeyValueStore`]. Each key holds a JSON array.
///
/// Reads never fail: a missing key, a storage error or corrupt JSON all
/// yield an empty array after logging. Writes return their errors.
#[derive(Clone)]
pub struct LocalStore {
    kv: ArcKeyValueStore,
}

impl LocalStore {
    pub fn new(kv: ArcKeyValueStore) -> Self {
        Self { kv }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: StorageKey) -> Vec<T> {
        let raw = match self.kv.get_item(key.as_str()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return vec![],
            Err(err) => {
                log::error!("Failed to read local storage ({}): {}", key.as_str(), err);
                return vec![];
            }
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => items,
            Err(err) => {
                log::error!(
                    "Corrupt data in local storage ({}), treating as empty: {}",
                    key.as_str(),
                    err
                );
                vec![]
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: StorageKey, items: &[T]) -> Result<()> {
        let raw = serde_json::to_string(items)
            .wrap_err_with(|| format!("encoding local storage ({})", key.as_str()))?;
        self.kv
            .set_item(key.as_str(), &raw)
            .await
            .wrap_err_with(|| format!("writing local storage ({})", key.as_str()))
    }

    /// Drops every AI record kept locally. Every key is attempted, the first
    /// failure is returned.
    pub async fn clear(&self) -> Result<()> {
        let mut result = Ok(());
        for key in StorageKey::ALL {
            if let Err(err) = self.kv.remove_item(key.as_str()).await {
                log::error!("Failed to clear local storage ({}): {}", key.as_str(), err);
                if result.is_ok() {
                    result = Err(err.wrap_err(format!("clearing {}", key.as_str())));
                }
            }
        }
        result
    }
}
