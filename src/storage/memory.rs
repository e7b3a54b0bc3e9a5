use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use eyre::Result;

use super::KeyValueStore;

/// Process local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct Memory {
    items: Mutex<HashMap<String, String>>,
}

impl Memory {
    fn items(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| eyre::eyre!("memory storage lock poisoned"))
    }
}

#[async_trait]
impl KeyValueStore for Memory {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items()?.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items()?.remove(key);
        Ok(())
    }
}
