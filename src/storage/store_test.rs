use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;

use super::*;
use crate::models::{Message, Role};
use crate::storage::{KeyValueStore, Memory};

fn new_store() -> (Arc<Memory>, LocalStore) {
    let kv = Arc::new(Memory::default());
    (kv.clone(), LocalStore::new(kv))
}

#[tokio::test]
async fn test_get_absent_key_is_empty() {
    let (_, store) = new_store();
    let messages: Vec<Message> = store.get(StorageKey::Messages).await;
    assert!(messages.is_empty());
}

#[tokio::test]
async fn test_set_then_get() {
    let (kv, store) = new_store();
    let messages = vec![
        Message::new("c1", Role::User, "hi"),
        Message::new("c1", Role::Assistant, "hello"),
    ];

    store.set(StorageKey::Messages, &messages).await.unwrap();
    let got: Vec<Message> = store.get(StorageKey::Messages).await;
    assert_eq!(got, messages);

    let raw = kv.get_item("ai_messages").await.unwrap().unwrap();
    assert!(raw.starts_with('['));
}

#[tokio::test]
async fn test_corrupt_json_is_empty() {
    let (kv, store) = new_store();
    kv.set_item("ai_conversations", "{not json").await.unwrap();

    let got: Vec<Message> = store.get(StorageKey::Conversations).await;
    assert!(got.is_empty());
}

#[tokio::test]
async fn test_clear_removes_all_keys() {
    let (kv, store) = new_store();
    for key in StorageKey::ALL {
        kv.set_item(key.as_str(), "[]").await.unwrap();
    }
    kv.set_item("unrelated", "keep").await.unwrap();

    store.clear().await.unwrap();

    for key in StorageKey::ALL {
        assert_eq!(kv.get_item(key.as_str()).await.unwrap(), None);
    }
    assert_eq!(
        kv.get_item("unrelated").await.unwrap().as_deref(),
        Some("keep")
    );
}

struct Broken;

#[async_trait]
impl KeyValueStore for Broken {
    async fn get_item(&self, _key: &str) -> Result<Option<String>> {
        eyre::bail!("disk on fire")
    }

    async fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
        eyre::bail!("disk on fire")
    }

    async fn remove_item(&self, _key: &str) -> Result<()> {
        eyre::bail!("disk on fire")
    }
}

#[tokio::test]
async fn test_read_errors_are_tolerated() {
    let store = LocalStore::new(Arc::new(Broken));
    let got: Vec<Message> = store.get(StorageKey::Templates).await;
    assert!(got.is_empty());
}

#[tokio::test]
async fn test_write_errors_are_returned() {
    let store = LocalStore::new(Arc::new(Broken));

    let err = store
        .set(StorageKey::Templates, &[Message::new("c", Role::User, "x")])
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("disk on fire"));
    assert!(store.clear().await.is_err());
}
