#[cfg(test)]
#[path = "local_test.rs"]
mod tests;

use async_trait::async_trait;
use chrono::Utc;
use eyre::{Context, Result};

use super::{AiRepository, RecordKind, RepositoryError, templates::system_templates};
use crate::{
    config::{Configuration, constants::DEFAULT_CONVERSATION_TITLE},
    models::{
        Conversation, ConversationUpdate, Message, NewConversation, NewTemplate, PromptTemplate,
        Role, TemplateUpdate,
    },
    storage::{LocalStore, StorageKey},
};

/// AI records kept in the local key-value store, scoped to one user.
pub struct Local {
    store: LocalStore,
    user_id: String,
    default_model: String,
}

impl Local {
    pub fn new(
        store: LocalStore,
        user_id: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            default_model: default_model.into(),
        }
    }

    pub fn from_config(config: &Configuration, store: LocalStore) -> Self {
        Self::new(
            store,
            &config.general.user_id,
            &config.gateway.default_model,
        )
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Inserts the system templates unless at least one system template is
    /// already stored. Presence is decided by the flag, not by name.
    pub async fn seed_system_templates(&self) -> Result<()> {
        let mut templates: Vec<PromptTemplate> = self.store.get(StorageKey::Templates).await;
        if templates.iter().any(|t| t.is_system()) {
            return Ok(());
        }

        let seeded = system_templates(&self.user_id, Utc::now());
        log::debug!("Seeding {} system templates", seeded.len());
        templates.extend(seeded);
        self.store
            .set(StorageKey::Templates, &templates)
            .await
            .wrap_err("seeding system templates")
    }

    async fn conversations(&self) -> Vec<Conversation> {
        self.store.get(StorageKey::Conversations).await
    }

    async fn messages(&self) -> Vec<Message> {
        self.store.get(StorageKey::Messages).await
    }

    async fn templates(&self) -> Vec<PromptTemplate> {
        self.store.get(StorageKey::Templates).await
    }
}

#[async_trait]
impl AiRepository for Local {
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let mut conversations = self
            .conversations()
            .await
            .into_iter()
            .filter(|c| c.user_id() == self.user_id)
            .collect::<Vec<_>>();
        conversations.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        Ok(conversations)
    }

    async fn create_conversation(&self, params: NewConversation) -> Result<Conversation> {
        let conversation = Conversation::new(
            &self.user_id,
            params.title().unwrap_or(DEFAULT_CONVERSATION_TITLE),
            params.model_name().unwrap_or(&self.default_model),
        );

        let mut conversations = self.conversations().await;
        conversations.push(conversation.clone());
        self.store
            .set(StorageKey::Conversations, &conversations)
            .await?;
        Ok(conversation)
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation> {
        self.conversations()
            .await
            .into_iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| RepositoryError::not_found(RecordKind::Conversation, id).into())
    }

    async fn update_conversation(
        &self,
        id: &str,
        update: ConversationUpdate,
    ) -> Result<Conversation> {
        let mut conversations = self.conversations().await;
        let Some(conversation) = conversations.iter_mut().find(|c| c.id() == id) else {
            return Err(RepositoryError::not_found(RecordKind::Conversation, id).into());
        };

        update.apply(conversation, Utc::now());
        let updated = conversation.clone();
        self.store
            .set(StorageKey::Conversations, &conversations)
            .await?;
        Ok(updated)
    }

    async fn delete_conversation(&self, id: &str) -> Result<()> {
        let conversations = self.conversations().await;
        if !conversations.iter().any(|c| c.id() == id) {
            return Err(RepositoryError::not_found(RecordKind::Conversation, id).into());
        }

        let conversations = conversations
            .into_iter()
            .filter(|c| c.id() != id)
            .collect::<Vec<_>>();
        self.store
            .set(StorageKey::Conversations, &conversations)
            .await?;

        let messages = self
            .messages()
            .await
            .into_iter()
            .filter(|m| m.conversation_id() != id)
            .collect::<Vec<_>>();
        self.store.set(StorageKey::Messages, &messages).await?;
        Ok(())
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let mut messages = self
            .messages()
            .await
            .into_iter()
            .filter(|m| m.conversation_id() == conversation_id)
            .collect::<Vec<_>>();
        // stable, so equal timestamps keep insertion order
        messages.sort_by_key(|m| m.timestamp());
        Ok(messages)
    }

    async fn add_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message> {
        // Refuse orphans up front so nothing is written for an unknown id
        self.get_conversation(conversation_id).await?;

        let message = Message::new(conversation_id, role, content);
        let mut messages = self.messages().await;
        messages.push(message.clone());
        self.store.set(StorageKey::Messages, &messages).await?;

        self.update_conversation(conversation_id, ConversationUpdate::default())
            .await?;
        Ok(message)
    }

    async fn delete_message(&self, id: &str) -> Result<()> {
        let messages = self.messages().await;
        if !messages.iter().any(|m| m.id() == id) {
            return Err(RepositoryError::not_found(RecordKind::Message, id).into());
        }

        let messages = messages
            .into_iter()
            .filter(|m| m.id() != id)
            .collect::<Vec<_>>();
        self.store.set(StorageKey::Messages, &messages).await?;
        Ok(())
    }

    async fn list_templates(&self) -> Result<Vec<PromptTemplate>> {
        self.seed_system_templates().await?;

        let mut templates = self
            .templates()
            .await
            .into_iter()
            .filter(|t| t.user_id() == self.user_id || t.is_system())
            .collect::<Vec<_>>();
        templates.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(templates)
    }

    async fn create_template(&self, params: NewTemplate) -> Result<PromptTemplate> {
        let template = PromptTemplate::new(&self.user_id, params);

        let mut templates = self.templates().await;
        templates.push(template.clone());
        self.store.set(StorageKey::Templates, &templates).await?;
        Ok(template)
    }

    async fn get_template(&self, id: &str) -> Result<PromptTemplate> {
        self.templates()
            .await
            .into_iter()
            .find(|t| t.id() == id)
            .ok_or_else(|| RepositoryError::not_found(RecordKind::Template, id).into())
    }

    async fn update_template(&self, id: &str, update: TemplateUpdate) -> Result<PromptTemplate> {
        let mut templates = self.templates().await;
        let Some(template) = templates.iter_mut().find(|t| t.id() == id) else {
            return Err(RepositoryError::not_found(RecordKind::Template, id).into());
        };

        if template.is_system() {
            return Err(RepositoryError::system_template(id).into());
        }

        update.apply(template, Utc::now());
        let updated = template.clone();
        self.store.set(StorageKey::Templates, &templates).await?;
        Ok(updated)
    }

    async fn delete_template(&self, id: &str) -> Result<()> {
        let templates = self.templates().await;
        let Some(template) = templates.iter().find(|t| t.id() == id) else {
            return Err(RepositoryError::not_found(RecordKind::Template, id).into());
        };

        if template.is_system() {
            return Err(RepositoryError::system_template(id).into());
        }

        let templates = templates
            .into_iter()
            .filter(|t| t.id() != id)
            .collect::<Vec<_>>();
        self.store.set(StorageKey::Templates, &templates).await?;
        Ok(())
    }
}
