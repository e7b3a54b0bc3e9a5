#[cfg(test)]
#[path = "fallback_test.rs"]
mod tests;

use async_trait::async_trait;
use eyre::Result;
use futures::future::BoxFuture;

use super::{AiRepository, ArcAiRepository, RepositoryError};
use crate::models::{
    Conversation, ConversationUpdate, Message, NewConversation, NewTemplate, PromptTemplate, Role,
    TemplateUpdate,
};

/// Sends every call to the remote repository first and repeats it against
/// the local one when the remote fails. Results are never merged and
/// nothing is synchronised between the two.
pub struct Fallback {
    remote: ArcAiRepository,
    local: ArcAiRepository,
}

impl Fallback {
    pub fn new(remote: ArcAiRepository, local: ArcAiRepository) -> Self {
        Self { remote, local }
    }

    async fn run<'a, T, R, L>(&'a self, op: &str, remote: R, local: L) -> Result<T>
    where
        R: FnOnce(&'a ArcAiRepository) -> BoxFuture<'a, Result<T>>,
        L: FnOnce(&'a ArcAiRepository) -> BoxFuture<'a, Result<T>>,
    {
        match remote(&self.remote).await {
            Ok(value) => Ok(value),
            Err(err) if !should_fallback(&err) => Err(err),
            Err(err) => {
                log::warn!("Remote {} failed, using local storage: {:#}", op, err);
                local(&self.local).await
            }
        }
    }
}

/// A refusal to touch a system template is an answer, not an outage.
fn should_fallback(err: &eyre::Report) -> bool {
    !matches!(
        err.downcast_ref::<RepositoryError>(),
        Some(RepositoryError::SystemTemplate { .. })
    )
}

#[async_trait]
impl AiRepository for Fallback {
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        self.run(
            "list_conversations",
            |r| r.list_conversations(),
            |l| l.list_conversations(),
        )
        .await
    }

    async fn create_conversation(&self, params: NewConversation) -> Result<Conversation> {
        let retry = params.clone();
        self.run(
            "create_conversation",
            |r| r.create_conversation(params),
            |l| l.create_conversation(retry),
        )
        .await
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation> {
        self.run(
            "get_conversation",
            |r| r.get_conversation(id),
            |l| l.get_conversation(id),
        )
        .await
    }

    async fn update_conversation(
        &self,
        id: &str,
        update: ConversationUpdate,
    ) -> Result<Conversation> {
        let retry = update.clone();
        self.run(
            "update_conversation",
            |r| r.update_conversation(id, update),
            |l| l.update_conversation(id, retry),
        )
        .await
    }

    async fn delete_conversation(&self, id: &str) -> Result<()> {
        self.run(
            "delete_conversation",
            |r| r.delete_conversation(id),
            |l| l.delete_conversation(id),
        )
        .await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.run(
            "list_messages",
            |r| r.list_messages(conversation_id),
            |l| l.list_messages(conversation_id),
        )
        .await
    }

    async fn add_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message> {
        self.run(
            "add_message",
            |r| r.add_message(conversation_id, role, content),
            |l| l.add_message(conversation_id, role, content),
        )
        .await
    }

    async fn delete_message(&self, id: &str) -> Result<()> {
        self.run(
            "delete_message",
            |r| r.delete_message(id),
            |l| l.delete_message(id),
        )
        .await
    }

    async fn list_templates(&self) -> Result<Vec<PromptTemplate>> {
        self.run(
            "list_templates",
            |r| r.list_templates(),
            |l| l.list_templates(),
        )
        .await
    }

    async fn create_template(&self, params: NewTemplate) -> Result<PromptTemplate> {
        let retry = params.clone();
        self.run(
            "create_template",
            |r| r.create_template(params),
            |l| l.create_template(retry),
        )
        .await
    }

    async fn get_template(&self, id: &str) -> Result<PromptTemplate> {
        self.run(
            "get_template",
            |r| r.get_template(id),
            |l| l.get_template(id),
        )
        .await
    }

    async fn update_template(&self, id: &str, update: TemplateUpdate) -> Result<PromptTemplate> {
        let retry = update.clone();
        self.run(
            "update_template",
            |r| r.update_template(id, update),
            |l| l.update_template(id, retry),
        )
        .await
    }

    async fn delete_template(&self, id: &str) -> Result<()> {
        self.run(
            "delete_template",
            |r| r.delete_template(id),
            |l| l.delete_template(id),
        )
        .await
    }
}
