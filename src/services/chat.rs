#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};

use eyre::{Context, Result};
use thiserror::Error;

use crate::{
    backend::{
        ArcBackend, StreamOutcome, TitleGenerator,
        title::should_update_title,
    },
    config::{AiConfig, GatewayConfig},
    models::{ChatMessage, Conversation, ConversationUpdate, Message, PromptTemplate, Role},
    repository::ArcAiRepository,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("a message is already being sent")]
    AlreadySending,

    #[error("message is empty")]
    EmptyInput,
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub default_model: String,
    pub temperature: f32,
    pub stream_response: bool,
    pub auto_title: bool,
    pub max_history_messages: usize,
}

impl ChatSettings {
    pub fn from_config(gateway: &GatewayConfig, ai: &AiConfig) -> Self {
        Self {
            default_model: gateway.default_model.clone(),
            temperature: gateway.temperature,
            stream_response: ai.stream_response,
            auto_title: ai.auto_title,
            max_history_messages: ai.max_history_messages,
        }
    }
}

/// Result of one exchange.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub user_message: Message,
    pub assistant_message: Message,
    /// The new conversation title, when it was regenerated.
    pub title: Option<String>,
    pub outcome: StreamOutcome,
}

/// Conversations and templates loaded when a chat session opens.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    pub conversations: Vec<Conversation>,
    pub templates: Vec<PromptTemplate>,
}

/// Runs chat exchanges against one repository and one backend. At most one
/// exchange is in flight per service.
pub struct ChatService {
    repo: ArcAiRepository,
    backend: ArcBackend,
    titles: TitleGenerator,
    settings: ChatSettings,
    sending: AtomicBool,
}

/// Clears the sending flag however the exchange ends.
struct SendingGuard<'a>(&'a AtomicBool);

impl<'a> SendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ChatError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ChatError::AlreadySending)?;
        Ok(Self(flag))
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ChatService {
    pub fn new(repo: ArcAiRepository, backend: ArcBackend, settings: ChatSettings) -> Self {
        let titles = TitleGenerator::new(backend.clone(), &settings.default_model);
        Self {
            repo,
            backend,
            titles,
            settings,
            sending: AtomicBool::new(false),
        }
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    /// Loads conversations and templates concurrently.
    pub async fn bootstrap(&self) -> Result<ChatSession> {
        let (conversations, templates) =
            tokio::try_join!(self.repo.list_conversations(), self.repo.list_templates())
                .wrap_err("loading chat session")?;
        Ok(ChatSession {
            conversations,
            templates,
        })
    }

    /// Sends `input` to the conversation, prefixed with the template content
    /// when one is given, and stores both sides of the exchange. Each piece
    /// of the answer is passed to `on_chunk` as it arrives.
    pub async fn send(
        &self,
        conversation_id: &str,
        input: &str,
        template: Option<&PromptTemplate>,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<ChatReply> {
        if input.trim().is_empty() {
            return Err(ChatError::EmptyInput.into());
        }
        let _guard = SendingGuard::acquire(&self.sending)?;

        let conversation = self.repo.get_conversation(conversation_id).await?;
        let content = match template {
            Some(template) => template.apply_to(input),
            None => input.to_string(),
        };
        let update_title = self.settings.auto_title
            && should_update_title(conversation.title(), &content);

        let mut history = self
            .repo
            .list_messages(conversation_id)
            .await
            .wrap_err("loading history")?;
        let user_message = self
            .repo
            .add_message(conversation_id, Role::User, &content)
            .await
            .wrap_err("storing user message")?;
        history.push(user_message.clone());

        let start = history
            .len()
            .saturating_sub(self.settings.max_history_messages.max(1));
        let messages = history[start..]
            .iter()
            .map(ChatMessage::from)
            .collect::<Vec<_>>();

        let model = match conversation.model_name() {
            "" => self.settings.default_model.as_str(),
            name => name,
        };

        let mut answer = String::new();
        let outcome = if self.settings.stream_response {
            let mut collect = |chunk: &str| {
                answer.push_str(chunk);
                on_chunk(chunk);
            };
            self.backend
                .stream_chat(&messages, model, self.settings.temperature, &mut collect)
                .await?
        } else {
            answer = self
                .backend
                .send_chat(&messages, model, self.settings.temperature)
                .await?;
            on_chunk(&answer);
            StreamOutcome::Done
        };

        if outcome == StreamOutcome::Eof {
            log::warn!(
                "Completion for conversation {} ended without [DONE]",
                conversation_id
            );
        }

        let assistant_message = self
            .repo
            .add_message(conversation_id, Role::Assistant, &answer)
            .await
            .wrap_err("storing assistant message")?;

        let title = if update_title && !answer.trim().is_empty() {
            self.regenerate_title(conversation_id, &content, &answer, &messages)
                .await
        } else {
            None
        };

        Ok(ChatReply {
            user_message,
            assistant_message,
            title,
            outcome,
        })
    }

    async fn regenerate_title(
        &self,
        conversation_id: &str,
        user_message: &str,
        answer: &str,
        history: &[ChatMessage],
    ) -> Option<String> {
        let title = self
            .titles
            .generate_conversation_title(user_message, answer, history)
            .await;

        match self
            .repo
            .update_conversation(conversation_id, ConversationUpdate::new().with_title(&title))
            .await
        {
            Ok(_) => Some(title),
            Err(err) => {
                log::warn!("Updating conversation title failed: {:#}", err);
                None
            }
        }
    }
}
