use serde::{Deserialize, Serialize};

use crate::models::{Message, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One entry of the history sent to the chat gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

impl From<Role> for ChatRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self::new(msg.role().into(), msg.content())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub max_tokens: usize,
    pub temperature: f32,
}

pub const AVAILABLE_MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "google/gemini-2.5-flash",
        display_name: "Gemini 2.5 Flash",
        max_tokens: 8192,
        temperature: 0.7,
    },
    ModelInfo {
        name: "anthropic/claude-3.5-sonnet",
        display_name: "Claude 3.5 Sonnet",
        max_tokens: 4096,
        temperature: 0.7,
    },
    ModelInfo {
        name: "openai/gpt-4",
        display_name: "GPT-4",
        max_tokens: 4096,
        temperature: 0.7,
    },
    ModelInfo {
        name: "openai/gpt-3.5-turbo",
        display_name: "GPT-3.5 Turbo",
        max_tokens: 4096,
        temperature: 0.7,
    },
];

pub fn model_info(name: &str) -> Option<&'static ModelInfo> {
    AVAILABLE_MODELS.iter().find(|m| m.name == name)
}
