pub mod fallback;
pub mod local;
pub mod remote;
pub(crate) mod templates;

pub use fallback::Fallback;
pub use local::Local;
pub use remote::{Baas, BaasError};

#[cfg(test)]
use mockall::automock;

use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;
use thiserror::Error;

use crate::{
    config::Configuration,
    models::{
        Conversation, ConversationUpdate, Message, NewConversation, NewNote, NewProject, NewTask,
        NewTemplate, Note, NoteQuery, NoteUpdate, Project, ProjectUpdate, PromptTemplate, Role,
        Task, TaskUpdate, TemplateUpdate,
    },
    storage::{ArcKeyValueStore, LocalStore},
};

/// Domain failures. They travel inside [`eyre::Report`]; callers that care
/// recover them with `downcast_ref::<RepositoryError>()`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("cannot modify system template: {id}")]
    SystemTemplate { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Conversation,
    Message,
    Template,
    Project,
    Task,
    Note,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordKind::Conversation => "conversation",
            RecordKind::Message => "message",
            RecordKind::Template => "template",
            RecordKind::Project => "project",
            RecordKind::Task => "task",
            RecordKind::Note => "note",
        };
        write!(f, "{}", name)
    }
}

impl RepositoryError {
    pub fn not_found(kind: RecordKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn system_template(id: impl Into<String>) -> Self {
        Self::SystemTemplate { id: id.into() }
    }
}

/// Conversations, messages and prompt templates of the configured user.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AiRepository {
    /// Newest activity first.
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;
    async fn create_conversation(&self, params: NewConversation) -> Result<Conversation>;
    async fn get_conversation(&self, id: &str) -> Result<Conversation>;
    async fn update_conversation(
        &self,
        id: &str,
        update: ConversationUpdate,
    ) -> Result<Conversation>;
    /// Removes the conversation together with its messages.
    async fn delete_conversation(&self, id: &str) -> Result<()>;

    /// Oldest first.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;
    async fn add_message(&self, conversation_id: &str, role: Role, content: &str)
    -> Result<Message>;
    async fn delete_message(&self, id: &str) -> Result<()>;

    /// User and system templates, newest first. Seeds the system templates
    /// when none exist yet.
    async fn list_templates(&self) -> Result<Vec<PromptTemplate>>;
    async fn create_template(&self, params: NewTemplate) -> Result<PromptTemplate>;
    async fn get_template(&self, id: &str) -> Result<PromptTemplate>;
    async fn update_template(&self, id: &str, update: TemplateUpdate) -> Result<PromptTemplate>;
    async fn delete_template(&self, id: &str) -> Result<()>;
}

pub type ArcAiRepository = Arc<dyn AiRepository + Send + Sync>;

/// Projects, tasks and notes. Only the remote backend serves these.
#[async_trait]
pub trait WorkspaceRepository {
    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn create_project(&self, params: NewProject) -> Result<Project>;
    async fn update_project(&self, id: &str, update: ProjectUpdate) -> Result<Project>;
    async fn delete_project(&self, id: &str) -> Result<()>;

    async fn list_tasks(&self, project_id: Option<&str>) -> Result<Vec<Task>>;
    async fn create_task(&self, params: NewTask) -> Result<Task>;
    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task>;
    async fn delete_task(&self, id: &str) -> Result<()>;

    async fn list_notes(&self) -> Result<Vec<Note>>;
    async fn create_note(&self, params: NewNote) -> Result<Note>;
    async fn update_note(&self, id: &str, update: NoteUpdate) -> Result<Note>;
    async fn delete_note(&self, id: &str) -> Result<()>;
    async fn search_notes(&self, query: NoteQuery) -> Result<Vec<Note>>;
    async fn toggle_favorite(&self, id: &str) -> Result<Note>;

    /// Drops every project and task of the current user, then stores the
    /// given ones with their ids kept.
    async fn replace_projects_and_tasks(
        &self,
        projects: &[Project],
        tasks: &[Task],
    ) -> Result<()>;
}

pub type ArcWorkspaceRepository = Arc<dyn WorkspaceRepository + Send + Sync>;

/// Builds the AI repository. With the remote disabled the local store is
/// used on its own, otherwise every call tries the remote first.
pub fn new_repository(config: &Configuration, kv: ArcKeyValueStore) -> Result<ArcAiRepository> {
    let local = Arc::new(Local::from_config(config, LocalStore::new(kv)));
    if !config.remote.enabled {
        log::info!("Remote backend disabled, using local storage only");
        return Ok(local);
    }

    let remote = Arc::new(Baas::from_config(config)?);
    Ok(Arc::new(Fallback::new(remote, local)))
}

/// Builds the workspace repository, which needs the remote backend.
pub fn new_workspace(config: &Configuration) -> Result<ArcWorkspaceRepository> {
    if !config.remote.enabled {
        eyre::bail!("projects, tasks and notes need the remote backend, enable it in [remote]");
    }
    Ok(Arc::new(Baas::from_config(config)?))
}
