#[cfg(test)]
#[path = "remote_test.rs"]
mod tests;

use std::{fmt::Display, time};

use async_trait::async_trait;
use chrono::Utc;
use eyre::{Context, Result};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;

use super::{AiRepository, RecordKind, RepositoryError, WorkspaceRepository};
use crate::{
    config::{Configuration, constants::DEFAULT_CONVERSATION_TITLE, user_agent},
    models::{
        Conversation, ConversationUpdate, Message, NewConversation, NewNote, NewProject, NewTask,
        NewTemplate, Note, NoteQuery, NoteUpdate, Project, ProjectUpdate, PromptTemplate, Role,
        Task, TaskUpdate, TemplateUpdate,
    },
};

const CONVERSATIONS: &str = "ai_conversations";
const MESSAGES: &str = "ai_messages";
const TEMPLATES: &str = "ai_prompt_templates";
const PROJECTS: &str = "projects";
const TASKS: &str = "tasks";
const NOTES: &str = "notes";

/// Client for a PostgREST backend (the REST face of the hosted database).
pub struct Baas {
    endpoint: String,
    api_key: Option<String>,
    timeout: Option<time::Duration>,
    user_id: String,
    default_model: String,
    client: reqwest::Client,
}

impl Baas {
    pub fn new(endpoint: &str, user_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: None,
            timeout: None,
            user_id: user_id.into(),
            default_model: String::new(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Configuration) -> Result<Self> {
        let remote = &config.remote;
        if remote.url.is_empty() {
            eyre::bail!("remote backend is enabled but no url is configured");
        }

        let mut baas = Baas::new(&remote.url, &config.general.user_id)
            .with_default_model(&config.gateway.default_model);
        if let Some(api_key) = remote.api_key.as_deref() {
            baas = baas.with_api_key(api_key);
        }
        if let Some(secs) = remote.timeout_secs {
            baas = baas.with_timeout(time::Duration::from_secs(secs as u64));
        }
        Ok(baas)
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_default_model(mut self, model: &str) -> Self {
        self.default_model = model.to_string();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}/rest/v1/{}", self.endpoint, table))
            .header("User-Agent", user_agent())
            .header("Prefer", "return=representation");

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        if let Some(key) = &self.api_key {
            req = req.header("apikey", key).bearer_auth(key);
        }
        req
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Vec<T>> {
        let res = req.send().await.wrap_err("sending request")?;

        if !res.status().is_success() {
            let http_code = res.status().as_u16();
            let body = res.text().await.wrap_err("reading error response")?;
            log::debug!("Remote error response: {}", body);
            let mut err = serde_json::from_str::<BaasError>(&body).unwrap_or_else(|_| BaasError {
                message: body,
                ..Default::default()
            });
            err.http_code = http_code;
            return Err(err.into());
        }

        let rows = res
            .json::<Vec<T>>()
            .await
            .wrap_err("parsing response rows")?;
        Ok(rows)
    }

    async fn fetch_one<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        kind: RecordKind,
        id: &str,
    ) -> Result<T> {
        self.fetch(req)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::not_found(kind, id).into())
    }

    async fn insert<T: Serialize + DeserializeOwned>(&self, table: &str, row: &T) -> Result<T> {
        self.fetch::<T>(self.request(Method::POST, table).json(row))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| eyre::eyre!("insert into {} returned no row", table))
    }

    async fn update<T: DeserializeOwned, B: Serialize>(
        &self,
        table: &str,
        kind: RecordKind,
        id: &str,
        body: &B,
    ) -> Result<T> {
        let req = self
            .request(Method::PATCH, table)
            .query(&[("id", format!("eq.{}", id))])
            .json(body);
        self.fetch_one(req, kind, id).await
    }

    async fn delete(&self, table: &str, kind: RecordKind, id: &str) -> Result<()> {
        let req = self
            .request(Method::DELETE, table)
            .query(&[("id", format!("eq.{}", id))]);
        self.fetch_one::<Value>(req, kind, id).await?;
        Ok(())
    }

    async fn get_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        kind: RecordKind,
        id: &str,
    ) -> Result<T> {
        let req = self
            .request(Method::GET, table)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{}", id))]);
        self.fetch_one(req, kind, id).await
    }

    /// Deletes every row of `table` owned by the current user.
    async fn delete_owned(&self, table: &str) -> Result<()> {
        let req = self
            .request(Method::DELETE, table)
            .query(&[self.owner_filter()]);
        self.fetch::<Value>(req).await?;
        Ok(())
    }

    fn owner_filter(&self) -> (&'static str, String) {
        ("user_id", format!("eq.{}", self.user_id))
    }
}

#[async_trait]
impl AiRepository for Baas {
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let req = self.request(Method::GET, CONVERSATIONS).query(&[
            ("select", "*".to_string()),
            self.owner_filter(),
            ("order", "updated_at.desc".to_string()),
        ]);
        self.fetch(req).await.wrap_err("listing conversations")
    }

    async fn create_conversation(&self, params: NewConversation) -> Result<Conversation> {
        let conversation = Conversation::new(
            &self.user_id,
            params.title().unwrap_or(DEFAULT_CONVERSATION_TITLE),
            params.model_name().unwrap_or(&self.default_model),
        );
        self.insert(CONVERSATIONS, &conversation)
            .await
            .wrap_err("creating conversation")
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation> {
        self.get_by_id(CONVERSATIONS, RecordKind::Conversation, id)
            .await
    }

    async fn update_conversation(
        &self,
        id: &str,
        update: ConversationUpdate,
    ) -> Result<Conversation> {
        let mut body = serde_json::to_value(&update).wrap_err("encoding update")?;
        body["updated_at"] = json!(Utc::now());
        self.update(CONVERSATIONS, RecordKind::Conversation, id, &body)
            .await
    }

    /// The conversation row goes first and decides the result. Message
    /// cleanup afterwards is best effort, the foreign key cascade usually
    /// removed them already.
    async fn delete_conversation(&self, id: &str) -> Result<()> {
        self.delete(CONVERSATIONS, RecordKind::Conversation, id)
            .await?;

        let req = self
            .request(Method::DELETE, MESSAGES)
            .query(&[("conversation_id", format!("eq.{}", id))]);
        if let Err(err) = self.fetch::<Value>(req).await {
            log::warn!("Removing messages of conversation {} failed: {:#}", id, err);
        }
        Ok(())
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let req = self.request(Method::GET, MESSAGES).query(&[
            ("select", "*".to_string()),
            ("conversation_id", format!("eq.{}", conversation_id)),
            ("order", "timestamp.asc".to_string()),
        ]);
        self.fetch(req).await.wrap_err("listing messages")
    }

    async fn add_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message> {
        let message = self
            .insert(MESSAGES, &Message::new(conversation_id, role, content))
            .await
            .wrap_err("adding message")?;

        // The insert is committed; a failed touch only leaves updated_at stale
        if let Err(err) = self
            .update_conversation(conversation_id, ConversationUpdate::default())
            .await
        {
            log::warn!("Touching conversation {} failed: {:#}", conversation_id, err);
        }
        Ok(message)
    }

    async fn delete_message(&self, id: &str) -> Result<()> {
        self.delete(MESSAGES, RecordKind::Message, id).await
    }

    async fn list_templates(&self) -> Result<Vec<PromptTemplate>> {
        let req = self.request(Method::GET, TEMPLATES).query(&[
            ("select", "*".to_string()),
            ("or", format!("(user_id.eq.{},is_system.eq.true)", self.user_id)),
            ("order", "created_at.desc".to_string()),
        ]);
        self.fetch(req).await.wrap_err("listing templates")
    }

    async fn create_template(&self, params: NewTemplate) -> Result<PromptTemplate> {
        let template = PromptTemplate::new(&self.user_id, params);
        self.insert(TEMPLATES, &template)
            .await
            .wrap_err("creating template")
    }

    async fn get_template(&self, id: &str) -> Result<PromptTemplate> {
        self.get_by_id(TEMPLATES, RecordKind::Template, id).await
    }

    async fn update_template(&self, id: &str, update: TemplateUpdate) -> Result<PromptTemplate> {
        if self.get_template(id).await?.is_system() {
            return Err(RepositoryError::system_template(id).into());
        }

        let mut body = serde_json::to_value(&update).wrap_err("encoding update")?;
        body["updated_at"] = json!(Utc::now());
        self.update(TEMPLATES, RecordKind::Template, id, &body)
            .await
    }

    async fn delete_template(&self, id: &str) -> Result<()> {
        if self.get_template(id).await?.is_system() {
            return Err(RepositoryError::system_template(id).into());
        }
        self.delete(TEMPLATES, RecordKind::Template, id).await
    }
}

#[async_trait]
impl WorkspaceRepository for Baas {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let req = self.request(Method::GET, PROJECTS).query(&[
            ("select", "*".to_string()),
            self.owner_filter(),
            ("order", "created_at.desc".to_string()),
        ]);
        self.fetch(req).await.wrap_err("listing projects")
    }

    async fn create_project(&self, params: NewProject) -> Result<Project> {
        self.insert(PROJECTS, &Project::new(&self.user_id, params))
            .await
            .wrap_err("creating project")
    }

    async fn update_project(&self, id: &str, update: ProjectUpdate) -> Result<Project> {
        let mut body = serde_json::to_value(&update).wrap_err("encoding update")?;
        body["updated_at"] = json!(Utc::now());
        self.update(PROJECTS, RecordKind::Project, id, &body).await
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        self.delete(PROJECTS, RecordKind::Project, id).await
    }

    async fn list_tasks(&self, project_id: Option<&str>) -> Result<Vec<Task>> {
        let mut query = vec![("select", "*".to_string()), self.owner_filter()];
        if let Some(project_id) = project_id {
            query.push(("project_id", format!("eq.{}", project_id)));
        }
        query.push(("order", "created_at.desc".to_string()));

        let req = self.request(Method::GET, TASKS).query(&query);
        self.fetch(req).await.wrap_err("listing tasks")
    }

    async fn create_task(&self, params: NewTask) -> Result<Task> {
        self.insert(TASKS, &Task::new(&self.user_id, params))
            .await
            .wrap_err("creating task")
    }

    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task> {
        let mut body = serde_json::to_value(&update).wrap_err("encoding update")?;
        body["updated_at"] = json!(Utc::now());
        self.update(TASKS, RecordKind::Task, id, &body).await
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        self.delete(TASKS, RecordKind::Task, id).await
    }

    async fn list_notes(&self) -> Result<Vec<Note>> {
        self.search_notes(NoteQuery::default()).await
    }

    async fn create_note(&self, params: NewNote) -> Result<Note> {
        self.insert(NOTES, &Note::new(&self.user_id, params))
            .await
            .wrap_err("creating note")
    }

    async fn update_note(&self, id: &str, update: NoteUpdate) -> Result<Note> {
        let mut body = serde_json::to_value(&update).wrap_err("encoding update")?;
        body["updated_at"] = json!(Utc::now());
        self.update(NOTES, RecordKind::Note, id, &body).await
    }

    async fn delete_note(&self, id: &str) -> Result<()> {
        self.delete(NOTES, RecordKind::Note, id).await
    }

    async fn search_notes(&self, query: NoteQuery) -> Result<Vec<Note>> {
        let mut params = vec![("select", "*".to_string()), self.owner_filter()];
        if let Some(category) = query.category {
            params.push(("category", format!("eq.{}", category)));
        }
        if query.favorites_only {
            params.push(("is_favorite", "eq.true".to_string()));
        }
        if let Some(text) = query.query.as_deref().filter(|q| !q.trim().is_empty()) {
            let pattern = ilike_pattern(text);
            params.push((
                "or",
                format!("(title.ilike.{0},content.ilike.{0})", pattern),
            ));
        }
        params.push(("order", "updated_at.desc".to_string()));

        let req = self.request(Method::GET, NOTES).query(&params);
        self.fetch(req).await.wrap_err("searching notes")
    }

    async fn toggle_favorite(&self, id: &str) -> Result<Note> {
        let note: Note = self.get_by_id(NOTES, RecordKind::Note, id).await?;
        let body = json!({ "is_favorite": !note.is_favorite, "updated_at": Utc::now() });
        self.update(NOTES, RecordKind::Note, id, &body).await
    }

    async fn replace_projects_and_tasks(
        &self,
        projects: &[Project],
        tasks: &[Task],
    ) -> Result<()> {
        // Tasks reference projects, so they leave first and arrive last
        self.delete_owned(TASKS).await.wrap_err("clearing tasks")?;
        self.delete_owned(PROJECTS)
            .await
            .wrap_err("clearing projects")?;

        if !projects.is_empty() {
            self.fetch::<Value>(self.request(Method::POST, PROJECTS).json(projects))
                .await
                .wrap_err("inserting projects")?;
        }
        if !tasks.is_empty() {
            self.fetch::<Value>(self.request(Method::POST, TASKS).json(tasks))
                .await
                .wrap_err("inserting tasks")?;
        }
        Ok(())
    }
}

/// Wraps `text` for a PostgREST `ilike` filter. The value is quoted so that
/// commas and parentheses in the search text do not split the `or` list.
fn ilike_pattern(text: &str) -> String {
    let escaped = text.trim().replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"*{}*\"", escaped)
}

/// Error body returned by PostgREST.
#[derive(Default, Error, Debug, Clone, Serialize, Deserialize)]
pub struct BaasError {
    #[serde(skip)]
    pub http_code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl Display for BaasError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(
                f,
                "remote error ({}, {}): {}",
                self.http_code, code, self.message
            ),
            None => write!(f, "remote error ({}): {}", self.http_code, self.message),
        }
    }
}
