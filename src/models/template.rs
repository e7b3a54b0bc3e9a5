use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reusable prompt prefix. System templates are shipped with the
/// application and can be neither edited nor removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    id: String,
    user_id: String,
    name: String,
    description: String,
    content: String,
    is_system: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PromptTemplate {
    pub fn new(user_id: impl Into<String>, template: NewTemplate) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: template.name,
            description: template.description,
            content: template.content,
            is_system: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_system(
        user_id: impl Into<String>,
        name: &str,
        description: &str,
        content: &str,
    ) -> Self {
        Self::new(user_id, NewTemplate::new(name, description, content)).with_system(true)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_system(mut self, is_system: bool) -> Self {
        self.is_system = is_system;
        self
    }

    pub fn with_created_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.created_at = timestamp;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Prefixes `input` with the template content, separated by a blank line.
    pub fn apply_to(&self, input: &str) -> String {
        format!("{}\n\n{}", self.content, input)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewTemplate {
    pub name: String,
    pub description: String,
    pub content: String,
}

impl NewTemplate {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl TemplateUpdate {
    pub fn apply(&self, template: &mut PromptTemplate, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            template.name = name.clone();
        }
        if let Some(description) = &self.description {
            template.description = description.clone();
        }
        if let Some(content) = &self.content {
            template.content = content.clone();
        }
        if now > template.updated_at {
            template.updated_at = now;
        }
    }
}
