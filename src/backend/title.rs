#[cfg(test)]
#[path = "title_test.rs"]
mod tests;

use eyre::Result;

use super::ArcBackend;
use crate::{
    config::constants::{DEFAULT_CONVERSATION_TITLE, DEFAULT_NOTE_TITLE},
    models::{ChatMessage, ChatRole, NoteCategory},
};

const TITLE_TEMPERATURE: f32 = 0.7;
const HISTORY_WINDOW: usize = 6;
const NOTE_EXCERPT_CHARS: usize = 500;
const SHORT_NOTE_CHARS: usize = 30;

const MAX_TITLE_CHARS: usize = 25;
const FALLBACK_TITLE_CHARS: usize = 15;
const NOTE_FIRST_LINE_CHARS: usize = 20;

const DEFAULT_TITLES: [&str; 3] = [DEFAULT_CONVERSATION_TITLE, DEFAULT_NOTE_TITLE, "Untitled"];

/// Asks the gateway for short titles and falls back to a slice of the input
/// whenever the answer is missing or unusable.
pub struct TitleGenerator {
    backend: ArcBackend,
    model: String,
}

impl TitleGenerator {
    pub fn new(backend: ArcBackend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub async fn generate_conversation_title(
        &self,
        user_message: &str,
        ai_response: &str,
        history: &[ChatMessage],
    ) -> String {
        let mut content = String::new();
        if !history.is_empty() {
            content.push_str("Conversation history:\n");
            let start = history.len().saturating_sub(HISTORY_WINDOW);
            for msg in &history[start..] {
                content.push_str(&format!("{}: {}\n", speaker(msg.role), msg.content));
            }
            content.push('\n');
        }
        content.push_str(&format!(
            "Latest exchange:\nUser: {}\nAI: {}",
            user_message, ai_response
        ));

        let prompt = format!(
            "Write a short, precise title for the following AI conversation.\n\n\
             {}\n\n\
             Requirements:\n\
             1. Capture the core topic of the conversation\n\
             2. Keep it between 10 and 20 characters\n\
             3. Be specific rather than generic\n\
             4. Reply with the title text only, without quotes or formatting\n\n\
             Bad: \"AI chat\", \"Question\"\n\
             Good: \"Python data cleaning\", \"Sprint planning tips\"",
            content
        );

        match self.ask(prompt).await {
            Ok(raw) => clean_title(&raw).unwrap_or_else(|| fallback_title(user_message)),
            Err(err) => {
                log::error!("Generating conversation title failed: {:#}", err);
                fallback_title(user_message)
            }
        }
    }

    pub async fn generate_note_title(&self, content: &str, category: NoteCategory) -> String {
        if content.trim().is_empty() {
            return DEFAULT_NOTE_TITLE.to_string();
        }

        if content.chars().count() <= SHORT_NOTE_CHARS {
            return take_chars(&flatten(content.trim()), NOTE_FIRST_LINE_CHARS);
        }

        let mut excerpt = take_chars(content, NOTE_EXCERPT_CHARS);
        if content.chars().count() > NOTE_EXCERPT_CHARS {
            excerpt.push_str("...");
        }

        let prompt = format!(
            "Write a short, precise title for the following note.\n\n\
             Category: {}\n\n\
             Note:\n{}\n\n\
             Requirements:\n\
             1. Capture the core content of the note\n\
             2. Keep it between 8 and 15 characters\n\
             3. Be specific and meaningful\n\
             4. Reply with the title text only, without quotes or formatting",
            category.hint(),
            excerpt
        );

        match self.ask(prompt).await {
            Ok(raw) => clean_title(&raw).unwrap_or_else(|| note_fallback_title(content)),
            Err(err) => {
                log::error!("Generating note title failed: {:#}", err);
                note_fallback_title(content)
            }
        }
    }

    /// Suggests a title for each `(id, content, category)`, one request at a
    /// time.
    pub async fn suggest_note_titles(
        &self,
        notes: &[(String, String, NoteCategory)],
    ) -> Vec<(String, String)> {
        let mut suggestions = Vec::with_capacity(notes.len());
        for (id, content, category) in notes {
            let title = self.generate_note_title(content, *category).await;
            suggestions.push((id.clone(), title));
        }
        suggestions
    }

    async fn ask(&self, prompt: String) -> Result<String> {
        self.backend
            .send_chat(&[ChatMessage::user(prompt)], &self.model, TITLE_TEMPERATURE)
            .await
    }
}

fn speaker(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "User",
        _ => "AI",
    }
}

fn take_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn flatten(s: &str) -> String {
    s.replace('\n', " ")
}

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '「' | '」' | '『' | '』')
}

/// Normalises a model answer into a title, or `None` if it is unusable.
pub fn clean_title(raw: &str) -> Option<String> {
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned.strip_prefix(is_quote) {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix(is_quote) {
        cleaned = rest;
    }

    let mut cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() > MAX_TITLE_CHARS {
        cleaned = take_chars(&cleaned, MAX_TITLE_CHARS) + "...";
    }

    let len = cleaned.chars().count();
    if !(2..=30).contains(&len) {
        return None;
    }
    Some(cleaned)
}

pub fn fallback_title(user_message: &str) -> String {
    let clean = flatten(user_message.trim());
    if clean.chars().count() <= FALLBACK_TITLE_CHARS {
        return clean;
    }
    take_chars(&clean, FALLBACK_TITLE_CHARS) + "..."
}

pub fn note_fallback_title(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default().trim();
    let len = first_line.chars().count();
    if len > 0 && len <= NOTE_FIRST_LINE_CHARS {
        return first_line.to_string();
    }

    let preview = take_chars(&flatten(content.trim()), FALLBACK_TITLE_CHARS);
    if preview.is_empty() {
        return DEFAULT_NOTE_TITLE.to_string();
    }
    preview
}

/// Whether `current` looks like a placeholder worth replacing.
pub fn should_update_title(current: &str, content: &str) -> bool {
    if DEFAULT_TITLES.contains(&current) {
        return true;
    }

    let title_len = current.chars().count();
    title_len < 3 || (content.chars().count() > 100 && title_len < 8)
}
