use chrono::{DateTime, Utc};

use crate::models::PromptTemplate;

/// (name, description, content)
const SYSTEM_TEMPLATES: &[(&str, &str, &str)] = &[
    (
        "Work Assistant",
        "Helps with work questions and tasks",
        "You are a professional work assistant. Please help me with the following work matter:",
    ),
    (
        "Learning Tutor",
        "Helps learning new knowledge and skills",
        "You are a patient tutor. Please explain the following in simple, easy to follow terms:",
    ),
    (
        "Creative Partner",
        "Sparks creative thinking and ideas",
        "You are a creative partner. Please help me look at the following from different angles:",
    ),
    (
        "Code Assistant",
        "Answers programming and technical questions",
        "You are an experienced programmer. Please help me analyze and solve the following technical problem:",
    ),
    (
        "Writing Assistant",
        "Helps drafting and polishing documents",
        "You are a professional writing assistant. Please help me improve the wording of the following text:",
    ),
];

pub(crate) fn system_templates(user_id: &str, now: DateTime<Utc>) -> Vec<PromptTemplate> {
    SYSTEM_TEMPLATES
        .iter()
        .map(|(name, description, content)| {
            PromptTemplate::new_system(user_id, name, description, content).with_created_at(now)
        })
        .collect()
}
