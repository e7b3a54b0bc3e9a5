/// Identity every record is scoped to when no user is configured
pub const DEFAULT_USER_ID: &str = "d357f1a4-7023-40ba-9378-3c2c8f3b9309";

pub const DEFAULT_USER_NAME: &str = "Taskpilot User";

pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const DEFAULT_MAX_TOKENS: usize = 2048;

pub const GATEWAY_ENDPOINT: &str = "https://openrouter.ai/api/v1";

pub const GATEWAY_REFERER: &str = "http://localhost:5173";

pub const GATEWAY_APP_TITLE: &str = "Taskpilot - AI Assistant";

/// Messages sent to the gateway as history, counted from the newest
pub const MAX_HISTORY_MESSAGES: usize = 50;

pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

pub const LOG_FILE_PATH: &str = "/tmp/taskpilot.log";

pub const LOCAL_DB_PATH: &str = "${HOME}/.local/share/taskpilot/local.db";
