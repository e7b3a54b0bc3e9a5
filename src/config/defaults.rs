use super::constants::*;

pub(crate) fn user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

pub(crate) fn user_name() -> String {
    DEFAULT_USER_NAME.to_string()
}

pub(crate) fn log_level() -> Option<String> {
    Some("info".to_string())
}

pub(crate) fn log_file_path() -> String {
    LOG_FILE_PATH.to_string()
}

pub(crate) fn gateway_endpoint() -> String {
    GATEWAY_ENDPOINT.to_string()
}

pub(crate) fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

pub(crate) fn temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

pub(crate) fn max_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}

pub(crate) fn referer() -> Option<String> {
    Some(GATEWAY_REFERER.to_string())
}

pub(crate) fn app_title() -> Option<String> {
    Some(GATEWAY_APP_TITLE.to_string())
}

pub(crate) fn max_history_messages() -> usize {
    MAX_HISTORY_MESSAGES
}

pub(crate) fn default_true() -> bool {
    true
}
