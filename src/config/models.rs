use serde::{Deserialize, Serialize};

use super::constants::LOCAL_DB_PATH;
use super::defaults::*;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Configuration {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default)]
    pub verbose: bool,

    #[serde(default = "user_id")]
    pub user_id: String,

    #[serde(default)]
    pub user_email: Option<String>,

    #[serde(default = "user_name")]
    pub user_name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogConfig {
    #[serde(default = "log_level")]
    pub level: Option<String>,

    #[serde(default)]
    pub filters: Option<Vec<LogFilter>>,

    #[serde(default)]
    pub file: LogFile,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFilter {
    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFile {
    #[serde(default = "log_file_path")]
    pub path: String,

    #[serde(default)]
    pub append: bool,
}

/// Connection settings for the OpenAI compatible chat gateway.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GatewayConfig {
    #[serde(default = "gateway_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "temperature")]
    pub temperature: f32,

    #[serde(default = "max_tokens")]
    pub max_tokens: usize,

    #[serde(default)]
    pub timeout_secs: Option<u16>,

    #[serde(default = "referer")]
    pub referer: Option<String>,

    #[serde(default = "app_title")]
    pub app_title: Option<String>,
}

/// The PostgREST backend. When disabled every AI record lives in local
/// storage only.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct RemoteConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u16>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub enum StorageConfig {
    #[serde(rename = "sqlite")]
    Sqlite(SqliteStorage),

    #[serde(rename = "memory")]
    Memory,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SqliteStorage {
    pub path: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AiConfig {
    #[serde(default = "default_true")]
    pub auto_title: bool,

    #[serde(default = "default_true")]
    pub stream_response: bool,

    #[serde(default = "max_history_messages")]
    pub max_history_messages: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            log: LogConfig::default(),
            gateway: GatewayConfig::default(),
            remote: RemoteConfig::default(),
            storage: StorageConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            user_id: user_id(),
            user_email: None,
            user_name: user_name(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: log_level(),
            file: LogFile::default(),
            filters: None,
        }
    }
}

impl Default for LogFile {
    fn default() -> Self {
        Self {
            path: log_file_path(),
            append: false,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: gateway_endpoint(),
            api_key: None,
            default_model: default_model(),
            temperature: temperature(),
            max_tokens: max_tokens(),
            timeout_secs: None,
            referer: referer(),
            app_title: app_title(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Sqlite(SqliteStorage::default())
    }
}

impl Default for SqliteStorage {
    fn default() -> Self {
        Self {
            path: Some(LOCAL_DB_PATH.to_string()),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            auto_title: true,
            stream_response: true,
            max_history_messages: max_history_messages(),
        }
    }
}
