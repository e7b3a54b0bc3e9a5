pub mod handlers;

use clap::{Parser, Subcommand, ValueEnum};
use eyre::{Context, Result};

use crate::{
    config::{self, Configuration, apply_env_overrides, load_configuration, lookup_config_path},
    models::TaskPriority,
};

#[derive(Debug, Parser)]
#[command(
    version,
    about,
    long_about = r#"Projects, tasks, notes and an AI chat assistant

Default configuration file location looks up in the following order:
    * $XDG_CONFIG_HOME/taskpilot/config.toml
    * $HOME/.config/taskpilot/config.toml
    * $HOME/.taskpilot.toml
"#,
    disable_version_flag = true
)]
pub struct Command {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<String>,

    /// Print progress to stderr
    #[arg(long, global = true)]
    verbose: bool,

    /// Show the version
    #[arg(short, long)]
    version: bool,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    /// Manage AI conversations
    Conversations {
        #[command(subcommand)]
        action: Option<ConversationAction>,
    },
    /// Show the messages of a conversation, oldest first
    Messages { conversation_id: String },
    /// Manage prompt templates
    Templates {
        #[command(subcommand)]
        action: Option<TemplateAction>,
    },
    /// Send a message and stream the answer
    Chat {
        /// Conversation to continue; a new one is created when omitted
        #[arg(long)]
        conversation: Option<String>,
        /// Template whose content prefixes the message
        #[arg(long)]
        template: Option<String>,
        /// Model for a new conversation
        #[arg(long)]
        model: Option<String>,
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: Option<ProjectAction>,
    },
    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        action: Option<TaskAction>,
    },
    /// Manage notes
    Notes {
        #[command(subcommand)]
        action: Option<NoteAction>,
    },
    /// Back up or restore projects and tasks as JSON
    Data {
        #[command(subcommand)]
        action: DataAction,
    },
    /// Task and note statistics
    Stats,
    /// List the known chat models
    Models,
    /// Check that the gateway accepts the configured api key
    CheckKey,
    /// Delete every AI record kept in local storage
    ResetLocal,
}

#[derive(Debug, Subcommand)]
pub enum ConversationAction {
    List,
    New {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    Rename {
        id: String,
        title: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum TemplateAction {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        content: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    List,
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum TaskAction {
    List {
        #[arg(long)]
        project: Option<String>,
    },
    Add {
        title: String,
        #[arg(long)]
        project: Option<String>,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(long)]
        description: Option<String>,
    },
    Start {
        id: String,
    },
    Done {
        id: String,
    },
    Delete {
        id: String,
    },
    /// Open tasks that are overdue or due today or tomorrow
    Due,
}

#[derive(Debug, Subcommand)]
pub enum NoteAction {
    List {
        /// Text searched in titles and contents
        #[arg(long)]
        query: Option<String>,
        /// work, personal, study, ideas or other
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        favorites: bool,
    },
    Add {
        /// Generated from the content when omitted
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "other")]
        category: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        content: String,
    },
    Favorite {
        id: String,
    },
    Delete {
        id: String,
    },
    /// Write today's notes, or this week's, as a Markdown report
    Export {
        /// Export the current Monday-to-Sunday week instead of today
        #[arg(long)]
        week: bool,
        /// Directory the report is written to; stdout when omitted
        #[arg(long, value_name = "DIR")]
        output: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum DataAction {
    /// Write every project and task to a JSON file, or stdout
    Export {
        #[arg(long, value_name = "PATH")]
        output: Option<String>,
    },
    /// Replace every project and task with the content of a JSON export
    Import {
        path: String,
        /// Confirm that the current projects and tasks are discarded
        #[arg(long)]
        replace: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl From<Priority> for TaskPriority {
    fn from(value: Priority) -> Self {
        match value {
            Priority::Low => TaskPriority::Low,
            Priority::Medium => TaskPriority::Medium,
            Priority::High => TaskPriority::High,
        }
    }
}

impl Command {
    pub fn new() -> Command {
        Self::parse()
    }

    pub fn get_config(&self) -> Result<Configuration> {
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| lookup_config_path().unwrap_or_default());

        let mut config = if config_path.is_empty() {
            // Nothing to load, every section keeps its defaults
            Configuration::default()
        } else {
            load_configuration(config_path.as_str()).wrap_err("loading configuration")?
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        if self.verbose {
            config.general.verbose = true;
        }
        Ok(config)
    }

    pub fn version(&self) -> bool {
        self.version
    }

    pub fn print_version(&self) {
        println!("{}", config::version())
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }
}
