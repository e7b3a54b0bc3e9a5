pub mod chat;
pub mod notes_export;
pub mod reminders;
pub mod transfer;

pub use chat::{ChatError, ChatReply, ChatService, ChatSession, ChatSettings};
pub use notes_export::{ExportPeriod, render_markdown};
pub use reminders::{DueStatus, due_status, due_tasks};
pub use transfer::{ImportError, WorkspaceExport, export_workspace, import_workspace};
