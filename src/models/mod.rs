pub mod backend;
pub mod conversation;
pub mod message;
pub mod template;
pub mod workspace;

pub use backend::*;
pub use conversation::{Conversation, ConversationUpdate, NewConversation};
pub use message::{Message, Role};
pub use template::{NewTemplate, PromptTemplate, TemplateUpdate};
pub use workspace::*;
