pub mod chat;
pub mod knowledge;
pub mod provider;
pub mod snapshot;

pub use chat::{ChatMessage, MessageRole};
pub use knowledge::{KnowledgeEntry, KnowledgePatch};
pub use provider::{Provider, ProviderKind, ProviderPatch};
pub use snapshot::{SCHEMA_VERSION, WorkspaceSnapshot};
