use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::ChatMessage;
use crate::knowledge::KnowledgeEntry;
use crate::provider::Provider;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceSnapshot {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub knowledge: Vec<KnowledgeEntry>,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub selected_provider: Option<Uuid>,
}

impl WorkspaceSnapshot {
    pub fn seeded() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            providers: Provider::seed_defaults(),
            knowledge: Vec::new(),
            chat_history: Vec::new(),
            selected_provider: None,
        }
    }

    pub fn provider(&self, id: Uuid) -> Option<&Provider> {
        self.providers.iter().find(|provider| provider.id == id)
    }

    pub fn provider_mut(&mut self, id: Uuid) -> Option<&mut Provider> {
        self.providers.iter_mut().find(|provider| provider.id == id)
    }

    pub fn knowledge_mut(&mut self, id: Uuid) -> Option<&mut KnowledgeEntry> {
        self.knowledge.iter_mut().find(|entry| entry.id == id)
    }

    pub fn message(&self, id: Uuid) -> Option<&ChatMessage> {
        self.chat_history.iter().find(|message| message.id == id)
    }

    pub fn locked_knowledge(&self) -> impl Iterator<Item = &KnowledgeEntry> {
        self.knowledge.iter().filter(|entry| entry.locked)
    }
}
