use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeEntry {
    pub id: Uuid,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: String,
    #[serde(default)]
    pub locked: bool,
    pub created_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    pub fn new(content: impl Into<String>, tags: Vec<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            tags,
            source: source.into(),
            locked: false,
            created_at: Utc::now(),
        }
    }

    pub fn locked(content: impl Into<String>, tags: Vec<String>, source: impl Into<String>) -> Self {
        Self {
            locked: true,
            ..Self::new(content, tags, source)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgePatch {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub source: Option<String>,
    pub locked: Option<bool>,
}

impl KnowledgePatch {
    pub fn locked(value: bool) -> Self {
        Self {
            locked: Some(value),
            ..Self::default()
        }
    }

    pub fn apply(&self, entry: &mut KnowledgeEntry) {
        if let Some(content) = &self.content {
            entry.content = content.clone();
        }
        if let Some(tags) = &self.tags {
            entry.tags = tags.clone();
        }
        if let Some(source) = &self.source {
            entry.source = source.clone();
        }
        if let Some(locked) = self.locked {
            entry.locked = locked;
        }
    }
}
