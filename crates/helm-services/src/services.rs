use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use helm_core::{
    ChatMessage, KnowledgeEntry, KnowledgePatch, MessageRole, Provider, ProviderKind,
    ProviderPatch, WorkspaceSnapshot,
};
use helm_store::HelmStore;
use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::reply::{PendingReply, REPLY_DELAY, compose_reply};

pub struct AppServicesBuilder {
    pub db_path: PathBuf,
}

impl AppServicesBuilder {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub fn build(self) -> Result<AppServices> {
        let store = HelmStore::open(&self.db_path)
            .with_context(|| format!("failed to open store {}", self.db_path.display()))?;
        let snapshot = store.load_snapshot_or_seed()?;
        let runtime = Runtime::new().context("failed to start reply runtime")?;

        Ok(AppServices {
            store: Arc::new(store),
            state: Arc::new(Mutex::new(snapshot)),
            runtime: Arc::new(runtime),
        })
    }
}

#[derive(Clone)]
pub struct AppServices {
    pub(crate) store: Arc<HelmStore>,
    pub(crate) state: Arc<Mutex<WorkspaceSnapshot>>,
    runtime: Arc<Runtime>,
}

#[derive(Debug, Clone)]
pub struct FlowSummary {
    pub active_providers: Vec<Provider>,
    pub locked_entries: usize,
    pub total_entries: usize,
    pub total_messages: usize,
}

impl AppServices {
    // Every mutation runs under the state lock and persists the whole
    // snapshot before the lock is released.
    pub(crate) fn mutate<R>(&self, apply: impl FnOnce(&mut WorkspaceSnapshot) -> R) -> Result<R> {
        let mut snapshot = self.state.lock();
        let output = apply(&mut snapshot);
        self.store.save_snapshot(&snapshot)?;
        Ok(output)
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        self.state.lock().clone()
    }

    pub fn providers(&self) -> Vec<Provider> {
        self.state.lock().providers.clone()
    }

    pub fn provider(&self, id: Uuid) -> Option<Provider> {
        self.state.lock().provider(id).cloned()
    }

    pub fn knowledge(&self) -> Vec<KnowledgeEntry> {
        self.state.lock().knowledge.clone()
    }

    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.state.lock().chat_history.clone()
    }

    pub fn messages_for(&self, provider_id: Uuid) -> Vec<ChatMessage> {
        self.state
            .lock()
            .chat_history
            .iter()
            .filter(|message| message.provider_id == provider_id)
            .cloned()
            .collect()
    }

    pub fn selected_provider(&self) -> Option<Uuid> {
        self.state.lock().selected_provider
    }

    pub fn flow_summary(&self) -> FlowSummary {
        let snapshot = self.state.lock();
        FlowSummary {
            active_providers: snapshot
                .providers
                .iter()
                .filter(|provider| provider.enabled)
                .cloned()
                .collect(),
            locked_entries: snapshot.locked_knowledge().count(),
            total_entries: snapshot.knowledge.len(),
            total_messages: snapshot.chat_history.len(),
        }
    }

    pub fn add_provider(
        &self,
        name: impl Into<String>,
        kind: ProviderKind,
        accent_color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Result<Provider> {
        let provider = Provider::new(name, kind, accent_color, icon);
        self.mutate(|snapshot| snapshot.providers.push(provider.clone()))?;
        info!(provider = %provider.id, "provider added");
        Ok(provider)
    }

    pub fn update_provider(&self, id: Uuid, patch: ProviderPatch) -> Result<bool> {
        self.mutate(|snapshot| match snapshot.provider_mut(id) {
            Some(provider) => {
                patch.apply(provider);
                true
            }
            None => false,
        })
    }

    pub fn configure_provider(&self, id: Uuid, api_key: impl Into<String>) -> Result<bool> {
        let api_key = api_key.into();
        let enabled = !api_key.trim().is_empty();
        self.update_provider(
            id,
            ProviderPatch {
                api_key: Some(api_key),
                enabled: Some(enabled),
                ..ProviderPatch::default()
            },
        )
    }

    pub fn remove_provider(&self, id: Uuid) -> Result<bool> {
        self.mutate(|snapshot| {
            let before = snapshot.providers.len();
            snapshot.providers.retain(|provider| provider.id != id);
            snapshot.providers.len() != before
        })
    }

    pub fn add_knowledge(
        &self,
        content: impl Into<String>,
        tags: Vec<String>,
        source: impl Into<String>,
        locked: bool,
    ) -> Result<KnowledgeEntry> {
        let entry = if locked {
            KnowledgeEntry::locked(content, tags, source)
        } else {
            KnowledgeEntry::new(content, tags, source)
        };
        self.mutate(|snapshot| snapshot.knowledge.push(entry.clone()))?;
        Ok(entry)
    }

    pub fn update_knowledge(&self, id: Uuid, patch: KnowledgePatch) -> Result<bool> {
        self.mutate(|snapshot| match snapshot.knowledge_mut(id) {
            Some(entry) => {
                patch.apply(entry);
                true
            }
            None => false,
        })
    }

    pub fn remove_knowledge(&self, id: Uuid) -> Result<bool> {
        self.mutate(|snapshot| {
            let before = snapshot.knowledge.len();
            snapshot.knowledge.retain(|entry| entry.id != id);
            snapshot.knowledge.len() != before
        })
    }

    pub fn toggle_knowledge_lock(&self, id: Uuid) -> Result<Option<bool>> {
        self.mutate(|snapshot| {
            snapshot.knowledge_mut(id).map(|entry| {
                entry.locked = !entry.locked;
                entry.locked
            })
        })
    }

    pub fn clear_history(&self) -> Result<()> {
        self.mutate(|snapshot| snapshot.chat_history.clear())
    }

    pub fn select_provider(&self, id: Option<Uuid>) -> Result<()> {
        self.mutate(|snapshot| snapshot.selected_provider = id)
    }

    // Raw append, used by backup tooling and tests. Association to a
    // provider id is not validated; messages may outlive their provider.
    pub fn append_message(
        &self,
        provider_id: Uuid,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<ChatMessage> {
        let message = match role {
            MessageRole::User => ChatMessage::user(provider_id, content),
            MessageRole::Assistant => ChatMessage::assistant(provider_id, content),
        };
        self.mutate(|snapshot| snapshot.chat_history.push(message.clone()))?;
        Ok(message)
    }

    pub fn send_chat_message(
        &self,
        provider_id: Uuid,
        content: impl Into<String>,
    ) -> Result<(ChatMessage, PendingReply)> {
        let content = content.into();
        let provider = self
            .provider(provider_id)
            .ok_or_else(|| anyhow!("provider not found: {provider_id}"))?;
        if !provider.enabled {
            bail!("provider {} is not enabled", provider.name);
        }

        let message = ChatMessage::user(provider_id, content.clone());
        self.mutate(|snapshot| snapshot.chat_history.push(message.clone()))?;
        info!(provider = %provider_id, "user message appended");

        Ok((message, self.schedule_reply(provider_id, content)))
    }

    // The simulated reply reads the locked context when the timer fires, not
    // when the message was sent.
    fn schedule_reply(&self, provider_id: Uuid, user_input: String) -> PendingReply {
        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(REPLY_DELAY).await;

            let mut snapshot = state.lock();
            let Some(provider) = snapshot.provider(provider_id).cloned() else {
                return;
            };

            let locked: Vec<KnowledgeEntry> = snapshot.locked_knowledge().cloned().collect();
            let start = locked.len().saturating_sub(3);
            let reply = compose_reply(&provider, &user_input, &locked[start..]);

            snapshot
                .chat_history
                .push(ChatMessage::assistant(provider_id, reply));
            if let Err(error) = store.save_snapshot(&snapshot) {
                warn!(%error, "failed to persist assistant reply");
            }
            info!(provider = %provider_id, "assistant reply appended");
        });

        PendingReply::new(provider_id, handle)
    }

    pub fn lock_message_to_knowledge(&self, message_id: Uuid) -> Result<Option<KnowledgeEntry>> {
        self.mutate(|snapshot| {
            let message = snapshot.message(message_id).cloned()?;
            let (source, kind_label) = match snapshot.provider(message.provider_id) {
                Some(provider) => (provider.name.clone(), provider.kind.label()),
                None => ("Unknown".to_owned(), "unknown"),
            };

            let entry = KnowledgeEntry::locked(
                message.content,
                vec!["chat".to_owned(), kind_label.to_owned()],
                source,
            );
            snapshot.knowledge.push(entry.clone());
            Some(entry)
        })
    }

    pub fn export_backup_json(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        crate::backup::export_backup_json(self, path)
    }

    pub fn import_backup_json(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<crate::ImportReport> {
        crate::backup::import_backup_json(self, path)
    }
}
