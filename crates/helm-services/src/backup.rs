use std::{fs, path::Path};

use anyhow::{Context, Result};
use helm_core::WorkspaceSnapshot;
use helm_store::upgrade_snapshot_value;

use crate::services::AppServices;

#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub providers: usize,
    pub knowledge: usize,
    pub messages: usize,
}

pub(crate) fn export_backup_json(services: &AppServices, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create backup dir {}", parent.display()))?;
    }

    let snapshot = services.snapshot();
    fs::write(path, serde_json::to_string_pretty(&snapshot)?)
        .with_context(|| format!("failed to write backup {}", path.display()))?;
    Ok(())
}

// Backups share the snapshot shape, so an export from the legacy web client
// imports through the same migration as the store load path.
pub(crate) fn import_backup_json(
    services: &AppServices,
    path: impl AsRef<Path>,
) -> Result<ImportReport> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse json {}", path.display()))?;
    upgrade_snapshot_value(&mut value)?;
    let snapshot: WorkspaceSnapshot = serde_json::from_value(value)?;

    let report = ImportReport {
        providers: snapshot.providers.len(),
        knowledge: snapshot.knowledge.len(),
        messages: snapshot.chat_history.len(),
    };
    services.mutate(|state| *state = snapshot)?;
    Ok(report)
}
