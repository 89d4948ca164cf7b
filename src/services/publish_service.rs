// PublishService - Mirror flagged notes into the public folder
//
// A note is published when its frontmatter carries the publish flag. Copies
// live at `{public_folder}/{source path}` and are kept identical to their
// source; copies without a published source are removed.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{ensure_parent, DocumentFailure};
use crate::config::{Settings, SettingsHandle};
use crate::contracts::{DocumentStore, MetadataIndexer, Notifier};
use crate::observability::{log_operation, Operation, OperationContext};
use crate::path_utils::{is_excluded, is_hidden, is_within_folder};
use crate::pure::{calculate_hash, extract_flag};
use crate::types::{VaultFile, VaultPath};

/// Summary of one publish pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub errors: usize,
    pub failures: Vec<DocumentFailure>,
}

impl PublishReport {
    pub fn has_changes(&self) -> bool {
        self.added + self.updated + self.removed > 0
    }

    fn fail(&mut self, path: &VaultPath, error: anyhow::Error) {
        warn!("Publish failed for {}: {:#}", path, error);
        self.errors += 1;
        self.failures.push(DocumentFailure::new(path.as_str(), &error));
    }
}

enum CopyOutcome {
    Added,
    Updated,
    Current,
}

pub struct PublishService {
    store: Arc<dyn DocumentStore>,
    indexer: Arc<dyn MetadataIndexer>,
    notifier: Arc<dyn Notifier>,
    settings: SettingsHandle,
}

impl PublishService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        indexer: Arc<dyn MetadataIndexer>,
        notifier: Arc<dyn Notifier>,
        settings: SettingsHandle,
    ) -> Self {
        Self {
            store,
            indexer,
            notifier,
            settings,
        }
    }

    /// Add, update and remove public copies so they match the flagged sources
    pub async fn sync(&self) -> Result<PublishReport> {
        let settings = self.settings.current();
        let ctx = OperationContext::new("publish_sync");
        let files = self
            .store
            .list()
            .await
            .context("Failed to list vault documents")?;

        let mut report = PublishReport::default();
        let mut published: HashSet<String> = HashSet::new();

        for file in files.iter().filter(|f| is_source(&settings, f)) {
            let content = match self.store.read(file).await {
                Ok(content) => content,
                Err(e) => {
                    report.fail(&file.path, e);
                    continue;
                }
            };
            let flagged = self
                .indexer
                .metadata(&content)
                .is_some_and(|fm| extract_flag(&fm, &settings.publish_key));
            if !flagged {
                continue;
            }

            published.insert(file.path.to_string());
            let target = match public_path(&settings, &file.path) {
                Ok(target) => target,
                Err(e) => {
                    report.fail(&file.path, e);
                    continue;
                }
            };
            match self.copy(&target, &content).await {
                Ok(CopyOutcome::Added) => report.added += 1,
                Ok(CopyOutcome::Updated) => report.updated += 1,
                Ok(CopyOutcome::Current) => debug!("{} is current", target),
                Err(e) => report.fail(&target, e),
            }
        }

        for file in files
            .iter()
            .filter(|f| f.is_markdown() && is_within_folder(f.path.as_str(), &settings.public_folder))
        {
            let source = source_path(&settings, &file.path);
            if published.contains(&source) {
                continue;
            }
            match self.store.delete(file).await {
                Ok(()) => {
                    info!("Removed unpublished copy {}", file.path);
                    report.removed += 1;
                }
                Err(e) => report.fail(&file.path, e),
            }
        }

        log_operation(
            &ctx,
            &Operation::PublishComplete {
                added: report.added,
                updated: report.updated,
                removed: report.removed,
                errors: report.errors,
            },
            &Ok(()),
        );
        if settings.show_notifications && (report.has_changes() || report.errors > 0) {
            self.notifier.notify(&format!(
                "Published: {} added, {} updated, {} removed ({} errors)",
                report.added, report.updated, report.removed, report.errors
            ));
        }
        Ok(report)
    }

    async fn copy(&self, target: &VaultPath, content: &str) -> Result<CopyOutcome> {
        match self.store.exists(target).await? {
            None => {
                ensure_parent(self.store.as_ref(), target).await?;
                self.store.create(target, content).await?;
                Ok(CopyOutcome::Added)
            }
            Some(entry) => {
                let file = entry
                    .as_file()
                    .ok_or_else(|| anyhow::anyhow!("A folder occupies {target}"))?;
                let current = self.store.read(file).await?;
                let (old, new) = (
                    calculate_hash(current.as_bytes()),
                    calculate_hash(content.as_bytes()),
                );
                if old == new {
                    return Ok(CopyOutcome::Current);
                }
                debug!(
                    "Updating {}: {} -> {}",
                    target,
                    &hex::encode(old)[..12],
                    &hex::encode(new)[..12]
                );
                self.store.write(file, content).await?;
                Ok(CopyOutcome::Updated)
            }
        }
    }
}

fn is_source(settings: &Settings, file: &VaultFile) -> bool {
    file.is_markdown()
        && !is_hidden(file.path.as_str())
        && !is_within_folder(file.path.as_str(), &settings.public_folder)
        && !is_excluded(file.path.as_str(), &settings.exclude_folders)
}

fn public_path(settings: &Settings, source: &VaultPath) -> Result<VaultPath> {
    VaultPath::new(format!("{}/{}", settings.public_folder, source))
}

fn source_path(settings: &Settings, public: &VaultPath) -> String {
    public
        .as_str()
        .strip_prefix(settings.public_folder.as_str())
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(public.as_str())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_between_source_and_public_paths() {
        let settings = Settings::default();
        let source = VaultPath::new("Notes/a.md").unwrap();
        let public = public_path(&settings, &source).unwrap();
        assert_eq!(public.as_str(), "Public/Notes/a.md");
        assert_eq!(source_path(&settings, &public), "Notes/a.md");
    }

    #[test]
    fn public_copies_are_not_sources() {
        let settings = Settings::default();
        assert!(is_source(&settings, &VaultFile::from_path("a.md").unwrap()));
        assert!(!is_source(&settings, &VaultFile::from_path("Public/a.md").unwrap()));
        assert!(!is_source(&settings, &VaultFile::from_path("Templates/a.md").unwrap()));
        assert!(!is_source(&settings, &VaultFile::from_path("img.png").unwrap()));
    }
}
