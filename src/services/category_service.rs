// CategoryService - Category normalization, materialization and orphan cleanup
//
// Every operation takes one settings snapshot up front and works through the
// document store sequentially. Bulk operations contain failures per document
// and always finish with a report.

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{ensure_parent, DocumentFailure};
use crate::config::{Settings, SettingsHandle};
use crate::contracts::{DocumentStore, MetadataIndexer, Notifier};
use crate::observability::{log_operation, record_metric, MetricType, Operation, OperationContext};
use crate::path_utils::{is_excluded, is_hidden, is_within_folder};
use crate::pure::templates::{index_path, render_index, render_view, view_path, VIEW_EXTENSION};
use crate::pure::{dedupe, normalize_document, reconcile, RewriteOutcome};
use crate::types::{CategoryName, VaultFile, VaultPath};

/// Why a document was not processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    NotMarkdown,
    Excluded,
    /// A mirror inside the public folder; its source is processed instead
    PublicCopy,
    /// No frontmatter or no `categories` field
    NoCategories,
}

/// Result of processing one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProcessOutcome {
    Skipped(SkipReason),
    Processed {
        categories: Vec<CategoryName>,
        rewritten: bool,
        /// Categories whose index or view file was created
        created: Vec<String>,
    },
}

impl ProcessOutcome {
    pub fn categories(&self) -> &[CategoryName] {
        match self {
            ProcessOutcome::Processed { categories, .. } => categories,
            ProcessOutcome::Skipped(_) => &[],
        }
    }

    pub fn is_rewritten(&self) -> bool {
        matches!(self, ProcessOutcome::Processed { rewritten: true, .. })
    }
}

/// Summary of a full sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Distinct categories across all processed documents
    pub categories_found: usize,
    /// Documents whose categories field was processed
    pub files_processed: usize,
    /// Documents that were rewritten
    pub files_rewritten: usize,
    pub errors: usize,
    pub failures: Vec<DocumentFailure>,
}

/// Used categories against materialized ones, for display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryOverview {
    pub used: Vec<String>,
    pub existing: Vec<String>,
    /// Used categories without an index note
    pub missing_index: Vec<String>,
    /// Used categories without a view file
    pub missing_view: Vec<String>,
}

/// Result of deleting orphaned categories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub deleted: Vec<String>,
    /// Names that are still in use or do not exist
    pub refused: Vec<String>,
    pub failures: Vec<DocumentFailure>,
}

/// Index and view names present in the vault
#[derive(Debug, Default)]
struct Companions {
    index: Vec<String>,
    views: Vec<String>,
}

/// Service for category operations over one vault
pub struct CategoryService {
    store: Arc<dyn DocumentStore>,
    indexer: Arc<dyn MetadataIndexer>,
    notifier: Arc<dyn Notifier>,
    settings: SettingsHandle,
}

impl CategoryService {
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

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn notify(&self, settings: &Settings, message: &str) {
        if settings.show_notifications {
            self.notifier.notify(message);
        }
    }

    /// Process every eligible document in listing order
    pub async fn sync_all(&self) -> Result<SyncReport> {
        self.sync_all_with_progress(|_, _, _| {}).await
    }

    /// Like [`sync_all`](Self::sync_all), reporting `(done, total, path)` after each document
    #[instrument(skip(self, progress))]
    pub async fn sync_all_with_progress(
        &self,
        mut progress: impl FnMut(usize, usize, &VaultPath) + Send,
    ) -> Result<SyncReport> {
        let settings = self.settings.current();
        let ctx = OperationContext::new("sync_all");

        let files: Vec<VaultFile> = self
            .store
            .list()
            .await
            .context("Failed to list vault documents")?
            .into_iter()
            .filter(|file| eligibility(&settings, file).is_none())
            .collect();
        let total = files.len();
        info!("Syncing categories across {} documents", total);
        log_operation(
            &ctx,
            &Operation::SyncStart {
                document_count: total,
            },
            &Ok(()),
        );

        let mut companions = self.companions(&settings).await?;
        let mut report = SyncReport::default();
        let mut used: Vec<String> = Vec::new();

        for (done, file) in files.iter().enumerate() {
            match self.process_file(&settings, file, &mut companions).await {
                Ok(ProcessOutcome::Processed {
                    categories,
                    rewritten,
                    ..
                }) => {
                    report.files_processed += 1;
                    if rewritten {
                        report.files_rewritten += 1;
                    }
                    used.extend(categories.iter().map(|name| name.as_str().to_string()));
                }
                Ok(ProcessOutcome::Skipped(reason)) => {
                    debug!("Skipped {}: {:?}", file.path, reason);
                }
                Err(e) => {
                    warn!("Failed to process {}: {:#}", file.path, e);
                    self.notify(&settings, &format!("Error processing {}: {:#}", file.path, e));
                    report.errors += 1;
                    report
                        .failures
                        .push(DocumentFailure::new(file.path.as_str(), &e));
                }
            }
            progress(done + 1, total, &file.path);
        }

        report.categories_found = dedupe(&used, settings.case_sensitivity()).len();

        log_operation(
            &ctx,
            &Operation::SyncComplete {
                files_processed: report.files_processed,
                categories_found: report.categories_found,
                errors: report.errors,
            },
            &Ok(()),
        );
        record_metric(MetricType::Timer {
            name: "sync_all.duration",
            duration: ctx.elapsed(),
        });
        self.notify(
            &settings,
            &format!(
                "Synced {} categories across {} files ({} errors)",
                report.categories_found, report.files_processed, report.errors
            ),
        );
        Ok(report)
    }

    /// Process a single document
    ///
    /// Failures are reported through the notifier and returned.
    pub async fn process_one(&self, file: &VaultFile) -> Result<ProcessOutcome> {
        let settings = self.settings.current();
        if let Some(reason) = eligibility(&settings, file) {
            return Ok(ProcessOutcome::Skipped(reason));
        }

        let result = async {
            let mut companions = self.companions(&settings).await?;
            self.process_file(&settings, file, &mut companions).await
        }
        .await;

        if let Err(e) = &result {
            self.notify(&settings, &format!("Error processing {}: {:#}", file.path, e));
        }
        result
    }

    async fn process_file(
        &self,
        settings: &Settings,
        file: &VaultFile,
        companions: &mut Companions,
    ) -> Result<ProcessOutcome> {
        let ctx = OperationContext::new("process_one");
        let content = self.store.read(file).await?;
        let frontmatter = self.indexer.metadata(&content);

        let Some((build, outcome)) = normalize_document(
            &content,
            frontmatter.as_ref(),
            &settings.nested_separator,
            settings.case_sensitivity(),
        ) else {
            return Ok(ProcessOutcome::Skipped(SkipReason::NoCategories));
        };

        for warning in &build.warnings {
            warn!("{}: {}", file.path, warning);
            self.notify(settings, &format!("{}: {}", file.path, warning));
        }

        let rewritten = outcome.is_rewritten();
        if let RewriteOutcome::Rewritten(updated) = outcome {
            self.store.write(file, &updated).await?;
            info!("Normalized categories in {}", file.path);
        }

        let created = self
            .materialize(settings, build.set.names(), companions)
            .await?;

        log_operation(
            &ctx,
            &Operation::CategoriesNormalized {
                path: file.path.to_string(),
                category_count: build.set.len(),
                rewritten,
            },
            &Ok(()),
        );

        Ok(ProcessOutcome::Processed {
            categories: build.set.names().to_vec(),
            rewritten,
            created,
        })
    }

    /// Create index and view files for names that have none yet
    async fn materialize(
        &self,
        settings: &Settings,
        names: &[CategoryName],
        companions: &mut Companions,
    ) -> Result<Vec<String>> {
        let policy = settings.case_sensitivity();
        let missing_index = reconcile(names, &companions.index, policy).missing;
        let missing_view = reconcile(names, &companions.views, policy).missing;

        let mut created = Vec::new();
        for name in &missing_index {
            let path = VaultPath::new(index_path(settings, name))?;
            self.create_companion(&path, &render_index(settings, name))
                .await?;
            companions.index.push(name.clone());
            created.push(name.clone());
        }
        for name in &missing_view {
            let path = VaultPath::new(view_path(settings, name))?;
            self.create_companion(&path, &render_view(&settings.base_template, name))
                .await?;
            companions.views.push(name.clone());
            if !created.contains(name) {
                created.push(name.clone());
            }
        }

        for name in &created {
            let ctx = OperationContext::new("materialize");
            log_operation(
                &ctx,
                &Operation::CategoryMaterialized { name: name.clone() },
                &Ok(()),
            );
            self.notify(settings, &format!("Created category: {name}"));
        }
        Ok(created)
    }

    async fn create_companion(&self, path: &VaultPath, content: &str) -> Result<()> {
        if self.store.exists(path).await?.is_some() {
            return Ok(());
        }
        ensure_parent(self.store.as_ref(), path).await?;
        self.store.create(path, content).await?;
        Ok(())
    }

    async fn companions(&self, settings: &Settings) -> Result<Companions> {
        let files = self
            .store
            .list()
            .await
            .context("Failed to list vault documents")?;
        let mut companions = Companions::default();
        for file in files {
            if in_folder(&file.path, &settings.categories_folder) && file.is_markdown() {
                companions.index.push(file.basename().to_string());
            } else if in_folder(&file.path, &settings.bases_folder)
                && file.extension == VIEW_EXTENSION
            {
                companions.views.push(file.basename().to_string());
            }
        }
        Ok(companions)
    }

    /// Categories used by documents, without modifying anything
    async fn used_categories(&self, settings: &Settings) -> Result<Vec<String>> {
        let mut used = Vec::new();
        for file in self.store.list().await? {
            if eligibility(settings, &file).is_some() {
                continue;
            }
            let content = match self.store.read(&file).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping unreadable {}: {:#}", file.path, e);
                    continue;
                }
            };
            let frontmatter = self.indexer.metadata(&content);
            if let Some((build, _)) = normalize_document(
                &content,
                frontmatter.as_ref(),
                &settings.nested_separator,
                settings.case_sensitivity(),
            ) {
                used.extend(build.set.iter().map(|name| name.as_str().to_string()));
            }
        }
        Ok(dedupe(&used, settings.case_sensitivity()))
    }

    /// Used and existing categories, sorted, with missing companion markers
    pub async fn list_used_vs_existing(&self) -> Result<CategoryOverview> {
        let settings = self.settings.current();
        let policy = settings.case_sensitivity();

        let mut used = self.used_categories(&settings).await?;
        let companions = self.companions(&settings).await?;
        let mut existing = dedupe(&companions.index, policy);

        let mut missing_index = reconcile(&used, &existing, policy).missing;
        let mut missing_view = reconcile(&used, &companions.views, policy).missing;

        used.sort();
        existing.sort();
        missing_index.sort();
        missing_view.sort();

        Ok(CategoryOverview {
            used,
            existing,
            missing_index,
            missing_view,
        })
    }

    /// Existing categories no document uses, sorted
    pub async fn find_orphans(&self) -> Result<Vec<String>> {
        let settings = self.settings.current();
        let used = self.used_categories(&settings).await?;
        let companions = self.companions(&settings).await?;
        let mut orphans = reconcile(&used, &companions.index, settings.case_sensitivity()).orphans;
        orphans.sort();
        Ok(orphans)
    }

    /// Delete the index note and view file of one category
    ///
    /// Returns false when neither file existed.
    pub async fn delete_orphan(&self, name: &str) -> Result<bool> {
        let settings = self.settings.current();
        let ctx = OperationContext::new("delete_orphan");

        let mut removed = false;
        for path in [index_path(&settings, name), view_path(&settings, name)] {
            let path = VaultPath::new(path)?;
            if let Some(entry) = self.store.exists(&path).await? {
                if let Some(file) = entry.as_file() {
                    self.store.delete(file).await?;
                    removed = true;
                }
            }
        }

        if removed {
            log_operation(
                &ctx,
                &Operation::OrphanRemoved {
                    name: name.to_string(),
                },
                &Ok(()),
            );
            self.notify(&settings, &format!("Deleted category: {name}"));
        }
        Ok(removed)
    }

    /// Delete several orphans; names still in use are refused
    pub async fn delete_orphans(&self, names: &[String]) -> Result<DeletionReport> {
        let settings = self.settings.current();
        let policy = settings.case_sensitivity();
        let orphans = self.find_orphans().await?;

        let mut report = DeletionReport::default();
        for name in names {
            let Some(orphan) = orphans.iter().find(|o| policy.equivalent(o, name)) else {
                report.refused.push(name.clone());
                continue;
            };
            match self.delete_orphan(orphan).await {
                Ok(true) => report.deleted.push(orphan.clone()),
                Ok(false) => report.refused.push(name.clone()),
                Err(e) => {
                    warn!("Failed to delete category {}: {:#}", orphan, e);
                    self.notify(&settings, &format!("Error deleting {orphan}: {e:#}"));
                    report.failures.push(DocumentFailure::new(orphan.as_str(), &e));
                }
            }
        }
        Ok(report)
    }
}

/// `None` when the document takes part in category processing
fn eligibility(settings: &Settings, file: &VaultFile) -> Option<SkipReason> {
    if !file.is_markdown() {
        return Some(SkipReason::NotMarkdown);
    }
    if is_hidden(file.path.as_str()) || is_excluded(file.path.as_str(), &settings.exclude_folders)
    {
        return Some(SkipReason::Excluded);
    }
    if is_within_folder(file.path.as_str(), &settings.public_folder) {
        return Some(SkipReason::PublicCopy);
    }
    None
}

/// Direct child of `folder`; an empty folder is the vault root
fn in_folder(path: &VaultPath, folder: &str) -> bool {
    match path.parent() {
        Some(parent) => parent.as_str() == folder,
        None => folder.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_storage::FileStore;
    use crate::metadata_index::FrontmatterIndexer;
    use crate::notifier::RecordingNotifier;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn service(dir: &TempDir) -> Result<(CategoryService, Arc<RecordingNotifier>)> {
        let notifier = Arc::new(RecordingNotifier::new());
        let service = CategoryService::new(
            Arc::new(FileStore::open(dir.path()).await?),
            Arc::new(FrontmatterIndexer),
            notifier.clone(),
            SettingsHandle::new(Settings::default()),
        );
        Ok((service, notifier))
    }

    #[tokio::test]
    async fn process_one_rewrites_and_materializes() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("trip.md"), "---\ncategories: Travel\n---\nBody\n")?;
        let (service, notifier) = service(&dir).await?;

        let outcome = service.process_one(&VaultFile::from_path("trip.md")?).await?;
        assert!(outcome.is_rewritten());
        assert_eq!(outcome.categories()[0].as_str(), "Travel");

        let content = std::fs::read_to_string(dir.path().join("trip.md"))?;
        assert_eq!(content, "---\ncategories:\n  - \"[[Travel]]\"\n---\nBody\n");
        assert!(dir.path().join("Categories/Travel.md").is_file());
        assert!(dir.path().join("Templates/Bases/Travel.base").is_file());
        assert!(notifier
            .messages()
            .contains(&"Created category: Travel".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn excluded_documents_are_skipped() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::create_dir_all(dir.path().join("Templates"))?;
        std::fs::write(
            dir.path().join("Templates/t.md"),
            "---\ncategories: X\n---\n",
        )?;
        let (service, _) = service(&dir).await?;

        let outcome = service
            .process_one(&VaultFile::from_path("Templates/t.md")?)
            .await?;
        assert_eq!(outcome, ProcessOutcome::Skipped(SkipReason::Excluded));
        assert!(!dir.path().join("Categories").exists());
        Ok(())
    }

    #[tokio::test]
    async fn existing_index_satisfies_case_insensitive_names() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::create_dir_all(dir.path().join("Categories"))?;
        std::fs::create_dir_all(dir.path().join("Templates/Bases"))?;
        std::fs::write(dir.path().join("Categories/Books.md"), "index")?;
        std::fs::write(dir.path().join("Templates/Bases/Books.base"), "view")?;
        std::fs::write(
            dir.path().join("a.md"),
            "---\ncategories:\n  - \"[[books]]\"\n---\n",
        )?;
        let (service, _) = service(&dir).await?;
        service.settings().update(|s| {
            s.case_sensitive = false;
            Ok(())
        })?;

        let outcome = service.process_one(&VaultFile::from_path("a.md")?).await?;
        let ProcessOutcome::Processed { created, rewritten, .. } = outcome else {
            panic!("expected the document to be processed");
        };
        assert!(created.is_empty());
        assert!(!rewritten);
        Ok(())
    }

    #[test]
    fn in_folder_only_matches_direct_children() {
        let path = VaultPath::new("Categories/Books.md").unwrap();
        assert!(in_folder(&path, "Categories"));
        assert!(!in_folder(&path, "Other"));
        let nested = VaultPath::new("Categories/Sub/Books.md").unwrap();
        assert!(!in_folder(&nested, "Categories"));
        let root = VaultPath::new("Books.md").unwrap();
        assert!(in_folder(&root, ""));
    }
}
