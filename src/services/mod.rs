// Services Layer - Business logic shared by the CLI and the watcher
//
// Services compose the pure category functions with the collaborator traits
// (document store, metadata indexer, notifier) and own per-document failure
// containment for bulk operations.

pub mod category_service;
pub mod publish_service;

pub use category_service::{
    CategoryOverview, CategoryService, DeletionReport, ProcessOutcome, SkipReason, SyncReport,
};
pub use publish_service::{PublishReport, PublishService};

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::contracts::DocumentStore;
use crate::types::VaultPath;

/// A document that failed during a bulk operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub path: String,
    pub error: String,
}

impl DocumentFailure {
    pub fn new(path: impl Into<String>, error: &anyhow::Error) -> Self {
        Self {
            path: path.into(),
            error: format!("{error:#}"),
        }
    }
}

/// Make sure `folder` and all of its ancestors exist
///
/// A failed create is tolerated when the folder exists afterwards, which
/// happens when something else created it in the meantime.
pub(crate) async fn ensure_folder(store: &dyn DocumentStore, folder: &VaultPath) -> Result<()> {
    let mut ancestors = Vec::new();
    let mut current = Some(folder.clone());
    while let Some(path) = current {
        current = path.parent();
        ancestors.push(path);
    }

    for path in ancestors.into_iter().rev() {
        match store.exists(&path).await? {
            Some(entry) if entry.is_folder() => continue,
            Some(_) => anyhow::bail!("Cannot create folder {path}: a file is in the way"),
            None => {}
        }

        debug!("Creating folder {}", path);
        if let Err(e) = store.create_folder(&path).await {
            match store.exists(&path).await? {
                Some(entry) if entry.is_folder() => {
                    warn!("Folder {} appeared while creating it: {:#}", path, e);
                }
                _ => return Err(e),
            }
        }
    }
    Ok(())
}

/// Create the parent folders of a file path
pub(crate) async fn ensure_parent(store: &dyn DocumentStore, path: &VaultPath) -> Result<()> {
    match path.parent() {
        Some(parent) => ensure_folder(store, &parent).await,
        None => Ok(()),
    }
}
