// Contract-First Design
// The host collaborators the category engine consumes: a document store, a
// metadata indexer and a notification surface. Each contract lists the
// preconditions callers must meet and the postconditions implementations keep.

use anyhow::Result;
use async_trait::async_trait;

use crate::pure::metadata::Frontmatter;
use crate::types::{VaultEntry, VaultFile, VaultPath};

/// Document store of the vault
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List every file of the vault
    ///
    /// # Postconditions
    /// - Files only, no folders
    /// - Stable listing order between calls when nothing changed
    async fn list(&self) -> Result<Vec<VaultFile>>;

    /// Read the full text of a file
    ///
    /// # Preconditions
    /// - `file` was obtained from this store
    async fn read(&self, file: &VaultFile) -> Result<String>;

    /// Replace the full text of an existing file
    ///
    /// # Postconditions
    /// - A subsequent `read` returns exactly `content`
    async fn write(&self, file: &VaultFile, content: &str) -> Result<()>;

    /// Create a new file
    ///
    /// # Preconditions
    /// - Nothing exists at `path`
    /// - The parent folder exists
    ///
    /// # Postconditions
    /// - Returns the created file
    async fn create(&self, path: &VaultPath, content: &str) -> Result<VaultFile>;

    /// Delete a file
    async fn delete(&self, file: &VaultFile) -> Result<()>;

    /// Look up whatever exists at `path`
    ///
    /// # Postconditions
    /// - `None` when nothing exists
    /// - Folders are returned with their direct children
    async fn exists(&self, path: &VaultPath) -> Result<Option<VaultEntry>>;

    /// Create a folder and any missing parents
    ///
    /// # Postconditions
    /// - May fail when the folder was created concurrently; callers re-check
    async fn create_folder(&self, path: &VaultPath) -> Result<()>;
}

/// Parses a document's frontmatter into a structured mapping
pub trait MetadataIndexer: Send + Sync {
    /// `None` when the document has no parseable frontmatter
    fn metadata(&self, content: &str) -> Option<Frontmatter>;
}

/// User-facing, fire-and-forget messages
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}
