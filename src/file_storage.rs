// File-based Document Store
// Implements DocumentStore over a vault directory on disk.
// Should be used through create_file_store so every call is traced.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::contracts::DocumentStore;
use crate::path_utils::{is_hidden, relative_to_vault};
use crate::types::{VaultEntry, VaultFile, VaultFolder, VaultPath};
use crate::wrappers::TracedStore;

/// Vault directory on the local file system
///
/// Hidden entries (dot-prefixed, like `.obsidian` or `.categorist`) are never listed.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a vault rooted at `root`; the directory must exist
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let metadata = fs::metadata(root)
            .await
            .with_context(|| format!("Failed to open vault: {}", root.display()))?;
        if !metadata.is_dir() {
            bail!("Vault root is not a directory: {}", root.display());
        }
        let root = fs::canonicalize(root)
            .await
            .with_context(|| format!("Failed to resolve vault path: {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a vault path
    pub fn absolute(&self, path: &VaultPath) -> PathBuf {
        path.as_str()
            .split('/')
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    /// Vault path for an absolute location, if it lies inside the vault
    pub fn vault_path(&self, absolute: &Path) -> Option<VaultPath> {
        let relative = relative_to_vault(absolute, &self.root)?;
        VaultPath::new(relative).ok()
    }

    /// Direct children of a folder, sorted by name
    async fn read_children(&self, dir: &Path) -> Result<Vec<(PathBuf, bool)>> {
        let mut entries = fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            let is_dir = entry.file_type().await?.is_dir();
            children.push((entry.path(), is_dir));
        }
        children.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(children)
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn list(&self) -> Result<Vec<VaultFile>> {
        let mut files = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let children = self.read_children(&dir).await?;
            for (path, is_dir) in children {
                if is_dir {
                    pending.push(path);
                } else if let Some(vault_path) = self.vault_path(&path) {
                    if !is_hidden(vault_path.as_str()) {
                        files.push(VaultFile::new(vault_path));
                    }
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn read(&self, file: &VaultFile) -> Result<String> {
        let path = self.absolute(&file.path);
        fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read document: {}", file.path))
    }

    async fn write(&self, file: &VaultFile, content: &str) -> Result<()> {
        let path = self.absolute(&file.path);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            bail!("Document does not exist: {}", file.path);
        }
        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write document: {}", file.path))
    }

    async fn create(&self, path: &VaultPath, content: &str) -> Result<VaultFile> {
        let absolute = self.absolute(path);
        let mut handle = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&absolute)
            .await
            .with_context(|| format!("Failed to create document: {path}"))?;
        tokio::io::AsyncWriteExt::write_all(&mut handle, content.as_bytes())
            .await
            .with_context(|| format!("Failed to write document: {path}"))?;
        tokio::io::AsyncWriteExt::flush(&mut handle).await?;
        Ok(VaultFile::new(path.clone()))
    }

    async fn delete(&self, file: &VaultFile) -> Result<()> {
        fs::remove_file(self.absolute(&file.path))
            .await
            .with_context(|| format!("Failed to delete document: {}", file.path))
    }

    async fn exists(&self, path: &VaultPath) -> Result<Option<VaultEntry>> {
        let absolute = self.absolute(path);
        let metadata = match fs::metadata(&absolute).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to stat: {path}"));
            }
        };

        if !metadata.is_dir() {
            return Ok(Some(VaultEntry::File(VaultFile::new(path.clone()))));
        }

        let mut children = Vec::new();
        for (child, is_dir) in self.read_children(&absolute).await? {
            let Some(child_path) = self.vault_path(&child) else {
                continue;
            };
            children.push(if is_dir {
                VaultEntry::Folder(VaultFolder {
                    path: child_path,
                    children: Vec::new(),
                })
            } else {
                VaultEntry::File(VaultFile::new(child_path))
            });
        }
        Ok(Some(VaultEntry::Folder(VaultFolder {
            path: path.clone(),
            children,
        })))
    }

    async fn create_folder(&self, path: &VaultPath) -> Result<()> {
        let absolute = self.absolute(path);
        fs::create_dir_all(&absolute)
            .await
            .with_context(|| format!("Failed to create folder: {path}"))
    }
}

/// Open a vault and wrap it with tracing
pub async fn create_file_store(root: impl AsRef<Path>) -> Result<TracedStore<FileStore>> {
    let store = FileStore::open(root).await?;
    Ok(TracedStore::new(store))
}
