// Wrapper Components
// Store wrappers that apply tracing around any DocumentStore.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::contracts::DocumentStore;
use crate::observability::*;
use crate::types::{VaultEntry, VaultFile, VaultPath};

/// Store wrapper that adds automatic tracing to all operations
pub struct TracedStore<S: DocumentStore> {
    inner: S,
    trace_id: Uuid,
    operation_count: AtomicU64,
}

impl<S: DocumentStore> TracedStore<S> {
    /// Wrap a store implementation with tracing
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            trace_id: Uuid::new_v4(),
            operation_count: AtomicU64::new(0),
        }
    }

    /// Get the current trace ID
    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    /// Get the number of operations performed
    pub fn operation_count(&self) -> u64 {
        self.operation_count.load(Ordering::Relaxed)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn context(&self, operation: &str, path: &str) -> OperationContext {
        self.operation_count.fetch_add(1, Ordering::Relaxed);
        let mut ctx = OperationContext::new(operation);
        ctx.add_attribute("store_trace_id", self.trace_id.to_string());
        ctx.add_attribute("path", path);
        ctx
    }
}

fn unit<T>(result: &Result<T>) -> Result<()> {
    result
        .as_ref()
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!("{:#}", e))
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for TracedStore<S> {
    async fn list(&self) -> Result<Vec<VaultFile>> {
        let ctx = self.context("store.list", "");
        let start = Instant::now();
        let result = self.inner.list().await;

        let file_count = result.as_ref().map(Vec::len).unwrap_or(0);
        log_operation(&ctx, &Operation::DocumentList { file_count }, &unit(&result));
        record_metric(MetricType::Histogram {
            name: "store.list.duration",
            value: start.elapsed().as_millis() as f64,
            unit: "ms",
        });
        result
    }

    async fn read(&self, file: &VaultFile) -> Result<String> {
        let ctx = self.context("store.read", file.path.as_str());
        let result = self.inner.read(file).await;

        let size_bytes = result.as_ref().map(String::len).unwrap_or(0);
        log_operation(
            &ctx,
            &Operation::DocumentRead {
                path: file.path.to_string(),
                size_bytes,
            },
            &unit(&result),
        );
        result
    }

    async fn write(&self, file: &VaultFile, content: &str) -> Result<()> {
        let ctx = self.context("store.write", file.path.as_str());
        debug!("[{}] Writing document: {}", self.trace_id, file.path);
        let result = self.inner.write(file, content).await;

        log_operation(
            &ctx,
            &Operation::DocumentWrite {
                path: file.path.to_string(),
                size_bytes: content.len(),
            },
            &unit(&result),
        );
        result
    }

    async fn create(&self, path: &VaultPath, content: &str) -> Result<VaultFile> {
        let ctx = self.context("store.create", path.as_str());
        debug!("[{}] Creating document: {}", self.trace_id, path);
        let result = self.inner.create(path, content).await;

        log_operation(
            &ctx,
            &Operation::DocumentCreate {
                path: path.to_string(),
                size_bytes: content.len(),
            },
            &unit(&result),
        );
        result
    }

    async fn delete(&self, file: &VaultFile) -> Result<()> {
        let ctx = self.context("store.delete", file.path.as_str());
        debug!("[{}] Deleting document: {}", self.trace_id, file.path);
        let result = self.inner.delete(file).await;

        log_operation(
            &ctx,
            &Operation::DocumentDelete {
                path: file.path.to_string(),
            },
            &unit(&result),
        );
        result
    }

    async fn exists(&self, path: &VaultPath) -> Result<Option<VaultEntry>> {
        self.operation_count.fetch_add(1, Ordering::Relaxed);
        let result = self.inner.exists(path).await;
        debug!(
            "[{}] exists({}) = {}",
            self.trace_id,
            path,
            match &result {
                Ok(Some(entry)) if entry.is_folder() => "folder",
                Ok(Some(_)) => "file",
                Ok(None) => "none",
                Err(_) => "error",
            }
        );
        result
    }

    async fn create_folder(&self, path: &VaultPath) -> Result<()> {
        let ctx = self.context("store.create_folder", path.as_str());
        let result = self.inner.create_folder(path).await;
        log_operation(
            &ctx,
            &Operation::FolderCreate {
                path: path.to_string(),
            },
            &unit(&result),
        );
        result
    }
}
