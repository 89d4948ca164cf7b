// Categorist - Category normalization and reconciliation for markdown vaults
// Root library module

pub mod builders;
pub mod config;
pub mod contracts;
pub mod file_storage;
pub mod metadata_index;
pub mod notifier;
pub mod observability;
pub mod path_utils;
pub mod pure;
pub mod services;
pub mod types;
pub mod validation;
pub mod watcher;
pub mod wrappers;

// Re-export key types
pub use observability::{
    init_logging, init_logging_with_level, log_operation, record_metric, with_trace_id,
    MetricType, Operation,
};

pub use contracts::{DocumentStore, MetadataIndexer, Notifier};

// Re-export validated types
pub use types::{
    CaseSensitivity, CategoryEntry, CategoryName, CategorySet, CategoryValue, VaultEntry,
    VaultFile, VaultFolder, VaultPath,
};

// Re-export configuration
pub use builders::SettingsBuilder;
pub use config::{Settings, SettingsHandle};

// Re-export the category engine
pub use pure::{
    dedupe, extract_entries, locate_categories, normalize_document, reconcile,
    rewrite_categories, FieldCursorTracker, FieldRegion, FieldShape, Reconciliation,
    RewriteOutcome,
};
pub use validation::category::normalize;
pub use validation::ValidationError;

// Re-export services
pub use services::{
    CategoryOverview, CategoryService, DeletionReport, DocumentFailure, ProcessOutcome,
    PublishReport, PublishService, SkipReason, SyncReport,
};

// Re-export storage implementations
pub use file_storage::{create_file_store, FileStore};
pub use metadata_index::FrontmatterIndexer;
pub use notifier::{ConsoleNotifier, LogNotifier, RecordingNotifier};
pub use wrappers::TracedStore;
pub use watcher::{run_watch, ChangeDebouncer, VaultWatcher};
