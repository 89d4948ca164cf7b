// Vault Watcher
// Bridges file system notifications into per-document category processing.
// Bursts of events for one document are coalesced before it is processed once.

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::path_utils::{is_excluded, is_hidden, is_within_folder, relative_to_vault};
use crate::services::CategoryService;
use crate::types::{VaultFile, VaultPath};

/// Coalesces repeated change notifications per document
///
/// A document becomes ready once no notification arrived for it during the
/// whole window; each new notification restarts its window.
#[derive(Debug)]
pub struct ChangeDebouncer {
    window: Duration,
    pending: HashMap<VaultPath, Instant>,
}

impl ChangeDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    /// Record a change seen at `now`
    pub fn record(&mut self, path: VaultPath, now: Instant) {
        self.pending.insert(path, now);
    }

    /// Remove and return every document whose window elapsed, in path order
    pub fn drain_ready(&mut self, now: Instant) -> Vec<VaultPath> {
        let window = self.window;
        let mut ready: Vec<VaultPath> = self
            .pending
            .iter()
            .filter(|(_, last)| now.saturating_duration_since(**last) >= window)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &ready {
            self.pending.remove(path);
        }
        ready.sort();
        ready
    }

    /// When the earliest pending document becomes ready
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().map(|last| *last + self.window)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Recursive file system watcher over a vault, delivering changed paths
pub struct VaultWatcher {
    // Dropping the watcher stops notifications
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<PathBuf>,
}

impl VaultWatcher {
    pub fn start(root: &Path) -> Result<Self> {
        let (tx, events) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        for path in event.paths {
                            // Receiver gone means the watch loop ended
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => warn!("File watch error: {}", e),
            },
            Config::default(),
        )
        .context("Failed to create file watcher")?;
        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch vault: {}", root.display()))?;

        info!("Watching {}", root.display());
        Ok(Self {
            _watcher: watcher,
            events,
        })
    }

    /// Next changed path; `None` once the watcher stopped
    pub async fn next(&mut self) -> Option<PathBuf> {
        self.events.recv().await
    }
}

/// Documents whose changes are worth processing
///
/// Companion files live in the categories and bases folders and are written
/// by processing itself, so their events are ignored.
pub fn is_watched(settings: &Settings, path: &VaultPath) -> bool {
    let file = VaultFile::new(path.clone());
    file.is_markdown()
        && !is_hidden(path.as_str())
        && !is_excluded(path.as_str(), &settings.exclude_folders)
        && !is_within_folder(path.as_str(), &settings.categories_folder)
        && !is_within_folder(path.as_str(), &settings.bases_folder)
        && !is_within_folder(path.as_str(), &settings.public_folder)
}

/// Watch a vault and process changed documents until `shutdown` resolves
///
/// Runs a full sync first when `sync_on_startup` is set.
pub async fn run_watch(
    service: &CategoryService,
    root: &Path,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let settings = service.settings().current();
    if settings.sync_on_startup {
        let report = service.sync_all().await?;
        info!(
            "Startup sync: {} files, {} categories, {} errors",
            report.files_processed, report.categories_found, report.errors
        );
    }

    let mut watcher = VaultWatcher::start(root)?;
    let mut debouncer = ChangeDebouncer::new(settings.debounce_window());
    tokio::pin!(shutdown);

    loop {
        let deadline = debouncer
            .next_deadline()
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(|| tokio::time::Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            _ = &mut shutdown => {
                info!("Stopping watcher");
                break;
            }
            event = watcher.next() => {
                let Some(absolute) = event else {
                    warn!("File watcher stopped");
                    break;
                };
                let Some(path) = relative_to_vault(&absolute, root)
                    .and_then(|relative| VaultPath::new(relative).ok())
                else {
                    continue;
                };
                if is_watched(&service.settings().current(), &path) {
                    debug!("Change recorded: {}", path);
                    debouncer.record(path, Instant::now());
                }
            }
            _ = tokio::time::sleep_until(deadline), if !debouncer.is_empty() => {
                for path in debouncer.drain_ready(Instant::now()) {
                    process_changed(service, path).await;
                }
            }
        }
    }
    Ok(())
}

async fn process_changed(service: &CategoryService, path: VaultPath) {
    // The document may be gone by the time its window elapsed
    match service.store().exists(&path).await {
        Ok(Some(entry)) if !entry.is_folder() => {}
        Ok(_) => return,
        Err(e) => {
            warn!("Failed to check {}: {:#}", path, e);
            return;
        }
    }

    match service.process_one(&VaultFile::new(path.clone())).await {
        Ok(outcome) if outcome.is_rewritten() => info!("Normalized {}", path),
        Ok(outcome) => debug!("Processed {}: {:?}", path, outcome),
        Err(e) => warn!("Failed to process {}: {:#}", path, e),
    }
}
