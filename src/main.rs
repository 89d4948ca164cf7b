// Categorist CLI - Keep the categories of a markdown vault canonical
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

// Macro for conditional printing based on quiet flag
macro_rules! qprintln {
    ($quiet:expr, $($arg:tt)*) => {
        if !$quiet {
            println!($($arg)*);
        }
    };
}
use categorist::{
    create_file_store, init_logging_with_level, run_watch, with_trace_id, CategoryService,
    ConsoleNotifier, DocumentStore, FrontmatterIndexer, LogNotifier, Notifier, PublishService,
    Settings, SettingsHandle, VaultFile, VaultPath,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Categorist - Canonical categories, index notes and orphan cleanup for markdown vaults",
    long_about = None,
    after_help = "EXAMPLES:
  # Normalize every note and create missing category files
  categorist --vault ~/Notes sync

  # Inspect and clean up categories nobody uses
  categorist orphans
  categorist orphans --delete Archive
  categorist orphans --all

  # Keep processing notes as they change
  categorist watch

  # Configuration
  categorist config set exclude_folders \"Templates, Archive\""
)]
struct Cli {
    /// Enable verbose logging (DEBUG level). Default is WARN level.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Vault root directory
    #[arg(long, global = true, default_value = ".")]
    vault: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize categories in every note and create missing index and view files
    Sync,

    /// Normalize categories in a single note
    Process {
        /// Note path, relative to the vault or absolute
        path: String,
    },

    /// Show used categories against existing index notes
    Status {
        /// Print the overview as JSON
        #[arg(long)]
        json: bool,
    },

    /// List categories no note uses, optionally deleting them
    Orphans {
        /// Delete the named orphans (index note and view file)
        #[arg(long, num_args = 1.., value_name = "NAME")]
        delete: Vec<String>,

        /// Delete every orphan
        #[arg(long, conflicts_with = "delete")]
        all: bool,
    },

    /// Watch the vault and process notes as they change
    Watch,

    /// Copy notes flagged for publishing into the public folder
    Publish,

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings
    Show,
    /// Write the default settings file if none exists
    Init,
    /// Change one setting and persist it
    Set { key: String, value: String },
}

struct Vault {
    root: PathBuf,
    store: Arc<dyn DocumentStore>,
    settings: SettingsHandle,
    notifier: Arc<dyn Notifier>,
}

impl Vault {
    async fn open(path: &Path, quiet: bool) -> Result<Self> {
        let traced = create_file_store(path).await?;
        let root = traced.inner().root().to_path_buf();
        let settings = Settings::load(&root)?;
        let settings = SettingsHandle::persistent(settings, Settings::path_for_vault(&root));
        let notifier: Arc<dyn Notifier> = if quiet {
            Arc::new(LogNotifier)
        } else {
            Arc::new(ConsoleNotifier)
        };
        Ok(Self {
            root,
            store: Arc::new(traced),
            settings,
            notifier,
        })
    }

    fn categories(&self) -> CategoryService {
        CategoryService::new(
            self.store.clone(),
            Arc::new(FrontmatterIndexer),
            self.notifier.clone(),
            self.settings.clone(),
        )
    }

    fn publisher(&self) -> PublishService {
        PublishService::new(
            self.store.clone(),
            Arc::new(FrontmatterIndexer),
            self.notifier.clone(),
            self.settings.clone(),
        )
    }

    /// Accept vault-relative or absolute note paths
    fn note(&self, raw: &str) -> Result<VaultFile> {
        let candidate = Path::new(raw);
        if !candidate.is_absolute() {
            return VaultFile::from_path(raw);
        }
        let absolute = std::fs::canonicalize(candidate)
            .with_context(|| format!("Note not found: {raw}"))?;
        let relative = categorist::path_utils::relative_to_vault(&absolute, &self.root)
            .ok_or_else(|| anyhow::anyhow!("{raw} is outside the vault"))?;
        Ok(VaultFile::new(VaultPath::new(relative)?))
    }
}

fn sync_progress_bar(quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

async fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;

    let vault = match &cli.command {
        Commands::Config { action } => return run_config(&cli.vault, action, quiet),
        _ => Vault::open(&cli.vault, quiet).await?,
    };

    match cli.command {
        Commands::Sync => {
            let service = vault.categories();
            let pb = sync_progress_bar(quiet)?;
            let report = service
                .sync_all_with_progress(|done, total, path| {
                    pb.set_length(total as u64);
                    pb.set_position(done as u64);
                    pb.set_message(path.to_string());
                })
                .await?;
            pb.finish_and_clear();

            qprintln!(quiet, "✅ Sync complete");
            qprintln!(quiet, "   Files processed:  {}", report.files_processed);
            qprintln!(quiet, "   Files rewritten:  {}", report.files_rewritten);
            qprintln!(quiet, "   Categories found: {}", report.categories_found);
            qprintln!(quiet, "   Errors:           {}", report.errors);
            for failure in &report.failures {
                eprintln!("   ❌ {}: {}", failure.path, failure.error);
            }
        }

        Commands::Process { path } => {
            let file = vault.note(&path)?;
            let outcome = vault.categories().process_one(&file).await?;
            match outcome {
                categorist::ProcessOutcome::Skipped(reason) => {
                    qprintln!(quiet, "⏭️  Skipped {}: {:?}", file.path, reason);
                }
                categorist::ProcessOutcome::Processed {
                    categories,
                    rewritten,
                    created,
                } => {
                    let names: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
                    qprintln!(
                        quiet,
                        "{} {}: {}",
                        if rewritten { "✏️ " } else { "✅" },
                        file.path,
                        names.join(", ")
                    );
                    for name in created {
                        qprintln!(quiet, "   Created category: {}", name);
                    }
                }
            }
        }

        Commands::Status { json } => {
            let overview = vault.categories().list_used_vs_existing().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
                return Ok(());
            }

            qprintln!(quiet, "📚 Categories in use: {}", overview.used.len());
            for name in &overview.used {
                let mut markers = Vec::new();
                if overview.missing_index.contains(name) {
                    markers.push("no index");
                }
                if overview.missing_view.contains(name) {
                    markers.push("no view");
                }
                if markers.is_empty() {
                    qprintln!(quiet, "   {}", name);
                } else {
                    qprintln!(quiet, "   {} ({})", name, markers.join(", "));
                }
            }
            qprintln!(quiet, "🗂️  Index notes: {}", overview.existing.len());
        }

        Commands::Orphans { delete, all } => {
            let service = vault.categories();
            let orphans = service.find_orphans().await?;
            let targets = if all { orphans.clone() } else { delete };

            if targets.is_empty() {
                if orphans.is_empty() {
                    qprintln!(quiet, "✅ No orphaned categories");
                } else {
                    qprintln!(quiet, "🧹 Orphaned categories: {}", orphans.len());
                    for name in &orphans {
                        println!("{name}");
                    }
                }
                return Ok(());
            }

            let report = service.delete_orphans(&targets).await?;
            for name in &report.deleted {
                qprintln!(quiet, "🗑️  Deleted {}", name);
            }
            for name in &report.refused {
                eprintln!("⚠️  Not an orphan: {name}");
            }
            for failure in &report.failures {
                eprintln!("❌ {}: {}", failure.path, failure.error);
            }
            if !report.failures.is_empty() {
                anyhow::bail!("{} deletions failed", report.failures.len());
            }
        }

        Commands::Watch => {
            let service = vault.categories();
            qprintln!(quiet, "👀 Watching {} (Ctrl+C to stop)", vault.root.display());
            run_watch(&service, &vault.root, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;
        }

        Commands::Publish => {
            let report = vault.publisher().sync().await?;
            qprintln!(
                quiet,
                "📤 Published: {} added, {} updated, {} removed, {} errors",
                report.added,
                report.updated,
                report.removed,
                report.errors
            );
            for failure in &report.failures {
                eprintln!("   ❌ {}: {}", failure.path, failure.error);
            }
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

fn run_config(vault: &Path, action: &ConfigCommand, quiet: bool) -> Result<()> {
    let path = Settings::path_for_vault(vault);
    match action {
        ConfigCommand::Show => {
            let settings = Settings::load(vault)?;
            print!("{}", toml::to_string_pretty(&settings)?);
        }
        ConfigCommand::Init => {
            if path.exists() {
                qprintln!(quiet, "Settings already exist at {}", path.display());
            } else {
                Settings::default().save(&path)?;
                qprintln!(quiet, "✅ Wrote {}", path.display());
            }
        }
        ConfigCommand::Set { key, value } => {
            let handle = SettingsHandle::persistent(Settings::load(vault)?, &path);
            handle.update(|settings| settings.set(key, value))?;
            qprintln!(quiet, "✅ {} = {}", key, value);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args first to get verbose flag
    let cli = Cli::parse();

    // Initialize logging with appropriate level based on verbose/quiet flags
    let _ = init_logging_with_level(cli.verbose, cli.quiet);

    // Run everything within trace context
    with_trace_id("categorist-cli", run(cli)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_orphan_deletion() {
        let cli = Cli::try_parse_from(["categorist", "orphans", "--delete", "A", "B"]).unwrap();
        match cli.command {
            Commands::Orphans { delete, all } => {
                assert_eq!(delete, vec!["A", "B"]);
                assert!(!all);
            }
            _ => panic!("expected orphans"),
        }
        assert!(Cli::try_parse_from(["categorist", "orphans", "--all", "--delete", "A"]).is_err());
    }

    #[test]
    fn parses_global_vault_flag() {
        let cli = Cli::try_parse_from(["categorist", "sync", "--vault", "/tmp/v", "-q"]).unwrap();
        assert_eq!(cli.vault, PathBuf::from("/tmp/v"));
        assert!(cli.quiet);
    }
}
