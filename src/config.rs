use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_NESTED_SEPARATOR: &str = " - ";

/// Token replaced with the category name in `base_template`
pub const CATEGORY_NAME_TOKEN: &str = "{{categoryName}}";

/// Settings file location relative to the vault root
pub const SETTINGS_FILE: &str = ".categorist/settings.toml";

pub const DEFAULT_BASE_TEMPLATE: &str = r#"filters:
  and:
    - categories.contains(link("{{categoryName}}"))
views:
  - type: table
    name: "{{categoryName}}"
    order:
      - file.name
      - categories
      - file.mtime
    sort:
      - property: file.mtime
        direction: DESC
  - type: cards
    name: Cards
    order:
      - file.name
      - file.mtime
    sort:
      - property: file.mtime
        direction: DESC
"#;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub categories_folder: String,
    pub bases_folder: String,
    pub exclude_folders: Vec<String>,
    pub case_sensitive: bool,
    pub show_notifications: bool,
    pub sync_on_startup: bool,
    pub nested_separator: String,
    pub base_template: String,
    pub public_folder: String,
    pub publish_key: String,
    pub debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            categories_folder: "Categories".to_string(),
            bases_folder: "Templates/Bases".to_string(),
            exclude_folders: vec!["Templates".to_string()],
            case_sensitive: true,
            show_notifications: true,
            sync_on_startup: false,
            nested_separator: DEFAULT_NESTED_SEPARATOR.to_string(),
            base_template: DEFAULT_BASE_TEMPLATE.to_string(),
            public_folder: "Public".to_string(),
            publish_key: "publish".to_string(),
            debounce_ms: 100,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Default settings path for a vault
    pub fn path_for_vault(vault_root: &Path) -> PathBuf {
        vault_root.join(SETTINGS_FILE)
    }

    /// Load settings for a vault: defaults, then the settings file, then environment
    pub fn load(vault_root: &Path) -> Result<Self> {
        let path = Self::path_for_vault(vault_root);
        let mut settings = if path.exists() {
            debug!("Loading settings from {}", path.display());
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        // Override with environment variables
        if let Ok(folder) = std::env::var("CATEGORIST_CATEGORIES_FOLDER") {
            settings.categories_folder = folder;
        }
        if let Ok(folder) = std::env::var("CATEGORIST_BASES_FOLDER") {
            settings.bases_folder = folder;
        }
        if let Ok(flag) = std::env::var("CATEGORIST_CASE_SENSITIVE") {
            settings.case_sensitive = flag
                .parse()
                .with_context(|| format!("Invalid CATEGORIST_CASE_SENSITIVE value: {flag}"))?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Persist settings, replacing the file atomically
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write settings file: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace settings file: {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        crate::validation::settings::validate_settings(self)
    }

    pub fn case_sensitivity(&self) -> crate::types::CaseSensitivity {
        crate::types::CaseSensitivity::from_flag(self.case_sensitive)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Set one option from its key and textual value, as the CLI does
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "categories_folder" => self.categories_folder = value.to_string(),
            "bases_folder" => self.bases_folder = value.to_string(),
            "exclude_folders" => {
                self.exclude_folders = crate::path_utils::parse_folder_list(value)
            }
            "case_sensitive" => self.case_sensitive = parse_flag(key, value)?,
            "show_notifications" => self.show_notifications = parse_flag(key, value)?,
            "sync_on_startup" => self.sync_on_startup = parse_flag(key, value)?,
            "nested_separator" => self.nested_separator = value.to_string(),
            "base_template" => self.base_template = value.to_string(),
            "public_folder" => self.public_folder = value.to_string(),
            "publish_key" => self.publish_key = value.to_string(),
            "debounce_ms" => {
                self.debounce_ms = value
                    .parse()
                    .with_context(|| format!("Invalid value for {key}: {value}"))?
            }
            _ => anyhow::bail!("Unknown setting: {key}"),
        }
        self.validate()
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => anyhow::bail!("Invalid value for {key}: {value} (expected true/false)"),
    }
}

/// Shared settings that every component reads and only the settings handler replaces
///
/// Readers take an `Arc<Settings>` snapshot for the duration of one operation.
#[derive(Debug, Clone)]
pub struct SettingsHandle {
    current: Arc<RwLock<Arc<Settings>>>,
    persist_to: Option<PathBuf>,
}

impl SettingsHandle {
    /// In-memory settings that are never written to disk
    pub fn new(settings: Settings) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(settings))),
            persist_to: None,
        }
    }

    /// Settings persisted to `path` on every change
    pub fn persistent(settings: Settings, path: impl Into<PathBuf>) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(settings))),
            persist_to: Some(path.into()),
        }
    }

    pub fn current(&self) -> Arc<Settings> {
        self.current.read().clone()
    }

    /// Validate, persist, then swap in a whole new settings value
    pub fn replace(&self, settings: Settings) -> Result<()> {
        settings.validate()?;
        if let Some(path) = &self.persist_to {
            settings.save(path)?;
            info!("Settings saved to {}", path.display());
        }
        *self.current.write() = Arc::new(settings);
        Ok(())
    }

    /// Apply a change to a copy of the current settings and replace
    pub fn update(&self, change: impl FnOnce(&mut Settings) -> Result<()>) -> Result<()> {
        let mut next = (*self.current()).clone();
        change(&mut next)?;
        self.replace(next)
    }
}
