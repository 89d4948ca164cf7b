// Builder Patterns
// Fluent builder for Settings with sensible defaults and validation on build.

use crate::config::Settings;
use crate::path_utils::normalize_vault_path;
use anyhow::{ensure, Result};
use std::time::Duration;

/// Fluent builder for creating Settings
///
/// Starts from the defaults; every setter normalizes its input and `build`
/// runs the same validation as loading from disk.
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Create a new settings builder
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }

    /// Start from existing settings
    pub fn from_settings(settings: Settings) -> Self {
        Self { settings }
    }

    /// Folder holding category index notes
    pub fn categories_folder(mut self, folder: impl AsRef<str>) -> Self {
        self.settings.categories_folder = normalize_vault_path(folder.as_ref());
        self
    }

    /// Folder holding query-view files
    pub fn bases_folder(mut self, folder: impl AsRef<str>) -> Self {
        self.settings.bases_folder = normalize_vault_path(folder.as_ref());
        self
    }

    /// Add one excluded folder
    pub fn exclude_folder(mut self, folder: impl AsRef<str>) -> Self {
        let folder = normalize_vault_path(folder.as_ref());
        if !folder.is_empty() && !self.settings.exclude_folders.contains(&folder) {
            self.settings.exclude_folders.push(folder);
        }
        self
    }

    /// Replace the excluded folders
    pub fn exclude_folders(mut self, folders: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.settings.exclude_folders = folders
            .into_iter()
            .map(|f| normalize_vault_path(f.as_ref()))
            .filter(|f| !f.is_empty())
            .collect();
        self
    }

    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.settings.case_sensitive = enabled;
        self
    }

    pub fn show_notifications(mut self, enabled: bool) -> Self {
        self.settings.show_notifications = enabled;
        self
    }

    pub fn sync_on_startup(mut self, enabled: bool) -> Self {
        self.settings.sync_on_startup = enabled;
        self
    }

    /// Separator used when flattening `A/B` into one name
    pub fn nested_separator(mut self, separator: impl Into<String>) -> Self {
        self.settings.nested_separator = separator.into();
        self
    }

    pub fn base_template(mut self, template: impl Into<String>) -> Self {
        self.settings.base_template = template.into();
        self
    }

    pub fn public_folder(mut self, folder: impl AsRef<str>) -> Self {
        self.settings.public_folder = normalize_vault_path(folder.as_ref());
        self
    }

    pub fn publish_key(mut self, key: impl Into<String>) -> Self {
        self.settings.publish_key = key.into();
        self
    }

    /// Debounce window for change notifications
    pub fn debounce(mut self, window: Duration) -> Result<Self> {
        ensure!(
            window <= Duration::from_secs(60),
            "Debounce window must not exceed 60 seconds"
        );
        self.settings.debounce_ms = window.as_millis() as u64;
        Ok(self)
    }

    /// Build the settings
    pub fn build(self) -> Result<Settings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_builder_defaults() {
        let settings = SettingsBuilder::new().build().unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_settings_builder_normalizes_folders() {
        let settings = SettingsBuilder::new()
            .categories_folder("/Topics/")
            .bases_folder("Meta\\Bases")
            .exclude_folder("Archive/")
            .exclude_folder("Archive")
            .build()
            .unwrap();

        assert_eq!(settings.categories_folder, "Topics");
        assert_eq!(settings.bases_folder, "Meta/Bases");
        assert_eq!(settings.exclude_folders, vec!["Templates", "Archive"]);
    }

    #[test]
    fn test_settings_builder_rejects_invalid_separator() {
        assert!(SettingsBuilder::new().nested_separator("/").build().is_err());
    }

    #[test]
    fn test_settings_builder_debounce() {
        let settings = SettingsBuilder::new()
            .debounce(Duration::from_millis(250))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(settings.debounce_ms, 250);
        assert!(SettingsBuilder::new()
            .debounce(Duration::from_secs(120))
            .is_err());
    }
}
