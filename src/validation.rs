// Validation Layer
// Runtime validation of paths, category names and settings.
// Category name normalization lives here because it is the contract every
// name must pass before it reaches the file system.

use anyhow::{bail, Result};
use std::collections::HashMap;

/// Validation errors with detailed context
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Precondition failed: {condition}")]
    PreconditionFailed { condition: String, context: String },

    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("empty category name")]
    EmptyCategoryName,
}

/// Validation context for better error messages
#[derive(Clone)]
pub struct ValidationContext {
    operation: String,
    attributes: HashMap<String, String>,
}

impl ValidationContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn validate(self, condition: bool, message: &str) -> Result<()> {
        if !condition {
            let context = format!(
                "Operation: {}, Attributes: {:?}",
                self.operation, self.attributes
            );
            bail!(ValidationError::PreconditionFailed {
                condition: message.to_string(),
                context,
            });
        }
        Ok(())
    }
}

/// Path validation with detailed checks
pub mod path {
    use super::*;

    /// Maximum path length across platforms
    const MAX_PATH_LENGTH: usize = 4096;

    /// Validate a normalized vault-relative path
    pub fn validate_vault_path(path: &str) -> Result<()> {
        let ctx = ValidationContext::new("validate_vault_path").with_attribute("path", path);

        ctx.clone()
            .validate(!path.is_empty(), "Path cannot be empty")?;

        ctx.clone().validate(
            path.len() < MAX_PATH_LENGTH,
            &format!("Path exceeds maximum length of {MAX_PATH_LENGTH}"),
        )?;

        ctx.validate(!path.contains('\0'), "Path contains null bytes")?;

        if path.split('/').any(|segment| segment == "..") {
            bail!(ValidationError::InvalidInput {
                field: "path".to_string(),
                reason: "Parent directory references (..) not allowed".to_string(),
            });
        }

        if path.starts_with('/') {
            bail!(ValidationError::InvalidInput {
                field: "path".to_string(),
                reason: "Vault paths must be relative".to_string(),
            });
        }

        Ok(())
    }

    /// Validate a configured folder; an empty folder means the vault root
    pub fn validate_folder(field: &str, folder: &str) -> Result<()> {
        if folder.is_empty() {
            return Ok(());
        }
        validate_vault_path(folder).map_err(|e| {
            anyhow::Error::new(ValidationError::InvalidInput {
                field: field.to_string(),
                reason: e.to_string(),
            })
        })
    }
}

/// Category name normalization: flatten, trim, sanitize
pub mod category {
    use super::ValidationError;
    use crate::types::CategoryName;

    /// Characters that cannot appear in a category file name
    pub const FORBIDDEN_CHARS: &[char] = &['\\', ':', '*', '?', '"', '<', '>', '|'];

    /// Forbidden characters plus control characters, which would split the
    /// rendered list item across lines
    pub fn is_forbidden(c: char) -> bool {
        FORBIDDEN_CHARS.contains(&c) || c.is_control()
    }

    /// Separator of hierarchical category paths in frontmatter
    pub const HIERARCHY_SEPARATOR: char = '/';

    /// Result of normalizing one raw name
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct NormalizedName {
        pub canonical: CategoryName,
        pub corrected: bool,
        pub warning: Option<String>,
    }

    /// Turn `Travel/Europe` into `Travel - Europe` using `nested_separator`
    ///
    /// Empty segments are dropped, so `Travel/` flattens to `Travel`.
    pub fn flatten(raw: &str, nested_separator: &str) -> String {
        if !raw.contains(HIERARCHY_SEPARATOR) {
            return raw.to_string();
        }
        raw.split(HIERARCHY_SEPARATOR)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(nested_separator)
    }

    /// Normalize a raw category name
    ///
    /// Flattening runs before sanitization so the hierarchy separator is always
    /// consumed by the nested separator and never reported as a correction.
    pub fn normalize(raw: &str, nested_separator: &str) -> Result<NormalizedName, ValidationError> {
        let flattened = flatten(raw, nested_separator);
        let trimmed = flattened.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyCategoryName);
        }

        let found: Vec<char> = trimmed
            .chars()
            .filter(|c| is_forbidden(*c))
            .collect();

        if found.is_empty() {
            return Ok(NormalizedName {
                canonical: CategoryName::from_canonical(trimmed.to_string()),
                corrected: false,
                warning: None,
            });
        }

        let sanitized: String = trimmed
            .chars()
            .map(|c| if is_forbidden(c) { '-' } else { c })
            .collect();
        let mut listed: Vec<String> = found.iter().map(|c| c.escape_default().to_string()).collect();
        listed.sort();
        listed.dedup();
        let warning = format!(
            "Category \"{}\" contains invalid characters ({}); renamed to \"{}\"",
            trimmed,
            listed.join(" "),
            sanitized
        );

        Ok(NormalizedName {
            canonical: CategoryName::from_canonical(sanitized),
            corrected: true,
            warning: Some(warning),
        })
    }
}

/// Settings validation
pub mod settings {
    use super::*;
    use crate::config::Settings;

    pub fn validate_settings(settings: &Settings) -> Result<()> {
        path::validate_folder("categories_folder", &settings.categories_folder)?;
        path::validate_folder("bases_folder", &settings.bases_folder)?;
        path::validate_folder("public_folder", &settings.public_folder)?;
        for folder in &settings.exclude_folders {
            path::validate_folder("exclude_folders", folder)?;
        }

        let ctx = ValidationContext::new("settings")
            .with_attribute("nested_separator", settings.nested_separator.as_str());

        ctx.clone().validate(
            !settings.nested_separator.contains('/'),
            "Nested separator cannot contain '/'",
        )?;
        ctx.clone().validate(
            !settings
                .nested_separator
                .chars()
                .any(|c| category::FORBIDDEN_CHARS.contains(&c)),
            "Nested separator contains characters not allowed in file names",
        )?;
        ctx.clone().validate(
            !settings.categories_folder.is_empty(),
            "Categories folder cannot be the vault root",
        )?;
        ctx.clone().validate(
            !settings.public_folder.is_empty(),
            "Public folder cannot be the vault root",
        )?;
        ctx.validate(
            !settings.publish_key.trim().is_empty(),
            "Publish key cannot be empty",
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::category::*;
    use super::*;

    #[test]
    fn test_path_validation() {
        assert!(path::validate_vault_path("Notes/file.md").is_ok());
        assert!(path::validate_vault_path("").is_err());
        assert!(path::validate_vault_path("../../etc/passwd").is_err());
        assert!(path::validate_vault_path("Notes/../x.md").is_err());
        assert!(path::validate_vault_path("file\0null.md").is_err());
        assert!(path::validate_vault_path("/abs.md").is_err());
        assert!(path::validate_vault_path(&"x".repeat(5000)).is_err());
    }

    #[test]
    fn test_flatten_hierarchy() {
        let normalized = normalize("Travel/Europe/Germany", " - ").unwrap();
        assert_eq!(normalized.canonical.as_str(), "Travel - Europe - Germany");
        assert!(!normalized.corrected);

        // Stable on a second pass
        let again = normalize(normalized.canonical.as_str(), " - ").unwrap();
        assert_eq!(again.canonical, normalized.canonical);
    }

    #[test]
    fn test_flatten_trims_segments_and_drops_empty_ones() {
        assert_eq!(flatten(" Travel / Europe ", " - "), "Travel - Europe");
        assert_eq!(flatten("Travel/", " > "), "Travel");
        assert_eq!(flatten("Plain", " - "), "Plain");
    }

    #[test]
    fn test_sanitize_forbidden_characters() {
        let normalized = normalize("Q&A: Notes", " - ").unwrap();
        assert_eq!(normalized.canonical.as_str(), "Q&A- Notes");
        assert!(normalized.corrected);
        assert!(normalized.warning.unwrap().contains(':'));

        let normalized = normalize("a*b?c", " - ").unwrap();
        assert_eq!(normalized.canonical.as_str(), "a-b-c");
    }

    #[test]
    fn test_control_characters_are_sanitized() {
        let normalized = normalize("Line\nBreak\tTab", " - ").unwrap();
        assert_eq!(normalized.canonical.as_str(), "Line-Break-Tab");
        assert!(normalized.warning.unwrap().contains("\\n"));
    }

    #[test]
    fn test_empty_names_fail() {
        assert!(matches!(
            normalize("   ", " - "),
            Err(ValidationError::EmptyCategoryName)
        ));
        assert!(matches!(
            normalize(" / ", " - "),
            Err(ValidationError::EmptyCategoryName)
        ));
        assert_eq!(
            normalize("", " - ").unwrap_err().to_string(),
            "empty category name"
        );
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = crate::config::Settings::default();
        assert!(settings::validate_settings(&settings).is_ok());

        settings.nested_separator = "/".to_string();
        assert!(settings::validate_settings(&settings).is_err());

        settings = crate::config::Settings::default();
        settings.categories_folder = "../outside".to_string();
        assert!(settings::validate_settings(&settings).is_err());
    }
}
