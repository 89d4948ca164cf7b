// Validated Types
// Strongly-typed wrappers that enforce invariants at construction time.
// A value of these types cannot hold invalid data, so downstream code never re-checks.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A vault-relative path that has been validated
///
/// Paths always use `/` as separator and never start with one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VaultPath {
    inner: String,
}

impl VaultPath {
    /// Create a new validated path
    ///
    /// # Invariants
    /// - Non-empty after normalization
    /// - No directory traversal (..)
    /// - No null bytes
    /// - Forward slashes only, no leading or trailing slash
    pub fn new(path: impl AsRef<str>) -> Result<Self> {
        let normalized = crate::path_utils::normalize_vault_path(path.as_ref());
        crate::validation::path::validate_vault_path(&normalized)?;
        Ok(Self { inner: normalized })
    }

    /// Join a child segment onto this path
    pub fn join(&self, child: impl AsRef<str>) -> Result<Self> {
        Self::new(format!("{}/{}", self.inner, child.as_ref()))
    }

    /// The parent folder, `None` for top-level entries
    pub fn parent(&self) -> Option<VaultPath> {
        let (parent, _) = self.inner.rsplit_once('/')?;
        Some(Self {
            inner: parent.to_string(),
        })
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        self.inner.rsplit('/').next().unwrap_or(&self.inner)
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name,
        }
    }

    /// Extension without the dot, empty when absent
    pub fn extension(&self) -> &str {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext,
            _ => "",
        }
    }

    /// True when this path lies inside `folder` (or is the folder itself)
    pub fn is_within(&self, folder: &str) -> bool {
        crate::path_utils::is_within_folder(&self.inner, folder)
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for VaultPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// A file in the vault
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultFile {
    pub path: VaultPath,
    pub extension: String,
}

impl VaultFile {
    pub fn new(path: VaultPath) -> Self {
        let extension = path.extension().to_string();
        Self { path, extension }
    }

    /// Parse and wrap a raw path
    pub fn from_path(path: impl AsRef<str>) -> Result<Self> {
        Ok(Self::new(VaultPath::new(path)?))
    }

    pub fn is_markdown(&self) -> bool {
        self.extension.eq_ignore_ascii_case("md")
    }

    /// Display name of the note (file name without extension)
    pub fn basename(&self) -> &str {
        self.path.stem()
    }
}

/// A folder in the vault with its direct children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultFolder {
    pub path: VaultPath,
    pub children: Vec<VaultEntry>,
}

/// Anything the store can hand back for a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEntry {
    File(VaultFile),
    Folder(VaultFolder),
}

impl VaultEntry {
    pub fn path(&self) -> &VaultPath {
        match self {
            VaultEntry::File(file) => &file.path,
            VaultEntry::Folder(folder) => &folder.path,
        }
    }

    pub fn as_file(&self) -> Option<&VaultFile> {
        match self {
            VaultEntry::File(file) => Some(file),
            VaultEntry::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&VaultFolder> {
        match self {
            VaultEntry::Folder(folder) => Some(folder),
            VaultEntry::File(_) => None,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, VaultEntry::Folder(_))
    }
}

/// A canonical category name
///
/// Produced only by [`crate::validation::category::normalize`]: flattened, trimmed,
/// non-empty and free of characters that are illegal in file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryName {
    inner: String,
}

impl CategoryName {
    pub(crate) fn from_canonical(canonical: String) -> Self {
        Self { inner: canonical }
    }

    /// Normalize a raw name with the default nested separator
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = crate::validation::category::normalize(
            raw,
            crate::config::DEFAULT_NESTED_SEPARATOR,
        )?;
        Ok(normalized.canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// The quoted link form written into frontmatter
    pub fn to_link(&self) -> String {
        format!("[[{}]]", self.inner)
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

/// Equivalence policy used wherever category names are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    pub fn from_flag(case_sensitive: bool) -> Self {
        if case_sensitive {
            CaseSensitivity::Sensitive
        } else {
            CaseSensitivity::Insensitive
        }
    }

    /// The key two equivalent names share
    pub fn key(&self, name: &str) -> String {
        match self {
            CaseSensitivity::Sensitive => name.to_string(),
            CaseSensitivity::Insensitive => name.to_lowercase(),
        }
    }

    pub fn equivalent(&self, a: &str, b: &str) -> bool {
        self.key(a) == self.key(b)
    }
}

/// The `categories` field after structural decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValue {
    Scalar(String),
    List(Vec<String>),
}

impl CategoryValue {
    /// One ordered sequence regardless of shape
    pub fn into_items(self) -> Vec<String> {
        match self {
            CategoryValue::Scalar(value) => vec![value],
            CategoryValue::List(values) => values,
        }
    }
}

/// One raw element of the field before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    pub name: String,
    pub was_linked: bool,
}

/// Ordered, deduplicated categories of one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet {
    names: Vec<CategoryName>,
    /// Every source entry was already in `[[link]]` form
    pub all_linked: bool,
    /// Entries dropped as duplicates under the active policy
    pub duplicates_removed: usize,
}

impl CategorySet {
    pub fn new(names: Vec<CategoryName>, all_linked: bool, duplicates_removed: usize) -> Self {
        Self {
            names,
            all_linked,
            duplicates_removed,
        }
    }

    pub fn names(&self) -> &[CategoryName] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryName> {
        self.names.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_path_accessors() {
        let path = VaultPath::new("Notes/Travel/Trip.md").unwrap();
        assert_eq!(path.file_name(), "Trip.md");
        assert_eq!(path.stem(), "Trip");
        assert_eq!(path.extension(), "md");
        assert_eq!(path.parent().unwrap().as_str(), "Notes/Travel");
        assert!(path.is_within("Notes"));
        assert!(!path.is_within("Note"));
    }

    #[test]
    fn dotfile_has_no_extension() {
        let path = VaultPath::new(".hidden").unwrap();
        assert_eq!(path.stem(), ".hidden");
        assert_eq!(path.extension(), "");
    }

    #[test]
    fn category_value_collapses_to_sequence() {
        assert_eq!(
            CategoryValue::Scalar("Books".into()).into_items(),
            vec!["Books".to_string()]
        );
        assert_eq!(
            CategoryValue::List(vec!["A".into(), "B".into()]).into_items().len(),
            2
        );
    }

    #[test]
    fn case_policy_keys() {
        assert!(CaseSensitivity::Insensitive.equivalent("Books", "BOOKS"));
        assert!(!CaseSensitivity::Sensitive.equivalent("Books", "BOOKS"));
    }
}
