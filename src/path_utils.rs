//! Path normalization utilities for consistent vault path handling
//!
//! Every path crossing the store boundary is vault-relative and uses forward
//! slashes, regardless of platform. These helpers keep that format consistent
//! between the file store, the watcher and the category services.

use std::path::Path;
use tracing::debug;

/// Normalize a raw path string into vault form
///
/// - Converts backslashes to forward slashes
/// - Removes leading "./" and "/" prefixes
/// - Collapses repeated slashes and drops trailing ones
///
/// # Examples
/// ```
/// use categorist::path_utils::normalize_vault_path;
/// assert_eq!(normalize_vault_path("./Notes//Trip.md"), "Notes/Trip.md");
/// ```
pub fn normalize_vault_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Make an absolute filesystem path relative to the vault root
///
/// Returns `None` when the path is outside the vault.
pub fn relative_to_vault(path: &Path, vault_root: &Path) -> Option<String> {
    match path.strip_prefix(vault_root) {
        Ok(rel) => Some(normalize_vault_path(&rel.to_string_lossy())),
        Err(_) => {
            debug!(
                "Path {:?} is not under vault root {:?}, ignoring",
                path, vault_root
            );
            None
        }
    }
}

/// True when `path` equals `folder` or lies beneath it
pub fn is_within_folder(path: &str, folder: &str) -> bool {
    let folder = normalize_vault_path(folder);
    if folder.is_empty() {
        return false;
    }
    path == folder
        || path
            .strip_prefix(folder.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
}

/// True when `path` lies in any of the excluded folders
pub fn is_excluded(path: &str, exclude_folders: &[String]) -> bool {
    exclude_folders
        .iter()
        .any(|folder| is_within_folder(path, folder))
}

/// True for paths inside hidden (dot-prefixed) directories or hidden files
pub fn is_hidden(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with('.'))
}

/// Split a comma separated folder list as entered on the command line
pub fn parse_folder_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalize_vault_path)
        .filter(|folder| !folder.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_vault_path() {
        assert_eq!(normalize_vault_path("Notes/Trip.md"), "Notes/Trip.md");
        assert_eq!(normalize_vault_path("/Notes/Trip.md"), "Notes/Trip.md");
        assert_eq!(normalize_vault_path("./Notes/"), "Notes");
        assert_eq!(normalize_vault_path("Notes\\Sub\\a.md"), "Notes/Sub/a.md");
        assert_eq!(normalize_vault_path(""), "");
    }

    #[test]
    fn test_relative_to_vault() {
        let root = PathBuf::from("/home/user/vault");
        assert_eq!(
            relative_to_vault(&root.join("Notes/a.md"), &root),
            Some("Notes/a.md".to_string())
        );
        assert_eq!(relative_to_vault(Path::new("/etc/passwd"), &root), None);
    }

    #[test]
    fn test_folder_membership() {
        assert!(is_within_folder("Templates/Daily.md", "Templates"));
        assert!(is_within_folder("Templates", "Templates/"));
        assert!(!is_within_folder("TemplatesOld/a.md", "Templates"));
        assert!(!is_within_folder("a.md", ""));

        let excluded = vec!["Templates".to_string(), "Archive/Old".to_string()];
        assert!(is_excluded("Archive/Old/x.md", &excluded));
        assert!(!is_excluded("Archive/x.md", &excluded));
    }

    #[test]
    fn test_hidden_and_lists() {
        assert!(is_hidden(".obsidian/app.json"));
        assert!(is_hidden("Notes/.trash/a.md"));
        assert!(!is_hidden("Notes/a.md"));
        assert_eq!(
            parse_folder_list("Templates, Archive/ ,,"),
            vec!["Templates".to_string(), "Archive".to_string()]
        );
    }
}
