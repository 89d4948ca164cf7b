// Metadata Processing - Pure Functions
// Parsing frontmatter blocks and reading typed values out of them

use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Parsed frontmatter mapping
pub type Frontmatter = HashMap<String, serde_yaml::Value>;

/// The frontmatter delimiter line
pub const DELIMITER: &str = "---";

/// Index of the closing delimiter line, if the document opens with a block
///
/// Line 0 must be exactly the delimiter; a trailing `\r` is tolerated.
pub fn frontmatter_end<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
    let first = lines.first()?.as_ref().trim_end_matches('\r');
    if first != DELIMITER {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.as_ref().trim_end_matches('\r') == DELIMITER)
        .map(|(index, _)| index)
}

/// Parse YAML frontmatter from markdown content
///
/// Returns `None` when there is no block or it is not a YAML mapping.
pub fn parse_frontmatter(content: &str) -> Option<Frontmatter> {
    let lines: Vec<&str> = content.split('\n').collect();
    let end = frontmatter_end(&lines)?;
    let yaml_content = lines[1..end]
        .iter()
        .map(|line| line.trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join("\n");

    if yaml_content.trim().is_empty() {
        return Some(Frontmatter::new());
    }

    match serde_yaml::from_str::<serde_yaml::Value>(&yaml_content).ok()? {
        serde_yaml::Value::Mapping(mapping) => Some(
            mapping
                .into_iter()
                .filter_map(|(key, value)| key.as_str().map(|k| (k.to_string(), value)))
                .collect(),
        ),
        serde_yaml::Value::Null => Some(Frontmatter::new()),
        _ => None,
    }
}

/// True when `key` holds a truthy flag (`true`, `yes`, `"true"`)
pub fn extract_flag(frontmatter: &Frontmatter, key: &str) -> bool {
    match frontmatter.get(key) {
        Some(serde_yaml::Value::Bool(flag)) => *flag,
        Some(serde_yaml::Value::String(text)) => {
            matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "yes")
        }
        _ => false,
    }
}

/// Calculate content hash (SHA-256)
pub fn calculate_hash(content: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hasher.finalize().into()
}
