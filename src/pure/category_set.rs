// Category Set Construction - Pure Functions
// entries -> normalized names -> deduplicated set, collecting warnings on the way

use super::dedupe::dedupe_by_key;
use crate::types::{CaseSensitivity, CategoryEntry, CategoryName, CategorySet};
use crate::validation::category::normalize;

/// A built set plus the user-facing warnings produced while normalizing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySetBuild {
    pub set: CategorySet,
    pub warnings: Vec<String>,
    /// Entries dropped because they were empty after normalization
    pub skipped: usize,
}

pub fn build_category_set(
    entries: &[CategoryEntry],
    nested_separator: &str,
    policy: CaseSensitivity,
) -> CategorySetBuild {
    let mut names: Vec<CategoryName> = Vec::with_capacity(entries.len());
    let mut warnings = Vec::new();
    let mut skipped = 0;

    for entry in entries {
        match normalize(&entry.name, nested_separator) {
            Ok(normalized) => {
                if let Some(warning) = normalized.warning {
                    warnings.push(warning);
                }
                names.push(normalized.canonical);
            }
            Err(e) => {
                warnings.push(format!("Skipped category \"{}\": {}", entry.name, e));
                skipped += 1;
            }
        }
    }

    let all_linked = entries.iter().all(|entry| entry.was_linked);
    let (names, duplicates_removed) = dedupe_by_key(names, policy);

    CategorySetBuild {
        set: CategorySet::new(names, all_linked, duplicates_removed),
        warnings,
        skipped,
    }
}
