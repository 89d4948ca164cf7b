// Category Reconciliation - Pure Functions
// Used names vs. materialized index names under the active equivalence policy

use std::collections::HashSet;

use super::dedupe::dedupe;
use crate::types::CaseSensitivity;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Used but without an index file
    pub missing: Vec<String>,
    /// Index files nothing uses
    pub orphans: Vec<String>,
}

/// Compare used names against existing index names
///
/// Both sides are deduplicated first, so when two spellings of one category are
/// present the first-seen one is reported.
pub fn reconcile<U: AsRef<str>, E: AsRef<str>>(
    used: &[U],
    existing: &[E],
    policy: CaseSensitivity,
) -> Reconciliation {
    let used: Vec<&str> = used.iter().map(AsRef::as_ref).collect();
    let existing: Vec<&str> = existing.iter().map(AsRef::as_ref).collect();
    let used = dedupe(&used, policy);
    let existing = dedupe(&existing, policy);

    let used_keys: HashSet<String> = used.iter().map(|name| policy.key(name)).collect();
    let existing_keys: HashSet<String> = existing.iter().map(|name| policy.key(name)).collect();

    Reconciliation {
        missing: used
            .into_iter()
            .filter(|name| !existing_keys.contains(&policy.key(name)))
            .collect(),
        orphans: existing
            .into_iter()
            .filter(|name| !used_keys.contains(&policy.key(name)))
            .collect(),
    }
}
