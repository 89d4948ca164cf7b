// Deduplication - Pure Functions

use indexmap::IndexMap;

use crate::types::CaseSensitivity;

/// Keep the first-seen spelling of every equivalence class, in first-seen order
pub fn dedupe<S: AsRef<str>>(names: &[S], policy: CaseSensitivity) -> Vec<String> {
    let mut seen: IndexMap<String, String> = IndexMap::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        seen.entry(policy.key(name))
            .or_insert_with(|| name.to_string());
    }
    seen.into_values().collect()
}

/// Same as [`dedupe`] for owned values, also reporting how many were dropped
pub fn dedupe_by_key<T: AsRef<str>>(items: Vec<T>, policy: CaseSensitivity) -> (Vec<T>, usize) {
    let total = items.len();
    let mut seen: IndexMap<String, T> = IndexMap::with_capacity(total);
    for item in items {
        let key = policy.key(item.as_ref());
        seen.entry(key).or_insert(item);
    }
    let kept: Vec<T> = seen.into_values().collect();
    let removed = total - kept.len();
    (kept, removed)
}
