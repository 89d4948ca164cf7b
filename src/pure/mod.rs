// Pure Functions Module
// All category algorithms implemented as side-effect-free functions over text and names.
// Services compose these with the document store; nothing here touches I/O.

pub mod category_set;
pub mod cursor;
pub mod dedupe;
pub mod extract;
pub mod frontmatter;
pub mod metadata;
pub mod reconcile;
pub mod rewrite;
pub mod templates;

pub use category_set::{build_category_set, CategorySetBuild};
pub use cursor::{CursorState, FieldCursorTracker};
pub use dedupe::{dedupe, dedupe_by_key};
pub use extract::{category_value, extract_entries, raw_region_values};
pub use frontmatter::{locate_categories, locate_field, FieldRegion, FieldShape, CATEGORIES_KEY};
pub use metadata::{calculate_hash, extract_flag, parse_frontmatter, Frontmatter};
pub use reconcile::{reconcile, Reconciliation};
pub use rewrite::{render_block, rewrite_categories, RewriteOutcome};

use crate::types::{CaseSensitivity, CategoryEntry};

/// Entries of the categories field of one document
///
/// Prefers the parsed frontmatter; falls back to decoding the field's literal
/// lines when the indexer produced nothing. `None` when there is no field.
pub fn categories_of(content: &str, frontmatter: Option<&Frontmatter>) -> Option<Vec<CategoryEntry>> {
    if let Some(frontmatter) = frontmatter {
        if frontmatter.contains_key(CATEGORIES_KEY) {
            return Some(
                category_value(frontmatter, CATEGORIES_KEY)
                    .map(extract_entries)
                    .unwrap_or_default(),
            );
        }
        return None;
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let region = locate_categories(&lines)?;
    Some(extract_entries(raw_region_values(&lines, &region)))
}

/// Full per-document pipeline: entries -> canonical set -> rewritten text
pub fn normalize_document(
    content: &str,
    frontmatter: Option<&Frontmatter>,
    nested_separator: &str,
    policy: CaseSensitivity,
) -> Option<(CategorySetBuild, RewriteOutcome)> {
    let entries = categories_of(content, frontmatter)?;
    let build = build_category_set(&entries, nested_separator, policy);
    let outcome = rewrite_categories(content, &build.set);
    Some((build, outcome))
}
