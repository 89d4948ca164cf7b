// Frontmatter Rewriting - Pure Functions
// Splices the canonical categories block over the located region, leaving every
// other line of the document untouched.

use super::frontmatter::{locate_categories, CATEGORIES_KEY};
use crate::types::CategorySet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    Unchanged,
    Rewritten(String),
}

impl RewriteOutcome {
    pub fn is_rewritten(&self) -> bool {
        matches!(self, RewriteOutcome::Rewritten(_))
    }
}

/// Canonical block lines for a set, without line terminators
pub fn render_block(indent: &str, set: &CategorySet) -> Vec<String> {
    let mut block = Vec::with_capacity(set.len() + 1);
    block.push(format!("{indent}{CATEGORIES_KEY}:"));
    for name in set.iter() {
        block.push(format!("{indent}  - \"{}\"", name.to_link()));
    }
    block
}

/// Rewrite the categories field of `content` into canonical form
///
/// Unchanged when the field cannot be located, the set is empty, or the region
/// already holds exactly the canonical block. Applying the result a second time
/// is always `Unchanged`.
pub fn rewrite_categories(content: &str, set: &CategorySet) -> RewriteOutcome {
    if set.is_empty() {
        return RewriteOutcome::Unchanged;
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let Some(region) = locate_categories(&lines) else {
        return RewriteOutcome::Unchanged;
    };

    let terminator = if lines[region.start].ends_with('\r') {
        "\r"
    } else {
        ""
    };
    let block: Vec<String> = render_block(&region.indent, set)
        .into_iter()
        .map(|line| format!("{line}{terminator}"))
        .collect();

    let source = &lines[region.start..=region.end];
    let differs = source.len() != block.len()
        || source.iter().zip(&block).any(|(old, new)| *old != new.as_str());
    if !differs && set.all_linked && set.duplicates_removed == 0 {
        return RewriteOutcome::Unchanged;
    }

    let mut output: Vec<&str> = Vec::with_capacity(lines.len() + block.len());
    output.extend_from_slice(&lines[..region.start]);
    output.extend(block.iter().map(String::as_str));
    output.extend_from_slice(&lines[region.end + 1..]);
    let rewritten = output.join("\n");

    if rewritten == content {
        RewriteOutcome::Unchanged
    } else {
        RewriteOutcome::Rewritten(rewritten)
    }
}
