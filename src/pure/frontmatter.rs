// Field Region Location - Pure Functions
// Finds the line range a single key occupies inside a hand-edited frontmatter
// block. Only the shapes notes actually use are recognized; this is not YAML.

use once_cell::sync::Lazy;
use regex::Regex;

use super::metadata::frontmatter_end;

/// Key rewritten by the categories engine
pub const CATEGORIES_KEY: &str = "categories";

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*-(\s|$)").expect("valid regex"));

/// Grammar shape of the located field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// `key:` followed by `- item` lines
    BlockList,
    /// `key: [a, b]`, possibly spanning lines
    InlineList,
    /// `key: value`
    InlineScalar,
}

/// Lines occupied by one field, `end` inclusive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRegion {
    pub start: usize,
    pub end: usize,
    pub indent: String,
    pub shape: FieldShape,
}

impl FieldRegion {
    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Locate `categories:` in the frontmatter of `lines`
pub fn locate_categories<S: AsRef<str>>(lines: &[S]) -> Option<FieldRegion> {
    locate_field(lines, CATEGORIES_KEY)
}

/// Locate `key:` in the frontmatter of `lines`
///
/// A top-level `key:` line wins over nested ones; otherwise the first match is
/// used. Returns `None` when the document has no closed frontmatter block, the
/// key is absent, or an inline list never closes before the block ends.
pub fn locate_field<S: AsRef<str>>(lines: &[S], key: &str) -> Option<FieldRegion> {
    let block_end = frontmatter_end(lines)?;
    let key_line = Regex::new(&format!(r"^(\s*){}:(.*)$", regex::escape(key))).ok()?;
    let line_at = |index: usize| lines[index].as_ref().trim_end_matches('\r');

    let matches: Vec<(usize, regex::Captures)> = (1..block_end)
        .filter_map(|index| key_line.captures(line_at(index)).map(|caps| (index, caps)))
        .collect();
    let (start, caps) = matches
        .iter()
        .find(|(_, caps)| caps[1].is_empty())
        .or_else(|| matches.first())?;
    let start = *start;
    let indent = caps[1].to_string();
    let trailing = caps[2].trim();

    if trailing.starts_with('[') {
        let end = if trailing.ends_with(']') {
            start
        } else {
            (start + 1..block_end).find(|&i| line_at(i).contains(']'))?
        };
        return Some(FieldRegion {
            start,
            end,
            indent,
            shape: FieldShape::InlineList,
        });
    }

    if !trailing.is_empty() && !trailing.starts_with('-') {
        return Some(FieldRegion {
            start,
            end: start,
            indent,
            shape: FieldShape::InlineScalar,
        });
    }

    let mut end = start;
    for index in start + 1..block_end {
        let line = line_at(index);
        if line.trim().is_empty() {
            continue;
        }
        if !LIST_ITEM.is_match(line) {
            // a new key or any other content ends the list
            break;
        }
        end = index;
    }
    Some(FieldRegion {
        start,
        end,
        indent,
        shape: FieldShape::BlockList,
    })
}
