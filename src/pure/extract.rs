// Category Value Extraction - Pure Functions
// Decodes the categories field into one ordered sequence of entries, classifying
// each as already linked or plain.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;

use super::frontmatter::{FieldRegion, FieldShape};
use super::metadata::Frontmatter;
use crate::types::{CategoryEntry, CategoryValue};

// Greedy so any rendered `[[name]]` reads back as `name`, brackets included
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[\[(.*)\]\]$").expect("valid regex"));

/// Decode the field from parsed frontmatter
///
/// `None` when the key is absent, null, or holds a mapping.
pub fn category_value(frontmatter: &Frontmatter, key: &str) -> Option<CategoryValue> {
    match frontmatter.get(key)? {
        Value::Sequence(items) => Some(CategoryValue::List(
            items.iter().filter_map(textual_form).collect(),
        )),
        other => textual_form(other).map(CategoryValue::Scalar),
    }
}

/// Text of one YAML element
///
/// An unquoted `[[Name]]` is decoded by YAML as a sequence holding a
/// one-element sequence; it is turned back into its link form here.
fn textual_form(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Sequence(inner) => match inner.as_slice() {
            [Value::Sequence(innermost)] => match innermost.as_slice() {
                [single] => textual_form(single).map(|name| format!("[[{name}]]")),
                _ => None,
            },
            [single] => textual_form(single).map(|name| format!("[[{name}]]")),
            _ => None,
        },
        Value::Tagged(tagged) => textual_form(&tagged.value),
        Value::Null | Value::Mapping(_) => None,
    }
}

/// Classify every element; blanks are dropped, order is kept
pub fn extract_entries(value: CategoryValue) -> Vec<CategoryEntry> {
    value
        .into_items()
        .into_iter()
        .filter_map(|item| classify(&item))
        .collect()
}

fn classify(item: &str) -> Option<CategoryEntry> {
    let trimmed = item.trim();
    if let Some(caps) = LINK.captures(trimmed) {
        let name = caps[1].trim();
        if name.is_empty() {
            return None;
        }
        return Some(CategoryEntry {
            name: name.to_string(),
            was_linked: true,
        });
    }
    if trimmed.is_empty() {
        return None;
    }
    Some(CategoryEntry {
        name: trimmed.to_string(),
        was_linked: false,
    })
}

/// Decode the literal lines of a located region without a YAML parser
///
/// Used when the block could not be parsed as a whole, so a broken line
/// elsewhere in the frontmatter does not stop the categories from being fixed.
pub fn raw_region_values<S: AsRef<str>>(lines: &[S], region: &FieldRegion) -> CategoryValue {
    let region_lines: Vec<&str> = lines[region.start..=region.end]
        .iter()
        .map(|line| line.as_ref().trim_end_matches('\r'))
        .collect();
    let head = region_lines[0]
        .split_once(':')
        .map_or("", |(_, rest)| rest)
        .trim();

    match region.shape {
        FieldShape::InlineScalar => CategoryValue::Scalar(unquote(head).to_string()),
        FieldShape::InlineList => {
            let mut joined = head.to_string();
            for line in &region_lines[1..] {
                joined.push(' ');
                joined.push_str(line.trim());
            }
            CategoryValue::List(split_flow_list(&joined))
        }
        FieldShape::BlockList => CategoryValue::List(
            region_lines[1..]
                .iter()
                .filter_map(|line| line.trim_start().strip_prefix('-'))
                .map(|item| unquote(item.trim()).to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        ),
    }
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Split `[a, "b", [[c]]]` or `[[a]], [[b]]` into items at depth-zero commas
fn split_flow_list(text: &str) -> Vec<String> {
    let text = text.trim();
    let body = if text.starts_with('[') && matching_close(text, 0) == Some(text.len() - 1) {
        &text[1..text.len() - 1]
    } else {
        text
    };

    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut current = String::new();
    for c in body.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                items.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    items.push(current);

    items
        .iter()
        .map(|item| {
            let item = unquote(item.trim());
            // `[Name]` inside a flow list is YAML for a nested one-element list
            match item.strip_prefix('[').and_then(|i| i.strip_suffix(']')) {
                Some(inner) if !inner.starts_with('[') && !inner.contains(',') => {
                    format!("[[{}]]", inner.trim())
                }
                _ => item.to_string(),
            }
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// Byte index of the bracket closing the one opened at `open`
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pure::frontmatter::locate_categories;
    use crate::pure::metadata::parse_frontmatter;

    fn entries_of(doc: &str) -> Vec<CategoryEntry> {
        let fm = parse_frontmatter(doc).unwrap();
        extract_entries(category_value(&fm, "categories").unwrap())
    }

    fn raw_of(doc: &str) -> CategoryValue {
        let lines: Vec<&str> = doc.split('\n').collect();
        let region = locate_categories(&lines).unwrap();
        raw_region_values(&lines, &region)
    }

    #[test]
    fn classifies_linked_and_plain_entries() {
        let entries = entries_of("---\ncategories:\n  - Urlaub\n  - \"[[Books]]\"\n  - \" \"\n---\n");
        assert_eq!(
            entries,
            vec![
                CategoryEntry {
                    name: "Urlaub".into(),
                    was_linked: false
                },
                CategoryEntry {
                    name: "Books".into(),
                    was_linked: true
                },
            ]
        );
    }

    #[test]
    fn links_keep_inner_brackets_and_empty_links_are_blank() {
        let entries = entries_of("---\ncategories:\n  - \"[[A]B]]\"\n  - \"[[]]\"\n  - \"[[ ]]\"\n---\n");
        assert_eq!(
            entries,
            vec![CategoryEntry {
                name: "A]B".into(),
                was_linked: true
            }]
        );
    }

    #[test]
    fn scalar_becomes_single_entry() {
        let entries = entries_of("---\ncategories: SingleValue\n---\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "SingleValue");
        assert!(!entries[0].was_linked);
    }

    #[test]
    fn unquoted_link_decodes_as_linked() {
        let entries = entries_of("---\ncategories: [[Books]]\n---\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Books");
        assert!(entries[0].was_linked);
    }

    #[test]
    fn non_string_scalars_use_text_form_and_null_is_absent() {
        let entries = entries_of("---\ncategories: [2024, true]\n---\n");
        assert_eq!(entries[0].name, "2024");
        assert_eq!(entries[1].name, "true");

        let fm = parse_frontmatter("---\ncategories:\n---\n").unwrap();
        assert!(category_value(&fm, "categories").is_none());
    }

    #[test]
    fn duplicates_are_kept_for_the_deduplicator() {
        let entries = entries_of("---\ncategories: [A, A, a]\n---\n");
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn raw_block_list() {
        let value = raw_of("---\ncategories:\n  - \"[[Books]]\"\n  - 'Travel'\n  -\n---");
        assert_eq!(
            value,
            CategoryValue::List(vec!["[[Books]]".into(), "Travel".into()])
        );
    }

    #[test]
    fn raw_inline_lists() {
        assert_eq!(
            raw_of("---\ncategories: [Books, \"Q, A\", [Travel]]\n---"),
            CategoryValue::List(vec!["Books".into(), "Q, A".into(), "[[Travel]]".into()])
        );
        assert_eq!(
            raw_of("---\ncategories: [[A]], [[B]]\n---"),
            CategoryValue::List(vec!["[[A]]".into(), "[[B]]".into()])
        );
        assert_eq!(
            raw_of("---\ncategories: [A,\n  B]\n---"),
            CategoryValue::List(vec!["A".into(), "B".into()])
        );
    }

    #[test]
    fn raw_scalar() {
        assert_eq!(
            raw_of("---\ncategories: \"Single\"\n---"),
            CategoryValue::Scalar("Single".into())
        );
    }
}
