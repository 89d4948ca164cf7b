// Property-Based Testing with Proptest
// Invariants of the category engine checked over generated names and documents

use categorist::pure::{dedupe, normalize_document, parse_frontmatter, reconcile, RewriteOutcome};
use categorist::validation::category::normalize;
use categorist::CaseSensitivity;
use proptest::prelude::*;

// Custom strategies for generating test data
mod strategies {
    use super::*;

    // Plain names that YAML reads back as strings
    pub fn plain_name() -> impl Strategy<Value = String> {
        prop::string::string_regex(r"[A-Z][a-z]{1,8}( [A-Z][a-z]{1,8})?").unwrap()
    }

    // Raw names including hierarchy, padding, brackets and forbidden characters
    pub fn raw_name() -> impl Strategy<Value = String> {
        prop::string::string_regex(r##"[ a-zA-Z0-9/:*?<>|&#"\\\[\]\t-]{0,30}"##).unwrap()
    }

    // Any printable name, written into YAML as a double-quoted string
    pub fn printable_name() -> impl Strategy<Value = String> {
        prop::string::string_regex(r"[ -~äöü]{1,16}").unwrap()
    }

    fn quoted(name: &str) -> String {
        format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
    }

    pub fn policy() -> impl Strategy<Value = CaseSensitivity> {
        prop_oneof![
            Just(CaseSensitivity::Sensitive),
            Just(CaseSensitivity::Insensitive),
        ]
    }

    fn with_field(names: &[String], shape: usize, item: impl Fn(&String) -> String) -> String {
        let field = match shape {
            0 => format!("categories: {}", item(&names[0])),
            1 => format!(
                "categories: [{}]",
                names.iter().map(&item).collect::<Vec<_>>().join(", ")
            ),
            _ => {
                let mut block = String::from("categories:");
                for name in names {
                    block.push_str(&format!("\n  - {}", item(name)));
                }
                block
            }
        };
        format!("---\ntitle: Note\n{field}\ntags: [a, b]\n---\n# Heading\n\nBody text\n")
    }

    // A document whose categories field takes one of the supported shapes
    pub fn document() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(plain_name(), 1..6),
            0..3usize,
            any::<bool>(),
        )
            .prop_map(|(names, shape, linked)| {
                with_field(&names, shape, |name| {
                    if linked {
                        format!("\"[[{name}]]\"")
                    } else {
                        name.clone()
                    }
                })
            })
    }

    // Like `document`, but names may hold brackets, quotes and backslashes
    pub fn printable_document() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(printable_name(), 1..6),
            0..3usize,
            any::<bool>(),
        )
            .prop_map(|(names, shape, linked)| {
                with_field(&names, shape, |name| {
                    if linked {
                        quoted(&format!("[[{name}]]"))
                    } else {
                        quoted(name)
                    }
                })
            })
    }
}

use strategies::*;

fn run(content: &str, policy: CaseSensitivity) -> RewriteOutcome {
    let frontmatter = parse_frontmatter(content);
    normalize_document(content, frontmatter.as_ref(), " - ", policy)
        .map(|(_, outcome)| outcome)
        .unwrap_or(RewriteOutcome::Unchanged)
}

proptest! {
    #[test]
    fn rewrite_is_idempotent(doc in document(), policy in policy()) {
        if let RewriteOutcome::Rewritten(once) = run(&doc, policy) {
            prop_assert_eq!(run(&once, policy), RewriteOutcome::Unchanged);
        }
    }

    #[test]
    fn rewrite_is_idempotent_for_printable_names(doc in printable_document(), policy in policy()) {
        if let RewriteOutcome::Rewritten(once) = run(&doc, policy) {
            prop_assert_eq!(run(&once, policy), RewriteOutcome::Unchanged);
        }
    }

    #[test]
    fn rewrite_preserves_lines_outside_the_field(doc in document(), policy in policy()) {
        let result = match run(&doc, policy) {
            RewriteOutcome::Rewritten(text) => text,
            RewriteOutcome::Unchanged => doc.clone(),
        };
        prop_assert!(result.starts_with("---\ntitle: Note\ncategories:"));
        prop_assert!(result.ends_with("\ntags: [a, b]\n---\n# Heading\n\nBody text\n"));
    }

    #[test]
    fn normalize_is_stable(raw in raw_name()) {
        if let Ok(first) = normalize(&raw, " - ") {
            let canonical = first.canonical.as_str();
            prop_assert!(!canonical.is_empty());
            prop_assert!(!canonical.contains('/'));
            prop_assert_eq!(canonical.trim(), canonical);

            let second = normalize(canonical, " - ").unwrap();
            prop_assert_eq!(second.canonical.as_str(), canonical);
            prop_assert!(!second.corrected);
        }
    }

    #[test]
    fn dedupe_keeps_one_of_each_class(
        names in prop::collection::vec(plain_name(), 0..20),
        policy in policy(),
    ) {
        let kept = dedupe(&names, policy);

        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                prop_assert!(!policy.equivalent(a, b));
            }
        }
        for name in &names {
            prop_assert!(kept.iter().any(|k| policy.equivalent(k, name)));
        }
        // First-seen spelling wins
        for k in &kept {
            let first = names.iter().find(|n| policy.equivalent(n, k)).unwrap();
            prop_assert_eq!(first, k);
        }
    }

    #[test]
    fn reconcile_partitions_names(
        used in prop::collection::vec(plain_name(), 0..10),
        existing in prop::collection::vec(plain_name(), 0..10),
        policy in policy(),
    ) {
        let result = reconcile(&used, &existing, policy);
        for name in &result.missing {
            prop_assert!(used.contains(name));
            prop_assert!(!existing.iter().any(|e| policy.equivalent(e, name)));
        }
        for name in &result.orphans {
            prop_assert!(existing.contains(name));
            prop_assert!(!used.iter().any(|u| policy.equivalent(u, name)));
        }
    }
}
