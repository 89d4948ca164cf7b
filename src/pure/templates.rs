// Companion File Templates - Pure Functions

use crate::config::{Settings, CATEGORY_NAME_TOKEN};

/// Extension of query-view files
pub const VIEW_EXTENSION: &str = "base";

/// Substitute the category name everywhere the token appears
pub fn render_view(template: &str, category: &str) -> String {
    template.replace(CATEGORY_NAME_TOKEN, category)
}

/// Index note: a `categories` tag and an embed of the paired view
pub fn render_index(settings: &Settings, category: &str) -> String {
    format!(
        "---\ntags: [categories]\n---\n\n![[{}]]\n",
        view_path(settings, category)
    )
}

fn join(folder: &str, file: &str) -> String {
    if folder.is_empty() {
        file.to_string()
    } else {
        format!("{folder}/{file}")
    }
}

/// `{categories_folder}/{name}.md`
pub fn index_path(settings: &Settings, category: &str) -> String {
    join(&settings.categories_folder, &format!("{category}.md"))
}

/// `{bases_folder}/{name}.base`
pub fn view_path(settings: &Settings, category: &str) -> String {
    join(
        &settings.bases_folder,
        &format!("{category}.{VIEW_EXTENSION}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_every_token() {
        let rendered = render_view("a {{categoryName}} b {{categoryName}}", "Books");
        assert_eq!(rendered, "a Books b Books");
    }

    #[test]
    fn default_template_filters_on_category() {
        let settings = Settings::default();
        let rendered = render_view(&settings.base_template, "Travel - Europe");
        assert!(rendered.contains("categories.contains(link(\"Travel - Europe\"))"));
        assert!(!rendered.contains(CATEGORY_NAME_TOKEN));
    }

    #[test]
    fn companion_paths() {
        let settings = Settings::default();
        assert_eq!(index_path(&settings, "Books"), "Categories/Books.md");
        assert_eq!(view_path(&settings, "Books"), "Templates/Bases/Books.base");
        assert_eq!(
            render_index(&settings, "Books"),
            "---\ntags: [categories]\n---\n\n![[Templates/Bases/Books.base]]\n"
        );
    }

    #[test]
    fn root_bases_folder() {
        let settings = Settings {
            bases_folder: String::new(),
            ..Settings::default()
        };
        assert_eq!(view_path(&settings, "Books"), "Books.base");
    }
}
