// Frontmatter indexer backed by serde_yaml

use crate::contracts::MetadataIndexer;
use crate::pure::metadata::{parse_frontmatter, Frontmatter};

/// Default [`MetadataIndexer`]: parses the leading `---` block as YAML
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontmatterIndexer;

impl MetadataIndexer for FrontmatterIndexer {
    fn metadata(&self, content: &str) -> Option<Frontmatter> {
        parse_frontmatter(content)
    }
}
