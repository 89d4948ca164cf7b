// Integration tests for publishing flagged notes into the public folder
use anyhow::Result;
use categorist::*;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(root: &Path, path: &str, content: &str) -> Result<()> {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, content)?;
    Ok(())
}

async fn publisher(root: &Path) -> Result<(PublishService, Arc<RecordingNotifier>)> {
    let notifier = Arc::new(RecordingNotifier::new());
    let service = PublishService::new(
        Arc::new(create_file_store(root).await?),
        Arc::new(FrontmatterIndexer),
        notifier.clone(),
        SettingsHandle::new(Settings::default()),
    );
    Ok((service, notifier))
}

#[tokio::test]
async fn test_publish_adds_updates_and_removes() -> Result<()> {
    let dir = TempDir::new()?;
    let root = dir.path();
    write(root, "Notes/open.md", "---\npublish: true\n---\nHello\n")?;
    write(root, "Notes/private.md", "---\npublish: false\n---\nSecret\n")?;
    write(root, "plain.md", "No frontmatter\n")?;
    let (service, notifier) = publisher(root).await?;

    let report = service.sync().await?;
    assert_eq!((report.added, report.updated, report.removed), (1, 0, 0));
    assert_eq!(
        std::fs::read_to_string(root.join("Public/Notes/open.md"))?,
        "---\npublish: true\n---\nHello\n"
    );
    assert!(!root.join("Public/Notes/private.md").exists());

    // Unchanged sources leave copies alone
    let report = service.sync().await?;
    assert!(!report.has_changes());

    write(root, "Notes/open.md", "---\npublish: true\n---\nHello again\n")?;
    let report = service.sync().await?;
    assert_eq!(report.updated, 1);
    assert_eq!(
        std::fs::read_to_string(root.join("Public/Notes/open.md"))?,
        "---\npublish: true\n---\nHello again\n"
    );

    write(root, "Notes/open.md", "---\npublish: false\n---\nHello again\n")?;
    let report = service.sync().await?;
    assert_eq!(report.removed, 1);
    assert!(!root.join("Public/Notes/open.md").exists());

    assert!(notifier
        .messages()
        .iter()
        .any(|m| m.starts_with("Published: 1 added")));
    Ok(())
}

#[tokio::test]
async fn test_stale_public_copies_are_removed() -> Result<()> {
    let dir = TempDir::new()?;
    let root = dir.path();
    write(root, "Public/gone.md", "left behind\n")?;
    write(root, "Public/asset.png", "binary")?;
    let (service, _) = publisher(root).await?;

    let report = service.sync().await?;
    assert_eq!(report.removed, 1);
    assert!(!root.join("Public/gone.md").exists());
    assert!(root.join("Public/asset.png").exists());
    Ok(())
}

#[tokio::test]
async fn test_excluded_folders_are_never_published() -> Result<()> {
    let dir = TempDir::new()?;
    let root = dir.path();
    write(root, "Templates/t.md", "---\npublish: true\n---\n")?;
    let (service, _) = publisher(root).await?;

    let report = service.sync().await?;
    assert_eq!(report.added, 0);
    assert!(!root.join("Public").exists());
    Ok(())
}
