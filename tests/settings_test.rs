// Settings persistence and loading tests
use anyhow::Result;
use categorist::{Settings, SettingsBuilder, SettingsHandle};
use tempfile::TempDir;

#[test]
fn test_load_without_file_uses_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let settings = Settings::load(dir.path())?;
    assert_eq!(settings.bases_folder, "Templates/Bases");
    assert_eq!(settings.nested_separator, " - ");
    assert!(!Settings::path_for_vault(dir.path()).exists());
    Ok(())
}

#[test]
fn test_save_and_reload_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = Settings::path_for_vault(dir.path());

    let settings = SettingsBuilder::new()
        .categories_folder("Topics")
        .exclude_folders(["Templates", "Archive"])
        .case_sensitive(false)
        .nested_separator(" -- ")
        .build()?;
    settings.save(&path)?;

    assert!(path.ends_with(".categorist/settings.toml"));
    assert_eq!(Settings::from_file(&path)?, settings);
    Ok(())
}

#[test]
fn test_handle_persists_every_change() -> Result<()> {
    let dir = TempDir::new()?;
    let path = Settings::path_for_vault(dir.path());
    let handle = SettingsHandle::persistent(Settings::default(), &path);

    handle.update(|s| s.set("sync_on_startup", "true"))?;
    assert!(handle.current().sync_on_startup);
    assert!(Settings::from_file(&path)?.sync_on_startup);

    // Rejected changes leave both memory and disk untouched
    assert!(handle.update(|s| s.set("bases_folder", "../outside")).is_err());
    assert_eq!(Settings::from_file(&path)?.bases_folder, "Templates/Bases");
    Ok(())
}

#[test]
fn test_invalid_file_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = Settings::path_for_vault(dir.path());
    std::fs::create_dir_all(path.parent().unwrap())?;
    std::fs::write(&path, "nested_separator = \"/\"\n")?;
    assert!(Settings::load(dir.path()).is_err());

    std::fs::write(&path, "case_sensitive = \"maybe\"\n")?;
    assert!(Settings::load(dir.path()).is_err());
    Ok(())
}

// The only test touching CATEGORIST_* variables, so parallel tests cannot race on them
#[test]
fn test_environment_overrides_file() -> Result<()> {
    let dir = TempDir::new()?;
    SettingsBuilder::new()
        .categories_folder("FromFile")
        .build()?
        .save(Settings::path_for_vault(dir.path()))?;

    std::env::set_var("CATEGORIST_CATEGORIES_FOLDER", "FromEnv");
    std::env::set_var("CATEGORIST_CASE_SENSITIVE", "false");
    let loaded = Settings::load(dir.path());
    std::env::remove_var("CATEGORIST_CATEGORIES_FOLDER");
    std::env::remove_var("CATEGORIST_CASE_SENSITIVE");

    let loaded = loaded?;
    assert_eq!(loaded.categories_folder, "FromEnv");
    assert!(!loaded.case_sensitive);
    Ok(())
}
