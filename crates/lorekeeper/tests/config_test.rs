//! Tests for layered configuration loading.

use lorekeeper::{EnumPolicy, LorekeeperConfig, LorekeeperErrorKind};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> anyhow::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[test]
fn test_from_file_overrides_and_defaults() -> anyhow::Result<()> {
    let file = write_config(
        r#"
[analysis]
concurrency = 2
narrator = "Zhang"
enum_policy = "reject"

[model]
model = "local-model"
base_url = "http://localhost:8080/v1"

[storage]
data_dir = "/tmp/lorekeeper-profiles"
"#,
    )?;

    let config = LorekeeperConfig::from_file(file.path())?;

    assert_eq!(*config.analysis().concurrency(), 2);
    assert_eq!(config.analysis().narrator().as_deref(), Some("Zhang"));
    assert_eq!(*config.analysis().enum_policy(), EnumPolicy::Reject);
    assert_eq!(*config.analysis().max_chapter_chars(), 8000);
    assert_eq!(config.model().model(), "local-model");
    assert_eq!(*config.model().max_tokens(), 4096);
    assert_eq!(
        config.storage().data_dir(),
        &PathBuf::from("/tmp/lorekeeper-profiles")
    );
    assert!(*config.cache().enabled());
    Ok(())
}

#[test]
fn test_empty_file_gives_defaults() -> anyhow::Result<()> {
    let file = write_config("")?;
    let config = LorekeeperConfig::from_file(file.path())?;
    assert_eq!(config, LorekeeperConfig::default());
    Ok(())
}

#[test]
fn test_zero_concurrency_rejected() -> anyhow::Result<()> {
    let file = write_config("[analysis]\nconcurrency = 0\n")?;
    let err = LorekeeperConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err.kind(), LorekeeperErrorKind::Config(_)));
    Ok(())
}

#[test]
fn test_unknown_policy_rejected() -> anyhow::Result<()> {
    let file = write_config("[analysis]\nenum_policy = \"guess\"\n")?;
    let err = LorekeeperConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err.kind(), LorekeeperErrorKind::Config(_)));
    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    let result = LorekeeperConfig::from_file("/nonexistent/lorekeeper-config.toml");
    assert!(result.is_err());
}

#[test]
fn test_client_settings_without_key() -> anyhow::Result<()> {
    let file = write_config(
        "[model]\napi_key_env = \"LOREKEEPER_TEST_UNSET_KEY_VARIABLE\"\ntimeout_secs = 30\n",
    )?;
    let config = LorekeeperConfig::from_file(file.path())?;
    let settings = config.model().client_settings()?;
    assert_eq!(settings.api_key(), &None);
    assert_eq!(*settings.timeout_secs(), 30);
    assert_eq!(settings.model(), "gpt-4o-mini");
    Ok(())
}
