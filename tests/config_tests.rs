//! Configuration loading tests

use std::fs;

use cdevents_sdk::{EventFactory, PipelineRunStartedEvent, SdkConfig};
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("cdevents.toml");
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[producer]
default_source = "/ci/pipelines"
id_prefix = "ci"

[consumer]
validate_on_parse = false
"#,
    );

    let config = SdkConfig::load_from(Some(&path)).unwrap();
    assert_eq!(config.producer.default_source, "/ci/pipelines");
    assert_eq!(config.producer.id_prefix.as_deref(), Some("ci"));
    assert!(!config.consumer.validate_on_parse);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[producer]\ndefault_source = \"/only/source\"\n");

    let config = SdkConfig::load_from(Some(&path)).unwrap();
    assert_eq!(config.producer.default_source, "/only/source");
    assert!(config.producer.id_prefix.is_none());
    assert!(config.consumer.validate_on_parse);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(SdkConfig::load_from(Some(&missing.to_string_lossy())).is_err());
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saved.toml");
    let path = path.to_string_lossy().into_owned();

    let mut config = SdkConfig::default();
    config.producer.default_source = "/saved/source".into();
    config.producer.id_prefix = Some("saved".into());
    config.save(&path).unwrap();

    let loaded = SdkConfig::load_from(Some(&path)).unwrap();
    assert_eq!(loaded.producer.default_source, "/saved/source");
    assert_eq!(loaded.producer.id_prefix.as_deref(), Some("saved"));
}

#[test]
fn test_factory_from_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "[producer]\ndefault_source = \"/ci/pipelines\"\nid_prefix = \"ci\"\n",
    );
    let config = SdkConfig::load_from(Some(&path)).unwrap();

    let factory = EventFactory::from_config(&config);
    let first: PipelineRunStartedEvent = factory.create();
    let second: PipelineRunStartedEvent = factory.create();
    assert_eq!(first.source(), "/ci/pipelines");
    assert_eq!(first.id(), "ci-1");
    assert_eq!(second.id(), "ci-2");
}
