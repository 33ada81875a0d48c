//! Tests for layered configuration loading.

use super::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Build a project tree with a `.git` marker and a nested cwd.
fn project_tree(temp: &TempDir) -> (PathBuf, PathBuf) {
    let project_root = temp.path().join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");
    (project_root, cwd)
}

/// Verify that a minimal config parses with defaults.
#[test]
fn parse_minimal_config() {
    let config = ContextConfig::load_from_str("{}").expect("config");
    assert_eq!(config, ContextConfig::default());
}

/// JSON5 comments and trailing commas are accepted.
#[test]
fn parse_json5_overrides() {
    let json5 = r#"{
        // keep a shorter history in tests
        storage: { capacity: 10, root: "/tmp/ctx", },
        search: { tag_weight: 3 },
    }"#;
    let config = ContextConfig::load_from_str(json5).expect("config");
    assert_eq!(config.storage.capacity, 10);
    assert_eq!(config.storage.root.as_deref(), Some("/tmp/ctx"));
    assert_eq!(config.search.tag_weight, 3);
    assert_eq!(config.search.text_weight, 1);
}

/// Reject unexpected top-level config keys.
#[test]
fn rejects_unknown_top_level_key() {
    let err = ContextConfig::load_from_str("{ unexpected: true }").unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("unknown key"));
}

/// Reject wrongly typed nested values with the field path in the message.
#[test]
fn rejects_non_integer_capacity() {
    let err = ContextConfig::load_from_str(r#"{ storage: { capacity: "many" } }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("storage.capacity"));
}

/// Semantic validation catches zero capacities.
#[test]
fn rejects_zero_capacity() {
    let err = ContextConfig::load_from_str("{ storage: { capacity: 0 } }").unwrap_err();
    match err {
        ConfigError::InvalidField { path, .. } => assert_eq!(path, "storage.capacity"),
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Blank extraction markers would match everywhere and are rejected.
#[test]
fn rejects_blank_marker() {
    let err = ContextConfig::load_from_str(r#"{ extraction: { decision_markers: [" "] } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("extraction.decision_markers"));
}

/// Ensure repo config takes precedence over cwd, project and user config.
#[test]
fn layered_config_prefers_repo_over_cwd() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, cwd) = project_tree(&temp);

    let user_config = temp.path().join("user.json5");
    write_json5(&user_config, "{ search: { default_limit: 1, tag_weight: 4 } }");
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        "{ search: { default_limit: 2 } }",
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        "{ search: { default_limit: 3 } }",
    );
    write_json5(
        &project_root
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE),
        "{ search: { default_limit: 4 } }",
    );

    let mut options = LayeredConfigOptions::new(&cwd);
    options.user_config_path = Some(user_config);

    let layered = ContextConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.search.default_limit, 4);
    assert_eq!(layered.config.search.tag_weight, 4);
    assert_eq!(layered.layers.len(), 4);
}

#[test]
fn runtime_override_wins() {
    let temp = TempDir::new().expect("tmp");
    let (_project_root, cwd) = project_tree(&temp);

    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        "{ digest: { relevant_limit: 2 } }",
    );
    let runtime_config = temp.path().join("runtime.json5");
    write_json5(&runtime_config, "{ digest: { relevant_limit: 7 } }");

    let mut options = LayeredConfigOptions::new(&cwd).with_runtime_path(&runtime_config);
    options.user_config_path = None;

    let layered = ContextConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.digest.relevant_limit, 7);
    assert_eq!(
        layered.layers.last().map(|layer| layer.source),
        Some(ConfigLayerSource::Runtime)
    );
}

#[test]
fn project_and_cwd_layers_are_not_loaded_twice() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, _cwd) = project_tree(&temp);
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        "{ events: { default_project: \"ctxlog\" } }",
    );

    let mut options = LayeredConfigOptions::new(&project_root);
    options.user_config_path = None;

    let layered = ContextConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.config.events.default_project, "ctxlog");
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let mut options =
        LayeredConfigOptions::new(temp.path()).with_runtime_path(temp.path().join("absent.json5"));
    options.user_config_path = None;

    let err = ContextConfig::load_layered_with_options(options).unwrap_err();
    match &err {
        ConfigError::ReadFailed { path, .. } => assert!(path.ends_with("absent.json5")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("cannot read ctxlog config "));
}

#[test]
fn malformed_layer_is_named_in_the_error() {
    let temp = TempDir::new().expect("tmp");
    let runtime = temp.path().join("broken.json5");
    write_json5(&runtime, "{ storage: ");
    let mut options = LayeredConfigOptions::new(temp.path()).with_runtime_path(&runtime);
    options.user_config_path = None;

    let err = ContextConfig::load_layered_with_options(options).unwrap_err();
    match &err {
        ConfigError::ParseFailed { layer, .. } => {
            assert!(layer.starts_with("runtime("));
            assert!(layer.contains("broken.json5"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
