//! Schema validation helpers for ctxlog JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    let allowed = [
        "$schema",
        "storage",
        "summaries",
        "extraction",
        "search",
        "digest",
        "events",
        "input",
    ];
    ensure_allowed_keys(map, &allowed, layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("storage") {
        validate_storage(value, layer, "storage")?;
    }
    if let Some(value) = map.get("summaries") {
        validate_integers(
            value,
            layer,
            "summaries",
            &["default_max_words", "brief_words", "detailed_words"],
        )?;
    }
    if let Some(value) = map.get("extraction") {
        validate_extraction(value, layer, "extraction")?;
    }
    if let Some(value) = map.get("search") {
        validate_integers(
            value,
            layer,
            "search",
            &["default_limit", "tag_weight", "text_weight"],
        )?;
    }
    if let Some(value) = map.get("digest") {
        validate_integers(value, layer, "digest", &["relevant_limit", "preview_words"])?;
    }
    if let Some(value) = map.get("events") {
        validate_events(value, layer, "events")?;
    }
    if let Some(value) = map.get("input") {
        validate_integers(value, layer, "input", &["max_text_chars", "max_tags"])?;
    }

    Ok(())
}

/// Validate the "storage" block.
fn validate_storage(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["root", "capacity"], layer, path)?;
    if let Some(value) = map.get("root") {
        expect_string(value, layer, &join_path(path, "root"))?;
    }
    if let Some(value) = map.get("capacity") {
        expect_u64(value, layer, &join_path(path, "capacity"))?;
    }
    Ok(())
}

/// Validate the "extraction" block.
fn validate_extraction(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "trailing_words",
            "decision_markers",
            "problem_markers",
            "solution_markers",
        ],
        layer,
        path,
    )?;
    if let Some(value) = map.get("trailing_words") {
        expect_u64(value, layer, &join_path(path, "trailing_words"))?;
    }
    for key in ["decision_markers", "problem_markers", "solution_markers"] {
        if let Some(value) = map.get(key) {
            validate_string_array(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Validate the "events" block.
fn validate_events(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["known_types", "default_project"], layer, path)?;
    if let Some(value) = map.get("known_types") {
        validate_string_array(value, layer, &join_path(path, "known_types"))?;
    }
    if let Some(value) = map.get("default_project") {
        expect_string(value, layer, &join_path(path, "default_project"))?;
    }
    Ok(())
}

/// Validate a block whose keys are all non-negative integers.
fn validate_integers(
    value: &Value,
    layer: &str,
    path: &str,
    keys: &[&str],
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, keys, layer, path)?;
    for key in keys {
        if let Some(value) = map.get(*key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a non-negative JSON integer or return a typed error.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Validate that a value is an array of strings.
fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Value::Array(arr) = value else {
        return Err(invalid_field(layer, path, "expected array"));
    };
    for (idx, entry) in arr.iter().enumerate() {
        if entry.as_str().is_none() {
            return Err(invalid_field(
                layer,
                &format!("{path}[{idx}]"),
                "expected string",
            ));
        }
    }
    Ok(())
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
