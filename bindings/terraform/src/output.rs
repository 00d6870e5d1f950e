use crate::engine::OutputMap;
use infra_tunnel_core::prelude::MissingOutputError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Deserialize)]
struct OutputEntry {
    #[serde(default)]
    value: Value,
}

/// Parse the JSON printed by `terraform output -json`, keeping only the output values.
pub fn parse_output_json(text: &str) -> Result<OutputMap, serde_json::Error> {
    let entries: BTreeMap<String, OutputEntry> = serde_json::from_str(text)?;

    Ok(entries
        .into_iter()
        .map(|(name, entry)| (name, entry.value))
        .collect())
}

/// Find a nested output value by following `path` through object values.
pub fn lookup<'a>(outputs: &'a OutputMap, path: &[&str]) -> Result<&'a Value, MissingOutputError> {
    let (first, rest) = path
        .split_first()
        .ok_or_else(|| MissingOutputError::new("", "empty output path"))?;

    let mut current = outputs
        .get(*first)
        .ok_or_else(|| MissingOutputError::new(*first, "not present in the module outputs"))?;

    for (depth, key) in rest.iter().enumerate() {
        let parent = &path[..=depth];
        current = current
            .as_object()
            .ok_or_else(|| {
                MissingOutputError::new(
                    parent.join("."),
                    format!("expected an object but found {}", kind(current)),
                )
            })?
            .get(*key)
            .ok_or_else(|| MissingOutputError::new(path[..=depth + 1].join("."), "not present"))?;
    }

    Ok(current)
}

/// Like [lookup], but the value must be a string.
pub fn lookup_str<'a>(outputs: &'a OutputMap, path: &[&str]) -> Result<&'a str, MissingOutputError> {
    let value = lookup(outputs, path)?;
    value.as_str().ok_or_else(|| {
        MissingOutputError::new(
            path.join("."),
            format!("expected a string but found {}", kind(value)),
        )
    })
}

/// Like [lookup], but the value must be an object.
pub fn lookup_object<'a>(
    outputs: &'a OutputMap,
    path: &[&str],
) -> Result<&'a OutputMap, MissingOutputError> {
    let value = lookup(outputs, path)?;
    value.as_object().ok_or_else(|| {
        MissingOutputError::new(
            path.join("."),
            format!("expected an object but found {}", kind(value)),
        )
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OUTPUT_JSON: &str = r#"{
        "crypto_key": {"sensitive": false, "type": "string", "value": "projects/p/keys/k"},
        "gke": {
            "sensitive": false,
            "type": ["object", {"gke_cluster_endpoint": "string"}],
            "value": {"gke_cluster_endpoint": "10.0.0.2"}
        },
        "node_count": {"sensitive": false, "type": "number", "value": 3}
    }"#;

    #[test]
    fn parse_keeps_values_only() {
        let outputs = parse_output_json(OUTPUT_JSON).unwrap();

        assert_eq!(3, outputs.len());
        assert_eq!(
            &json!({"gke_cluster_endpoint": "10.0.0.2"}),
            outputs.get("gke").unwrap()
        );
        assert_eq!(&json!("projects/p/keys/k"), outputs.get("crypto_key").unwrap());
    }

    #[test]
    fn parse_empty_outputs() {
        assert!(parse_output_json("{}").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_non_json() {
        assert!(parse_output_json("Warning: No outputs found").is_err());
    }

    #[test]
    fn lookup_nested_string() {
        let outputs = parse_output_json(OUTPUT_JSON).unwrap();

        assert_eq!(
            "10.0.0.2",
            lookup_str(&outputs, &["gke", "gke_cluster_endpoint"]).unwrap()
        );
    }

    #[test]
    fn lookup_missing_nested_key_names_full_path() {
        let outputs = parse_output_json(OUTPUT_JSON).unwrap();

        let err = lookup(&outputs, &["gke", "gke_cluster_ca"]).unwrap_err();

        assert_eq!("gke.gke_cluster_ca", err.key());
    }

    #[test]
    fn lookup_missing_top_level_key() {
        let outputs = parse_output_json(OUTPUT_JSON).unwrap();

        let err = lookup_str(&outputs, &["vpc_id"]).unwrap_err();

        assert_eq!("vpc_id", err.key());
    }

    #[test]
    fn lookup_through_non_object_fails() {
        let outputs = parse_output_json(OUTPUT_JSON).unwrap();

        let err = lookup(&outputs, &["node_count", "value"]).unwrap_err();

        assert_eq!("node_count", err.key());
        assert!(err.to_string().contains("expected an object but found a number"));
    }

    #[test]
    fn lookup_wrong_type() {
        let outputs = parse_output_json(OUTPUT_JSON).unwrap();

        assert!(lookup_str(&outputs, &["node_count"]).is_err());
        assert!(lookup_object(&outputs, &["crypto_key"]).is_err());
        assert!(lookup_object(&outputs, &["gke"]).is_ok());
    }
}
