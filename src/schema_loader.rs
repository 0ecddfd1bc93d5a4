//! JSON Schema gate for registry documents.
//!
//! The registry schema ships inside the crate (`schema/cui_registry.schema.json`)
//! so the built-in database and caller-supplied documents are checked against
//! the same contract before any index is built.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::BTreeSet;

pub(crate) const REGISTRY_SCHEMA: &str = include_str!("../schema/cui_registry.schema.json");

/// Where the schema declares the document version it accepts.
const SCHEMA_VERSION_POINTER: &str = "/properties/schema_version/const";

/// Compiled registry schema plus the version it pins.
pub(crate) struct SchemaLoadResult {
    pub schema_version: String,
    pub compiled: JSONSchema,
}

/// Compile the embedded registry schema.
///
/// `allowed_versions` guards against shipping a schema whose pinned version
/// the index does not know how to interpret.
pub(crate) fn load_registry_schema(
    allowed_versions: &BTreeSet<String>,
) -> Result<SchemaLoadResult> {
    let raw: Value =
        serde_json::from_str(REGISTRY_SCHEMA).context("parsing embedded registry schema")?;

    let schema_version = extract_schema_version(&raw, SCHEMA_VERSION_POINTER)
        .ok_or_else(|| anyhow!("registry schema missing schema_version const"))?;
    if !allowed_versions.contains(&schema_version) {
        bail!(
            "schema_version '{}' not in allowed set {:?}",
            schema_version,
            allowed_versions
        );
    }

    let compiled = JSONSchema::compile(&raw)
        .map_err(|err| anyhow!("compiling embedded registry schema: {err}"))?;

    Ok(SchemaLoadResult {
        schema_version,
        compiled,
    })
}

/// Validate a parsed document, collecting every schema violation into one error.
pub(crate) fn validate_document_value(schema: &SchemaLoadResult, document: &Value) -> Result<()> {
    if let Err(errors) = schema.compiled.validate(document) {
        let details = errors
            .map(|err| {
                let path = err.instance_path.to_string();
                if path.is_empty() {
                    err.to_string()
                } else {
                    format!("{path}: {err}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        bail!("registry document failed schema validation:\n{details}");
    }
    Ok(())
}

fn extract_schema_version(schema: &Value, pointer: &str) -> Option<String> {
    let version = schema.pointer(pointer).and_then(Value::as_str)?;
    if version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn allowed() -> BTreeSet<String> {
        BTreeSet::from(["cui_registry_v1".to_string()])
    }

    #[test]
    fn embedded_schema_compiles_and_pins_version() {
        let schema = load_registry_schema(&allowed()).unwrap();
        assert_eq!(schema.schema_version, "cui_registry_v1");
    }

    #[test]
    fn rejects_schema_outside_allowed_versions() {
        let other = BTreeSet::from(["cui_registry_v9".to_string()]);
        let err = load_registry_schema(&other).err().unwrap();
        assert!(err.to_string().contains("not in allowed set"));
    }

    #[test]
    fn validation_collects_violations_with_paths() {
        let schema = load_registry_schema(&allowed()).unwrap();
        let document = json!({
            "schema_version": "cui_registry_v1",
            "source": {"title": "fixture"},
            "organizations": {"ORG": "Org"},
            "categories": [
                {"code": "A", "marking": "A", "name": "A", "specified": "yes", "organization": "ORG"}
            ]
        });
        let err = validate_document_value(&schema, &document).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("failed schema validation"));
        assert!(message.contains("/categories/0/specified"), "{message}");
    }

    #[test]
    fn minimal_document_passes() {
        let schema = load_registry_schema(&allowed()).unwrap();
        let document = json!({
            "schema_version": "cui_registry_v1",
            "source": {"title": "fixture"},
            "organizations": {},
            "categories": []
        });
        validate_document_value(&schema, &document).unwrap();
    }

    #[test]
    fn version_extraction_rejects_odd_characters() {
        let schema = json!({"properties": {"schema_version": {"const": "bad version!"}}});
        assert_eq!(extract_schema_version(&schema, SCHEMA_VERSION_POINTER), None);
    }
}
