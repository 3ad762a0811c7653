//! Structural checks for the OpenAPI document itself.
//!
//! Before conformance rules mean anything, the document must be a
//! recognizable OpenAPI 3.0 or 3.1 definition. This module validates the
//! core top-level structure against a simplified schema for each version;
//! full OpenAPI validation is out of scope here.

use serde_json::{json, Value};

use crate::error::ValidateError;
use crate::result::{Finding, FindingKind, ValidationResult};

/// OpenAPI document versions the structural check understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenApiVersion {
    V3_0,
    V3_1,
}

impl OpenApiVersion {
    /// Map a full `openapi` field value to its version line.
    pub fn from_version(version: &str) -> Option<OpenApiVersion> {
        if version.starts_with("3.0.") || version == "3.0" {
            Some(OpenApiVersion::V3_0)
        } else if version.starts_with("3.1.") || version == "3.1" {
            Some(OpenApiVersion::V3_1)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OpenApiVersion::V3_0 => "3.0",
            OpenApiVersion::V3_1 => "3.1",
        }
    }

    fn core_schema(&self) -> Value {
        match self {
            OpenApiVersion::V3_0 => json!({
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "object",
                "required": ["openapi", "info", "paths"],
                "properties": {
                    "openapi": { "type": "string", "pattern": "^3\\.0(\\.\\d+)?$" },
                    "info": {
                        "type": "object",
                        "required": ["title", "version"],
                        "properties": {
                            "title": { "type": "string" },
                            "version": { "type": "string" },
                            "description": { "type": "string" },
                            "termsOfService": { "type": "string" },
                            "contact": { "type": "object" },
                            "license": { "type": "object" }
                        }
                    },
                    "paths": { "type": "object" },
                    "servers": { "type": "array" },
                    "components": { "type": "object" },
                    "security": { "type": "array" },
                    "tags": { "type": "array" },
                    "externalDocs": { "type": "object" }
                }
            }),
            // 3.1 drops the mandatory paths member and adds webhooks.
            OpenApiVersion::V3_1 => json!({
                "$schema": "https://json-schema.org/draft/2020-12/schema",
                "type": "object",
                "required": ["openapi", "info"],
                "properties": {
                    "openapi": { "type": "string", "pattern": "^3\\.1(\\.\\d+)?$" },
                    "info": {
                        "type": "object",
                        "required": ["title", "version"],
                        "properties": {
                            "title": { "type": "string" },
                            "version": { "type": "string" },
                            "summary": { "type": "string" },
                            "description": { "type": "string" },
                            "termsOfService": { "type": "string" },
                            "contact": { "type": "object" },
                            "license": { "type": "object" }
                        }
                    },
                    "paths": { "type": "object" },
                    "webhooks": { "type": "object" },
                    "servers": { "type": "array" },
                    "components": { "type": "object" },
                    "security": { "type": "array" },
                    "tags": { "type": "array" },
                    "externalDocs": { "type": "object" },
                    "jsonSchemaDialect": { "type": "string" }
                }
            }),
        }
    }
}

/// Validate the top-level structure of an OpenAPI document.
///
/// An absent or malformed `openapi` field short-circuits with a single
/// finding; otherwise the matching core schema runs and each violation
/// becomes a finding at its instance path. When `expected` is given and
/// the document declares the other version line, a version-mismatch
/// warning is added.
///
/// # Errors
///
/// Returns [`ValidateError::InvalidDocument`] for a non-object document.
pub fn validate_structure(
    document: &Value,
    expected: Option<OpenApiVersion>,
) -> Result<ValidationResult, ValidateError> {
    if !document.is_object() {
        return Err(ValidateError::InvalidDocument);
    }

    let Some(version_field) = document.get("openapi") else {
        let finding = Finding::new(
            FindingKind::MissingField,
            "openapi",
            "missing required 'openapi' field",
        );
        return Ok(ValidationResult::failure(vec![finding]));
    };
    let Some(version) = version_field.as_str() else {
        let finding = Finding::new(
            FindingKind::InvalidType,
            "openapi",
            "'openapi' field must be a string",
        );
        return Ok(ValidationResult::failure(vec![finding]));
    };
    let Some(detected) = OpenApiVersion::from_version(version) else {
        let finding = Finding::new(
            FindingKind::UnsupportedVersion,
            "openapi",
            format!("unsupported OpenAPI version: {version}"),
        );
        return Ok(ValidationResult::failure(vec![finding]));
    };

    let mut warnings = Vec::new();
    if let Some(expected) = expected {
        if expected != detected {
            warnings.push(Finding::new(
                FindingKind::VersionMismatch,
                "openapi",
                format!("expected {} but found {}", expected.as_str(), detected.as_str()),
            ));
        }
    }

    let schema = detected.core_schema();
    let validator = jsonschema::validator_for(&schema).map_err(|e| {
        ValidateError::InvalidSchema {
            message: e.to_string(),
        }
    })?;

    let errors: Vec<Finding> = validator
        .iter_errors(document)
        .map(|e| {
            let path = e.instance_path.to_string();
            let path = if path.is_empty() { "/".to_string() } else { path };
            Finding::new(FindingKind::SchemaError, path, e.to_string())
        })
        .collect();

    Ok(ValidationResult::from_findings(errors, warnings))
}
