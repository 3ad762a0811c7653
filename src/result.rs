//! Validation outcomes: severity-classified findings and their aggregation.

use serde::{Deserialize, Serialize};

use crate::types::SpecificationKey;

/// Severity of a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// Taxonomy of finding types.
///
/// Severity belongs to the finding, not the kind, but each kind carries the
/// default it is emitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    MissingRequiredPath,
    MissingRequiredOperation,
    MissingParameter,
    MissingResponse,
    UnsupportedVersion,
    MissingReferencePath,
    VersionMismatch,
    // Kinds emitted by the OpenAPI core-structure check.
    MissingField,
    InvalidType,
    SchemaError,
}

impl FindingKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            FindingKind::MissingRequiredPath
            | FindingKind::MissingRequiredOperation
            | FindingKind::MissingParameter
            | FindingKind::MissingResponse
            | FindingKind::UnsupportedVersion
            | FindingKind::MissingField
            | FindingKind::InvalidType
            | FindingKind::SchemaError => Severity::Critical,
            FindingKind::MissingReferencePath | FindingKind::VersionMismatch => Severity::Warning,
        }
    }
}

/// One reported issue: a path locator, human-readable message, taxonomy
/// kind, and severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Locator into the document (e.g. `paths/collections`).
    pub path: String,
    pub message: String,
    pub kind: FindingKind,
    pub severity: Severity,
    /// The declared conformance class that activated this requirement,
    /// when the requirement is gated rather than unconditional.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conformance_class: Option<String>,
}

impl Finding {
    /// Create a finding with the kind's default severity.
    pub fn new(kind: FindingKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Finding {
            path: path.into(),
            message: message.into(),
            kind,
            severity: kind.default_severity(),
            conformance_class: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn for_class(mut self, class_name: impl Into<String>) -> Self {
        self.conformance_class = Some(class_name.into());
        self
    }
}

/// Per-severity finding counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub total: usize,
}

/// Immutable outcome of one validation call.
///
/// `errors` holds the findings that fail the call (critical severity);
/// advisory findings (warning and info severity) go to `warnings`, so
/// `is_valid` is exactly "no critical finding was produced".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_against: Option<SpecificationKey>,
}

impl ValidationResult {
    pub fn success() -> Self {
        ValidationResult {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            validated_against: None,
        }
    }

    pub fn failure(errors: Vec<Finding>) -> Self {
        ValidationResult {
            is_valid: false,
            errors,
            warnings: Vec::new(),
            validated_against: None,
        }
    }

    /// Build from collected findings: valid iff `errors` is empty.
    pub fn from_findings(errors: Vec<Finding>, warnings: Vec<Finding>) -> Self {
        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            validated_against: None,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<Finding>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn against(mut self, key: SpecificationKey) -> Self {
        self.validated_against = Some(key);
        self
    }

    fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.errors.iter().chain(self.warnings.iter())
    }

    /// Findings of a given severity, across both sequences.
    pub fn findings_by_severity(&self, severity: Severity) -> Vec<&Finding> {
        self.findings().filter(|f| f.severity == severity).collect()
    }

    pub fn critical_errors(&self) -> Vec<&Finding> {
        self.findings_by_severity(Severity::Critical)
    }

    pub fn warning_errors(&self) -> Vec<&Finding> {
        self.findings_by_severity(Severity::Warning)
    }

    pub fn info_errors(&self) -> Vec<&Finding> {
        self.findings_by_severity(Severity::Info)
    }

    pub fn has_critical_errors(&self) -> bool {
        self.findings().any(|f| f.severity == Severity::Critical)
    }

    /// True iff no critical-severity finding exists, independent of
    /// `is_valid`.
    pub fn is_compliant(&self) -> bool {
        !self.has_critical_errors()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            critical: 0,
            warning: 0,
            info: 0,
            total: 0,
        };
        for finding in self.findings() {
            match finding.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
            summary.total += 1;
        }
        summary
    }

    /// Combine two results.
    ///
    /// Error and warning sequences are concatenated, preserving the relative
    /// order within each operand; `is_valid` is the logical AND.
    /// `validated_against` survives only when both sides agree.
    pub fn merge(mut self, other: ValidationResult) -> ValidationResult {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.is_valid = self.is_valid && other.is_valid;
        if self.validated_against != other.validated_against {
            self.validated_against = None;
        }
        self
    }
}
