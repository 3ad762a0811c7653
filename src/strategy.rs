//! The validation strategy abstraction and its default rule engine.
//!
//! A strategy is the rule evaluator for one API family: given a parsed
//! OpenAPI document and the declared conformance classes, it derives which
//! paths, operations, parameters and response codes the document must
//! expose, and reports each miss as a finding. Strategies are stateless;
//! `validate` is a pure function of its inputs.
//!
//! Concrete families implement the rule-table methods and inherit the
//! evaluation loop, matching and scoring from the trait's default methods.
//! Third-party strategies implement the same trait and register with
//! [`StrategyRegistry`](crate::StrategyRegistry).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;

use crate::error::ValidateError;
use crate::result::{Finding, FindingKind, Severity, ValidationResult};
use crate::types::{major_minor_eq, ApiFamily, ConformanceClass};

/// Score bonus for a declared `core` class of the strategy's own family.
/// A core declaration outranks any number of non-core classes alone.
pub(crate) const CORE_SCORE_BONUS: u32 = 5;

/// A required query parameter on one operation, activated by a declared
/// conformance class or carried unconditionally as an advisory check.
#[derive(Debug, Clone)]
pub struct ParameterRule {
    /// Path template the operation lives on.
    pub path: &'static str,
    /// Lower-case HTTP method.
    pub method: &'static str,
    /// Parameter name that must be declared on the operation.
    pub name: &'static str,
    pub severity: Severity,
    /// The class that activated this rule, if gated.
    pub conformance_class: Option<&'static str>,
}

/// A required response status code on one operation.
#[derive(Debug, Clone)]
pub struct ResponseRule {
    pub path: &'static str,
    pub method: &'static str,
    /// Status code key expected under `responses` (e.g. `200`).
    pub status: &'static str,
    pub severity: Severity,
    pub conformance_class: Option<&'static str>,
}

/// Rule evaluator for one API family.
pub trait ValidationStrategy {
    /// The family this strategy validates.
    fn family(&self) -> ApiFamily;

    /// URI substrings that mark this strategy as a structural match.
    fn required_conformance_patterns(&self) -> &[&str];

    /// Class names that, when declared, extend the required structure.
    fn optional_conformance_patterns(&self) -> &[&str] {
        &[]
    }

    /// Profile versions this strategy's rule tables cover.
    fn supported_versions(&self) -> &[&str] {
        &["1.0"]
    }

    /// Path templates the document must expose, conditioned on the
    /// declared classes.
    fn required_paths(&self, classes: &[ConformanceClass]) -> Vec<String>;

    /// Required HTTP methods per path template.
    fn required_operations(
        &self,
        classes: &[ConformanceClass],
    ) -> BTreeMap<String, BTreeSet<String>>;

    /// Parameter requirements, conditioned on the declared classes.
    fn parameter_rules(&self, classes: &[ConformanceClass]) -> Vec<ParameterRule> {
        let _ = classes;
        Vec::new()
    }

    /// Response-code requirements, conditioned on the declared classes.
    fn response_rules(&self, classes: &[ConformanceClass]) -> Vec<ResponseRule> {
        let _ = classes;
        Vec::new()
    }

    /// True if this strategy should handle the given declarations.
    ///
    /// Matches when any class's derived family equals this strategy's
    /// family, or — for servers declaring non-canonical URIs — when a
    /// required pattern appears as a substring of any raw URI.
    fn matches_conformance(&self, classes: &[ConformanceClass]) -> bool {
        let family = self.family();
        if classes.iter().any(|c| c.family() == family) {
            return true;
        }
        classes.iter().any(|c| {
            let uri = c.uri().to_lowercase();
            self.required_conformance_patterns()
                .iter()
                .any(|p| uri.contains(&p.to_lowercase()))
        })
    }

    /// Rank used to break ties when several strategies match: the count of
    /// declared classes of this family, plus a fixed bonus when the
    /// family's `core` class is among them.
    fn conformance_score(&self, classes: &[ConformanceClass]) -> u32 {
        let family = self.family();
        let own: Vec<_> = classes.iter().filter(|c| c.family() == family).collect();
        let core_bonus = if own.iter().any(|c| c.is_core()) {
            CORE_SCORE_BONUS
        } else {
            0
        };
        own.len() as u32 + core_bonus
    }

    /// True if this strategy's rule tables cover the given profile version.
    /// Versions compare on their major.minor prefix; an empty version
    /// (nothing to check against) is accepted.
    fn supports_version(&self, version: &str) -> bool {
        version.is_empty()
            || self
                .supported_versions()
                .iter()
                .any(|v| major_minor_eq(v, version))
    }

    /// Evaluate the document against this strategy's rules.
    ///
    /// Critical findings land in `errors`, advisory ones in `warnings`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidateError::InvalidDocument`] if the document tree is
    /// not a JSON object. Everything else is reported as findings.
    fn validate(
        &self,
        document: &Value,
        classes: &[ConformanceClass],
    ) -> Result<ValidationResult, ValidateError> {
        if !document.is_object() {
            return Err(ValidateError::InvalidDocument);
        }

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let paths = document_paths(document);

        for template in self.required_paths(classes) {
            if !paths.keys().any(|p| path_matches_template(p, &template)) {
                errors.push(Finding::new(
                    FindingKind::MissingRequiredPath,
                    format!("paths{template}"),
                    format!("required path '{template}' not found"),
                ));
            }
        }

        for (template, methods) in self.required_operations(classes) {
            for (path, item) in paths.iter().filter(|(p, _)| path_matches_template(p, &template)) {
                let Some(item) = item.as_object() else {
                    continue;
                };
                for method in &methods {
                    if !item.contains_key(method.as_str()) {
                        errors.push(Finding::new(
                            FindingKind::MissingRequiredOperation,
                            format!("paths{path}/{method}"),
                            format!(
                                "required operation '{}' not found for path '{path}'",
                                method.to_uppercase()
                            ),
                        ));
                    }
                }
            }
        }

        for rule in self.parameter_rules(classes) {
            for (path, item) in paths.iter().filter(|(p, _)| path_matches_template(p, rule.path)) {
                let Some(operation) = item.get(rule.method) else {
                    continue;
                };
                if !operation_has_parameter(operation, rule.name) {
                    let mut finding = Finding::new(
                        FindingKind::MissingParameter,
                        format!("paths{path}/{}/parameters", rule.method),
                        format!("parameter '{}' not declared on {path}", rule.name),
                    )
                    .with_severity(rule.severity);
                    if let Some(class) = rule.conformance_class {
                        finding = finding.for_class(class);
                    }
                    push_finding(&mut errors, &mut warnings, finding);
                }
            }
        }

        for rule in self.response_rules(classes) {
            for (path, item) in paths.iter().filter(|(p, _)| path_matches_template(p, rule.path)) {
                let Some(operation) = item.get(rule.method) else {
                    continue;
                };
                let declared = operation
                    .get("responses")
                    .and_then(Value::as_object)
                    .map(|r| r.contains_key(rule.status))
                    .unwrap_or(false);
                if !declared {
                    let mut finding = Finding::new(
                        FindingKind::MissingResponse,
                        format!("paths{path}/{}/responses", rule.method),
                        format!("response '{}' not declared on {path}", rule.status),
                    )
                    .with_severity(rule.severity);
                    if let Some(class) = rule.conformance_class {
                        finding = finding.for_class(class);
                    }
                    push_finding(&mut errors, &mut warnings, finding);
                }
            }
        }

        Ok(ValidationResult::from_findings(errors, warnings))
    }
}

fn push_finding(errors: &mut Vec<Finding>, warnings: &mut Vec<Finding>, finding: Finding) {
    if finding.severity == Severity::Critical {
        errors.push(finding);
    } else {
        warnings.push(finding);
    }
}

/// The document's path table, empty when absent or malformed. A missing
/// `paths` member is absorbed here; required paths then simply all miss.
fn document_paths(document: &Value) -> &serde_json::Map<String, Value> {
    static EMPTY: std::sync::OnceLock<serde_json::Map<String, Value>> = std::sync::OnceLock::new();
    document
        .get("paths")
        .and_then(Value::as_object)
        .unwrap_or_else(|| EMPTY.get_or_init(serde_json::Map::new))
}

/// Check a concrete path against a template with `{placeholder}` segments.
/// Placeholders match any single non-empty segment, including a literal
/// placeholder spelled in the document.
pub fn path_matches_template(path: &str, template: &str) -> bool {
    let mut path_segments = path.trim_end_matches('/').split('/');
    let mut template_segments = template.trim_end_matches('/').split('/');

    loop {
        match (path_segments.next(), template_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(t)) => {
                let is_placeholder = t.starts_with('{') && t.ends_with('}');
                if is_placeholder {
                    if p.is_empty() {
                        return false;
                    }
                } else if p != t {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

fn operation_has_parameter(operation: &Value, name: &str) -> bool {
    operation
        .get("parameters")
        .and_then(Value::as_array)
        .map(|params| {
            params
                .iter()
                .any(|p| p.get("name").and_then(Value::as_str) == Some(name))
        })
        .unwrap_or(false)
}

/// Shared handle to a registered strategy.
pub type StrategyRef = Arc<dyn ValidationStrategy + Send + Sync>;

/// An ordered aggregate of several family strategies.
///
/// Built by the registry when a document structurally matches more than one
/// family. Member order is fixed at construction (descending conformance
/// score, family name as tie-break) and determines finding order in the
/// merged result.
pub struct CompositeStrategy {
    members: Vec<StrategyRef>,
}

impl CompositeStrategy {
    pub fn new(members: Vec<StrategyRef>) -> Self {
        CompositeStrategy { members }
    }

    pub fn members(&self) -> &[StrategyRef] {
        &self.members
    }
}

impl ValidationStrategy for CompositeStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Common
    }

    fn required_conformance_patterns(&self) -> &[&str] {
        &[]
    }

    fn matches_conformance(&self, classes: &[ConformanceClass]) -> bool {
        self.members.iter().any(|s| s.matches_conformance(classes))
    }

    fn conformance_score(&self, classes: &[ConformanceClass]) -> u32 {
        self.members.iter().map(|s| s.conformance_score(classes)).sum()
    }

    fn supports_version(&self, version: &str) -> bool {
        self.members.iter().all(|s| s.supports_version(version))
    }

    /// Union of member paths, first occurrence wins the position.
    fn required_paths(&self, classes: &[ConformanceClass]) -> Vec<String> {
        let mut paths = Vec::new();
        for strategy in &self.members {
            for path in strategy.required_paths(classes) {
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }
        paths
    }

    /// Union of member operations; method sets merge on equal templates.
    fn required_operations(
        &self,
        classes: &[ConformanceClass],
    ) -> BTreeMap<String, BTreeSet<String>> {
        let mut operations: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for strategy in &self.members {
            for (path, methods) in strategy.required_operations(classes) {
                operations.entry(path).or_default().extend(methods);
            }
        }
        operations
    }

    fn validate(
        &self,
        document: &Value,
        classes: &[ConformanceClass],
    ) -> Result<ValidationResult, ValidateError> {
        if !document.is_object() {
            return Err(ValidateError::InvalidDocument);
        }

        let mut merged = ValidationResult::success();
        for strategy in &self.members {
            merged = merged.merge(strategy.validate(document, classes)?);
        }
        Ok(merged)
    }
}
