//! Strategy registration, selection, and the top-level validation entry
//! points.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::ValidateError;
use crate::families::{
    CommonStrategy, CoveragesStrategy, EdrStrategy, FeaturesStrategy, MapsStrategy,
    ProcessesStrategy, RecordsStrategy, RoutesStrategy, StylesStrategy, TilesStrategy,
};
use crate::reference::ReferenceSource;
use crate::result::{Finding, FindingKind, ValidationResult};
use crate::strategy::{path_matches_template, CompositeStrategy, StrategyRef, ValidationStrategy};
use crate::types::{parse_conformance_classes, ApiFamily, ConformanceClass, SpecificationKey};

/// Registry of one strategy per API family.
///
/// Holds the ten built-in strategies by default; callers swap in their own
/// with [`StrategyRegistry::register`]. Interior locking makes a shared
/// registry usable from concurrent validators; each call works on a
/// snapshot taken at entry, so a registration mid-validation does not
/// affect an in-flight call.
pub struct StrategyRegistry {
    strategies: RwLock<BTreeMap<ApiFamily, StrategyRef>>,
}

impl StrategyRegistry {
    /// A registry pre-populated with the ten built-in strategies.
    pub fn new() -> Self {
        let mut strategies: BTreeMap<ApiFamily, StrategyRef> = BTreeMap::new();
        let defaults: [StrategyRef; 10] = [
            Arc::new(CommonStrategy),
            Arc::new(FeaturesStrategy),
            Arc::new(TilesStrategy),
            Arc::new(MapsStrategy),
            Arc::new(ProcessesStrategy),
            Arc::new(RecordsStrategy),
            Arc::new(CoveragesStrategy),
            Arc::new(EdrStrategy),
            Arc::new(StylesStrategy),
            Arc::new(RoutesStrategy),
        ];
        for strategy in defaults {
            strategies.insert(strategy.family(), strategy);
        }
        StrategyRegistry {
            strategies: RwLock::new(strategies),
        }
    }

    /// An empty registry with no strategies at all.
    pub fn empty() -> Self {
        StrategyRegistry {
            strategies: RwLock::new(BTreeMap::new()),
        }
    }

    /// Install a strategy for its family, replacing any previous one.
    pub fn register(&self, strategy: StrategyRef) {
        let family = strategy.family();
        self.write_lock().insert(family, strategy);
    }

    /// Remove the strategy for a family, returning it if present.
    pub fn unregister(&self, family: ApiFamily) -> Option<StrategyRef> {
        self.write_lock().remove(&family)
    }

    /// The strategy registered for a family.
    pub fn get(&self, family: ApiFamily) -> Option<StrategyRef> {
        self.read_lock().get(&family).cloned()
    }

    /// Families with a registered strategy, in family order.
    pub fn families(&self) -> Vec<ApiFamily> {
        self.read_lock().keys().copied().collect()
    }

    fn snapshot(&self) -> Vec<StrategyRef> {
        // Iterate in the specificity order of ApiFamily::ALL so composite
        // member tie-breaks are stable.
        let guard = self.read_lock();
        ApiFamily::ALL
            .iter()
            .filter_map(|family| guard.get(family).cloned())
            .collect()
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<ApiFamily, StrategyRef>> {
        match self.strategies.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<ApiFamily, StrategyRef>> {
        match self.strategies.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Select the strategy for a set of declared classes.
    ///
    /// No match falls back to the Common strategy; a single match is
    /// returned as-is; several matches are wrapped in a
    /// [`CompositeStrategy`] ordered by descending conformance score, with
    /// the family name breaking ties.
    pub fn get_for_conformance(&self, classes: &[ConformanceClass]) -> StrategyRef {
        let mut matches: Vec<(u32, StrategyRef)> = self
            .snapshot()
            .into_iter()
            .filter(|s| s.matches_conformance(classes))
            .map(|s| (s.conformance_score(classes), s))
            .collect();

        match matches.len() {
            0 => self
                .get(ApiFamily::Common)
                .unwrap_or_else(|| Arc::new(CommonStrategy)),
            1 => matches.remove(0).1,
            _ => {
                matches.sort_by(|(score_a, a), (score_b, b)| {
                    score_b
                        .cmp(score_a)
                        .then_with(|| a.family().token().cmp(b.family().token()))
                });
                Arc::new(CompositeStrategy::new(
                    matches.into_iter().map(|(_, s)| s).collect(),
                ))
            }
        }
    }

    /// Select a strategy from conformance declarations, then validate.
    ///
    /// When `classes` is empty, declarations are extracted from the
    /// document itself: the `info.x-conformance` and top-level
    /// `x-conformsTo` extensions, falling back to inference from the path
    /// structure.
    ///
    /// # Errors
    ///
    /// Returns [`ValidateError::InvalidDocument`] for a non-object
    /// document.
    pub fn detect_and_validate(
        &self,
        document: &Value,
        classes: &[ConformanceClass],
    ) -> Result<ValidationResult, ValidateError> {
        if !document.is_object() {
            return Err(ValidateError::InvalidDocument);
        }
        let effective;
        let classes = if classes.is_empty() {
            effective = extract_conformance(document);
            &effective
        } else {
            classes
        };
        self.get_for_conformance(classes).validate(document, classes)
    }

    /// Validate a document against one named specification, using
    /// `reference` for the path comparison.
    ///
    /// The strategy is chosen by the key's family (Common when the family
    /// has no registration). A version outside the strategy's rule tables
    /// is reported as a finding rather than evaluated against rules that
    /// do not apply to it. Reference paths absent from the document are
    /// appended as advisory findings.
    ///
    /// # Errors
    ///
    /// Returns [`ValidateError::InvalidDocument`] for a non-object
    /// document.
    pub fn validate_against_spec(
        &self,
        document: &Value,
        key: &SpecificationKey,
        reference: &dyn ReferenceSource,
        classes: &[ConformanceClass],
    ) -> Result<ValidationResult, ValidateError> {
        if !document.is_object() {
            return Err(ValidateError::InvalidDocument);
        }

        let strategy = self
            .get(key.family)
            .or_else(|| self.get(ApiFamily::Common))
            .unwrap_or_else(|| Arc::new(CommonStrategy));

        if !strategy.supports_version(&key.spec_version) {
            let finding = Finding::new(
                FindingKind::UnsupportedVersion,
                "info/version".to_string(),
                format!(
                    "version '{}' is not covered by the {} rules",
                    key.spec_version,
                    key.family.display_name()
                ),
            );
            return Ok(ValidationResult::failure(vec![finding]).against(key.clone()));
        }

        let mut result = strategy.validate(document, classes)?.against(key.clone());

        if let Some(reference_paths) = reference.reference_paths(key) {
            let declared: Vec<&str> = document
                .get("paths")
                .and_then(Value::as_object)
                .map(|paths| paths.keys().map(String::as_str).collect())
                .unwrap_or_default();
            for template in reference_paths {
                let present = declared
                    .iter()
                    .any(|p| path_matches_template(p, &template));
                if !present {
                    result.warnings.push(Finding::new(
                        FindingKind::MissingReferencePath,
                        format!("paths{template}"),
                        format!("reference declares '{template}' which is absent here"),
                    ));
                }
            }
        }

        Ok(result)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        StrategyRegistry::new()
    }
}

/// Pull conformance declarations out of the document, falling back to
/// path-structure inference when no extension carries them.
pub fn extract_conformance(document: &Value) -> Vec<ConformanceClass> {
    let mut classes = Vec::new();

    if let Some(declared) = document.get("info").and_then(|i| i.get("x-conformance")) {
        classes.extend(parse_conformance_classes(declared));
    }
    if let Some(declared) = document.get("x-conformsTo") {
        classes.extend(parse_conformance_classes(declared));
    }
    if classes.is_empty() {
        classes = infer_conformance_from_paths(document);
    }
    classes
}

/// Guess conformance classes from the shape of the path table. Used only
/// when the document declares nothing; each recognized pattern yields the
/// family's core class.
pub fn infer_conformance_from_paths(document: &Value) -> Vec<ConformanceClass> {
    let paths: Vec<&str> = document
        .get("paths")
        .and_then(Value::as_object)
        .map(|paths| paths.keys().map(String::as_str).collect())
        .unwrap_or_default();
    let has = |needle: &str| paths.iter().any(|p| p.contains(needle));
    let has_exact = |path: &str| paths.iter().any(|p| *p == path);

    let mut inferred = Vec::new();
    let mut core = |family: ApiFamily| {
        inferred.push(ConformanceClass::parse(&format!(
            "http://www.opengis.net/spec/ogcapi-{}-1/1.0/conf/core",
            family.token()
        )));
    };

    if has_exact("/") && has_exact("/conformance") {
        core(ApiFamily::Common);
    }

    let has_collections = has_exact("/collections");
    if has_collections && has("/items") {
        // featureId vs recordId disambiguates the two catalog shapes;
        // bare /items defaults to Features.
        let has_record_id = has("recordId");
        if has("featureId") || !has_record_id {
            core(ApiFamily::Features);
        }
        if has_record_id {
            core(ApiFamily::Records);
        }
    }

    if has("/tiles") && has("tileMatrix") {
        core(ApiFamily::Tiles);
    }
    if has_exact("/processes") && has("/execution") {
        core(ApiFamily::Processes);
    }
    if has_collections && has("/map") {
        core(ApiFamily::Maps);
    }
    if has_collections && has("/coverage") {
        core(ApiFamily::Coverages);
    }
    let edr_queries = ["position", "area", "cube", "trajectory", "corridor"];
    if has_collections && edr_queries.iter().any(|q| has(q)) {
        core(ApiFamily::Edr);
    }
    if has_exact("/styles") {
        core(ApiFamily::Styles);
    }
    if has_exact("/routes") {
        core(ApiFamily::Routes);
    }

    inferred
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classes(uris: &[&str]) -> Vec<ConformanceClass> {
        uris.iter().map(|u| ConformanceClass::parse(u)).collect()
    }

    #[test]
    fn default_registry_holds_all_families() {
        let registry = StrategyRegistry::new();
        assert_eq!(registry.families().len(), 10);
        assert!(registry.get(ApiFamily::Edr).is_some());
    }

    #[test]
    fn single_match_returns_that_strategy() {
        let registry = StrategyRegistry::new();
        let strategy = registry.get_for_conformance(&classes(&[
            "http://www.opengis.net/spec/ogcapi-tiles-1/1.0/conf/core",
        ]));
        assert_eq!(strategy.family(), ApiFamily::Tiles);
    }

    #[test]
    fn no_match_falls_back_to_common() {
        let registry = StrategyRegistry::new();
        let strategy = registry.get_for_conformance(&[]);
        assert_eq!(strategy.family(), ApiFamily::Common);
    }

    #[test]
    fn multiple_matches_produce_composite_union() {
        let registry = StrategyRegistry::new();
        let declared = classes(&[
            "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core",
            "http://www.opengis.net/spec/ogcapi-tiles-1/1.0/conf/core",
            "http://www.opengis.net/spec/ogcapi-tiles-1/1.0/conf/tileset",
        ]);
        let strategy = registry.get_for_conformance(&declared);
        let required = strategy.required_paths(&declared);
        assert!(required.contains(&"/collections/{collectionId}/items".to_string()));
        assert!(required.contains(&"/tiles".to_string()));
    }

    #[test]
    fn composite_orders_members_by_score() {
        let registry = StrategyRegistry::new();
        // Tiles declares core + an extension, Features only a non-core
        // class, so Tiles findings should come first in a merged result.
        let declared = classes(&[
            "http://www.opengis.net/spec/ogcapi-tiles-1/1.0/conf/core",
            "http://www.opengis.net/spec/ogcapi-tiles-1/1.0/conf/tileset",
            "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/geojson",
        ]);
        let strategy = registry.get_for_conformance(&declared);
        let required = strategy.required_paths(&declared);
        let tiles_pos = required.iter().position(|p| p == "/tiles");
        let features_pos = required.iter().position(|p| p == "/collections");
        assert!(tiles_pos.is_some() && features_pos.is_some());
        assert!(tiles_pos < features_pos);
    }

    #[test]
    fn detect_uses_declared_extension() {
        let registry = StrategyRegistry::new();
        let doc = json!({
            "openapi": "3.0.3",
            "info": {
                "title": "t",
                "version": "1",
                "x-conformance": [
                    "http://www.opengis.net/spec/ogcapi-processes-1/1.0/conf/core"
                ]
            },
            "paths": {
                "/processes": { "get": { "responses": { "200": {} } } },
                "/processes/{processId}": { "get": {} },
                "/processes/{processId}/execution": { "post": {} }
            }
        });
        let result = registry.detect_and_validate(&doc, &[]).unwrap();
        assert!(result.is_valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn detect_rejects_non_object_document() {
        let registry = StrategyRegistry::new();
        let err = registry.detect_and_validate(&json!([1, 2]), &[]).unwrap_err();
        assert!(matches!(err, ValidateError::InvalidDocument));
    }

    #[test]
    fn infer_features_from_item_paths() {
        let doc = json!({
            "paths": {
                "/": {},
                "/conformance": {},
                "/collections": {},
                "/collections/{collectionId}/items/{featureId}": {}
            }
        });
        let inferred = infer_conformance_from_paths(&doc);
        assert!(inferred.iter().any(|c| c.family() == ApiFamily::Common));
        assert!(inferred.iter().any(|c| c.family() == ApiFamily::Features));
        assert!(!inferred.iter().any(|c| c.family() == ApiFamily::Records));
    }

    #[test]
    fn infer_records_when_record_id_present() {
        let doc = json!({
            "paths": {
                "/collections": {},
                "/collections/{collectionId}/items/{recordId}": {}
            }
        });
        let inferred = infer_conformance_from_paths(&doc);
        assert!(inferred.iter().any(|c| c.family() == ApiFamily::Records));
        assert!(!inferred.iter().any(|c| c.family() == ApiFamily::Features));
    }

    #[test]
    fn infer_tiles_needs_matrix_segment() {
        let doc = json!({
            "paths": {
                "/tiles/{tileMatrixSetId}/{tileMatrix}/{tileRow}/{tileCol}": {}
            }
        });
        let inferred = infer_conformance_from_paths(&doc);
        assert!(inferred.iter().any(|c| c.family() == ApiFamily::Tiles));
    }

    #[test]
    fn registered_custom_strategy_replaces_the_default() {
        use std::collections::BTreeSet;

        struct PinnedFeatures;

        impl ValidationStrategy for PinnedFeatures {
            fn family(&self) -> ApiFamily {
                ApiFamily::Features
            }

            fn required_conformance_patterns(&self) -> &[&str] {
                &["ogcapi-features"]
            }

            fn required_paths(&self, _classes: &[ConformanceClass]) -> Vec<String> {
                vec!["/collections/pinned".to_string()]
            }

            fn required_operations(
                &self,
                _classes: &[ConformanceClass],
            ) -> std::collections::BTreeMap<String, BTreeSet<String>> {
                std::collections::BTreeMap::new()
            }
        }

        let registry = StrategyRegistry::new();
        registry.register(Arc::new(PinnedFeatures));

        let declared = classes(&["http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core"]);
        let strategy = registry.get_for_conformance(&declared);
        assert_eq!(strategy.family(), ApiFamily::Features);
        assert_eq!(
            strategy.required_paths(&declared),
            vec!["/collections/pinned".to_string()]
        );

        let doc = json!({ "paths": {} });
        let result = registry.detect_and_validate(&doc, &declared).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].path.contains("/collections/pinned"));
    }

    #[test]
    fn unregister_removes_family() {
        let registry = StrategyRegistry::new();
        assert!(registry.unregister(ApiFamily::Routes).is_some());
        assert!(registry.get(ApiFamily::Routes).is_none());
        assert!(registry.unregister(ApiFamily::Routes).is_none());
    }

    #[test]
    fn unsupported_version_is_a_finding_not_a_fault() {
        let registry = StrategyRegistry::new();
        let reference = crate::reference::SpecificationRegistry::new();
        let key = SpecificationKey::new(ApiFamily::Features, "9.0", Some(1));
        let result = registry
            .validate_against_spec(&json!({ "paths": {} }), &key, &reference, &[])
            .unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, FindingKind::UnsupportedVersion);
        assert_eq!(result.validated_against, Some(key));
    }

    #[test]
    fn reference_gap_reported_as_warning() {
        let registry = StrategyRegistry::new();
        let mut reference = crate::reference::SpecificationRegistry::new();
        let key = SpecificationKey::new(ApiFamily::Common, "1.0", Some(1));
        reference
            .register(
                key.clone(),
                json!({ "paths": { "/": {}, "/conformance": {}, "/api": {} } }),
                false,
            )
            .unwrap();
        let doc = json!({
            "paths": { "/": { "get": {} }, "/conformance": { "get": {} } }
        });
        let result = registry
            .validate_against_spec(&doc, &key, &reference, &[])
            .unwrap();
        assert!(result.is_valid);
        let gaps: Vec<_> = result
            .warnings
            .iter()
            .filter(|f| f.kind == FindingKind::MissingReferencePath)
            .collect();
        assert_eq!(gaps.len(), 1);
        assert!(gaps[0].path.contains("/api"));
    }
}
