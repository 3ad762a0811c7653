//! Built-in strategies for the ten standard API families.
//!
//! Each strategy encodes the structural requirements of one family's Part 1
//! core, plus the extra requirements activated by declared extension
//! classes. Paths use OpenAPI `{placeholder}` templates.

use std::collections::{BTreeMap, BTreeSet};

use crate::result::Severity;
use crate::strategy::{ParameterRule, ResponseRule, ValidationStrategy};
use crate::types::{ApiFamily, ConformanceClass};

/// True when a class of `family` with the given name is declared. Names
/// compare case-insensitively so malformed-but-recognizable URIs still
/// activate their gates.
fn declares(classes: &[ConformanceClass], family: ApiFamily, name: &str) -> bool {
    classes
        .iter()
        .any(|c| c.family() == family && c.class_name().eq_ignore_ascii_case(name))
}

fn operations(entries: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
    entries
        .iter()
        .map(|(path, methods)| {
            (
                (*path).to_string(),
                methods.iter().map(|m| (*m).to_string()).collect(),
            )
        })
        .collect()
}

fn paths(templates: &[&str]) -> Vec<String> {
    templates.iter().map(|t| (*t).to_string()).collect()
}

/// OGC API - Common: the landing page and conformance declaration every
/// conforming API carries.
#[derive(Debug, Default)]
pub struct CommonStrategy;

impl ValidationStrategy for CommonStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Common
    }

    fn required_conformance_patterns(&self) -> &[&str] {
        &["ogcapi-common"]
    }

    fn required_paths(&self, _classes: &[ConformanceClass]) -> Vec<String> {
        paths(&["/", "/conformance"])
    }

    fn required_operations(
        &self,
        _classes: &[ConformanceClass],
    ) -> BTreeMap<String, BTreeSet<String>> {
        operations(&[("/", &["get"]), ("/conformance", &["get"])])
    }
}

/// OGC API - Features Part 1 core, with gates for the `crs` (Part 2) and
/// `filter` (Part 3) classes.
#[derive(Debug, Default)]
pub struct FeaturesStrategy;

impl ValidationStrategy for FeaturesStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Features
    }

    fn required_conformance_patterns(&self) -> &[&str] {
        &["ogcapi-features"]
    }

    fn optional_conformance_patterns(&self) -> &[&str] {
        &["crs", "filter"]
    }

    fn required_paths(&self, _classes: &[ConformanceClass]) -> Vec<String> {
        paths(&[
            "/",
            "/conformance",
            "/collections",
            "/collections/{collectionId}",
            "/collections/{collectionId}/items",
            "/collections/{collectionId}/items/{featureId}",
        ])
    }

    fn required_operations(
        &self,
        _classes: &[ConformanceClass],
    ) -> BTreeMap<String, BTreeSet<String>> {
        operations(&[
            ("/", &["get"]),
            ("/conformance", &["get"]),
            ("/collections", &["get"]),
            ("/collections/{collectionId}", &["get"]),
            ("/collections/{collectionId}/items", &["get"]),
            ("/collections/{collectionId}/items/{featureId}", &["get"]),
        ])
    }

    fn parameter_rules(&self, classes: &[ConformanceClass]) -> Vec<ParameterRule> {
        let items = "/collections/{collectionId}/items";
        let mut rules = vec![
            ParameterRule {
                path: items,
                method: "get",
                name: "limit",
                severity: Severity::Warning,
                conformance_class: None,
            },
            ParameterRule {
                path: items,
                method: "get",
                name: "bbox",
                severity: Severity::Warning,
                conformance_class: None,
            },
        ];
        if declares(classes, ApiFamily::Features, "crs") {
            for name in ["crs", "bbox-crs"] {
                rules.push(ParameterRule {
                    path: items,
                    method: "get",
                    name,
                    severity: Severity::Critical,
                    conformance_class: Some("crs"),
                });
            }
        }
        if declares(classes, ApiFamily::Features, "filter") {
            for name in ["filter", "filter-lang"] {
                rules.push(ParameterRule {
                    path: items,
                    method: "get",
                    name,
                    severity: Severity::Info,
                    conformance_class: Some("filter"),
                });
            }
        }
        rules
    }

    fn response_rules(&self, _classes: &[ConformanceClass]) -> Vec<ResponseRule> {
        vec![ResponseRule {
            path: "/collections/{collectionId}/items",
            method: "get",
            status: "200",
            severity: Severity::Critical,
            conformance_class: None,
        }]
    }
}

/// OGC API - Tiles. The core class carries no path of its own; tileset
/// classes gate the dataset and geodata tile endpoints.
#[derive(Debug, Default)]
pub struct TilesStrategy;

impl TilesStrategy {
    fn dataset_tiles(classes: &[ConformanceClass]) -> bool {
        ["tileset", "tilesets-list", "dataset-tilesets"]
            .iter()
            .any(|name| declares(classes, ApiFamily::Tiles, name))
    }

    fn geodata_tiles(classes: &[ConformanceClass]) -> bool {
        declares(classes, ApiFamily::Tiles, "geodata-tilesets")
    }
}

impl ValidationStrategy for TilesStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Tiles
    }

    fn required_conformance_patterns(&self) -> &[&str] {
        &["ogcapi-tiles"]
    }

    fn optional_conformance_patterns(&self) -> &[&str] {
        &["tileset", "tilesets-list", "dataset-tilesets", "geodata-tilesets"]
    }

    fn required_paths(&self, classes: &[ConformanceClass]) -> Vec<String> {
        let mut required = Vec::new();
        if Self::dataset_tiles(classes) {
            required.extend(paths(&["/tiles", "/tiles/{tileMatrixSetId}"]));
        }
        if Self::geodata_tiles(classes) {
            required.extend(paths(&[
                "/collections/{collectionId}/tiles",
                "/collections/{collectionId}/tiles/{tileMatrixSetId}",
            ]));
        }
        required
    }

    fn required_operations(
        &self,
        classes: &[ConformanceClass],
    ) -> BTreeMap<String, BTreeSet<String>> {
        let mut ops = BTreeMap::new();
        if Self::dataset_tiles(classes) {
            ops.append(&mut operations(&[
                ("/tiles", &["get"]),
                ("/tiles/{tileMatrixSetId}", &["get"]),
            ]));
        }
        if Self::geodata_tiles(classes) {
            ops.append(&mut operations(&[
                ("/collections/{collectionId}/tiles", &["get"]),
                ("/collections/{collectionId}/tiles/{tileMatrixSetId}", &["get"]),
            ]));
        }
        ops
    }
}

/// OGC API - Processes Part 1, with gates for job listing and dismissal.
#[derive(Debug, Default)]
pub struct ProcessesStrategy;

impl ValidationStrategy for ProcessesStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Processes
    }

    fn required_conformance_patterns(&self) -> &[&str] {
        &["ogcapi-processes"]
    }

    fn optional_conformance_patterns(&self) -> &[&str] {
        &["job-list", "dismiss"]
    }

    fn required_paths(&self, classes: &[ConformanceClass]) -> Vec<String> {
        let mut required = paths(&[
            "/processes",
            "/processes/{processId}",
            "/processes/{processId}/execution",
        ]);
        if declares(classes, ApiFamily::Processes, "job-list") {
            required.push("/jobs".to_string());
        }
        if declares(classes, ApiFamily::Processes, "dismiss") {
            required.push("/jobs/{jobId}".to_string());
        }
        required
    }

    fn required_operations(
        &self,
        classes: &[ConformanceClass],
    ) -> BTreeMap<String, BTreeSet<String>> {
        let mut ops = operations(&[
            ("/processes", &["get"]),
            ("/processes/{processId}", &["get"]),
            ("/processes/{processId}/execution", &["post"]),
        ]);
        if declares(classes, ApiFamily::Processes, "job-list") {
            ops.append(&mut operations(&[("/jobs", &["get"])]));
        }
        if declares(classes, ApiFamily::Processes, "dismiss") {
            ops.append(&mut operations(&[("/jobs/{jobId}", &["get", "delete"])]));
        }
        ops
    }

    fn response_rules(&self, _classes: &[ConformanceClass]) -> Vec<ResponseRule> {
        vec![ResponseRule {
            path: "/processes",
            method: "get",
            status: "200",
            severity: Severity::Critical,
            conformance_class: None,
        }]
    }
}

/// OGC API - Records Part 1 searchable-catalog profile, with gates for
/// sorting and CQL filtering.
#[derive(Debug, Default)]
pub struct RecordsStrategy;

impl ValidationStrategy for RecordsStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Records
    }

    fn required_conformance_patterns(&self) -> &[&str] {
        &["ogcapi-records"]
    }

    fn optional_conformance_patterns(&self) -> &[&str] {
        &["sorting", "cql-filter"]
    }

    fn required_paths(&self, _classes: &[ConformanceClass]) -> Vec<String> {
        paths(&[
            "/collections",
            "/collections/{collectionId}",
            "/collections/{collectionId}/items",
            "/collections/{collectionId}/items/{recordId}",
        ])
    }

    fn required_operations(
        &self,
        _classes: &[ConformanceClass],
    ) -> BTreeMap<String, BTreeSet<String>> {
        operations(&[
            ("/collections", &["get"]),
            ("/collections/{collectionId}", &["get"]),
            ("/collections/{collectionId}/items", &["get"]),
            ("/collections/{collectionId}/items/{recordId}", &["get"]),
        ])
    }

    fn parameter_rules(&self, classes: &[ConformanceClass]) -> Vec<ParameterRule> {
        let items = "/collections/{collectionId}/items";
        let mut rules = vec![
            ParameterRule {
                path: items,
                method: "get",
                name: "q",
                severity: Severity::Warning,
                conformance_class: None,
            },
            ParameterRule {
                path: items,
                method: "get",
                name: "limit",
                severity: Severity::Warning,
                conformance_class: None,
            },
        ];
        if declares(classes, ApiFamily::Records, "sorting") {
            rules.push(ParameterRule {
                path: items,
                method: "get",
                name: "sortby",
                severity: Severity::Warning,
                conformance_class: Some("sorting"),
            });
        }
        if declares(classes, ApiFamily::Records, "cql-filter") {
            rules.push(ParameterRule {
                path: items,
                method: "get",
                name: "filter",
                severity: Severity::Info,
                conformance_class: Some("cql-filter"),
            });
        }
        rules
    }

    fn response_rules(&self, _classes: &[ConformanceClass]) -> Vec<ResponseRule> {
        vec![ResponseRule {
            path: "/collections/{collectionId}/items",
            method: "get",
            status: "200",
            severity: Severity::Critical,
            conformance_class: None,
        }]
    }
}

/// OGC API - Coverages Part 1 core.
#[derive(Debug, Default)]
pub struct CoveragesStrategy;

impl ValidationStrategy for CoveragesStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Coverages
    }

    fn required_conformance_patterns(&self) -> &[&str] {
        &["ogcapi-coverages"]
    }

    fn required_paths(&self, _classes: &[ConformanceClass]) -> Vec<String> {
        paths(&[
            "/collections",
            "/collections/{collectionId}",
            "/collections/{collectionId}/coverage",
        ])
    }

    fn required_operations(
        &self,
        _classes: &[ConformanceClass],
    ) -> BTreeMap<String, BTreeSet<String>> {
        operations(&[
            ("/collections", &["get"]),
            ("/collections/{collectionId}", &["get"]),
            ("/collections/{collectionId}/coverage", &["get"]),
        ])
    }
}

/// OGC API - Environmental Data Retrieval. Query endpoints are gated by
/// the `queries` class; rule tables cover the 1.0 and 1.1 profiles.
#[derive(Debug, Default)]
pub struct EdrStrategy;

impl ValidationStrategy for EdrStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Edr
    }

    fn required_conformance_patterns(&self) -> &[&str] {
        &["ogcapi-edr"]
    }

    fn optional_conformance_patterns(&self) -> &[&str] {
        &["queries"]
    }

    fn supported_versions(&self) -> &[&str] {
        &["1.0", "1.1"]
    }

    fn required_paths(&self, classes: &[ConformanceClass]) -> Vec<String> {
        let mut required = paths(&["/collections", "/collections/{collectionId}"]);
        if declares(classes, ApiFamily::Edr, "queries") {
            required.extend(paths(&[
                "/collections/{collectionId}/position",
                "/collections/{collectionId}/area",
            ]));
        }
        required
    }

    fn required_operations(
        &self,
        classes: &[ConformanceClass],
    ) -> BTreeMap<String, BTreeSet<String>> {
        let mut ops = operations(&[
            ("/collections", &["get"]),
            ("/collections/{collectionId}", &["get"]),
        ]);
        if declares(classes, ApiFamily::Edr, "queries") {
            ops.append(&mut operations(&[
                ("/collections/{collectionId}/position", &["get"]),
                ("/collections/{collectionId}/area", &["get"]),
            ]));
        }
        ops
    }

    fn parameter_rules(&self, classes: &[ConformanceClass]) -> Vec<ParameterRule> {
        if !declares(classes, ApiFamily::Edr, "queries") {
            return Vec::new();
        }
        vec![ParameterRule {
            path: "/collections/{collectionId}/position",
            method: "get",
            name: "coords",
            severity: Severity::Critical,
            conformance_class: Some("queries"),
        }]
    }
}

/// OGC API - Maps, with gates for spatial subsetting and display
/// resolution.
#[derive(Debug, Default)]
pub struct MapsStrategy;

impl ValidationStrategy for MapsStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Maps
    }

    fn required_conformance_patterns(&self) -> &[&str] {
        &["ogcapi-maps"]
    }

    fn optional_conformance_patterns(&self) -> &[&str] {
        &["spatial-subsetting", "display-resolution"]
    }

    fn required_paths(&self, _classes: &[ConformanceClass]) -> Vec<String> {
        paths(&["/collections/{collectionId}/map"])
    }

    fn required_operations(
        &self,
        _classes: &[ConformanceClass],
    ) -> BTreeMap<String, BTreeSet<String>> {
        operations(&[("/collections/{collectionId}/map", &["get"])])
    }

    fn parameter_rules(&self, classes: &[ConformanceClass]) -> Vec<ParameterRule> {
        let map = "/collections/{collectionId}/map";
        let mut rules = Vec::new();
        if declares(classes, ApiFamily::Maps, "spatial-subsetting") {
            rules.push(ParameterRule {
                path: map,
                method: "get",
                name: "bbox",
                severity: Severity::Critical,
                conformance_class: Some("spatial-subsetting"),
            });
        }
        if declares(classes, ApiFamily::Maps, "display-resolution") {
            for name in ["width", "height"] {
                rules.push(ParameterRule {
                    path: map,
                    method: "get",
                    name,
                    severity: Severity::Warning,
                    conformance_class: Some("display-resolution"),
                });
            }
        }
        rules
    }
}

/// OGC API - Styles, with the `manage-styles` class gating write
/// operations.
#[derive(Debug, Default)]
pub struct StylesStrategy;

impl ValidationStrategy for StylesStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Styles
    }

    fn required_conformance_patterns(&self) -> &[&str] {
        &["ogcapi-styles"]
    }

    fn optional_conformance_patterns(&self) -> &[&str] {
        &["manage-styles"]
    }

    fn required_paths(&self, _classes: &[ConformanceClass]) -> Vec<String> {
        paths(&["/styles", "/styles/{styleId}"])
    }

    fn required_operations(
        &self,
        classes: &[ConformanceClass],
    ) -> BTreeMap<String, BTreeSet<String>> {
        if declares(classes, ApiFamily::Styles, "manage-styles") {
            operations(&[
                ("/styles", &["get", "post"]),
                ("/styles/{styleId}", &["get", "put", "delete"]),
            ])
        } else {
            operations(&[("/styles", &["get"]), ("/styles/{styleId}", &["get"])])
        }
    }
}

/// OGC API - Routes core: route creation and retrieval.
#[derive(Debug, Default)]
pub struct RoutesStrategy;

impl ValidationStrategy for RoutesStrategy {
    fn family(&self) -> ApiFamily {
        ApiFamily::Routes
    }

    fn required_conformance_patterns(&self) -> &[&str] {
        &["ogcapi-routes"]
    }

    fn required_paths(&self, _classes: &[ConformanceClass]) -> Vec<String> {
        paths(&["/routes", "/routes/{routeId}"])
    }

    fn required_operations(
        &self,
        _classes: &[ConformanceClass],
    ) -> BTreeMap<String, BTreeSet<String>> {
        operations(&[("/routes", &["get", "post"]), ("/routes/{routeId}", &["get"])])
    }
}
