//! OGC API Conformance Validator
//!
//! Conformance-driven validation of OpenAPI documents for OGC API
//! services.
//!
//! A service declares conformance class URIs; each URI names the family
//! (Features, Tiles, Processes, ...), part and version of a specification
//! it claims to implement. This library parses those URIs, selects the
//! matching validation strategy (or a composite of several), and checks
//! the service's OpenAPI definition against the structural requirements
//! the declarations imply: required paths, operations, parameters and
//! response codes.
//!
//! # Example
//!
//! ```
//! use ogcapi_conformance::{ConformanceClass, StrategyRegistry};
//! use serde_json::json;
//!
//! let document = json!({
//!     "openapi": "3.0.3",
//!     "info": { "title": "Demo", "version": "1.0.0" },
//!     "paths": {
//!         "/": { "get": {} },
//!         "/conformance": { "get": {} }
//!     }
//! });
//!
//! let classes = vec![ConformanceClass::parse(
//!     "http://www.opengis.net/spec/ogcapi-common-1/1.0/conf/core",
//! )];
//!
//! let registry = StrategyRegistry::new();
//! let result = registry.detect_and_validate(&document, &classes).unwrap();
//! assert!(result.is_valid);
//! ```
//!
//! # Severity Model
//!
//! | Severity | Meaning | Affects `is_valid` |
//! |------------|----------------------------------------|--------------------|
//! | `critical` | A requirement of a declared class miss | yes |
//! | `warning` | Advisory gap, likely an oversight | no |
//! | `info` | Informational observation | no |
//!
//! Critical findings collect in [`ValidationResult::errors`], the rest in
//! [`ValidationResult::warnings`].

mod error;
mod families;
mod openapi;
mod reference;
mod registry;
mod result;
mod strategy;
mod types;

pub use error::{RegistryError, ValidateError};
pub use families::{
    CommonStrategy, CoveragesStrategy, EdrStrategy, FeaturesStrategy, MapsStrategy,
    ProcessesStrategy, RecordsStrategy, RoutesStrategy, StylesStrategy, TilesStrategy,
};
pub use openapi::{validate_structure, OpenApiVersion};
pub use reference::{ReferenceSource, RegisteredSpecification, SpecificationRegistry};
pub use registry::{extract_conformance, infer_conformance_from_paths, StrategyRegistry};
pub use result::{Finding, FindingKind, Severity, Summary, ValidationResult};
pub use strategy::{
    path_matches_template, CompositeStrategy, ParameterRule, ResponseRule, StrategyRef,
    ValidationStrategy,
};
pub use types::{
    detect_families, distinct_keys, group_by_spec, parse_conformance_classes, ApiFamily,
    ConformanceClass, SpecificationKey,
};
