//! Core types: API families, conformance classes, and specification keys.
//!
//! A conformance class is a URI a server declares to identify one capability
//! set it implements. Canonical URIs look like
//! `http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core`:
//! family token (`features`), part (`1`), version (`1.0`), class name
//! (`core`). Parsing is best-effort and never fails — declarations come from
//! third-party servers and must not abort a validation run.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The OGC API specification families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFamily {
    Common,
    Features,
    Tiles,
    Maps,
    Processes,
    Records,
    Coverages,
    Edr,
    Styles,
    Routes,
}

impl ApiFamily {
    /// All families, in the order used when checking a URI for a family
    /// token. `Common` comes last: every other token is more specific.
    pub const ALL: [ApiFamily; 10] = [
        ApiFamily::Features,
        ApiFamily::Tiles,
        ApiFamily::Maps,
        ApiFamily::Processes,
        ApiFamily::Records,
        ApiFamily::Coverages,
        ApiFamily::Edr,
        ApiFamily::Styles,
        ApiFamily::Routes,
        ApiFamily::Common,
    ];

    /// The URI token for this family (e.g. `features` in `ogcapi-features-1`).
    pub fn token(&self) -> &'static str {
        match self {
            ApiFamily::Common => "common",
            ApiFamily::Features => "features",
            ApiFamily::Tiles => "tiles",
            ApiFamily::Maps => "maps",
            ApiFamily::Processes => "processes",
            ApiFamily::Records => "records",
            ApiFamily::Coverages => "coverages",
            ApiFamily::Edr => "edr",
            ApiFamily::Styles => "styles",
            ApiFamily::Routes => "routes",
        }
    }

    /// Human-readable name for reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            ApiFamily::Common => "OGC API - Common",
            ApiFamily::Features => "OGC API - Features",
            ApiFamily::Tiles => "OGC API - Tiles",
            ApiFamily::Maps => "OGC API - Maps",
            ApiFamily::Processes => "OGC API - Processes",
            ApiFamily::Records => "OGC API - Records",
            ApiFamily::Coverages => "OGC API - Coverages",
            ApiFamily::Edr => "OGC API - Environmental Data Retrieval",
            ApiFamily::Styles => "OGC API - Styles",
            ApiFamily::Routes => "OGC API - Routes",
        }
    }
}

impl fmt::Display for ApiFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One declared conformance class, parsed from its URI.
///
/// All derived fields are a pure function of the URI: two values built from
/// equal URIs are equal in every field. Construction never fails; URIs that
/// don't follow the canonical form degrade to family `common`, part 1 and an
/// empty version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConformanceClass {
    uri: String,
    family: ApiFamily,
    part: u32,
    spec_version: String,
    class_name: String,
}

impl ConformanceClass {
    /// Parse a declaration URI.
    pub fn parse(uri: &str) -> Self {
        let lower = uri.to_lowercase();
        let family = detect_family(&lower).unwrap_or(ApiFamily::Common);
        let part = parse_part(&lower, family);
        let spec_version = parse_version(&lower);
        let class_name = uri
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("")
            .to_string();

        ConformanceClass {
            uri: uri.to_string(),
            family,
            part,
            spec_version,
            class_name,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn family(&self) -> ApiFamily {
        self.family
    }

    /// Part number of the specification this class belongs to, default 1.
    pub fn part(&self) -> u32 {
        self.part
    }

    /// Dotted version string extracted from the URI, empty if absent.
    pub fn spec_version(&self) -> &str {
        &self.spec_version
    }

    /// Final URI path segment, preserved verbatim for display.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// True if this is the family's `core` class.
    pub fn is_core(&self) -> bool {
        self.class_name.eq_ignore_ascii_case("core")
    }

    /// The specification this class belongs to.
    pub fn specification_key(&self) -> SpecificationKey {
        SpecificationKey::new(self.family, &self.spec_version, Some(self.part))
    }
}

impl fmt::Display for ConformanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

fn detect_family(lower_uri: &str) -> Option<ApiFamily> {
    ApiFamily::ALL.into_iter().find(|family| {
        let token = family.token();
        lower_uri.contains(&format!("ogcapi-{token}"))
            || lower_uri.contains(&format!("/{token}-"))
    })
}

/// Part number follows the family token and a hyphen (`features-1`).
/// Missing or non-numeric parts default to 1.
fn parse_part(lower_uri: &str, family: ApiFamily) -> u32 {
    let marker = format!("{}-", family.token());
    let Some(idx) = lower_uri.find(&marker) else {
        return 1;
    };
    let digits: String = lower_uri[idx + marker.len()..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse::<u32>() {
        Ok(part) if part >= 1 => part,
        _ => 1,
    }
}

/// First dotted numeric path segment (`1.0`, `1.0.1`), empty if absent.
fn parse_version(uri: &str) -> String {
    uri.split('/')
        .find(|segment| {
            segment.contains('.')
                && segment
                    .split('.')
                    .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        })
        .unwrap_or("")
        .to_string()
}

/// Identifies a reference specification profile: family, version, and an
/// optional part number. An absent part means "any part".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SpecificationKey {
    pub family: ApiFamily,
    pub spec_version: String,
    pub part: Option<u32>,
}

impl SpecificationKey {
    pub fn new(family: ApiFamily, spec_version: &str, part: Option<u32>) -> Self {
        SpecificationKey {
            family,
            spec_version: spec_version.to_string(),
            part,
        }
    }

    /// Compare against another key.
    ///
    /// Family must match exactly under both policies, and parts must match
    /// when both keys carry one. Strict matching requires exact version
    /// equality; loose matching compares only the major.minor prefix
    /// ("1.0" loosely matches "1.0.1" but not "1.1").
    pub fn matches(&self, other: &SpecificationKey, strict: bool) -> bool {
        if self.family != other.family {
            return false;
        }
        if let (Some(a), Some(b)) = (self.part, other.part) {
            if a != b {
                return false;
            }
        }
        if strict {
            self.spec_version == other.spec_version
        } else {
            major_minor_eq(&self.spec_version, &other.spec_version)
        }
    }
}

impl fmt::Display for SpecificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.part {
            Some(part) => write!(
                f,
                "{} Part {} v{}",
                self.family.display_name(),
                part,
                self.spec_version
            ),
            None => write!(f, "{} v{}", self.family.display_name(), self.spec_version),
        }
    }
}

/// Compare two dotted versions on major.minor only, padding missing
/// components with "0".
pub(crate) fn major_minor_eq(a: &str, b: &str) -> bool {
    let mm = |v: &str| {
        let mut it = v.split('.');
        (
            it.next().unwrap_or("0").to_string(),
            it.next().unwrap_or("0").to_string(),
        )
    };
    mm(a) == mm(b)
}

/// Numeric sort key for dotted version strings. Non-numeric components
/// collate as 0.
pub(crate) fn version_sort_key(v: &str) -> Vec<u64> {
    v.split('.').map(|p| p.parse().unwrap_or(0)).collect()
}

/// Parse conformance declarations from the shapes discovery endpoints use:
/// either a JSON array of URI strings or an object carrying a `conformsTo`
/// array. Non-string entries are skipped.
pub fn parse_conformance_classes(data: &Value) -> Vec<ConformanceClass> {
    let uris = match data {
        Value::Array(arr) => arr.as_slice(),
        Value::Object(map) => map
            .get("conformsTo")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    };

    uris.iter()
        .filter_map(Value::as_str)
        .map(ConformanceClass::parse)
        .collect()
}

/// All distinct families named by a set of declarations.
pub fn detect_families(classes: &[ConformanceClass]) -> BTreeSet<ApiFamily> {
    classes.iter().map(ConformanceClass::family).collect()
}

/// Group declarations by the specification they belong to, preserving input
/// order both across groups (first-seen key order) and within each group.
pub fn group_by_spec(
    classes: &[ConformanceClass],
) -> Vec<(SpecificationKey, Vec<ConformanceClass>)> {
    let mut groups: Vec<(SpecificationKey, Vec<ConformanceClass>)> = Vec::new();

    for class in classes {
        let key = class.specification_key();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(class.clone()),
            None => groups.push((key, vec![class.clone()])),
        }
    }

    groups
}

/// The set of unique specification keys named by a set of declarations.
pub fn distinct_keys(classes: &[ConformanceClass]) -> BTreeSet<SpecificationKey> {
    classes
        .iter()
        .map(ConformanceClass::specification_key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_canonical_uri() {
        let cc =
            ConformanceClass::parse("http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core");
        assert_eq!(cc.family(), ApiFamily::Features);
        assert_eq!(cc.part(), 1);
        assert_eq!(cc.spec_version(), "1.0");
        assert_eq!(cc.class_name(), "core");
        assert!(cc.is_core());
    }

    #[test]
    fn parse_part_two() {
        let cc =
            ConformanceClass::parse("http://www.opengis.net/spec/ogcapi-features-2/1.0/conf/crs");
        assert_eq!(cc.family(), ApiFamily::Features);
        assert_eq!(cc.part(), 2);
        assert_eq!(cc.class_name(), "crs");
        assert!(!cc.is_core());
    }

    #[test]
    fn parse_patch_version() {
        let cc =
            ConformanceClass::parse("http://www.opengis.net/spec/ogcapi-edr-1/1.0.1/conf/core");
        assert_eq!(cc.family(), ApiFamily::Edr);
        assert_eq!(cc.spec_version(), "1.0.1");
    }

    #[test]
    fn parse_malformed_uri_degrades_to_defaults() {
        let cc = ConformanceClass::parse("http://example.com/unknown");
        assert_eq!(cc.family(), ApiFamily::Common);
        assert_eq!(cc.part(), 1);
        assert_eq!(cc.spec_version(), "");
        assert_eq!(cc.class_name(), "unknown");
    }

    #[test]
    fn parse_empty_uri_never_panics() {
        let cc = ConformanceClass::parse("");
        assert_eq!(cc.family(), ApiFamily::Common);
        assert_eq!(cc.part(), 1);
        assert_eq!(cc.class_name(), "");
    }

    #[test]
    fn parse_non_canonical_family_token() {
        // Some servers declare URIs that still name the family segment.
        let cc = ConformanceClass::parse("http://example.com/spec/tiles-1/1.0/conf/core");
        assert_eq!(cc.family(), ApiFamily::Tiles);
    }

    #[test]
    fn class_name_preserved_verbatim() {
        let cc =
            ConformanceClass::parse("http://www.opengis.net/spec/ogcapi-common-1/1.0/conf/CORE");
        assert_eq!(cc.class_name(), "CORE");
        assert!(cc.is_core());
    }

    #[test]
    fn equal_uris_yield_equal_values() {
        let uri = "http://www.opengis.net/spec/ogcapi-records-1/1.0/conf/sorting";
        assert_eq!(ConformanceClass::parse(uri), ConformanceClass::parse(uri));
    }

    #[test]
    fn specification_key_from_class() {
        let cc =
            ConformanceClass::parse("http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core");
        let key = cc.specification_key();
        assert_eq!(key.family, ApiFamily::Features);
        assert_eq!(key.spec_version, "1.0");
        assert_eq!(key.part, Some(1));
    }

    #[test]
    fn key_matches_strict() {
        let a = SpecificationKey::new(ApiFamily::Features, "1.0", Some(1));
        let b = SpecificationKey::new(ApiFamily::Features, "1.0", Some(1));
        let c = SpecificationKey::new(ApiFamily::Features, "1.0.1", Some(1));

        assert!(a.matches(&b, true));
        assert!(!a.matches(&c, true));
    }

    #[test]
    fn key_matches_loose() {
        let a = SpecificationKey::new(ApiFamily::Features, "1.0", Some(1));
        let b = SpecificationKey::new(ApiFamily::Features, "1.0.1", Some(1));
        let c = SpecificationKey::new(ApiFamily::Features, "1.1", Some(1));

        assert!(a.matches(&b, false));
        assert!(!a.matches(&c, false));
    }

    #[test]
    fn key_matches_is_reflexive_and_symmetric() {
        let a = SpecificationKey::new(ApiFamily::Edr, "1.1", Some(1));
        let b = SpecificationKey::new(ApiFamily::Edr, "1.1.2", Some(1));

        for strict in [true, false] {
            assert!(a.matches(&a, strict));
            assert_eq!(a.matches(&b, strict), b.matches(&a, strict));
        }
    }

    #[test]
    fn key_family_mismatch_never_matches() {
        let a = SpecificationKey::new(ApiFamily::Features, "1.0", Some(1));
        let b = SpecificationKey::new(ApiFamily::Tiles, "1.0", Some(1));
        assert!(!a.matches(&b, true));
        assert!(!a.matches(&b, false));
    }

    #[test]
    fn key_absent_part_matches_any() {
        let any = SpecificationKey::new(ApiFamily::Features, "1.0", None);
        let one = SpecificationKey::new(ApiFamily::Features, "1.0", Some(1));
        let two = SpecificationKey::new(ApiFamily::Features, "1.0", Some(2));

        assert!(any.matches(&one, true));
        assert!(any.matches(&two, true));
        assert!(!one.matches(&two, true));
    }

    #[test]
    fn key_display() {
        let key = SpecificationKey::new(ApiFamily::Features, "1.0", Some(1));
        assert_eq!(key.to_string(), "OGC API - Features Part 1 v1.0");

        let key = SpecificationKey::new(ApiFamily::Edr, "1.1", None);
        assert_eq!(
            key.to_string(),
            "OGC API - Environmental Data Retrieval v1.1"
        );
    }

    #[test]
    fn parse_classes_from_array() {
        let data = json!(["http://www.opengis.net/spec/ogcapi-common-1/1.0/conf/core", 42]);
        let classes = parse_conformance_classes(&data);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].family(), ApiFamily::Common);
    }

    #[test]
    fn parse_classes_from_conforms_to_object() {
        let data = json!({
            "conformsTo": [
                "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core",
                "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/geojson"
            ]
        });
        let classes = parse_conformance_classes(&data);
        assert_eq!(classes.len(), 2);
        assert!(classes.iter().all(|c| c.family() == ApiFamily::Features));
    }

    #[test]
    fn group_by_spec_preserves_order() {
        let classes: Vec<_> = [
            "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core",
            "http://www.opengis.net/spec/ogcapi-common-1/1.0/conf/core",
            "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/geojson",
        ]
        .iter()
        .map(|u| ConformanceClass::parse(u))
        .collect();

        let groups = group_by_spec(&classes);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.family, ApiFamily::Features);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[1].class_name(), "geojson");
        assert_eq!(groups[1].0.family, ApiFamily::Common);
    }

    #[test]
    fn distinct_keys_deduplicates() {
        let classes: Vec<_> = [
            "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core",
            "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/geojson",
            "http://www.opengis.net/spec/ogcapi-common-1/1.0/conf/core",
        ]
        .iter()
        .map(|u| ConformanceClass::parse(u))
        .collect();

        assert_eq!(distinct_keys(&classes).len(), 2);
    }

    #[test]
    fn major_minor_padding() {
        assert!(major_minor_eq("1.0", "1.0.9"));
        assert!(major_minor_eq("1", "1.0"));
        assert!(!major_minor_eq("1.0", "1.1"));
    }

    #[test]
    fn version_sort_key_is_numeric() {
        assert!(version_sort_key("1.10") > version_sort_key("1.9"));
        assert!(version_sort_key("1.1") > version_sort_key("1.0.1"));
    }
}
