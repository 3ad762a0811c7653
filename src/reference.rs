//! Registry of reference OpenAPI documents, keyed by specification.
//!
//! A reference document is a known-good definition for one specification
//! part and version. During validation the reference's path table is
//! compared against the candidate document; paths present in the reference
//! but absent from the candidate are reported as advisory findings.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::RegistryError;
use crate::types::{version_sort_key, ApiFamily, SpecificationKey};

/// Source of reference path tables, looked up by specification key.
///
/// Implemented by [`SpecificationRegistry`]; a caller with its own store
/// of reference documents can implement it directly.
pub trait ReferenceSource {
    /// Path templates of the reference for `key`, or `None` when no
    /// reference is held for it.
    fn reference_paths(&self, key: &SpecificationKey) -> Option<Vec<String>>;
}

/// A reference document together with the key it was registered under.
#[derive(Debug, Clone)]
pub struct RegisteredSpecification {
    key: SpecificationKey,
    content: Value,
}

impl RegisteredSpecification {
    pub fn new(key: SpecificationKey, content: Value) -> Self {
        RegisteredSpecification { key, content }
    }

    pub fn key(&self) -> &SpecificationKey {
        &self.key
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    /// The document's declared `openapi` version, if present.
    pub fn openapi_version(&self) -> Option<&str> {
        self.content.get("openapi").and_then(Value::as_str)
    }

    pub fn info_title(&self) -> Option<&str> {
        self.content
            .get("info")
            .and_then(|i| i.get("title"))
            .and_then(Value::as_str)
    }

    pub fn info_version(&self) -> Option<&str> {
        self.content
            .get("info")
            .and_then(|i| i.get("version"))
            .and_then(Value::as_str)
    }

    /// Path templates declared by the document, in definition order.
    pub fn paths(&self) -> Vec<String> {
        self.content
            .get("paths")
            .and_then(Value::as_object)
            .map(|paths| paths.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// In-memory store of reference documents.
///
/// Keys order by family, then version, then part, so iteration and
/// [`SpecificationRegistry::keys`] are deterministic.
#[derive(Debug, Default)]
pub struct SpecificationRegistry {
    specifications: BTreeMap<SpecificationKey, RegisteredSpecification>,
}

impl SpecificationRegistry {
    pub fn new() -> Self {
        SpecificationRegistry::default()
    }

    /// Store a reference document under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyExists`] when `key` is taken and
    /// `overwrite` is false.
    pub fn register(
        &mut self,
        key: SpecificationKey,
        content: Value,
        overwrite: bool,
    ) -> Result<(), RegistryError> {
        if !overwrite && self.specifications.contains_key(&key) {
            return Err(RegistryError::AlreadyExists { key });
        }
        let spec = RegisteredSpecification::new(key.clone(), content);
        self.specifications.insert(key, spec);
        Ok(())
    }

    /// Exact-key lookup.
    pub fn get(&self, key: &SpecificationKey) -> Option<&RegisteredSpecification> {
        self.specifications.get(key)
    }

    /// First registered specification matching `key` under the chosen
    /// version discipline. Exact hits win over loose ones.
    pub fn find(&self, key: &SpecificationKey, strict: bool) -> Option<&RegisteredSpecification> {
        if let Some(spec) = self.specifications.get(key) {
            return Some(spec);
        }
        if strict {
            return None;
        }
        self.specifications
            .values()
            .find(|spec| spec.key().matches(key, false))
    }

    /// Highest-versioned registration for a family and part.
    pub fn get_latest(
        &self,
        family: ApiFamily,
        part: Option<u32>,
    ) -> Option<&RegisteredSpecification> {
        self.specifications
            .values()
            .filter(|spec| spec.key().family == family && spec.key().part == part)
            .max_by_key(|spec| version_sort_key(&spec.key().spec_version))
    }

    pub fn exists(&self, key: &SpecificationKey) -> bool {
        self.specifications.contains_key(key)
    }

    pub fn remove(&mut self, key: &SpecificationKey) -> Result<RegisteredSpecification, RegistryError> {
        self.specifications
            .remove(key)
            .ok_or_else(|| RegistryError::NotFound { key: key.clone() })
    }

    /// Registered versions for a family and part, newest first.
    pub fn list_versions(&self, family: ApiFamily, part: Option<u32>) -> Vec<String> {
        let mut versions: Vec<String> = self
            .specifications
            .keys()
            .filter(|k| k.family == family && k.part == part)
            .map(|k| k.spec_version.clone())
            .collect();
        versions.sort_by_key(|v| std::cmp::Reverse(version_sort_key(v)));
        versions
    }

    pub fn keys(&self) -> impl Iterator<Item = &SpecificationKey> {
        self.specifications.keys()
    }

    pub fn clear(&mut self) {
        self.specifications.clear();
    }

    pub fn len(&self) -> usize {
        self.specifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specifications.is_empty()
    }
}

impl ReferenceSource for SpecificationRegistry {
    fn reference_paths(&self, key: &SpecificationKey) -> Option<Vec<String>> {
        self.find(key, false).map(RegisteredSpecification::paths)
    }
}
