//! Process-wide feature registry with case-insensitive lookup.

use crate::catalog::TABLE_FEATURES;
use crate::feature::TableFeature;
use lakeproto_core::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Read-only name index over a fixed list of features.
///
/// Names are indexed in ASCII lowercase, so `ROWTRACKING`, `rowtracking` and
/// `rowTracking` all resolve to the same descriptor. Enumeration keeps the
/// order of the list the registry was built from.
#[derive(Debug)]
pub struct FeatureRegistry {
    features: &'static [&'static TableFeature],
    by_name: HashMap<String, &'static TableFeature>,
}

static REGISTRY: Lazy<FeatureRegistry> = Lazy::new(|| FeatureRegistry::new(TABLE_FEATURES));

impl FeatureRegistry {
    fn new(features: &'static [&'static TableFeature]) -> Self {
        let by_name: HashMap<String, &'static TableFeature> = features
            .iter()
            .map(|f| (f.name().to_ascii_lowercase(), *f))
            .collect();
        debug_assert_eq!(
            by_name.len(),
            features.len(),
            "feature names must be unique ignoring case"
        );
        Self { features, by_name }
    }

    /// The registry of built-in features, built on first use.
    pub fn global() -> &'static FeatureRegistry {
        &REGISTRY
    }

    /// Resolve a feature by name, ignoring ASCII case.
    pub fn lookup(&self, name: &str) -> Result<&'static TableFeature> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| Error::UnknownFeature(name.to_string()))
    }

    /// Every registered feature, in catalog order.
    pub fn all(&self) -> &'static [&'static TableFeature] {
        self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Look up a built-in feature by name, ignoring ASCII case.
pub fn get_table_feature(name: &str) -> Result<&'static TableFeature> {
    FeatureRegistry::global().lookup(name)
}

/// Every built-in feature, in catalog order.
pub fn table_features() -> &'static [&'static TableFeature] {
    FeatureRegistry::global().all()
}
