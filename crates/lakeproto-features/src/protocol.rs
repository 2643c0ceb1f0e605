//! Protocol model: version pair plus explicit feature lists.
//!
//! A protocol supports a feature either implicitly, because its versions are
//! old enough to predate explicit listing and high enough to imply the
//! feature, or explicitly, by naming it in the reader or writer list. Every
//! transformation returns a new value.

use crate::catalog::{CATALOG_OWNED_PREVIEW, CLUSTERING, DOMAIN_METADATA, ROW_TRACKING};
use crate::dependency::dependency_closure;
use crate::feature::{FeatureSet, TableFeature};
use crate::registry::FeatureRegistry;
use lakeproto_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Smallest reader version that carries an explicit reader feature list.
pub const TABLE_FEATURES_MIN_READER_VERSION: i32 = 3;

/// Smallest writer version that carries an explicit writer feature list.
pub const TABLE_FEATURES_MIN_WRITER_VERSION: i32 = 7;

/// True if a protocol with this reader version lists reader features.
pub fn supports_reader_features(reader_version: i32) -> bool {
    reader_version >= TABLE_FEATURES_MIN_READER_VERSION
}

/// True if a protocol with this writer version lists writer features.
pub fn supports_writer_features(writer_version: i32) -> bool {
    writer_version >= TABLE_FEATURES_MIN_WRITER_VERSION
}

/// Smallest `(reader, writer)` versions under which every given feature is
/// legal. Never below `(1, 1)`.
pub fn minimum_required_versions(
    features: impl IntoIterator<Item = &'static TableFeature>,
) -> (i32, i32) {
    features
        .into_iter()
        .fold((1, 1), |(reader, writer), feature| {
            (
                reader.max(feature.min_reader_version()),
                writer.max(feature.min_writer_version()),
            )
        })
}

/// A table protocol.
///
/// Feature names are kept as text, exactly as persisted, so that names this
/// engine does not know survive until something asks to resolve them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProtocolAction", into = "ProtocolAction")]
pub struct Protocol {
    min_reader_version: i32,
    min_writer_version: i32,
    reader_features: BTreeSet<String>,
    writer_features: BTreeSet<String>,
}

impl Protocol {
    /// Protocol with the given versions and no explicit features.
    pub fn new(min_reader_version: i32, min_writer_version: i32) -> Self {
        Self {
            min_reader_version,
            min_writer_version,
            reader_features: BTreeSet::new(),
            writer_features: BTreeSet::new(),
        }
    }

    /// Protocol with the given versions and raw explicit feature names.
    pub fn with_explicit_features<R, W>(
        min_reader_version: i32,
        min_writer_version: i32,
        reader_features: impl IntoIterator<Item = R>,
        writer_features: impl IntoIterator<Item = W>,
    ) -> Self
    where
        R: Into<String>,
        W: Into<String>,
    {
        Self {
            min_reader_version,
            min_writer_version,
            reader_features: reader_features.into_iter().map(Into::into).collect(),
            writer_features: writer_features.into_iter().map(Into::into).collect(),
        }
    }

    pub fn min_reader_version(&self) -> i32 {
        self.min_reader_version
    }

    pub fn min_writer_version(&self) -> i32 {
        self.min_writer_version
    }

    /// Explicit reader feature names, as persisted.
    pub fn reader_features(&self) -> &BTreeSet<String> {
        &self.reader_features
    }

    /// Explicit writer feature names, as persisted.
    pub fn writer_features(&self) -> &BTreeSet<String> {
        &self.writer_features
    }

    pub fn supports_reader_features(&self) -> bool {
        supports_reader_features(self.min_reader_version)
    }

    pub fn supports_writer_features(&self) -> bool {
        supports_writer_features(self.min_writer_version)
    }

    /// Legacy features implied by the versions alone.
    ///
    /// Only a protocol that lists features on neither side implies anything;
    /// once either side lists features, every feature must be named.
    pub fn implicitly_supported_features(&self) -> FeatureSet {
        if self.supports_reader_features() || self.supports_writer_features() {
            return FeatureSet::new();
        }
        FeatureRegistry::global()
            .all()
            .iter()
            .copied()
            .filter(|f| {
                f.is_legacy()
                    && f.min_reader_version() <= self.min_reader_version
                    && f.min_writer_version() <= self.min_writer_version
            })
            .collect()
    }

    /// Features named in either explicit list, resolved through the registry.
    pub fn explicitly_supported_features(&self) -> Result<FeatureSet> {
        let registry = FeatureRegistry::global();
        self.reader_features
            .iter()
            .chain(&self.writer_features)
            .map(|name| registry.lookup(name))
            .collect()
    }

    /// Implicitly and explicitly supported features.
    ///
    /// Fails with `UnknownFeature` if an explicit name is not registered.
    pub fn supported_features(&self) -> Result<FeatureSet> {
        let mut supported = self.implicitly_supported_features();
        supported.extend(self.explicitly_supported_features()?);
        Ok(supported)
    }

    /// True if `feature` is implied by the versions or listed explicitly.
    /// Unrelated explicit names are never resolved.
    pub fn supports_feature(&self, feature: &TableFeature) -> bool {
        let listed = |names: &BTreeSet<String>| {
            names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(feature.name()))
        };
        listed(&self.reader_features)
            || listed(&self.writer_features)
            || self.implicitly_supported_features().contains(feature)
    }

    pub fn is_row_tracking_supported(&self) -> bool {
        self.supports_feature(&ROW_TRACKING)
    }

    pub fn is_domain_metadata_supported(&self) -> bool {
        self.supports_feature(&DOMAIN_METADATA)
    }

    pub fn is_clustering_supported(&self) -> bool {
        self.supports_feature(&CLUSTERING)
    }

    pub fn is_catalog_managed_supported(&self) -> bool {
        self.supports_feature(&CATALOG_OWNED_PREVIEW)
    }

    /// Returns a protocol that supports everything this one does plus
    /// `features` and every feature they require.
    ///
    /// Versions are raised to each feature's thresholds. When the result
    /// lists features, everything this protocol already supported is listed
    /// too, so implied support is never lost by crossing a threshold.
    pub fn with_features(
        &self,
        features: impl IntoIterator<Item = &'static TableFeature>,
    ) -> Result<Protocol> {
        let features = dependency_closure(features);
        let (reader, writer) = minimum_required_versions(features.iter().copied());

        let mut listed = self.supported_features()?;
        listed.extend(features);

        let mut protocol = Protocol {
            min_reader_version: self.min_reader_version.max(reader),
            min_writer_version: self.min_writer_version.max(writer),
            reader_features: self.reader_features.clone(),
            writer_features: self.writer_features.clone(),
        };

        if protocol.supports_writer_features() {
            for feature in &listed {
                insert_name(&mut protocol.writer_features, feature.name());
            }
        }
        if protocol.supports_reader_features() {
            for feature in listed.iter().filter(|f| f.is_reader_writer()) {
                insert_name(&mut protocol.reader_features, feature.name());
            }
        }
        Ok(protocol)
    }

    /// Smallest equivalent protocol.
    ///
    /// A protocol that does not list writer features keeps its versions and
    /// drops any explicit names. Otherwise, if a pure-version protocol at the
    /// minimal versions supports exactly the same features it is returned;
    /// failing that, the features are listed under writer version 7.
    pub fn normalized(&self) -> Result<Protocol> {
        if !self.supports_writer_features() {
            return Ok(Protocol::new(
                self.min_reader_version,
                self.min_writer_version,
            ));
        }

        let supported = self.supported_features()?;
        let (reader, writer) = minimum_required_versions(supported.iter().copied());
        let legacy = Protocol::new(reader, writer);
        if legacy.implicitly_supported_features() == supported {
            return Ok(legacy);
        }
        Protocol::new(reader, TABLE_FEATURES_MIN_WRITER_VERSION).with_features(supported)
    }

    // Rewrites a pure-version protocol as one that lists its implied features.
    fn denormalized(&self) -> Result<Protocol> {
        if self.supports_writer_features() {
            return Ok(self.clone());
        }
        let implicit = self.implicitly_supported_features();
        let (reader, _) = minimum_required_versions(implicit.iter().copied());
        Protocol::new(reader, TABLE_FEATURES_MIN_WRITER_VERSION).with_features(implicit)
    }

    /// Smallest protocol supporting everything `self` and `other` support.
    pub fn merge(&self, other: &Protocol) -> Result<Protocol> {
        if self == other {
            return Ok(self.clone());
        }
        let mut features = self.supported_features()?;
        features.extend(other.supported_features()?);

        Protocol::new(
            self.min_reader_version.max(other.min_reader_version),
            self.min_writer_version.max(other.min_writer_version),
        )
        .with_features(features)?
        .denormalized()?
        .normalized()
    }

    /// True if `other` already supports every feature `self` supports.
    pub fn is_subset_of(&self, other: &Protocol) -> Result<bool> {
        Ok(self
            .supported_features()?
            .is_subset(&other.supported_features()?))
    }
}

fn insert_name(names: &mut BTreeSet<String>, name: &str) {
    if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        names.insert(name.to_string());
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Protocol({}, {}",
            self.min_reader_version, self.min_writer_version
        )?;
        if self.supports_reader_features() {
            write!(f, ", reader=[{}]", join(&self.reader_features))?;
        }
        if self.supports_writer_features() {
            write!(f, ", writer=[{}]", join(&self.writer_features))?;
        }
        f.write_str(")")
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

// =============================================================================
// WIRE FORM
// =============================================================================

/// Persisted shape of a protocol record.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolAction {
    min_reader_version: i32,
    min_writer_version: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reader_features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    writer_features: Option<Vec<String>>,
}

impl TryFrom<ProtocolAction> for Protocol {
    type Error = Error;

    fn try_from(action: ProtocolAction) -> Result<Self> {
        if action.min_reader_version < 1 || action.min_writer_version < 1 {
            return Err(Error::InvalidProtocol(format!(
                "versions must be at least 1, got reader {} and writer {}",
                action.min_reader_version, action.min_writer_version
            )));
        }

        let reader_features = match action.reader_features {
            Some(names) if supports_reader_features(action.min_reader_version) => names,
            Some(names) => {
                tracing::debug!(
                    reader_version = action.min_reader_version,
                    ignored = names.len(),
                    "Ignoring reader features below listing version"
                );
                Vec::new()
            }
            None => Vec::new(),
        };
        let writer_features = match action.writer_features {
            Some(names) if supports_writer_features(action.min_writer_version) => names,
            Some(names) => {
                tracing::debug!(
                    writer_version = action.min_writer_version,
                    ignored = names.len(),
                    "Ignoring writer features below listing version"
                );
                Vec::new()
            }
            None => Vec::new(),
        };

        Ok(Protocol::with_explicit_features(
            action.min_reader_version,
            action.min_writer_version,
            reader_features,
            writer_features,
        ))
    }
}

impl From<Protocol> for ProtocolAction {
    fn from(protocol: Protocol) -> Self {
        let reader_features = protocol
            .supports_reader_features()
            .then(|| protocol.reader_features.iter().cloned().collect());
        let writer_features = protocol
            .supports_writer_features()
            .then(|| protocol.writer_features.iter().cloned().collect());
        ProtocolAction {
            min_reader_version: protocol.min_reader_version,
            min_writer_version: protocol.min_writer_version,
            reader_features,
            writer_features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        APPEND_ONLY, CHECK_CONSTRAINTS, COLUMN_MAPPING, DELETION_VECTORS, ICEBERG_COMPAT_V2,
        ICEBERG_COMPAT_V3, INVARIANTS, TIMESTAMP_NTZ,
    };
    use crate::feature::feature_names;

    fn names(features: &FeatureSet) -> Vec<String> {
        feature_names(features.iter().copied())
    }

    #[test]
    fn test_minimum_required_versions() {
        assert_eq!(minimum_required_versions(FeatureSet::new()), (1, 1));
        assert_eq!(minimum_required_versions([&APPEND_ONLY]), (1, 2));
        assert_eq!(
            minimum_required_versions([&COLUMN_MAPPING, &ROW_TRACKING]),
            (2, 7)
        );
        assert_eq!(minimum_required_versions([&DELETION_VECTORS]), (3, 7));
    }

    #[test]
    fn test_implicit_support_by_version() {
        assert!(Protocol::new(1, 1).implicitly_supported_features().is_empty());
        assert_eq!(
            names(&Protocol::new(1, 2).implicitly_supported_features()),
            vec!["appendOnly", "invariants"]
        );
        let v25 = Protocol::new(2, 5).implicitly_supported_features();
        assert!(v25.contains(&COLUMN_MAPPING));
        assert!(!v25.contains(&ROW_TRACKING));
        // reader 1 is below columnMapping's reader threshold
        assert!(!Protocol::new(1, 5)
            .implicitly_supported_features()
            .contains(&COLUMN_MAPPING));
    }

    #[test]
    fn test_no_implicit_support_once_listing() {
        assert!(Protocol::new(1, 7).implicitly_supported_features().is_empty());
        assert!(Protocol::new(3, 7).implicitly_supported_features().is_empty());
    }

    #[test]
    fn test_supported_features_resolves_names_case_insensitively() {
        let protocol = Protocol::with_explicit_features(
            3,
            7,
            ["DELETIONVECTORS"],
            ["deletionVectors", "ROWTRACKING", "domainMetadata"],
        );
        assert_eq!(
            names(&protocol.supported_features().unwrap()),
            vec!["deletionVectors", "domainMetadata", "rowTracking"]
        );
    }

    #[test]
    fn test_supported_features_unknown_name() {
        let protocol = Protocol::with_explicit_features(1, 7, Vec::<String>::new(), ["bogus"]);
        assert_eq!(
            protocol.supported_features(),
            Err(Error::UnknownFeature("bogus".to_string()))
        );
    }

    #[test]
    fn test_supports_feature() {
        let protocol =
            Protocol::with_explicit_features(1, 7, Vec::<String>::new(), ["ROWTRACKING", "bogus"]);
        assert!(protocol.is_row_tracking_supported());
        assert!(!protocol.is_domain_metadata_supported());
        assert!(!protocol.is_clustering_supported());
        assert!(!protocol.is_catalog_managed_supported());

        assert!(Protocol::new(1, 2).supports_feature(&INVARIANTS));
        assert!(!Protocol::new(1, 2).supports_feature(&CHECK_CONSTRAINTS));
    }

    #[test]
    fn test_with_features_raises_versions() {
        let protocol = Protocol::new(1, 1).with_features([&ROW_TRACKING]).unwrap();
        assert_eq!(protocol.min_reader_version(), 1);
        assert_eq!(protocol.min_writer_version(), 7);
        assert!(protocol.reader_features().is_empty());
        assert_eq!(
            protocol.writer_features().iter().collect::<Vec<_>>(),
            vec!["domainMetadata", "rowTracking"]
        );
    }

    #[test]
    fn test_with_features_adds_required_features() {
        let protocol = Protocol::new(1, 1)
            .with_features([&ICEBERG_COMPAT_V2])
            .unwrap();
        assert_eq!(protocol.min_reader_version(), 2);
        assert_eq!(protocol.min_writer_version(), 7);
        assert!(protocol.reader_features().is_empty());
        assert_eq!(
            protocol.writer_features().iter().collect::<Vec<_>>(),
            vec!["columnMapping", "icebergCompatV2"]
        );
        assert!(protocol.supports_feature(&COLUMN_MAPPING));
        assert_eq!(
            protocol.to_string(),
            "Protocol(2, 7, writer=[columnMapping, icebergCompatV2])"
        );
    }

    #[test]
    fn test_with_features_adds_chained_requirements() {
        let protocol = Protocol::new(1, 1)
            .with_features([&ICEBERG_COMPAT_V3])
            .unwrap();
        assert_eq!(
            names(&protocol.supported_features().unwrap()),
            vec!["columnMapping", "domainMetadata", "icebergCompatV3", "rowTracking"]
        );
    }

    #[test]
    fn test_with_features_legacy_stays_implicit() {
        let protocol = Protocol::new(1, 1).with_features([&COLUMN_MAPPING]).unwrap();
        assert_eq!(protocol, Protocol::new(2, 5));
        assert!(protocol.supports_feature(&COLUMN_MAPPING));
    }

    #[test]
    fn test_with_features_lists_previously_implied() {
        let protocol = Protocol::new(2, 5).with_features([&TIMESTAMP_NTZ]).unwrap();
        assert_eq!(protocol.min_reader_version(), 3);
        assert_eq!(protocol.min_writer_version(), 7);
        assert!(protocol.writer_features().contains("columnMapping"));
        assert!(protocol.writer_features().contains("appendOnly"));
        assert!(protocol.writer_features().contains("timestampNtz"));
        assert_eq!(
            protocol.reader_features().iter().collect::<Vec<_>>(),
            vec!["columnMapping", "timestampNtz"]
        );
    }

    #[test]
    fn test_with_features_keeps_existing_spelling() {
        let protocol =
            Protocol::with_explicit_features(1, 7, Vec::<String>::new(), ["ROWTRACKING"])
                .with_features([&ROW_TRACKING, &DOMAIN_METADATA])
                .unwrap();
        assert_eq!(
            protocol.writer_features().iter().collect::<Vec<_>>(),
            vec!["ROWTRACKING", "domainMetadata"]
        );
    }

    #[test]
    fn test_normalized_collapses_to_legacy() {
        let listed = Protocol::new(3, 7)
            .with_features([&APPEND_ONLY, &INVARIANTS])
            .unwrap();
        assert_eq!(listed.normalized().unwrap(), Protocol::new(1, 2));

        let with_mapping = Protocol::new(3, 7)
            .with_features([&APPEND_ONLY, &INVARIANTS, &COLUMN_MAPPING])
            .unwrap();
        // (2,5) would also imply the other legacy writer features
        let normalized = with_mapping.normalized().unwrap();
        assert_eq!(normalized.min_reader_version(), 2);
        assert_eq!(normalized.min_writer_version(), 7);
        assert_eq!(normalized.writer_features().len(), 3);
        assert!(normalized.reader_features().is_empty());
    }

    #[test]
    fn test_normalized_lowers_reader_version() {
        let protocol = Protocol::new(3, 7).with_features([&ICEBERG_COMPAT_V2]).unwrap();
        let normalized = protocol.normalized().unwrap();
        assert_eq!(normalized.min_reader_version(), 2);
        assert_eq!(normalized.min_writer_version(), 7);
        assert_eq!(
            names(&normalized.supported_features().unwrap()),
            vec!["columnMapping", "icebergCompatV2"]
        );
    }

    #[test]
    fn test_normalized_clears_lists_below_threshold() {
        let protocol = Protocol::with_explicit_features(1, 2, ["x"], ["y"]);
        assert_eq!(protocol.normalized().unwrap(), Protocol::new(1, 2));
    }

    #[test]
    fn test_merge_identical_is_noop() {
        let protocol = Protocol::new(1, 7).with_features([&ROW_TRACKING]).unwrap();
        assert_eq!(protocol.merge(&protocol).unwrap(), protocol);
    }

    #[test]
    fn test_merge_legacy_protocols() {
        let merged = Protocol::new(1, 2).merge(&Protocol::new(1, 3)).unwrap();
        assert_eq!(merged, Protocol::new(1, 3));

        // (2,3) implies nothing at reader 2, so it shrinks to (1,3).
        let merged = Protocol::new(2, 3).merge(&Protocol::new(1, 1)).unwrap();
        assert_eq!(merged, Protocol::new(1, 3));
    }

    #[test]
    fn test_merge_legacy_with_listing() {
        let listing = Protocol::new(1, 7).with_features([&DOMAIN_METADATA]).unwrap();
        let merged = listing.merge(&Protocol::new(1, 2)).unwrap();
        assert_eq!(merged.min_writer_version(), 7);
        assert_eq!(
            names(&merged.supported_features().unwrap()),
            vec!["appendOnly", "domainMetadata", "invariants"]
        );
    }

    #[test]
    fn test_is_subset_of() {
        let legacy = Protocol::new(1, 2);
        let listing = Protocol::new(1, 7)
            .with_features([&APPEND_ONLY, &INVARIANTS, &ROW_TRACKING])
            .unwrap();
        assert!(legacy.is_subset_of(&listing).unwrap());
        assert!(!listing.is_subset_of(&legacy).unwrap());
        assert!(Protocol::new(1, 1).is_subset_of(&legacy).unwrap());
    }

    #[test]
    fn test_serialize_legacy_omits_lists() {
        let json = serde_json::to_value(Protocol::new(1, 2)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"minReaderVersion": 1, "minWriterVersion": 2})
        );
    }

    #[test]
    fn test_serialize_listing_protocol() {
        let protocol = Protocol::new(1, 1)
            .with_features([&DELETION_VECTORS, &ROW_TRACKING])
            .unwrap();
        let json = serde_json::to_value(&protocol).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "minReaderVersion": 3,
                "minWriterVersion": 7,
                "readerFeatures": ["deletionVectors"],
                "writerFeatures": ["deletionVectors", "domainMetadata", "rowTracking"]
            })
        );
        let parsed: Protocol = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, protocol);
    }

    #[test]
    fn test_deserialize_writer_only_listing() {
        let protocol: Protocol = serde_json::from_str(
            r#"{"minReaderVersion":1,"minWriterVersion":7,"writerFeatures":["appendOnly"]}"#,
        )
        .unwrap();
        assert!(protocol.reader_features().is_empty());
        assert!(protocol.supports_feature(&APPEND_ONLY));
    }

    #[test]
    fn test_deserialize_rejects_zero_version() {
        let result: std::result::Result<Protocol, _> =
            serde_json::from_str(r#"{"minReaderVersion":0,"minWriterVersion":2}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Protocol::new(1, 2).to_string(), "Protocol(1, 2)");
        let protocol = Protocol::new(1, 7).with_features([&ROW_TRACKING]).unwrap();
        assert_eq!(
            protocol.to_string(),
            "Protocol(1, 7, writer=[domainMetadata, rowTracking])"
        );
    }
}
