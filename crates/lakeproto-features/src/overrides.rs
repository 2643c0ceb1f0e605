//! Feature override properties (`delta.feature.<name> = supported`).

use crate::feature::{feature_names, FeatureSet};
use crate::registry::FeatureRegistry;
use lakeproto_core::table_properties::{FEATURE_OVERRIDE_PREFIX, FEATURE_OVERRIDE_SUPPORTED};
use lakeproto_core::{logging, Error, Metadata, Result};
use tracing::{debug, field, instrument, Span};

/// Features forced on by override properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureOverrides {
    /// Features named by override keys.
    pub features: FeatureSet,
    /// The input metadata without override keys, present only if at least
    /// one override key was found.
    pub metadata: Option<Metadata>,
}

/// Collects the features named by override keys in `metadata`'s configuration
/// and strips those keys.
///
/// Every override must name a known feature and carry exactly `supported`.
#[instrument(skip_all, fields(
    subsystem = "features",
    component = "overrides",
    op = "extract_overrides",
    override_count = field::Empty,
))]
pub fn extract_feature_property_overrides(metadata: &Metadata) -> Result<FeatureOverrides> {
    let registry = FeatureRegistry::global();
    let mut features = FeatureSet::new();
    let mut configuration = metadata.configuration().clone();
    let mut found = 0usize;

    for (key, value) in metadata.configuration() {
        let Some(name) = key.strip_prefix(FEATURE_OVERRIDE_PREFIX) else {
            continue;
        };
        let feature = registry.lookup(name)?;
        if value != FEATURE_OVERRIDE_SUPPORTED {
            return Err(Error::InvalidOverrideValue {
                key: key.clone(),
                value: value.clone(),
            });
        }
        features.insert(feature);
        configuration.remove(key);
        found += 1;
    }

    Span::current().record(logging::OVERRIDE_COUNT, found);
    if found == 0 {
        return Ok(FeatureOverrides::default());
    }

    debug!(
        features = ?feature_names(features.iter().copied()),
        "Found feature override properties"
    );
    Ok(FeatureOverrides {
        features,
        metadata: Some(metadata.with_replaced_configuration(configuration)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DELETION_VECTORS, ICEBERG_WRITER_COMPAT_V1};
    use lakeproto_core::StructType;

    fn config(entries: &[(&str, &str)]) -> Metadata {
        Metadata::new(StructType::default(), entries.iter().copied())
    }

    #[test]
    fn test_no_overrides() {
        let md = config(&[("delta.enableRowTracking", "true"), ("owner", "me")]);
        let overrides = extract_feature_property_overrides(&md).unwrap();
        assert!(overrides.features.is_empty());
        assert!(overrides.metadata.is_none());
    }

    #[test]
    fn test_overrides_are_stripped() {
        let md = config(&[
            ("delta.feature.icebergWriterCompatV1", "supported"),
            ("delta.feature.DELETIONVECTORS", "supported"),
            ("delta.enableRowTracking", "true"),
        ]);
        let overrides = extract_feature_property_overrides(&md).unwrap();

        assert_eq!(
            overrides.features.iter().copied().collect::<Vec<_>>(),
            vec![&DELETION_VECTORS, &ICEBERG_WRITER_COMPAT_V1]
        );
        let stripped = overrides.metadata.unwrap();
        assert_eq!(
            stripped.configuration().keys().collect::<Vec<_>>(),
            vec!["delta.enableRowTracking"]
        );
        // the input is left untouched
        assert_eq!(md.configuration().len(), 3);
    }

    #[test]
    fn test_unknown_override_feature() {
        let md = config(&[("delta.feature.notAFeature", "supported")]);
        assert_eq!(
            extract_feature_property_overrides(&md),
            Err(Error::UnknownFeature("notAFeature".to_string()))
        );
    }

    #[test]
    fn test_override_value_must_be_exact() {
        for value in ["enabled", "Supported", " supported", "true"] {
            let md = config(&[("delta.feature.rowTracking", value)]);
            match extract_feature_property_overrides(&md) {
                Err(Error::InvalidOverrideValue { key, value: got }) => {
                    assert_eq!(key, "delta.feature.rowTracking");
                    assert_eq!(got, value);
                }
                other => panic!("Expected InvalidOverrideValue, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        let md = config(&[("DELTA.FEATURE.rowTracking", "supported")]);
        let overrides = extract_feature_property_overrides(&md).unwrap();
        assert!(overrides.features.is_empty());
        assert!(overrides.metadata.is_none());
    }
}
