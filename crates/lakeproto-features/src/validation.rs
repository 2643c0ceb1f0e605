//! Read and write compatibility checks.
//!
//! Feature checks collect every blocking feature before failing, so a single
//! error names everything that stands in the way.

use crate::feature::{feature_names, FeatureSet};
use crate::protocol::{
    Protocol, TABLE_FEATURES_MIN_READER_VERSION, TABLE_FEATURES_MIN_WRITER_VERSION,
};
use lakeproto_core::{logging, Error, Metadata, Result};
use tracing::{field, instrument, trace, warn, Span};

/// Highest reader version this implementation can read.
pub const MAX_SUPPORTED_READER_VERSION: i32 = TABLE_FEATURES_MIN_READER_VERSION;

/// Highest writer version this implementation can write.
pub const MAX_SUPPORTED_WRITER_VERSION: i32 = TABLE_FEATURES_MIN_WRITER_VERSION;

/// Fails unless this implementation can read a table with `protocol`.
#[instrument(skip_all, fields(
    subsystem = "features",
    component = "validation",
    op = "validate_read",
    table = %table,
    reader_version = protocol.min_reader_version(),
    feature = field::Empty,
))]
pub fn validate_can_read(protocol: &Protocol, table: &str) -> Result<()> {
    check_can_read(protocol, table).map(|_| ())
}

/// Fails unless this implementation can write a table with `protocol` whose
/// new metadata is `metadata`. Readability is checked first.
#[instrument(skip_all, fields(
    subsystem = "features",
    component = "validation",
    op = "validate_write",
    table = %table,
    reader_version = protocol.min_reader_version(),
    writer_version = protocol.min_writer_version(),
    feature = field::Empty,
))]
pub fn validate_can_write(protocol: &Protocol, metadata: &Metadata, table: &str) -> Result<()> {
    let supported = check_can_read(protocol, table)?;

    if protocol.min_writer_version() > MAX_SUPPORTED_WRITER_VERSION {
        warn!(
            max_supported = MAX_SUPPORTED_WRITER_VERSION,
            "Writer protocol version not supported"
        );
        return Err(Error::UnsupportedWriterProtocol {
            table: table.to_string(),
            version: protocol.min_writer_version(),
        });
    }
    check_writable(&supported, metadata, table)
}

/// Reader version, then readable features. Returns the supported set so a
/// write check can reuse it.
fn check_can_read(protocol: &Protocol, table: &str) -> Result<FeatureSet> {
    check_reader_version(protocol, table)?;
    let supported = protocol.supported_features()?;
    check_readable(&supported, table)?;
    Ok(supported)
}

fn check_reader_version(protocol: &Protocol, table: &str) -> Result<()> {
    if protocol.min_reader_version() > MAX_SUPPORTED_READER_VERSION {
        warn!(
            max_supported = MAX_SUPPORTED_READER_VERSION,
            "Reader protocol version not supported"
        );
        return Err(Error::UnsupportedReaderProtocol {
            table: table.to_string(),
            version: protocol.min_reader_version(),
        });
    }
    Ok(())
}

/// Fails with every reader-writer feature in `features` that cannot be read.
pub(crate) fn check_readable(features: &FeatureSet, table: &str) -> Result<()> {
    let unreadable: FeatureSet = features
        .iter()
        .copied()
        .filter(|f| f.is_reader_writer() && !f.has_read_support())
        .collect();

    if unreadable.is_empty() {
        return Ok(());
    }
    let features = feature_names(unreadable);
    Span::current().record(logging::FEATURE, field::display(features.join(",")));
    warn!(count = features.len(), "Table has features that cannot be read");
    Err(Error::UnsupportedReaderFeatures {
        table: table.to_string(),
        features,
    })
}

/// Fails with every feature in `features` that cannot be written for
/// `metadata`. An error from a write-support check is returned as is.
pub(crate) fn check_writable(
    features: &FeatureSet,
    metadata: &Metadata,
    table: &str,
) -> Result<()> {
    let mut unwritable = FeatureSet::new();
    for feature in features {
        let writable = feature.has_write_support(metadata)?;
        trace!(feature = feature.name(), writable, "Checked write support");
        if !writable {
            unwritable.insert(*feature);
        }
    }

    if unwritable.is_empty() {
        return Ok(());
    }
    let features = feature_names(unwritable);
    Span::current().record(logging::FEATURE, field::display(features.join(",")));
    warn!(count = features.len(), "Table has features that cannot be written");
    Err(Error::UnsupportedWriterFeatures {
        table: table.to_string(),
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CHANGE_DATA_FEED, DELETION_VECTORS, INVARIANTS, ROW_TRACKING, VARIANT_TYPE};
    use crate::feature::TableFeature;
    use crate::predicates::INVARIANTS_KEY;
    use lakeproto_core::{PrimitiveType, StructField, StructType};

    static UNREADABLE_A: TableFeature = TableFeature {
        read_support: false,
        ..TableFeature::reader_writer("unreadableA")
    };
    static UNREADABLE_B: TableFeature = TableFeature {
        read_support: false,
        ..TableFeature::reader_writer("unreadableB")
    };
    static WRITER_ONLY_UNREADABLE: TableFeature = TableFeature {
        read_support: false,
        ..TableFeature::writer("writerOnlyUnreadable")
    };

    fn invariant_schema() -> Metadata {
        Metadata::from_schema(StructType::new([StructField::new(
            "a",
            PrimitiveType::Integer,
            true,
        )
        .with_metadata([(INVARIANTS_KEY, "a > 0")])]))
    }

    #[test]
    fn test_read_supported_protocols() {
        assert!(validate_can_read(&Protocol::new(1, 1), "t").is_ok());
        assert!(validate_can_read(&Protocol::new(2, 5), "t").is_ok());
        let listing = Protocol::new(1, 1)
            .with_features([&DELETION_VECTORS, &ROW_TRACKING])
            .unwrap();
        assert!(validate_can_read(&listing, "t").is_ok());
    }

    #[test]
    fn test_reader_version_too_high() {
        match validate_can_read(&Protocol::new(4, 7), "t") {
            Err(Error::UnsupportedReaderProtocol { table, version }) => {
                assert_eq!(table, "t");
                assert_eq!(version, 4);
            }
            other => panic!("Expected UnsupportedReaderProtocol, got {:?}", other),
        }
    }

    #[test]
    fn test_read_unknown_feature() {
        let protocol = Protocol::with_explicit_features(3, 7, ["mystery"], ["mystery"]);
        assert_eq!(
            validate_can_read(&protocol, "t"),
            Err(Error::UnknownFeature("mystery".to_string()))
        );
    }

    #[test]
    fn test_unreadable_features_are_aggregated() {
        let features: FeatureSet = [&UNREADABLE_B, &DELETION_VECTORS, &UNREADABLE_A]
            .into_iter()
            .collect();
        match check_readable(&features, "t") {
            Err(Error::UnsupportedReaderFeatures { table, features }) => {
                assert_eq!(table, "t");
                assert_eq!(features, vec!["unreadableA", "unreadableB"]);
            }
            other => panic!("Expected UnsupportedReaderFeatures, got {:?}", other),
        }
    }

    #[test]
    fn test_writer_only_features_do_not_block_reads() {
        let features: FeatureSet = [&WRITER_ONLY_UNREADABLE].into_iter().collect();
        assert!(check_readable(&features, "t").is_ok());
    }

    #[test]
    fn test_writer_version_too_high() {
        match validate_can_write(&Protocol::new(1, 8), &Metadata::default(), "t") {
            Err(Error::UnsupportedWriterProtocol { version, .. }) => assert_eq!(version, 8),
            other => panic!("Expected UnsupportedWriterProtocol, got {:?}", other),
        }
    }

    #[test]
    fn test_write_checks_read_first() {
        match validate_can_write(&Protocol::new(4, 8), &Metadata::default(), "t") {
            Err(Error::UnsupportedReaderProtocol { version, .. }) => assert_eq!(version, 4),
            other => panic!("Expected UnsupportedReaderProtocol, got {:?}", other),
        }
    }

    #[test]
    fn test_write_resolves_features_before_writer_version() {
        let protocol = Protocol::with_explicit_features(3, 8, ["mystery"], ["mystery"]);
        assert_eq!(
            validate_can_write(&protocol, &Metadata::default(), "t"),
            Err(Error::UnknownFeature("mystery".to_string()))
        );
    }

    #[test]
    fn test_write_fails_wherever_read_fails() {
        let protocols = [
            Protocol::new(4, 7),
            Protocol::new(5, 9),
            Protocol::with_explicit_features(3, 7, ["mystery"], ["mystery"]),
            Protocol::with_explicit_features(3, 7, Vec::<String>::new(), ["deletionVectors", "bogus"]),
        ];
        for protocol in &protocols {
            let read = validate_can_read(protocol, "t").unwrap_err();
            let write = validate_can_write(protocol, &Metadata::default(), "t").unwrap_err();
            assert_eq!(read, write, "{}", protocol);
        }
    }

    #[test]
    fn test_write_support_depends_on_metadata() {
        let protocol = Protocol::new(1, 2);
        assert!(validate_can_write(&protocol, &Metadata::default(), "t").is_ok());
        assert!(validate_can_write(&protocol, &invariant_schema(), "t").is_err());
    }

    #[test]
    fn test_unwritable_features_are_aggregated() {
        let metadata = Metadata::new(
            invariant_schema().schema().clone(),
            [("delta.enableChangeDataFeed", "true")],
        );
        let protocol = Protocol::new(3, 7)
            .with_features([&INVARIANTS, &CHANGE_DATA_FEED, &VARIANT_TYPE])
            .unwrap();
        match validate_can_write(&protocol, &metadata, "t") {
            Err(Error::UnsupportedWriterFeatures { features, .. }) => {
                assert_eq!(features, vec!["changeDataFeed", "invariants", "variantType"]);
            }
            other => panic!("Expected UnsupportedWriterFeatures, got {:?}", other),
        }
    }

    #[test]
    fn test_write_support_error_propagates() {
        let metadata = Metadata::new(StructType::default(), [("delta.enableChangeDataFeed", "on")]);
        let result = validate_can_write(&Protocol::new(1, 4), &metadata, "t");
        assert!(matches!(result, Err(Error::InvalidTableProperty { .. })));
    }
}
