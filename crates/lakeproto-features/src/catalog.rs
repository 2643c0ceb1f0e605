//! Built-in table feature catalog.
//!
//! **Names and version thresholds are part of the cross-implementation table
//! format.** They are persisted verbatim in protocol records written by other
//! engines and must never be renamed or re-cased.
//!
//! The catalog is closed: every feature the engine knows about is declared
//! here and listed in [`TABLE_FEATURES`], which fixes the enumeration order.

use crate::feature::TableFeature;
use crate::predicates::{
    has_check_constraints, has_generated_columns, has_identity_columns, has_invariants,
    has_type_column,
};
use crate::protocol::Protocol;
use lakeproto_core::table_properties::{
    APPEND_ONLY_ENABLED, CHANGE_DATA_FEED_ENABLED, CHECKPOINT_POLICY, COLUMN_MAPPING_MODE,
    DELETION_VECTORS_CREATION_ENABLED, ICEBERG_COMPAT_V2_ENABLED, ICEBERG_COMPAT_V3_ENABLED,
    ICEBERG_WRITER_COMPAT_V1_ENABLED, ICEBERG_WRITER_COMPAT_V3_ENABLED,
    IN_COMMIT_TIMESTAMPS_ENABLED, ROW_TRACKING_ENABLED, TYPE_WIDENING_ENABLED,
    VARIANT_SHREDDING_ENABLED,
};
use lakeproto_core::{CheckpointPolicy, ColumnMappingMode, Metadata, PrimitiveType, Result};

// =============================================================================
// WRITE-SEMANTICS GATING (legacy, writer only)
// =============================================================================

pub static APPEND_ONLY: TableFeature = TableFeature {
    auto_enable: Some(append_only_enabled),
    ..TableFeature::legacy_writer("appendOnly", 2)
};

pub static INVARIANTS: TableFeature = TableFeature {
    auto_enable: Some(schema_has_invariants),
    write_support: writable_without_invariants,
    ..TableFeature::legacy_writer("invariants", 2)
};

pub static CHECK_CONSTRAINTS: TableFeature = TableFeature {
    auto_enable: Some(metadata_has_check_constraints),
    write_support: writable_without_check_constraints,
    ..TableFeature::legacy_writer("checkConstraints", 3)
};

pub static CHANGE_DATA_FEED: TableFeature = TableFeature {
    auto_enable: Some(change_data_feed_enabled),
    write_support: writable_without_change_data_feed,
    ..TableFeature::legacy_writer("changeDataFeed", 4)
};

pub static GENERATED_COLUMNS: TableFeature = TableFeature {
    auto_enable: Some(metadata_has_generated_columns),
    write_support: writable_without_generated_columns,
    ..TableFeature::legacy_writer("generatedColumns", 4)
};

pub static IDENTITY_COLUMNS: TableFeature = TableFeature {
    auto_enable: Some(metadata_has_identity_columns),
    write_support: writable_without_identity_columns,
    ..TableFeature::legacy_writer("identityColumns", 6)
};

// =============================================================================
// SCHEMA AND FORMAT EVOLUTION
// =============================================================================

pub static COLUMN_MAPPING: TableFeature = TableFeature {
    auto_enable: Some(column_mapping_enabled),
    ..TableFeature::legacy_reader_writer("columnMapping", 2, 5)
};

pub static DELETION_VECTORS: TableFeature = TableFeature {
    auto_enable: Some(deletion_vectors_enabled),
    ..TableFeature::reader_writer("deletionVectors")
};

// =============================================================================
// BOOKKEEPING
// =============================================================================

pub static DOMAIN_METADATA: TableFeature = TableFeature::writer("domainMetadata");

pub static CLUSTERING: TableFeature = TableFeature {
    required: &[&DOMAIN_METADATA],
    ..TableFeature::writer("clustering")
};

pub static ROW_TRACKING: TableFeature = TableFeature {
    required: &[&DOMAIN_METADATA],
    auto_enable: Some(row_tracking_enabled),
    ..TableFeature::writer("rowTracking")
};

// =============================================================================
// ICEBERG COMPATIBILITY
// =============================================================================

pub static ICEBERG_COMPAT_V2: TableFeature = TableFeature {
    required: &[&COLUMN_MAPPING],
    auto_enable: Some(iceberg_compat_v2_enabled),
    ..TableFeature::writer("icebergCompatV2")
};

pub static ICEBERG_COMPAT_V3: TableFeature = TableFeature {
    required: &[&COLUMN_MAPPING, &ROW_TRACKING],
    auto_enable: Some(iceberg_compat_v3_enabled),
    ..TableFeature::writer("icebergCompatV3")
};

pub static ICEBERG_WRITER_COMPAT_V1: TableFeature = TableFeature {
    required: &[&ICEBERG_COMPAT_V2],
    auto_enable: Some(iceberg_writer_compat_v1_enabled),
    ..TableFeature::writer("icebergWriterCompatV1")
};

pub static ICEBERG_WRITER_COMPAT_V3: TableFeature = TableFeature {
    required: &[&ICEBERG_COMPAT_V3],
    auto_enable: Some(iceberg_writer_compat_v3_enabled),
    ..TableFeature::writer("icebergWriterCompatV3")
};

pub static IN_COMMIT_TIMESTAMP: TableFeature = TableFeature {
    auto_enable: Some(in_commit_timestamps_enabled),
    ..TableFeature::writer("inCommitTimestamp")
};

// =============================================================================
// TYPES
// =============================================================================

pub static TYPE_WIDENING: TableFeature = TableFeature {
    auto_enable: Some(type_widening_enabled),
    ..TableFeature::reader_writer("typeWidening")
};

pub static TYPE_WIDENING_PREVIEW: TableFeature =
    TableFeature::reader_writer("typeWidening-preview");

pub static VARIANT_TYPE: TableFeature = TableFeature {
    auto_enable: Some(schema_has_variant),
    write_support: never_writable,
    ..TableFeature::reader_writer("variantType")
};

pub static VARIANT_TYPE_PREVIEW: TableFeature = TableFeature {
    write_support: never_writable,
    ..TableFeature::reader_writer("variantType-preview")
};

pub static VARIANT_SHREDDING_PREVIEW: TableFeature = TableFeature {
    auto_enable: Some(variant_shredding_enabled),
    write_support: never_writable,
    ..TableFeature::reader_writer("variantShredding-preview")
};

pub static TIMESTAMP_NTZ: TableFeature = TableFeature {
    auto_enable: Some(schema_has_timestamp_ntz),
    ..TableFeature::reader_writer("timestampNtz")
};

// =============================================================================
// CHECKPOINTS, VACUUM, CATALOG MANAGEMENT
// =============================================================================

pub static V2_CHECKPOINT: TableFeature = TableFeature {
    auto_enable: Some(v2_checkpoint_policy),
    ..TableFeature::reader_writer("v2Checkpoint")
};

pub static VACUUM_PROTOCOL_CHECK: TableFeature =
    TableFeature::reader_writer("vacuumProtocolCheck");

pub static CATALOG_OWNED_PREVIEW: TableFeature = TableFeature {
    required: &[&IN_COMMIT_TIMESTAMP],
    write_support: never_writable,
    ..TableFeature::reader_writer("catalogOwned-preview")
};

/// Every built-in feature, in registry enumeration order.
pub static TABLE_FEATURES: &[&TableFeature] = &[
    &APPEND_ONLY,
    &INVARIANTS,
    &CHECK_CONSTRAINTS,
    &CHANGE_DATA_FEED,
    &GENERATED_COLUMNS,
    &IDENTITY_COLUMNS,
    &COLUMN_MAPPING,
    &DELETION_VECTORS,
    &DOMAIN_METADATA,
    &CLUSTERING,
    &ROW_TRACKING,
    &ICEBERG_COMPAT_V2,
    &ICEBERG_COMPAT_V3,
    &ICEBERG_WRITER_COMPAT_V1,
    &ICEBERG_WRITER_COMPAT_V3,
    &IN_COMMIT_TIMESTAMP,
    &TYPE_WIDENING,
    &TYPE_WIDENING_PREVIEW,
    &VARIANT_TYPE,
    &VARIANT_TYPE_PREVIEW,
    &VARIANT_SHREDDING_PREVIEW,
    &TIMESTAMP_NTZ,
    &V2_CHECKPOINT,
    &VACUUM_PROTOCOL_CHECK,
    &CATALOG_OWNED_PREVIEW,
];

// =============================================================================
// AUTO-ENABLE PREDICATES
// =============================================================================

fn append_only_enabled(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    APPEND_ONLY_ENABLED.from_metadata(metadata)
}

fn schema_has_invariants(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    Ok(has_invariants(metadata.schema()))
}

fn metadata_has_check_constraints(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    Ok(has_check_constraints(metadata))
}

fn change_data_feed_enabled(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    CHANGE_DATA_FEED_ENABLED.from_metadata(metadata)
}

fn metadata_has_generated_columns(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    Ok(has_generated_columns(metadata))
}

fn metadata_has_identity_columns(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    has_identity_columns(metadata)
}

fn column_mapping_enabled(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    Ok(COLUMN_MAPPING_MODE.from_metadata(metadata)? != ColumnMappingMode::None)
}

fn deletion_vectors_enabled(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    DELETION_VECTORS_CREATION_ENABLED.from_metadata(metadata)
}

fn row_tracking_enabled(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    ROW_TRACKING_ENABLED.from_metadata(metadata)
}

fn iceberg_compat_v2_enabled(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    ICEBERG_COMPAT_V2_ENABLED.from_metadata(metadata)
}

fn iceberg_compat_v3_enabled(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    ICEBERG_COMPAT_V3_ENABLED.from_metadata(metadata)
}

fn iceberg_writer_compat_v1_enabled(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    ICEBERG_WRITER_COMPAT_V1_ENABLED.from_metadata(metadata)
}

fn iceberg_writer_compat_v3_enabled(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    ICEBERG_WRITER_COMPAT_V3_ENABLED.from_metadata(metadata)
}

fn in_commit_timestamps_enabled(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    IN_COMMIT_TIMESTAMPS_ENABLED.from_metadata(metadata)
}

// Tables already on the preview feature stay on it; enabling the stable name
// as well would lock out readers that only know the preview.
fn type_widening_enabled(protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    Ok(TYPE_WIDENING_ENABLED.from_metadata(metadata)?
        && !protocol.supports_feature(&TYPE_WIDENING_PREVIEW))
}

fn schema_has_variant(protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    Ok(has_type_column(metadata.schema(), &PrimitiveType::Variant)
        && !protocol.supports_feature(&VARIANT_TYPE_PREVIEW))
}

fn variant_shredding_enabled(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    VARIANT_SHREDDING_ENABLED.from_metadata(metadata)
}

fn schema_has_timestamp_ntz(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    Ok(has_type_column(metadata.schema(), &PrimitiveType::TimestampNtz))
}

fn v2_checkpoint_policy(_protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
    Ok(CHECKPOINT_POLICY.from_metadata(metadata)? == CheckpointPolicy::V2)
}

// =============================================================================
// WRITE SUPPORT
// =============================================================================

fn writable_without_invariants(metadata: &Metadata) -> Result<bool> {
    Ok(!has_invariants(metadata.schema()))
}

fn writable_without_check_constraints(metadata: &Metadata) -> Result<bool> {
    Ok(!has_check_constraints(metadata))
}

fn writable_without_change_data_feed(metadata: &Metadata) -> Result<bool> {
    Ok(!CHANGE_DATA_FEED_ENABLED.from_metadata(metadata)?)
}

fn writable_without_generated_columns(metadata: &Metadata) -> Result<bool> {
    Ok(!has_generated_columns(metadata))
}

fn writable_without_identity_columns(metadata: &Metadata) -> Result<bool> {
    Ok(!has_identity_columns(metadata)?)
}

fn never_writable(_metadata: &Metadata) -> Result<bool> {
    Ok(false)
}
