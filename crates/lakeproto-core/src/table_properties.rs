//! Typed table properties read from [`Metadata`] configuration.
//!
//! **This module is the single source of truth** for the configuration keys
//! that table feature negotiation looks at. Keys are part of the
//! cross-implementation table format and must not be renamed.

use crate::error::{Error, Result};
use crate::metadata::Metadata;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// PREFIXES
// =============================================================================

/// Prefix of keys that force a table feature to be supported, e.g.
/// `delta.feature.icebergWriterCompatV1`.
///
/// Keys with this prefix are never persisted as ordinary configuration; they
/// only ever add support for a feature, never remove it.
pub const FEATURE_OVERRIDE_PREFIX: &str = "delta.feature.";

/// The only legal value of a feature override key.
pub const FEATURE_OVERRIDE_SUPPORTED: &str = "supported";

/// Prefix of keys that declare CHECK constraints, e.g. `delta.constraints.positive_id`.
pub const CHECK_CONSTRAINT_PREFIX: &str = "delta.constraints.";

// =============================================================================
// PROPERTY DESCRIPTOR
// =============================================================================

/// A single typed table property: key, default, and parser.
#[derive(Debug, Clone, Copy)]
pub struct TableProperty<T> {
    pub key: &'static str,
    pub default: &'static str,
    /// Human-readable description of the accepted values.
    pub expected: &'static str,
    parse: fn(&str) -> Option<T>,
}

impl<T> TableProperty<T> {
    /// Read the property from `metadata`, falling back to the default when
    /// the key is absent.
    pub fn from_metadata(&self, metadata: &Metadata) -> Result<T> {
        let raw = metadata
            .configuration()
            .get(self.key)
            .map(String::as_str)
            .unwrap_or(self.default);

        (self.parse)(raw).ok_or_else(|| {
            tracing::warn!(key = self.key, value = %raw, "Invalid table property value");
            Error::InvalidTableProperty {
                key: self.key.to_string(),
                value: raw.to_string(),
                reason: format!("expected {}", self.expected),
            }
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

const fn bool_property(key: &'static str) -> TableProperty<bool> {
    TableProperty {
        key,
        default: "false",
        expected: "true or false",
        parse: parse_bool,
    }
}

// =============================================================================
// ENUM-VALUED PROPERTIES
// =============================================================================

/// How logical column names map onto physical data file columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnMappingMode {
    None,
    Id,
    Name,
}

impl ColumnMappingMode {
    /// Case-insensitive parse.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnMappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Id => write!(f, "id"),
            Self::Name => write!(f, "name"),
        }
    }
}

/// Which checkpoint format writers produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointPolicy {
    Classic,
    V2,
}

impl CheckpointPolicy {
    /// Case-insensitive parse.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(Self::Classic),
            "v2" => Some(Self::V2),
            _ => None,
        }
    }
}

impl fmt::Display for CheckpointPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic => write!(f, "classic"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

// =============================================================================
// PROPERTIES
// =============================================================================

/// Table only accepts appends; updates and deletes are rejected.
pub const APPEND_ONLY_ENABLED: TableProperty<bool> = bool_property("delta.appendOnly");

/// Writers record row-level changes for the change data feed.
pub const CHANGE_DATA_FEED_ENABLED: TableProperty<bool> =
    bool_property("delta.enableChangeDataFeed");

pub const COLUMN_MAPPING_MODE: TableProperty<ColumnMappingMode> = TableProperty {
    key: "delta.columnMapping.mode",
    default: "none",
    expected: "one of none, id, name",
    parse: ColumnMappingMode::from_str_loose,
};

pub const DELETION_VECTORS_CREATION_ENABLED: TableProperty<bool> =
    bool_property("delta.enableDeletionVectors");

pub const ROW_TRACKING_ENABLED: TableProperty<bool> = bool_property("delta.enableRowTracking");

pub const ICEBERG_COMPAT_V2_ENABLED: TableProperty<bool> =
    bool_property("delta.enableIcebergCompatV2");

pub const ICEBERG_COMPAT_V3_ENABLED: TableProperty<bool> =
    bool_property("delta.enableIcebergCompatV3");

pub const ICEBERG_WRITER_COMPAT_V1_ENABLED: TableProperty<bool> =
    bool_property("delta.enableIcebergWriterCompatV1");

pub const ICEBERG_WRITER_COMPAT_V3_ENABLED: TableProperty<bool> =
    bool_property("delta.enableIcebergWriterCompatV3");

pub const TYPE_WIDENING_ENABLED: TableProperty<bool> = bool_property("delta.enableTypeWidening");

pub const IN_COMMIT_TIMESTAMPS_ENABLED: TableProperty<bool> =
    bool_property("delta.enableInCommitTimestamps");

pub const VARIANT_SHREDDING_ENABLED: TableProperty<bool> =
    bool_property("delta.enableVariantShredding");

pub const CHECKPOINT_POLICY: TableProperty<CheckpointPolicy> = TableProperty {
    key: "delta.checkpointPolicy",
    default: "classic",
    expected: "one of classic, v2",
    parse: CheckpointPolicy::from_str_loose,
};
