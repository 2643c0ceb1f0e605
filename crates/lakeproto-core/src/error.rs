//! Error types for lakeproto.

use thiserror::Error;

/// Result type alias using lakeproto's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for table feature negotiation.
///
/// Every variant is terminal: the engine performs no I/O, so nothing here is
/// worth retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A feature name does not resolve to any known table feature
    #[error("Unsupported table feature: table requires feature \"{0}\" which is not known to this implementation")]
    UnknownFeature(String),

    /// The table's reader protocol version is newer than this implementation supports
    #[error("Unsupported reader protocol version {version} for table {table}")]
    UnsupportedReaderProtocol { table: String, version: i32 },

    /// The table declares reader features this implementation cannot read
    #[error("Unsupported reader features for table {table}: {}", .features.join(", "))]
    UnsupportedReaderFeatures { table: String, features: Vec<String> },

    /// The table's writer protocol version is newer than this implementation supports
    #[error("Unsupported writer protocol version {version} for table {table}")]
    UnsupportedWriterProtocol { table: String, version: i32 },

    /// The table declares writer features this implementation cannot write
    #[error("Unsupported writer features for table {table}: {}", .features.join(", "))]
    UnsupportedWriterFeatures { table: String, features: Vec<String> },

    /// A feature override key carries something other than "supported"
    #[error("Invalid value '{value}' for feature override '{key}': table feature overrides may only be set to \"supported\"")]
    InvalidOverrideValue { key: String, value: String },

    /// A column carries some, but not all, of the identity column tags
    #[error("Inconsistent IDENTITY metadata for column {field} detected: {has_start}, {has_step}, {has_allow_explicit_insert}")]
    InconsistentIdentityMetadata {
        field: String,
        has_start: bool,
        has_step: bool,
        has_allow_explicit_insert: bool,
    },

    /// A recognised table property holds a value that cannot be parsed
    #[error("Invalid value '{value}' for table property '{key}': {reason}")]
    InvalidTableProperty {
        key: String,
        value: String,
        reason: String,
    },

    /// A protocol record is structurally invalid
    #[error("Invalid protocol: {0}")]
    InvalidProtocol(String),
}
