//! # lakeproto-features
//!
//! Table feature negotiation: which capabilities a table's protocol declares,
//! whether this implementation can read or write such a table, and the
//! smallest protocol upgrade that new table metadata requires.
//!
//! Everything here is a pure function of in-memory values. The feature
//! catalog is fixed at build time and shared read-only across threads.

pub mod catalog;
pub mod dependency;
pub mod feature;
pub mod overrides;
pub mod predicates;
pub mod protocol;
pub mod registry;
pub mod upgrade;
pub mod validation;

pub use dependency::dependency_closure;
pub use feature::{feature_names, FeatureKind, FeatureSet, TableFeature};
pub use overrides::{extract_feature_property_overrides, FeatureOverrides};
pub use predicates::{
    has_check_constraints, has_generated_columns, has_identity_columns, has_invariants,
    has_type_column,
};
pub use protocol::{
    minimum_required_versions, supports_reader_features, supports_writer_features, Protocol,
    TABLE_FEATURES_MIN_READER_VERSION, TABLE_FEATURES_MIN_WRITER_VERSION,
};
pub use registry::{get_table_feature, table_features, FeatureRegistry};
pub use upgrade::{auto_enabled_features, auto_upgrade_protocol, ProtocolUpgrade};
pub use validation::{
    validate_can_read, validate_can_write, MAX_SUPPORTED_READER_VERSION,
    MAX_SUPPORTED_WRITER_VERSION,
};
