//! Structured logging field names for lakeproto.
//!
//! These constants are the catalogue of span field names. `#[instrument]`
//! only accepts field names as literals, so every literal in an instrument
//! attribute must spell one of the names below. Fields that are only known
//! once the operation finishes are declared as `field::Empty` and filled in
//! with `Span::record` through the constants themselves.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | WARN  | A table was rejected for reading or writing |
//! | DEBUG | Decision points: upgrade needed or not, overrides found |
//! | TRACE | Per-feature evaluation |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event. Always "features" for this engine.
pub const SUBSYSTEM: &str = "subsystem";

/// Component within the subsystem.
/// Values: "upgrade", "validation", "overrides"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "auto_upgrade", "validate_read", "validate_write"
pub const OPERATION: &str = "op";

/// Table path or identifier being validated.
pub const TABLE: &str = "table";

// ─── Protocol fields ───────────────────────────────────────────────────────

/// Minimum reader version of the protocol being inspected.
pub const READER_VERSION: &str = "reader_version";

/// Minimum writer version of the protocol being inspected.
pub const WRITER_VERSION: &str = "writer_version";

/// Single table feature name.
pub const FEATURE: &str = "feature";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Number of features a protocol upgrade newly enables.
pub const NEW_FEATURE_COUNT: &str = "new_feature_count";

/// Number of feature override keys found in table configuration.
pub const OVERRIDE_COUNT: &str = "override_count";
