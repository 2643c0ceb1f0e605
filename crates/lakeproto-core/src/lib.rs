//! # lakeproto-core
//!
//! Core types for the lakeproto table feature negotiation engine.
//!
//! This crate provides the values the engine consumes but does not own: the
//! error type, the table schema model and its traversal primitive, table
//! metadata, and the typed table properties that feature detection reads.

pub mod error;
pub mod logging;
pub mod metadata;
pub mod schema;
pub mod table_properties;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use metadata::{Configuration, Metadata};
pub use schema::{
    all_containers, structs_only, ArrayType, ContainerKind, DataType, FieldMetadata, MapType,
    PrimitiveType, StructField, StructType,
};
pub use table_properties::{CheckpointPolicy, ColumnMappingMode, TableProperty};
