//! Schema and metadata checks that detect feature-relevant table content.
//!
//! Column tags are only looked for in top-level and nested struct fields.
//! Array elements and map keys/values cannot carry invariants, generation
//! expressions or identity definitions, so the walk does not enter them.

use lakeproto_core::schema::{all_containers, structs_only};
use lakeproto_core::table_properties::CHECK_CONSTRAINT_PREFIX;
use lakeproto_core::{Error, Metadata, PrimitiveType, Result, StructField, StructType};

/// Column metadata key holding a column invariant expression.
pub const INVARIANTS_KEY: &str = "delta.invariants";

/// Column metadata key holding a generated column expression.
pub const GENERATION_EXPRESSION_KEY: &str = "delta.generationExpression";

/// Column metadata keys that together define an identity column.
pub const IDENTITY_START_KEY: &str = "delta.identity.start";
pub const IDENTITY_STEP_KEY: &str = "delta.identity.step";
pub const IDENTITY_ALLOW_EXPLICIT_INSERT_KEY: &str = "delta.identity.allowExplicitInsert";

/// True if any struct-reachable column declares an invariant.
pub fn has_invariants(schema: &StructType) -> bool {
    schema.any_field(structs_only, |field| field.has_metadata_key(INVARIANTS_KEY))
}

/// True if the configuration declares any CHECK constraint.
pub fn has_check_constraints(metadata: &Metadata) -> bool {
    metadata
        .configuration()
        .keys()
        .any(|key| key.starts_with(CHECK_CONSTRAINT_PREFIX))
}

/// True if any struct-reachable column is a generated column.
pub fn has_generated_columns(metadata: &Metadata) -> bool {
    metadata
        .schema()
        .any_field(structs_only, |field| field.has_metadata_key(GENERATION_EXPRESSION_KEY))
}

/// True if any struct-reachable column is an identity column.
///
/// A column must carry all three identity tags or none of them; a partial
/// definition fails immediately with `InconsistentIdentityMetadata`.
pub fn has_identity_columns(metadata: &Metadata) -> Result<bool> {
    metadata
        .schema()
        .try_any_field(structs_only, identity_column)
}

fn identity_column(field: &StructField) -> Result<bool> {
    let has_start = field.has_metadata_key(IDENTITY_START_KEY);
    let has_step = field.has_metadata_key(IDENTITY_STEP_KEY);
    let has_allow_explicit_insert = field.has_metadata_key(IDENTITY_ALLOW_EXPLICIT_INSERT_KEY);

    if has_start != has_step || has_start != has_allow_explicit_insert {
        return Err(Error::InconsistentIdentityMetadata {
            field: field.name.clone(),
            has_start,
            has_step,
            has_allow_explicit_insert,
        });
    }
    Ok(has_start)
}

/// True if any column, at any nesting depth including array elements and map
/// keys/values, has the primitive type `target`.
///
/// Only meaningful for primitive targets; nested types are never compared.
pub fn has_type_column(schema: &StructType, target: &PrimitiveType) -> bool {
    schema.any_field(all_containers, |field| field.data_type.has_leaf_type(target))
}
