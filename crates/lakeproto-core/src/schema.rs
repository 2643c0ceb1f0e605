//! Minimal table schema model.
//!
//! Only what feature detection needs: nested data types, per-field JSON
//! metadata, and a depth-first walk whose descent into containers is chosen
//! by the caller.

use serde_json::Value;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;

/// Field-level metadata. Values are arbitrary JSON, as persisted in the log.
pub type FieldMetadata = BTreeMap<String, Value>;

/// Leaf (non-nested) data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Long,
    Integer,
    Short,
    Byte,
    Float,
    Double,
    Boolean,
    Binary,
    Date,
    Timestamp,
    TimestampNtz,
    Decimal { precision: u8, scale: u8 },
    Variant,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Long => write!(f, "long"),
            Self::Integer => write!(f, "integer"),
            Self::Short => write!(f, "short"),
            Self::Byte => write!(f, "byte"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::Boolean => write!(f, "boolean"),
            Self::Binary => write!(f, "binary"),
            Self::Date => write!(f, "date"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::TimestampNtz => write!(f, "timestamp_ntz"),
            Self::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
            Self::Variant => write!(f, "variant"),
        }
    }
}

/// Composite type kinds a schema walk may step into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Struct,
    Array,
    Map,
}

/// Descent policy that enters nested structs but never array elements or map
/// keys/values.
pub fn structs_only(kind: ContainerKind) -> bool {
    kind == ContainerKind::Struct
}

/// Descent policy that enters every container.
pub fn all_containers(_kind: ContainerKind) -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Primitive(PrimitiveType),
    Struct(Box<StructType>),
    Array(Box<ArrayType>),
    Map(Box<MapType>),
}

impl DataType {
    pub fn array(element_type: impl Into<DataType>, contains_null: bool) -> Self {
        DataType::Array(Box::new(ArrayType {
            element_type: element_type.into(),
            contains_null,
        }))
    }

    pub fn map(
        key_type: impl Into<DataType>,
        value_type: impl Into<DataType>,
        value_contains_null: bool,
    ) -> Self {
        DataType::Map(Box::new(MapType {
            key_type: key_type.into(),
            value_type: value_type.into(),
            value_contains_null,
        }))
    }

    pub fn struct_type(fields: impl IntoIterator<Item = StructField>) -> Self {
        DataType::Struct(Box::new(StructType::new(fields)))
    }

    /// True if this type is `target`, or is an array/map whose element, key or
    /// value type is (recursively) `target`. Struct members are not inspected;
    /// they are fields in their own right.
    pub fn has_leaf_type(&self, target: &PrimitiveType) -> bool {
        match self {
            DataType::Primitive(p) => p == target,
            DataType::Array(array) => array.element_type.has_leaf_type(target),
            DataType::Map(map) => {
                map.key_type.has_leaf_type(target) || map.value_type.has_leaf_type(target)
            }
            DataType::Struct(_) => false,
        }
    }
}

impl From<PrimitiveType> for DataType {
    fn from(p: PrimitiveType) -> Self {
        DataType::Primitive(p)
    }
}

impl From<StructType> for DataType {
    fn from(s: StructType) -> Self {
        DataType::Struct(Box::new(s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    pub element_type: DataType,
    pub contains_null: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapType {
    pub key_type: DataType,
    pub value_type: DataType,
    pub value_contains_null: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub metadata: FieldMetadata,
}

impl StructField {
    pub fn new(name: impl Into<String>, data_type: impl Into<DataType>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            metadata: FieldMetadata::new(),
        }
    }

    /// Returns this field with the given metadata entries added.
    pub fn with_metadata<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.metadata
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn has_metadata_key(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructType {
    fields: Vec<StructField>,
}

impl StructType {
    pub fn new(fields: impl IntoIterator<Item = StructField>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Depth-first search over every field reachable from this struct.
    ///
    /// `descend` is asked before entering a nested struct, an array element or
    /// a map key/value; the top-level fields are always visited. The walk stops
    /// at the first field for which `predicate` returns `Ok(true)`, and an
    /// error from `predicate` aborts it immediately.
    pub fn try_any_field<D, P, E>(&self, descend: D, mut predicate: P) -> std::result::Result<bool, E>
    where
        D: Fn(ContainerKind) -> bool,
        P: FnMut(&StructField) -> std::result::Result<bool, E>,
    {
        walk_struct(self, &descend, &mut predicate)
    }

    /// Infallible form of [`StructType::try_any_field`].
    pub fn any_field<D, P>(&self, descend: D, mut predicate: P) -> bool
    where
        D: Fn(ContainerKind) -> bool,
        P: FnMut(&StructField) -> bool,
    {
        self.try_any_field(descend, |field| Ok::<_, Infallible>(predicate(field)))
            .unwrap_or_else(|never| match never {})
    }
}

fn walk_struct<D, P, E>(
    schema: &StructType,
    descend: &D,
    predicate: &mut P,
) -> std::result::Result<bool, E>
where
    D: Fn(ContainerKind) -> bool,
    P: FnMut(&StructField) -> std::result::Result<bool, E>,
{
    for field in &schema.fields {
        if predicate(field)? || walk_type(&field.data_type, descend, predicate)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn walk_type<D, P, E>(
    data_type: &DataType,
    descend: &D,
    predicate: &mut P,
) -> std::result::Result<bool, E>
where
    D: Fn(ContainerKind) -> bool,
    P: FnMut(&StructField) -> std::result::Result<bool, E>,
{
    match data_type {
        DataType::Primitive(_) => Ok(false),
        DataType::Struct(inner) if descend(ContainerKind::Struct) => {
            walk_struct(inner, descend, predicate)
        }
        DataType::Array(array) if descend(ContainerKind::Array) => {
            walk_type(&array.element_type, descend, predicate)
        }
        DataType::Map(map) if descend(ContainerKind::Map) => {
            Ok(walk_type(&map.key_type, descend, predicate)?
                || walk_type(&map.value_type, descend, predicate)?)
        }
        _ => Ok(false),
    }
}
