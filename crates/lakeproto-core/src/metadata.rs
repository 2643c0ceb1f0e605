//! Table metadata: schema plus configuration.

use crate::schema::StructType;
use std::collections::BTreeMap;

/// Table configuration, ordered by key.
pub type Configuration = BTreeMap<String, String>;

/// The parts of a table's metadata record that feature negotiation reads.
///
/// Values are immutable; "changing" the configuration produces a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    schema: StructType,
    configuration: Configuration,
}

impl Metadata {
    pub fn new<K, V>(schema: StructType, configuration: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            schema,
            configuration: configuration
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Metadata with the given schema and an empty configuration.
    pub fn from_schema(schema: StructType) -> Self {
        Self {
            schema,
            configuration: Configuration::new(),
        }
    }

    pub fn schema(&self) -> &StructType {
        &self.schema
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Returns a copy of this metadata with the configuration replaced.
    pub fn with_replaced_configuration(&self, configuration: Configuration) -> Self {
        Self {
            schema: self.schema.clone(),
            configuration,
        }
    }
}
