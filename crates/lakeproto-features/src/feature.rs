//! Table feature descriptors.
//!
//! A [`TableFeature`] is an immutable description of one named capability:
//! its kind, the protocol versions it needs, the features it depends on, and
//! the predicates that decide when metadata requires it and whether this
//! implementation can read or write a table that has it.

use crate::protocol::Protocol;
use lakeproto_core::{Metadata, Result};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Ordered set of features, keyed by feature name.
pub type FeatureSet = BTreeSet<&'static TableFeature>;

/// Decides, from the current protocol and the new metadata, whether a feature
/// must become supported.
pub type AutoEnablePredicate = fn(&Protocol, &Metadata) -> Result<bool>;

/// Decides whether this implementation can safely write a table with the
/// given metadata while the feature is supported.
pub type WriteSupport = fn(&Metadata) -> Result<bool>;

/// How a feature is recognised in a protocol and which paths it affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Implied by the writer version alone; affects writers only.
    LegacyWriterOnly,
    /// Implied by the reader and writer versions alone; affects both paths.
    LegacyReaderWriter,
    /// Must be listed in the writer feature set.
    ModernWriterOnly,
    /// Must be listed in both the reader and writer feature sets.
    ModernReaderWriter,
}

impl FeatureKind {
    pub fn is_legacy(self) -> bool {
        matches!(self, Self::LegacyWriterOnly | Self::LegacyReaderWriter)
    }

    pub fn is_reader_writer(self) -> bool {
        matches!(self, Self::LegacyReaderWriter | Self::ModernReaderWriter)
    }
}

/// One named table feature. Identity is the name.
pub struct TableFeature {
    pub(crate) name: &'static str,
    pub(crate) kind: FeatureKind,
    pub(crate) min_reader_version: i32,
    pub(crate) min_writer_version: i32,
    pub(crate) required: &'static [&'static TableFeature],
    pub(crate) auto_enable: Option<AutoEnablePredicate>,
    pub(crate) read_support: bool,
    pub(crate) write_support: WriteSupport,
}

fn always_writable(_metadata: &Metadata) -> Result<bool> {
    Ok(true)
}

impl TableFeature {
    const fn base(
        name: &'static str,
        kind: FeatureKind,
        min_reader_version: i32,
        min_writer_version: i32,
    ) -> Self {
        Self {
            name,
            kind,
            min_reader_version,
            min_writer_version,
            required: &[],
            auto_enable: None,
            read_support: true,
            write_support: always_writable,
        }
    }

    /// Writer-only feature implied by `min_writer_version`.
    pub(crate) const fn legacy_writer(name: &'static str, min_writer_version: i32) -> Self {
        Self::base(name, FeatureKind::LegacyWriterOnly, 0, min_writer_version)
    }

    /// Reader-writer feature implied by both versions.
    pub(crate) const fn legacy_reader_writer(
        name: &'static str,
        min_reader_version: i32,
        min_writer_version: i32,
    ) -> Self {
        Self::base(
            name,
            FeatureKind::LegacyReaderWriter,
            min_reader_version,
            min_writer_version,
        )
    }

    /// Writer-only feature that must be listed explicitly.
    pub(crate) const fn writer(name: &'static str) -> Self {
        Self::base(name, FeatureKind::ModernWriterOnly, 0, 7)
    }

    /// Reader-writer feature that must be listed explicitly.
    pub(crate) const fn reader_writer(name: &'static str) -> Self {
        Self::base(name, FeatureKind::ModernReaderWriter, 3, 7)
    }

    /// Wire-level name, with its original casing.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    pub fn min_reader_version(&self) -> i32 {
        self.min_reader_version
    }

    pub fn min_writer_version(&self) -> i32 {
        self.min_writer_version
    }

    pub fn is_legacy(&self) -> bool {
        self.kind.is_legacy()
    }

    pub fn is_reader_writer(&self) -> bool {
        self.kind.is_reader_writer()
    }

    /// Features that must be supported whenever this one is.
    pub fn required_features(&self) -> &'static [&'static TableFeature] {
        self.required
    }

    /// True if the feature can be switched on by table metadata.
    pub fn is_auto_enabled_by_metadata(&self) -> bool {
        self.auto_enable.is_some()
    }

    /// Evaluates the auto-enable predicate against the current (pre-upgrade)
    /// protocol. Features without one are never required by metadata.
    pub fn auto_enable_required(&self, protocol: &Protocol, metadata: &Metadata) -> Result<bool> {
        match self.auto_enable {
            Some(predicate) => predicate(protocol, metadata),
            None => Ok(false),
        }
    }

    pub fn has_read_support(&self) -> bool {
        self.read_support
    }

    pub fn has_write_support(&self, metadata: &Metadata) -> Result<bool> {
        (self.write_support)(metadata)
    }
}

impl PartialEq for TableFeature {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TableFeature {}

impl Hash for TableFeature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for TableFeature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TableFeature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(other.name)
    }
}

// Dependencies are printed by name; following the references could loop.
impl fmt::Debug for TableFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableFeature")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("min_reader_version", &self.min_reader_version)
            .field("min_writer_version", &self.min_writer_version)
            .field(
                "required",
                &self.required.iter().map(|f| f.name).collect::<Vec<_>>(),
            )
            .field("auto_enabled", &self.auto_enable.is_some())
            .finish()
    }
}

impl fmt::Display for TableFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Names of the given features, in set order.
pub fn feature_names(features: impl IntoIterator<Item = &'static TableFeature>) -> Vec<String> {
    features.into_iter().map(|f| f.name.to_string()).collect()
}
