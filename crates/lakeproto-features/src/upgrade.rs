//! Metadata-driven protocol upgrades.

use crate::dependency::dependency_closure;
use crate::feature::{feature_names, FeatureSet, TableFeature};
use crate::protocol::{
    Protocol, TABLE_FEATURES_MIN_READER_VERSION, TABLE_FEATURES_MIN_WRITER_VERSION,
};
use crate::registry::FeatureRegistry;
use lakeproto_core::{logging, Metadata, Result};
use tracing::{debug, field, instrument, trace, Span};

/// A protocol upgrade the new metadata makes necessary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolUpgrade {
    /// The upgraded protocol to commit.
    pub protocol: Protocol,
    /// Features supported by `protocol` that the current protocol lacks.
    pub newly_enabled: FeatureSet,
}

impl ProtocolUpgrade {
    /// Names of the newly enabled features, in name order.
    pub fn newly_enabled_names(&self) -> Vec<String> {
        feature_names(self.newly_enabled.iter().copied())
    }
}

/// Features whose auto-enable predicate holds for `metadata`, evaluated
/// against the current protocol.
pub fn auto_enabled_features(current: &Protocol, metadata: &Metadata) -> Result<FeatureSet> {
    let mut enabled = FeatureSet::new();
    for feature in FeatureRegistry::global().all() {
        if feature.auto_enable_required(current, metadata)? {
            trace!(feature = feature.name(), "Auto-enabled by metadata");
            enabled.insert(*feature);
        }
    }
    Ok(enabled)
}

/// Computes the smallest protocol that supports everything `current` does,
/// every feature `metadata` requires, every feature in `manual`, and all of
/// their dependencies.
///
/// Returns `None` when `current` already supports all of that.
#[instrument(skip_all, fields(
    subsystem = "features",
    component = "upgrade",
    op = "auto_upgrade",
    reader_version = current.min_reader_version(),
    writer_version = current.min_writer_version(),
    new_feature_count = field::Empty,
))]
pub fn auto_upgrade_protocol(
    metadata: &Metadata,
    manual: impl IntoIterator<Item = &'static TableFeature>,
    current: &Protocol,
) -> Result<Option<ProtocolUpgrade>> {
    let mut needed = auto_enabled_features(current, metadata)?;
    needed.extend(manual);

    let mut all_needed = dependency_closure(needed);
    let current_features = current.supported_features()?;
    all_needed.extend(current_features.iter().copied());

    let required = Protocol::new(
        TABLE_FEATURES_MIN_READER_VERSION,
        TABLE_FEATURES_MIN_WRITER_VERSION,
    )
    .with_features(all_needed)?
    .normalized()?;

    if required.is_subset_of(current)? {
        debug!("Current protocol already supports every needed feature");
        return Ok(None);
    }

    let upgraded = required.merge(current)?;
    let newly_enabled: FeatureSet = upgraded
        .supported_features()?
        .difference(&current_features)
        .copied()
        .collect();

    Span::current().record(logging::NEW_FEATURE_COUNT, newly_enabled.len());
    debug!(
        protocol = %upgraded,
        features = ?feature_names(newly_enabled.iter().copied()),
        "Protocol upgrade required"
    );
    Ok(Some(ProtocolUpgrade {
        protocol: upgraded,
        newly_enabled,
    }))
}
