//! Transitive closure of feature sets under "requires" edges.

use crate::feature::{FeatureSet, TableFeature};

/// Smallest superset of `features` that contains every required feature of
/// each member.
///
/// Each feature enters the result at most once and its dependencies are only
/// queued on first entry, so the loop ends after visiting every reachable
/// feature once, cycles included.
pub fn dependency_closure(
    features: impl IntoIterator<Item = &'static TableFeature>,
) -> FeatureSet {
    let mut pending: Vec<&'static TableFeature> = features.into_iter().collect();
    let mut closed = FeatureSet::new();

    while let Some(feature) = pending.pop() {
        if closed.insert(feature) {
            pending.extend(
                feature
                    .required_features()
                    .iter()
                    .copied()
                    .filter(|dep| !closed.contains(*dep)),
            );
        }
    }
    closed
}
