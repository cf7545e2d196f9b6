//! Fetching the features of one tile.
//!
//! Feature sources limit the size of a single request, so the tile's box is
//! split at its longitudinal midpoint and the halves are requested
//! concurrently.
use std::collections::HashSet;
use std::time::Duration;

use futures::future::try_join;
use tracing::debug;

use crate::error::Error;
use crate::feature::RawFeature;
use crate::tile::GeoBounds;
use crate::FeatureSource;

/// Fetches every feature in `bounds` as two half-box requests.
///
/// Both requests share one `timeout`. If either fails the other is dropped
/// and the whole fetch fails; there is no partial result. Features of the
/// eastern half whose identifier already appeared in the western half are
/// skipped.
pub async fn fetch_tile_features(
    source: &dyn FeatureSource,
    bounds: &GeoBounds,
    timeout: Duration,
) -> Result<Vec<RawFeature>, Error> {
    let (west, east) = bounds.split_at_longitude_midpoint();

    let halves = try_join(source.features(west), source.features(east));
    let (west_features, east_features) = tokio::time::timeout(timeout, halves)
        .await
        .map_err(|_| Error::FetchTimeout(timeout))??;

    debug!(
        west = west_features.len(),
        east = east_features.len(),
        "Fetched tile halves"
    );
    Ok(union(west_features, east_features))
}

fn union(mut first: Vec<RawFeature>, second: Vec<RawFeature>) -> Vec<RawFeature> {
    let seen: HashSet<String> = first.iter().filter_map(|f| f.id.clone()).collect();
    first.extend(
        second
            .into_iter()
            .filter(|f| f.id.as_ref().map_or(true, |id| !seen.contains(id))),
    );
    first
}
