//! K-nearest fingerprint lookup in signal space
//!
//! Given a database of located fingerprints and a query fingerprint, find
//! the K entries with the smallest signal-space distance to the query.
//!
//! The metric is the absolute [`sqr_distance`] (not the mean-removed
//! variant): when the query and the database were captured by comparable
//! hardware, the absolute RSSI level carries real ranging information that
//! mean removal would discard.
//!
//! A full scan with a stable sort is sufficient here — the metric lives in
//! signal space, not physical space, so no spatial index applies.
//!
//! # Example
//!
//! ```
//! use rloc_core::fingerprint::{Fingerprint, LocatedFingerprint};
//! use rloc_core::geometry::Position;
//! use rloc_core::knn_finder::find_k_nearest;
//! use rloc_core::types::{SignalReading, SourceId};
//!
//! let ap = SourceId::new("ap-1");
//! let database: Vec<LocatedFingerprint<2>> = [(-40.0, 0.0), (-60.0, 5.0), (-80.0, 10.0)]
//!     .iter()
//!     .map(|&(rssi, x)| {
//!         let fp = Fingerprint::from_readings([(ap.clone(), SignalReading::new(rssi))]);
//!         LocatedFingerprint::new(fp, Position::new([x, 0.0]))
//!     })
//!     .collect();
//!
//! let query = Fingerprint::from_readings([(ap.clone(), SignalReading::new(-58.0))]);
//! let nearest = find_k_nearest(&database, &query, 2).unwrap();
//! assert_eq!(nearest[0].fingerprint.position.coords, [5.0, 0.0]);
//! assert!(nearest[0].distance <= nearest[1].distance);
//! ```

use crate::fingerprint::{Fingerprint, LocatedFingerprint};
use crate::fingerprint_distance::sqr_distance;
use crate::types::{PositioningError, PositioningResult};
use tracing::debug;

/// A database fingerprint paired with its signal-space distance to a query.
///
/// Entries borrow the database; the caller keeps ownership of the
/// fingerprints for the duration of a solve.
#[derive(Debug, Clone, Copy)]
pub struct DistanceEntry<'a, const N: usize> {
    /// The matched database entry.
    pub fingerprint: &'a LocatedFingerprint<N>,
    /// Non-negative signal-space distance to the query.
    pub distance: f64,
}

/// Find the `k` database fingerprints nearest to `query` in signal space.
///
/// Results are ordered ascending by distance; ties keep database order
/// (the sort is stable). Requires `1 <= k <= database.len()`, otherwise
/// [`PositioningError::KOutOfRange`].
pub fn find_k_nearest<'a, const N: usize>(
    database: &'a [LocatedFingerprint<N>],
    query: &Fingerprint,
    k: usize,
) -> PositioningResult<Vec<DistanceEntry<'a, N>>> {
    if k == 0 || k > database.len() {
        return Err(PositioningError::KOutOfRange {
            k,
            database: database.len(),
        });
    }

    let mut entries: Vec<DistanceEntry<'a, N>> = database
        .iter()
        .map(|located| DistanceEntry {
            fingerprint: located,
            distance: sqr_distance(Some(query), Some(&located.fingerprint)).sqrt(),
        })
        .collect();

    // Stable sort keeps database order on ties.
    entries.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries.truncate(k);

    debug!(
        k,
        database = database.len(),
        nearest = entries[0].distance,
        farthest = entries[k - 1].distance,
        "selected k nearest fingerprints"
    );

    Ok(entries)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;
    use crate::types::{SignalReading, SourceId};

    fn ap() -> SourceId {
        SourceId::new("ap-1")
    }

    fn database(rssi_values: &[f64]) -> Vec<LocatedFingerprint<2>> {
        rssi_values
            .iter()
            .enumerate()
            .map(|(i, &rssi)| {
                let fp = Fingerprint::from_readings([(ap(), SignalReading::new(rssi))]);
                LocatedFingerprint::new(fp, Position::new([i as f64, 0.0]))
            })
            .collect()
    }

    fn query(rssi: f64) -> Fingerprint {
        Fingerprint::from_readings([(ap(), SignalReading::new(rssi))])
    }

    #[test]
    fn test_full_database_sorted_ascending() {
        let db = database(&[-80.0, -40.0, -60.0, -55.0]);
        let q = query(-58.0);
        let all = find_k_nearest(&db, &q, db.len()).unwrap();
        assert_eq!(all.len(), 4);
        for pair in all.windows(2) {
            assert!(
                pair[0].distance <= pair[1].distance,
                "not sorted: {} > {}",
                pair[0].distance,
                pair[1].distance
            );
        }
        // Closest RSSI is -60 (distance 2)
        assert_eq!(all[0].fingerprint.position.coords, [2.0, 0.0]);
    }

    #[test]
    fn test_prefix_consistency() {
        // find(k) must equal the first k entries of find(k+1), by distance
        let db = database(&[-80.0, -40.0, -60.0, -55.0, -52.0, -90.0]);
        let q = query(-58.0);
        for k in 1..db.len() {
            let smaller = find_k_nearest(&db, &q, k).unwrap();
            let larger = find_k_nearest(&db, &q, k + 1).unwrap();
            for i in 0..k {
                assert_eq!(
                    smaller[i].distance, larger[i].distance,
                    "prefix mismatch at k={}, i={}",
                    k, i
                );
            }
        }
    }

    #[test]
    fn test_ties_keep_database_order() {
        // Two entries equidistant from the query
        let db = database(&[-56.0, -60.0, -56.0]);
        let q = query(-58.0);
        let all = find_k_nearest(&db, &q, 3).unwrap();
        // All three are at distance 2; database order must be preserved
        assert_eq!(all[0].fingerprint.position.coords, [0.0, 0.0]);
        assert_eq!(all[1].fingerprint.position.coords, [1.0, 0.0]);
        assert_eq!(all[2].fingerprint.position.coords, [2.0, 0.0]);
    }

    #[test]
    fn test_k_out_of_range() {
        let db = database(&[-50.0, -60.0]);
        let q = query(-55.0);
        assert_eq!(
            find_k_nearest(&db, &q, 0).unwrap_err(),
            PositioningError::KOutOfRange { k: 0, database: 2 }
        );
        assert_eq!(
            find_k_nearest(&db, &q, 3).unwrap_err(),
            PositioningError::KOutOfRange { k: 3, database: 2 }
        );
    }

    #[test]
    fn test_empty_database_rejected() {
        let db: Vec<LocatedFingerprint<2>> = Vec::new();
        let q = query(-55.0);
        assert!(matches!(
            find_k_nearest(&db, &q, 1),
            Err(PositioningError::KOutOfRange { .. })
        ));
    }
}
