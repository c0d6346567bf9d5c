//! Signal-space dissimilarity between RSSI fingerprints
//!
//! The metric sums squared RSSI differences over the radio sources present
//! in **both** fingerprints; a source seen by only one side carries no
//! penalty. Two fingerprints with no sources in common therefore compare as
//! 0 — observationally identical to a perfect match. That is the reference
//! semantics this crate preserves (callers ranking candidates should ensure
//! some overlap exists); see DESIGN.md for the discussion.
//!
//! An absent fingerprint (`None`) is *incomparable* and yields
//! [`f64::MAX`], which is distinct from the zero-overlap case.
//!
//! [`no_mean_sqr_distance`] first removes each side's mean RSSI over the
//! shared sources, making the metric invariant to a constant calibration
//! offset between devices — the variant recommended for cross-device
//! matching.
//!
//! # Example
//!
//! ```
//! use rloc_core::fingerprint_distance::{no_mean_sqr_distance, sqr_distance};
//! use rloc_core::fingerprint::Fingerprint;
//! use rloc_core::types::{SignalReading, SourceId};
//!
//! let a = Fingerprint::from_readings([
//!     (SourceId::new("ap-1"), SignalReading::new(-50.0)),
//!     (SourceId::new("ap-2"), SignalReading::new(-70.0)),
//! ]);
//! // Same vector shifted by a constant 6 dB device offset
//! let b = Fingerprint::from_readings([
//!     (SourceId::new("ap-1"), SignalReading::new(-56.0)),
//!     (SourceId::new("ap-2"), SignalReading::new(-76.0)),
//! ]);
//!
//! assert_eq!(sqr_distance(Some(&a), Some(&b)), 72.0);
//! assert!(no_mean_sqr_distance(Some(&a), Some(&b)) < 1e-12);
//! ```

use crate::fingerprint::Fingerprint;

/// Squared signal-space distance over shared sources.
///
/// Returns [`f64::MAX`] when either fingerprint is absent, and `0.0` when
/// the fingerprints share no sources.
pub fn sqr_distance(a: Option<&Fingerprint>, b: Option<&Fingerprint>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return f64::MAX;
    };
    let mut acc = 0.0;
    for (source, reading_a) in a.iter() {
        if let Some(reading_b) = b.reading(source) {
            let diff = reading_a.rssi_dbm - reading_b.rssi_dbm;
            acc += diff * diff;
        }
    }
    acc
}

/// Signal-space distance: `sqrt(sqr_distance)`.
pub fn distance(a: Option<&Fingerprint>, b: Option<&Fingerprint>) -> f64 {
    sqr_distance(a, b).sqrt()
}

/// Mean-removed squared distance over shared sources.
///
/// Each fingerprint's readings over the *shared* source set are first
/// centred on their own mean, cancelling any constant per-device
/// calibration offset. Same absent/zero-overlap contract as
/// [`sqr_distance`].
pub fn no_mean_sqr_distance(a: Option<&Fingerprint>, b: Option<&Fingerprint>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return f64::MAX;
    };
    let shared: Vec<(f64, f64)> = a
        .iter()
        .filter_map(|(source, reading_a)| {
            b.reading(source)
                .map(|reading_b| (reading_a.rssi_dbm, reading_b.rssi_dbm))
        })
        .collect();
    if shared.is_empty() {
        return 0.0;
    }
    let k = shared.len() as f64;
    let mean_a: f64 = shared.iter().map(|(ra, _)| ra).sum::<f64>() / k;
    let mean_b: f64 = shared.iter().map(|(_, rb)| rb).sum::<f64>() / k;
    shared
        .iter()
        .map(|(ra, rb)| {
            let diff = (ra - mean_a) - (rb - mean_b);
            diff * diff
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SignalReading, SourceId};

    fn fp(pairs: &[(&str, f64)]) -> Fingerprint {
        Fingerprint::from_readings(
            pairs
                .iter()
                .map(|&(id, rssi)| (SourceId::new(id), SignalReading::new(rssi))),
        )
    }

    #[test]
    fn test_identical_fingerprints_are_zero() {
        let a = fp(&[("x", -50.0), ("y", -60.0)]);
        assert_eq!(sqr_distance(Some(&a), Some(&a)), 0.0);
        assert_eq!(distance(Some(&a), Some(&a)), 0.0);
    }

    #[test]
    fn test_shared_sources_only() {
        let a = fp(&[("x", -50.0), ("only-a", -90.0)]);
        let b = fp(&[("x", -53.0), ("only-b", -30.0)]);
        // Only "x" contributes: 3^2 = 9; unshared sources are not penalized
        assert_eq!(sqr_distance(Some(&a), Some(&b)), 9.0);
        assert_eq!(distance(Some(&a), Some(&b)), 3.0);
    }

    #[test]
    fn test_zero_overlap_is_zero() {
        let a = fp(&[("only-a", -50.0)]);
        let b = fp(&[("only-b", -60.0)]);
        assert_eq!(sqr_distance(Some(&a), Some(&b)), 0.0);
        assert_eq!(no_mean_sqr_distance(Some(&a), Some(&b)), 0.0);
    }

    #[test]
    fn test_absent_fingerprint_is_incomparable() {
        let a = fp(&[("x", -50.0)]);
        assert_eq!(sqr_distance(None, Some(&a)), f64::MAX);
        assert_eq!(sqr_distance(Some(&a), None), f64::MAX);
        assert_eq!(sqr_distance(None, None), f64::MAX);
        assert_eq!(no_mean_sqr_distance(None, Some(&a)), f64::MAX);
    }

    #[test]
    fn test_symmetry() {
        let a = fp(&[("x", -50.0), ("y", -64.0), ("z", -81.0)]);
        let b = fp(&[("x", -55.0), ("y", -60.0)]);
        assert_eq!(
            sqr_distance(Some(&a), Some(&b)),
            sqr_distance(Some(&b), Some(&a))
        );
        let d_ab = no_mean_sqr_distance(Some(&a), Some(&b));
        let d_ba = no_mean_sqr_distance(Some(&b), Some(&a));
        assert!((d_ab - d_ba).abs() < 1e-12);
    }

    #[test]
    fn test_no_mean_cancels_constant_offset() {
        let a = fp(&[("x", -50.0), ("y", -64.0), ("z", -81.0)]);
        // b = a + 7 dB everywhere
        let b = fp(&[("x", -43.0), ("y", -57.0), ("z", -74.0)]);
        assert!(sqr_distance(Some(&a), Some(&b)) > 100.0);
        assert!(
            no_mean_sqr_distance(Some(&a), Some(&b)) < 1e-12,
            "constant offset should cancel"
        );
    }

    #[test]
    fn test_no_mean_detects_shape_difference() {
        let a = fp(&[("x", -50.0), ("y", -60.0)]);
        let b = fp(&[("x", -60.0), ("y", -50.0)]);
        // Means are equal, but the shapes differ: (5 - (-5))^2 * 2 = 200
        assert!((no_mean_sqr_distance(Some(&a), Some(&b)) - 200.0).abs() < 1e-9);
    }
}
