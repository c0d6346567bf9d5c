//! RSSI fingerprints and the located fingerprint database entry
//!
//! A [`Fingerprint`] is a sparse map from radio-source identity to the RSSI
//! reading observed for that source — insertion order is irrelevant and a
//! source appears at most once. A [`LocatedFingerprint`] additionally owns
//! the physical position where the fingerprint was captured, optionally with
//! a position covariance from the survey process.
//!
//! # Example
//!
//! ```
//! use rloc_core::fingerprint::{Fingerprint, LocatedFingerprint};
//! use rloc_core::geometry::Position;
//! use rloc_core::types::{SignalReading, SourceId};
//!
//! let fp = Fingerprint::from_readings([
//!     (SourceId::new("ap-1"), SignalReading::new(-48.0)),
//!     (SourceId::new("ap-2"), SignalReading::new(-71.5)),
//! ]);
//! assert_eq!(fp.len(), 2);
//!
//! let located = LocatedFingerprint::new(fp, Position::new([2.5, 4.0]));
//! assert_eq!(located.position.coords, [2.5, 4.0]);
//! ```

use crate::geometry::{Covariance, Position};
use crate::types::{SignalReading, SourceId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A sparse RSSI signal vector: one reading per observed radio source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fingerprint {
    readings: HashMap<SourceId, SignalReading>,
}

impl Fingerprint {
    /// Create an empty fingerprint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fingerprint from `(source, reading)` pairs.
    ///
    /// A duplicate source keeps the last reading.
    pub fn from_readings(
        readings: impl IntoIterator<Item = (SourceId, SignalReading)>,
    ) -> Self {
        Self {
            readings: readings.into_iter().collect(),
        }
    }

    /// Insert a reading, replacing any previous reading for the source.
    pub fn insert(&mut self, source: SourceId, reading: SignalReading) {
        self.readings.insert(source, reading);
    }

    /// The reading for a source, if observed.
    pub fn reading(&self, source: &SourceId) -> Option<&SignalReading> {
        self.readings.get(source)
    }

    /// Number of observed sources.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// True when no sources were observed.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Iterate over `(source, reading)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&SourceId, &SignalReading)> {
        self.readings.iter()
    }

    /// Iterate over the observed source identities.
    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.readings.keys()
    }
}

/// A fingerprint captured at a known position.
///
/// The covariance, when present, describes the uncertainty of the surveyed
/// position; its dimension always matches the position's because both share
/// the const parameter `N`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedFingerprint<const N: usize> {
    pub fingerprint: Fingerprint,
    pub position: Position<N>,
    pub position_covariance: Option<Covariance<N>>,
}

impl<const N: usize> LocatedFingerprint<N> {
    /// A located fingerprint with no position uncertainty information.
    pub fn new(fingerprint: Fingerprint, position: Position<N>) -> Self {
        Self {
            fingerprint,
            position,
            position_covariance: None,
        }
    }

    /// A located fingerprint with a surveyed position covariance.
    ///
    /// The covariance has already been validated (symmetry, non-negative
    /// diagonal) at [`Covariance::new`].
    pub fn with_covariance(
        fingerprint: Fingerprint,
        position: Position<N>,
        covariance: Covariance<N>,
    ) -> Self {
        Self {
            fingerprint,
            position,
            position_covariance: Some(covariance),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
