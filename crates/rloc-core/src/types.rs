//! Core types for RSSI-based positioning
//!
//! This module defines the radio-source identifier used as the fingerprint
//! map key, the signal reading attached to each observed source, and the
//! crate-wide error type.
//!
//! ## dBm readings
//!
//! All signal strengths in this crate are RSSI values in dBm (decibels
//! relative to one milliwatt). Typical indoor WiFi/BLE readings fall in the
//! -30 dBm (very close) to -100 dBm (edge of reception) range. A reading may
//! carry an optional standard deviation when the capture hardware reports
//! one; it feeds the uncertainty-propagation engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for positioning operations
pub type PositioningResult<T> = Result<T, PositioningError>;

/// Errors that can occur during positioning operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PositioningError {
    #[error("empty input: {what}")]
    EmptyInput { what: &'static str },

    #[error("length mismatch: {fingerprints} fingerprints vs {distances} distances")]
    LengthMismatch { fingerprints: usize, distances: usize },

    #[error("k = {k} out of range for a database of {database} fingerprints")]
    KOutOfRange { k: usize, database: usize },

    #[error("{what} must be positive, got {value}")]
    NonPositive { what: &'static str, value: f64 },

    #[error("standard deviation must be non-negative, got {value}")]
    NegativeStdDev { value: f64 },

    #[error("covariance matrix is not symmetric")]
    AsymmetricCovariance,

    #[error("covariance diagonal entry {index} is negative: {value}")]
    NegativeVariance { index: usize, value: f64 },

    #[error("degenerate geometry: fingerprint position coincides with the radio source")]
    InvalidGeometry,

    #[error("solver is not ready: fingerprints and distances have not been set")]
    NotReady,

    #[error("solver is locked: mutation attempted during an active solve")]
    Locked,
}

/// Identity of a radio source (WiFi access point, BLE beacon).
///
/// Typically a MAC address or beacon UUID string. Equality and hashing are
/// by value; this is the key type of [`Fingerprint`](crate::Fingerprint)
/// maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(String);

impl SourceId {
    /// Create an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single RSSI observation of one radio source.
///
/// Immutable once attached to a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    /// Received signal strength in dBm.
    pub rssi_dbm: f64,
    /// Standard deviation of the reading in dB, when known.
    pub std_dev: Option<f64>,
}

impl SignalReading {
    /// Create a reading with no uncertainty information.
    pub fn new(rssi_dbm: f64) -> Self {
        Self {
            rssi_dbm,
            std_dev: None,
        }
    }

    /// Create a reading with a known standard deviation.
    ///
    /// Fails with [`PositioningError::NegativeStdDev`] if `std_dev < 0`.
    pub fn with_std_dev(rssi_dbm: f64, std_dev: f64) -> PositioningResult<Self> {
        if std_dev < 0.0 {
            return Err(PositioningError::NegativeStdDev { value: std_dev });
        }
        Ok(Self {
            rssi_dbm,
            std_dev: Some(std_dev),
        })
    }

    /// The reading variance (squared standard deviation), when known.
    pub fn variance(&self) -> Option<f64> {
        self.std_dev.map(|s| s * s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_value_equality() {
        let a = SourceId::new("aa:bb:cc:dd:ee:ff");
        let b = SourceId::from("aa:bb:cc:dd:ee:ff");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_reading_negative_std_dev_rejected() {
        let err = SignalReading::with_std_dev(-60.0, -1.0).unwrap_err();
        assert_eq!(err, PositioningError::NegativeStdDev { value: -1.0 });
    }

    #[test]
    fn test_reading_variance() {
        let r = SignalReading::with_std_dev(-60.0, 3.0).unwrap();
        assert_eq!(r.variance(), Some(9.0));
        assert_eq!(SignalReading::new(-60.0).variance(), None);
    }

    #[test]
    fn test_error_display() {
        let e = PositioningError::KOutOfRange { k: 5, database: 3 };
        let s = format!("{}", e);
        assert!(s.contains("5"));
        assert!(s.contains("3"));
    }
}
