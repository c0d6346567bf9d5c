//! Radio source metadata
//!
//! A [`RadioSource`] describes a known transmitter (WiFi access point or
//! BLE beacon): its identity plus whatever optional metadata the survey
//! captured. The reference APIs in this space grow a constructor overload
//! per combination of optional fields; here a single builder with named
//! setters replaces them, and validation applies uniformly regardless of
//! which fields are populated.
//!
//! # Example
//!
//! ```
//! use rloc_core::radio_source::RadioSource;
//!
//! let ap = RadioSource::builder("aa:bb:cc:dd:ee:ff")
//!     .manufacturer("Acme Networks")
//!     .frequency_hz(2.437e9)
//!     .tx_power_dbm(20.0)
//!     .path_loss_exponent(1.8)
//!     .path_loss_exponent_std_dev(0.1)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(ap.id.as_str(), "aa:bb:cc:dd:ee:ff");
//! assert_eq!(ap.frequency_hz, Some(2.437e9));
//! ```

use crate::types::{PositioningError, PositioningResult, SourceId};
use serde::{Deserialize, Serialize};

/// A known radio transmitter and its optional survey metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioSource {
    /// Identity used as the fingerprint map key.
    pub id: SourceId,
    /// Hardware (MAC) address, when distinct from the identity string.
    pub address: Option<String>,
    /// Manufacturer name.
    pub manufacturer: Option<String>,
    /// Advertised service UUID (BLE beacons).
    pub service_uuid: Option<String>,
    /// Carrier frequency in Hz.
    pub frequency_hz: Option<f64>,
    /// Nominal transmit power in dBm.
    pub tx_power_dbm: Option<f64>,
    /// Standard deviation of the transmit power in dB.
    pub tx_power_std_dev: Option<f64>,
    /// Path-loss exponent calibrated for this source's environment.
    pub path_loss_exponent: Option<f64>,
    /// Standard deviation of the path-loss exponent.
    pub path_loss_exponent_std_dev: Option<f64>,
}

impl RadioSource {
    /// Start building a radio source with the given identity.
    pub fn builder(id: impl Into<SourceId>) -> RadioSourceBuilder {
        RadioSourceBuilder {
            source: RadioSource {
                id: id.into(),
                address: None,
                manufacturer: None,
                service_uuid: None,
                frequency_hz: None,
                tx_power_dbm: None,
                tx_power_std_dev: None,
                path_loss_exponent: None,
                path_loss_exponent_std_dev: None,
            },
        }
    }

    /// Transmit-power variance in dB^2, when the std-dev is known.
    pub fn tx_power_variance(&self) -> Option<f64> {
        self.tx_power_std_dev.map(|s| s * s)
    }

    /// Path-loss-exponent variance, when the std-dev is known.
    pub fn path_loss_exponent_variance(&self) -> Option<f64> {
        self.path_loss_exponent_std_dev.map(|s| s * s)
    }
}

/// Builder for [`RadioSource`].
#[derive(Debug, Clone)]
pub struct RadioSourceBuilder {
    source: RadioSource,
}

impl RadioSourceBuilder {
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.source.address = Some(address.into());
        self
    }

    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.source.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn service_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.source.service_uuid = Some(uuid.into());
        self
    }

    pub fn frequency_hz(mut self, frequency_hz: f64) -> Self {
        self.source.frequency_hz = Some(frequency_hz);
        self
    }

    pub fn tx_power_dbm(mut self, tx_power_dbm: f64) -> Self {
        self.source.tx_power_dbm = Some(tx_power_dbm);
        self
    }

    pub fn tx_power_std_dev(mut self, std_dev: f64) -> Self {
        self.source.tx_power_std_dev = Some(std_dev);
        self
    }

    pub fn path_loss_exponent(mut self, exponent: f64) -> Self {
        self.source.path_loss_exponent = Some(exponent);
        self
    }

    pub fn path_loss_exponent_std_dev(mut self, std_dev: f64) -> Self {
        self.source.path_loss_exponent_std_dev = Some(std_dev);
        self
    }

    /// Validate and produce the [`RadioSource`].
    ///
    /// Validation is uniform over whichever optional fields were set:
    /// frequency and path-loss exponent must be positive, standard
    /// deviations must be non-negative.
    pub fn build(self) -> PositioningResult<RadioSource> {
        let s = &self.source;
        if let Some(f) = s.frequency_hz {
            if f <= 0.0 {
                return Err(PositioningError::NonPositive {
                    what: "frequency",
                    value: f,
                });
            }
        }
        if let Some(n) = s.path_loss_exponent {
            if n <= 0.0 {
                return Err(PositioningError::NonPositive {
                    what: "path-loss exponent",
                    value: n,
                });
            }
        }
        for std_dev in [s.tx_power_std_dev, s.path_loss_exponent_std_dev]
            .into_iter()
            .flatten()
        {
            if std_dev < 0.0 {
                return Err(PositioningError::NegativeStdDev { value: std_dev });
            }
        }
        Ok(self.source)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
