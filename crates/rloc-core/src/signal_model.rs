//! Log-distance path-loss radio propagation model
//!
//! Conversions between linear power and dBm, plus the forward and inverse
//! forms of the log-distance model used throughout the crate:
//!
//! ```text
//! P_rx = P_tx * (c / (4*pi*f))^n / d^n          (linear domain)
//! P_rx[dBm] = P_tx[dBm] + 10*n*log10(k / d)     (dBm domain, k = c/(4*pi*f))
//! ```
//!
//! With path-loss exponent `n = 2` this reduces to the Friis free-space
//! equation. Indoor WiFi environments typically show `n` between 1.6 (open
//! corridor, waveguide effect) and 4+ (heavy walls).
//!
//! # Example
//!
//! ```
//! use rloc_core::signal_model::{dbm_to_power, power_to_dbm, distance_from_rssi};
//!
//! // dBm round trip
//! let p = dbm_to_power(-60.0);
//! assert!((power_to_dbm(p) - (-60.0)).abs() < 1e-9);
//!
//! // Invert the path-loss model: 0 dBm TX, 2.4 GHz, free space
//! let d = distance_from_rssi(0.0, -40.0, 2.0, 2.4e9).unwrap();
//! assert!(d > 0.9 && d < 1.1, "expected ~1 m, got {d}");
//! ```

use crate::types::{PositioningError, PositioningResult};
use std::f64::consts::PI;

/// Speed of light in m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Convert dBm to linear power (milliwatts).
pub fn dbm_to_power(dbm: f64) -> f64 {
    10.0_f64.powf(dbm / 10.0)
}

/// Convert linear power (milliwatts) to dBm.
pub fn power_to_dbm(power: f64) -> f64 {
    10.0 * power.log10()
}

/// Wavelength-derived model constant `k = c / (4*pi*f)` in metres.
fn model_constant(frequency_hz: f64) -> f64 {
    SPEED_OF_LIGHT / (4.0 * PI * frequency_hz)
}

/// Received power (linear domain) under the log-distance model.
///
/// `P_rx = P_tx * (c / (4*pi*f))^n / d^n`
///
/// # Errors
/// [`PositioningError::NonPositive`] if `distance_m` or `frequency_hz` is
/// not strictly positive.
pub fn received_power(
    tx_power: f64,
    distance_m: f64,
    path_loss_exponent: f64,
    frequency_hz: f64,
) -> PositioningResult<f64> {
    if distance_m <= 0.0 {
        return Err(PositioningError::NonPositive {
            what: "distance",
            value: distance_m,
        });
    }
    if frequency_hz <= 0.0 {
        return Err(PositioningError::NonPositive {
            what: "frequency",
            value: frequency_hz,
        });
    }
    let k = model_constant(frequency_hz);
    Ok(tx_power * (k / distance_m).powf(path_loss_exponent))
}

/// Expected RSSI in dBm at a given distance from the transmitter.
///
/// dBm-domain forward model: `rssi = tx_dbm + 10*n*log10(k / d)`.
///
/// # Errors
/// [`PositioningError::NonPositive`] for non-positive distance or frequency.
pub fn rssi_at_distance(
    tx_power_dbm: f64,
    distance_m: f64,
    path_loss_exponent: f64,
    frequency_hz: f64,
) -> PositioningResult<f64> {
    if distance_m <= 0.0 {
        return Err(PositioningError::NonPositive {
            what: "distance",
            value: distance_m,
        });
    }
    if frequency_hz <= 0.0 {
        return Err(PositioningError::NonPositive {
            what: "frequency",
            value: frequency_hz,
        });
    }
    let k = model_constant(frequency_hz);
    Ok(tx_power_dbm + 10.0 * path_loss_exponent * (k / distance_m).log10())
}

/// Distance implied by a transmit/receive dBm pair (inverse model).
///
/// `d = k * 10^((tx_dbm - rx_dbm) / (10*n))`
///
/// # Errors
/// [`PositioningError::NonPositive`] for a non-positive frequency or
/// path-loss exponent.
pub fn distance_from_rssi(
    tx_power_dbm: f64,
    rx_power_dbm: f64,
    path_loss_exponent: f64,
    frequency_hz: f64,
) -> PositioningResult<f64> {
    if frequency_hz <= 0.0 {
        return Err(PositioningError::NonPositive {
            what: "frequency",
            value: frequency_hz,
        });
    }
    if path_loss_exponent <= 0.0 {
        return Err(PositioningError::NonPositive {
            what: "path-loss exponent",
            value: path_loss_exponent,
        });
    }
    let k = model_constant(frequency_hz);
    Ok(k * 10.0_f64.powf((tx_power_dbm - rx_power_dbm) / (10.0 * path_loss_exponent)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
