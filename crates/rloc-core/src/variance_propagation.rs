//! Delta-method uncertainty propagation through the path-loss model
//!
//! Measurement variances (transmit power, received power, path-loss
//! exponent, anchor/source/estimate position covariances) are propagated to
//! the variance of a derived quantity — an estimated distance, or a
//! linearized RSSI — using closed-form partial derivatives of the
//! log-distance model: for a scalar output `f` of random inputs `x`,
//! `Var[f] ~= grad(f)^T Cov[x] grad(f)`.
//!
//! For the RSSI functions the model is expanded around the fingerprint
//! anchor `p1`. With source position `pa` and candidate position `pi`,
//! writing `v = p1 - pa`, `delta = pi - p1`,
//!
//! ```text
//! rssi(pi) = r1 - (5n/ln10) * [ln|pi - pa|^2 - ln|p1 - pa|^2]
//! ```
//!
//! and the bracket is Taylor-expanded to first, second, or third order in
//! `delta` through the scalars `A = v.delta`, `B = |delta|^2`,
//! `D = |v|^2`. First order is a plain gradient linearization; the higher
//! orders keep curvature terms that materially reduce bias when the
//! candidate sits several metres from the anchor. All orders agree on the
//! noise-free mean at `delta = 0`, which is the anchor property the tests
//! pin down.
//!
//! Absent-vs-zero is deliberate throughout: a `None` return means
//! "uncertainty not requested / not computable", a variance of `0.0` means
//! "computed and exactly zero".

use crate::geometry::{Covariance, Position};
use crate::signal_model;
use crate::types::{PositioningError, PositioningResult};
use std::f64::consts::LN_10;

/// Mean and variance of a propagated scalar quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropagatedVariance {
    /// Expected value of the derived quantity (metres or dBm).
    pub mean: f64,
    /// Variance of the derived quantity; always >= 0, exactly 0 when every
    /// supplied input variance is 0 or absent.
    pub variance: f64,
}

// ---------------------------------------------------------------------------
// Distance propagation
// ---------------------------------------------------------------------------

/// Distance estimate with variance from received-power uncertainty alone.
///
/// The mean is the deterministic inverse of the path-loss model at the
/// given dBm values; the variance is `(d(d)/d(rx))^2 * rx_variance` with
/// `d(d)/d(rx) = -d * ln10 / (10n)`. An absent or zero `rx_power_variance`
/// yields a variance of exactly 0.
pub fn distance_variance_from_power(
    tx_power_dbm: f64,
    rx_power_dbm: f64,
    path_loss_exponent: f64,
    frequency_hz: f64,
    rx_power_variance: Option<f64>,
) -> PositioningResult<PropagatedVariance> {
    let mean = signal_model::distance_from_rssi(
        tx_power_dbm,
        rx_power_dbm,
        path_loss_exponent,
        frequency_hz,
    )?;
    let dd_drx = -mean * LN_10 / (10.0 * path_loss_exponent);
    let variance = rx_power_variance.unwrap_or(0.0) * dd_drx * dd_drx;
    Ok(PropagatedVariance { mean, variance })
}

/// Full distance distribution from tx-power, rx-power, and path-loss
/// exponent uncertainty.
///
/// Returns `Ok(None)` when all three variances are absent — "no
/// uncertainty requested" is distinct from "known to be exact". Otherwise
/// the variance is `J^T diag(tx, rx, n) J` with the three closed-form
/// partials of the inverted model.
pub fn distance_distribution(
    tx_power_dbm: f64,
    rx_power_dbm: f64,
    path_loss_exponent: f64,
    frequency_hz: f64,
    tx_power_variance: Option<f64>,
    rx_power_variance: Option<f64>,
    path_loss_exponent_variance: Option<f64>,
) -> PositioningResult<Option<PropagatedVariance>> {
    if tx_power_variance.is_none()
        && rx_power_variance.is_none()
        && path_loss_exponent_variance.is_none()
    {
        return Ok(None);
    }
    let mean = signal_model::distance_from_rssi(
        tx_power_dbm,
        rx_power_dbm,
        path_loss_exponent,
        frequency_hz,
    )?;

    // d = k * 10^((tx - rx) / (10 n))
    let dd_dtx = mean * LN_10 / (10.0 * path_loss_exponent);
    let dd_drx = -dd_dtx;
    let dd_dn = -mean * LN_10 * (tx_power_dbm - rx_power_dbm)
        / (10.0 * path_loss_exponent * path_loss_exponent);

    let variance = tx_power_variance.unwrap_or(0.0) * dd_dtx * dd_dtx
        + rx_power_variance.unwrap_or(0.0) * dd_drx * dd_drx
        + path_loss_exponent_variance.unwrap_or(0.0) * dd_dn * dd_dn;
    Ok(Some(PropagatedVariance { mean, variance }))
}

// ---------------------------------------------------------------------------
// RSSI Taylor expansion core
// ---------------------------------------------------------------------------

/// Expansion order of the RSSI Taylor polynomial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaylorOrder {
    First,
    Second,
    Third,
}

/// Order-o expansion of the RSSI model and its analytic gradient.
struct RssiExpansion<const N: usize> {
    /// The bracket value `S`; the mean shift is `-(5n/ln10) * S`.
    s: f64,
    /// `mean - r1`.
    mean_shift: f64,
    grad_p1: Position<N>,
    grad_pa: Position<N>,
    grad_pi: Position<N>,
}

/// Evaluate the order-o Taylor polynomial of the RSSI model and its
/// gradient with respect to the three positions.
///
/// Errors with [`PositioningError::InvalidGeometry`] when the fingerprint
/// coincides with the radio source (`|p1 - pa|^2 = 0`), which would put a
/// zero in every denominator.
fn expand_rssi<const N: usize>(
    order: TaylorOrder,
    path_loss_exponent: f64,
    fingerprint_position: &Position<N>,
    radio_source_position: &Position<N>,
    estimated_position: &Position<N>,
) -> PositioningResult<RssiExpansion<N>> {
    let v = fingerprint_position.sub(radio_source_position);
    let delta = estimated_position.sub(fingerprint_position);
    let d = v.sqr_norm();
    if d <= 0.0 {
        return Err(PositioningError::InvalidGeometry);
    }
    let a = v.dot(&delta);
    let b = delta.sqr_norm();
    let d2 = d * d;
    let d3 = d2 * d;

    // S and its partials with respect to the scalars (A, B, D), built up
    // order by order. Each order is a strict refinement of the previous.
    let mut s = 2.0 * a / d;
    let mut s_a = 2.0 / d;
    let mut s_b = 0.0;
    let mut s_d = -2.0 * a / d2;

    if order != TaylorOrder::First {
        s += b / d - 2.0 * a * a / d2;
        s_a += -4.0 * a / d2;
        s_b += 1.0 / d;
        s_d += -b / d2 + 4.0 * a * a / d3;
    }
    if order == TaylorOrder::Third {
        let d4 = d3 * d;
        s += -2.0 * a * b / d2 + (8.0 / 3.0) * a * a * a / d3;
        s_a += -2.0 * b / d2 + 8.0 * a * a / d3;
        s_b += -2.0 * a / d2;
        s_d += 4.0 * a * b / d3 - 8.0 * a * a * a / d4;
    }

    // Chain rule through A = v.delta, B = |delta|^2, D = |v|^2:
    //   dA/dpi = v        dB/dpi = 2 delta    dD/dpi = 0
    //   dA/dp1 = delta-v  dB/dp1 = -2 delta   dD/dp1 = 2 v
    //   dA/dpa = -delta   dB/dpa = 0          dD/dpa = -2 v
    let scale = -5.0 * path_loss_exponent / LN_10;
    let grad_pi = v.scale(s_a).add(&delta.scale(2.0 * s_b)).scale(scale);
    let grad_p1 = delta
        .sub(&v)
        .scale(s_a)
        .add(&delta.scale(-2.0 * s_b))
        .add(&v.scale(2.0 * s_d))
        .scale(scale);
    let grad_pa = delta
        .scale(-s_a)
        .add(&v.scale(-2.0 * s_d))
        .scale(scale);

    Ok(RssiExpansion {
        s,
        mean_shift: scale * s,
        grad_p1,
        grad_pa,
        grad_pi,
    })
}

/// Shared implementation behind the public per-order wrappers.
#[allow(clippy::too_many_arguments)]
fn rssi_variance<const N: usize>(
    order: TaylorOrder,
    fingerprint_rssi: f64,
    path_loss_exponent: f64,
    fingerprint_position: Option<&Position<N>>,
    radio_source_position: Option<&Position<N>>,
    estimated_position: Option<&Position<N>>,
    path_loss_exponent_variance: Option<f64>,
    rssi_variance: Option<f64>,
    fingerprint_position_covariance: Option<&Covariance<N>>,
    radio_source_position_covariance: Option<&Covariance<N>>,
    estimated_position_covariance: Option<&Covariance<N>>,
) -> PositioningResult<Option<PropagatedVariance>> {
    let (Some(p1), Some(pa), Some(pi)) = (
        fingerprint_position,
        radio_source_position,
        estimated_position,
    ) else {
        return Ok(None);
    };
    let expansion = expand_rssi(order, path_loss_exponent, p1, pa, pi)?;
    let mean = fingerprint_rssi + expansion.mean_shift;

    // mean_shift is linear in n, so d(mean)/dn = mean_shift / n, written
    // without the division to stay finite for any exponent.
    let dmean_dn = -5.0 * expansion.s / LN_10;

    let mut variance = rssi_variance.unwrap_or(0.0);
    variance += path_loss_exponent_variance.unwrap_or(0.0) * dmean_dn * dmean_dn;
    if let Some(cov) = fingerprint_position_covariance {
        variance += cov.quadratic_form(&expansion.grad_p1);
    }
    if let Some(cov) = radio_source_position_covariance {
        variance += cov.quadratic_form(&expansion.grad_pa);
    }
    if let Some(cov) = estimated_position_covariance {
        variance += cov.quadratic_form(&expansion.grad_pi);
    }
    Ok(Some(PropagatedVariance { mean, variance }))
}

macro_rules! rssi_variance_fn {
    ($(#[$doc:meta])* $name:ident, $order:expr, $dim:literal) => {
        $(#[$doc])*
        #[allow(clippy::too_many_arguments)]
        pub fn $name(
            fingerprint_rssi: f64,
            path_loss_exponent: f64,
            fingerprint_position: Option<&Position<$dim>>,
            radio_source_position: Option<&Position<$dim>>,
            estimated_position: Option<&Position<$dim>>,
            path_loss_exponent_variance: Option<f64>,
            rssi_variance: Option<f64>,
            fingerprint_position_covariance: Option<&Covariance<$dim>>,
            radio_source_position_covariance: Option<&Covariance<$dim>>,
            estimated_position_covariance: Option<&Covariance<$dim>>,
        ) -> PositioningResult<Option<PropagatedVariance>> {
            self::rssi_variance(
                $order,
                fingerprint_rssi,
                path_loss_exponent,
                fingerprint_position,
                radio_source_position,
                estimated_position,
                path_loss_exponent_variance,
                rssi_variance,
                fingerprint_position_covariance,
                radio_source_position_covariance,
                estimated_position_covariance,
            )
        }
    };
}

rssi_variance_fn!(
    /// First-order (gradient) RSSI variance at a 2-D candidate position.
    ///
    /// Returns `Ok(None)` when any of the three positions is absent. When
    /// every variance input is absent the result has variance exactly 0
    /// and its mean is the noise-free first-order Taylor value.
    rssi_variance_first_order_2d,
    TaylorOrder::First,
    2
);
rssi_variance_fn!(
    /// First-order (gradient) RSSI variance at a 3-D candidate position.
    rssi_variance_first_order_3d,
    TaylorOrder::First,
    3
);
rssi_variance_fn!(
    /// Second-order RSSI variance at a 2-D candidate position; retains
    /// curvature terms of the squared-distance ratio.
    rssi_variance_second_order_2d,
    TaylorOrder::Second,
    2
);
rssi_variance_fn!(
    /// Second-order RSSI variance at a 3-D candidate position.
    rssi_variance_second_order_3d,
    TaylorOrder::Second,
    3
);
rssi_variance_fn!(
    /// Third-order RSSI variance at a 2-D candidate position; the tightest
    /// expansion offered, for candidates far from the fingerprint grid.
    rssi_variance_third_order_2d,
    TaylorOrder::Third,
    2
);
rssi_variance_fn!(
    /// Third-order RSSI variance at a 3-D candidate position.
    rssi_variance_third_order_3d,
    TaylorOrder::Third,
    3
);

// ---------------------------------------------------------------------------
// RSSI difference propagation
// ---------------------------------------------------------------------------

/// Shared implementation of the RSSI-difference variance.
fn rssi_difference_variance<const N: usize>(
    path_loss_exponent: f64,
    fingerprint_position: Option<&Position<N>>,
    radio_source_position: Option<&Position<N>>,
    estimated_position: Option<&Position<N>>,
    path_loss_exponent_variance: Option<f64>,
    fingerprint_position_covariance: Option<&Covariance<N>>,
    radio_source_position_covariance: Option<&Covariance<N>>,
    estimated_position_covariance: Option<&Covariance<N>>,
) -> PositioningResult<Option<PropagatedVariance>> {
    let (Some(p1), Some(pa), Some(pi)) = (
        fingerprint_position,
        radio_source_position,
        estimated_position,
    ) else {
        return Ok(None);
    };
    let expansion = expand_rssi(TaylorOrder::First, path_loss_exponent, p1, pa, pi)?;
    let mean = expansion.mean_shift;
    let dmean_dn = -5.0 * expansion.s / LN_10;

    let mut variance = path_loss_exponent_variance.unwrap_or(0.0) * dmean_dn * dmean_dn;
    if let Some(cov) = fingerprint_position_covariance {
        variance += cov.quadratic_form(&expansion.grad_p1);
    }
    if let Some(cov) = radio_source_position_covariance {
        variance += cov.quadratic_form(&expansion.grad_pa);
    }
    if let Some(cov) = estimated_position_covariance {
        variance += cov.quadratic_form(&expansion.grad_pi);
    }
    Ok(Some(PropagatedVariance { mean, variance }))
}

/// Variance of the RSSI *difference* between two 2-D points relative to
/// the same source.
///
/// The transmit power cancels in the difference, so this works for
/// differential positioning with unknown absolute power. First-order
/// expansion; same absent-position contract as the `rssi_variance_*`
/// functions.
#[allow(clippy::too_many_arguments)]
pub fn rssi_difference_variance_2d(
    path_loss_exponent: f64,
    fingerprint_position: Option<&Position<2>>,
    radio_source_position: Option<&Position<2>>,
    estimated_position: Option<&Position<2>>,
    path_loss_exponent_variance: Option<f64>,
    fingerprint_position_covariance: Option<&Covariance<2>>,
    radio_source_position_covariance: Option<&Covariance<2>>,
    estimated_position_covariance: Option<&Covariance<2>>,
) -> PositioningResult<Option<PropagatedVariance>> {
    rssi_difference_variance(
        path_loss_exponent,
        fingerprint_position,
        radio_source_position,
        estimated_position,
        path_loss_exponent_variance,
        fingerprint_position_covariance,
        radio_source_position_covariance,
        estimated_position_covariance,
    )
}

/// Variance of the RSSI difference between two 3-D points relative to the
/// same source. See [`rssi_difference_variance_2d`].
#[allow(clippy::too_many_arguments)]
pub fn rssi_difference_variance_3d(
    path_loss_exponent: f64,
    fingerprint_position: Option<&Position<3>>,
    radio_source_position: Option<&Position<3>>,
    estimated_position: Option<&Position<3>>,
    path_loss_exponent_variance: Option<f64>,
    fingerprint_position_covariance: Option<&Covariance<3>>,
    radio_source_position_covariance: Option<&Covariance<3>>,
    estimated_position_covariance: Option<&Covariance<3>>,
) -> PositioningResult<Option<PropagatedVariance>> {
    rssi_difference_variance(
        path_loss_exponent,
        fingerprint_position,
        radio_source_position,
        estimated_position,
        path_loss_exponent_variance,
        fingerprint_position_covariance,
        radio_source_position_covariance,
        estimated_position_covariance,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
