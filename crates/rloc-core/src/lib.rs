//! # RSSI Fingerprint Positioning Library
//!
//! This crate provides the building blocks for indoor positioning from
//! received-signal-strength (RSSI) fingerprints: a surveyed database of
//! located signal snapshots, signal-space distance metrics, k-nearest
//! matching, a weighted-k-nearest-neighbour (WKNN) position solver, and
//! analytic uncertainty propagation through the log-distance path-loss
//! model.
//!
//! ## Overview
//!
//! - **Fingerprints**: per-source RSSI readings keyed by stable source
//!   identifiers, with optional per-reading noise ([`Fingerprint`],
//!   [`SignalReading`])
//! - **Signal model**: the log-distance path-loss model in both
//!   directions, dBm or linear ([`signal_model`])
//! - **Matching**: squared, Euclidean, and mean-removed signal-space
//!   distances plus k-nearest lookup ([`fingerprint_distance`],
//!   [`find_k_nearest`])
//! - **Solving**: inverse-square-distance weighted centroid over the
//!   matched fingerprints ([`WeightedPositionSolver`])
//! - **Uncertainty**: delta-method variance of derived distances and of
//!   Taylor-expanded RSSI readings, to third order
//!   ([`variance_propagation`])
//!
//! ## Positioning Flow
//!
//! ```text
//! Survey:  walk the space → Fingerprint + Position per point → database
//! Online:  live Fingerprint → find_k_nearest → WeightedPositionSolver → Position
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rloc_core::{
//!     find_k_nearest, Fingerprint, LocatedFingerprint, Position,
//!     SignalReading, WeightedPositionSolver,
//! };
//!
//! # fn main() -> rloc_core::PositioningResult<()> {
//! // Two surveyed points, one metre apart
//! let mut left = Fingerprint::new();
//! left.insert("beacon-1".into(), SignalReading::new(-58.0));
//! left.insert("beacon-2".into(), SignalReading::new(-71.0));
//! let mut right = Fingerprint::new();
//! right.insert("beacon-1".into(), SignalReading::new(-66.0));
//! right.insert("beacon-2".into(), SignalReading::new(-63.0));
//!
//! let database = vec![
//!     LocatedFingerprint::new(left, Position::new([0.0, 0.0])),
//!     LocatedFingerprint::new(right, Position::new([1.0, 0.0])),
//! ];
//!
//! // A live reading taken somewhere between the two survey points
//! let mut query = Fingerprint::new();
//! query.insert("beacon-1".into(), SignalReading::new(-62.0));
//! query.insert("beacon-2".into(), SignalReading::new(-67.0));
//!
//! let nearest = find_k_nearest(&database, &query, 2)?;
//! let mut solver = WeightedPositionSolver::with_inputs(
//!     nearest.iter().map(|entry| entry.fingerprint).collect(),
//!     nearest.iter().map(|entry| entry.distance).collect(),
//! )?;
//! let estimate = solver.solve()?;
//! assert!(estimate.coords[0] > 0.0 && estimate.coords[0] < 1.0);
//! # Ok(())
//! # }
//! ```

pub mod fingerprint;
pub mod fingerprint_distance;
pub mod geometry;
pub mod knn_finder;
pub mod radio_source;
pub mod signal_model;
pub mod types;
pub mod variance_propagation;
pub mod wknn_solver;

// Re-export main types
pub use fingerprint::{Fingerprint, LocatedFingerprint};
pub use geometry::{Covariance, Position, Position2, Position3};
pub use knn_finder::{find_k_nearest, DistanceEntry};
pub use radio_source::{RadioSource, RadioSourceBuilder};
pub use types::{PositioningError, PositioningResult, SignalReading, SourceId};
pub use variance_propagation::PropagatedVariance;
pub use wknn_solver::{
    SolveListener, SolverState, WeightedPositionSolver, DEFAULT_EPSILON,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fingerprint::{Fingerprint, LocatedFingerprint};
    pub use crate::geometry::{Covariance, Position, Position2, Position3};
    pub use crate::knn_finder::find_k_nearest;
    pub use crate::types::{PositioningError, PositioningResult, SignalReading, SourceId};
    pub use crate::wknn_solver::WeightedPositionSolver;
}
