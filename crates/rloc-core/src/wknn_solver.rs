//! Weighted K-nearest-neighbours position solver
//!
//! Combines the K nearest located fingerprints and their signal-space
//! distances into one position estimate: each candidate's known position is
//! weighted by the inverse of its squared distance,
//! `w_i = 1 / (d_i^2 + epsilon)`, and the estimate is the weight-normalised
//! centroid. The epsilon regulariser keeps the weight finite when a
//! candidate's distance is exactly zero.
//!
//! The solver is a small state machine:
//!
//! ```text
//! Unready --set_inputs--> Ready --solve()--> Locked --returns--> Ready
//! ```
//!
//! `Locked` is held only for the duration of the synchronous [`solve`]
//! call. It exists to reject re-entrant mutation from the same call stack —
//! a [`SolveListener`] hook trying to change inputs mid-solve gets
//! [`PositioningError::Locked`]. It is not a thread-safety primitive;
//! concurrent use of one solver from several threads must be serialized by
//! the caller.
//!
//! [`solve`]: WeightedPositionSolver::solve
//!
//! # Example
//!
//! ```
//! use rloc_core::fingerprint::{Fingerprint, LocatedFingerprint};
//! use rloc_core::geometry::Position;
//! use rloc_core::wknn_solver::WeightedPositionSolver;
//!
//! let a = LocatedFingerprint::new(Fingerprint::new(), Position::new([0.0, 0.0]));
//! let b = LocatedFingerprint::new(Fingerprint::new(), Position::new([4.0, 0.0]));
//!
//! let mut solver = WeightedPositionSolver::new();
//! solver.set_inputs(vec![&a, &b], vec![1.0, 1.0]).unwrap();
//! let estimate = solver.solve().unwrap();
//! // Equal distances: the midpoint
//! assert_eq!(estimate.coords, [2.0, 0.0]);
//! ```

use crate::fingerprint::LocatedFingerprint;
use crate::geometry::Position;
use crate::types::{PositioningError, PositioningResult};
use tracing::debug;

/// Default Tikhonov-style regulariser added to squared distances.
pub const DEFAULT_EPSILON: f64 = 1e-7;

/// Solver lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// Inputs not yet set; `solve` is rejected.
    Unready,
    /// Inputs set; `solve` may run, mutation is allowed.
    Ready,
    /// A solve is in progress; all mutation is rejected.
    Locked,
}

/// Lifecycle hooks invoked around a solve.
///
/// Both hooks receive the solver itself, still in the `Locked` state, so
/// any mutation attempt from inside a hook observes
/// [`PositioningError::Locked`].
pub trait SolveListener<const N: usize> {
    /// Invoked before any computation, solver already locked.
    fn on_solve_start(&mut self, _solver: &mut WeightedPositionSolver<'_, N>) {}
    /// Invoked after the estimate is stored, solver still locked.
    fn on_solve_end(&mut self, _solver: &mut WeightedPositionSolver<'_, N>) {}
}

/// WKNN position solver over borrowed database fingerprints.
pub struct WeightedPositionSolver<'a, const N: usize> {
    fingerprints: Vec<&'a LocatedFingerprint<N>>,
    distances: Vec<f64>,
    epsilon: f64,
    state: SolverState,
    listener: Option<Box<dyn SolveListener<N> + 'a>>,
    estimated: Option<Position<N>>,
}

impl<const N: usize> Default for WeightedPositionSolver<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> WeightedPositionSolver<'a, N> {
    /// Create an unready solver with the default epsilon and no listener.
    pub fn new() -> Self {
        Self {
            fingerprints: Vec::new(),
            distances: Vec::new(),
            epsilon: DEFAULT_EPSILON,
            state: SolverState::Unready,
            listener: None,
            estimated: None,
        }
    }

    /// Create a ready solver from fingerprints and their distances.
    pub fn with_inputs(
        fingerprints: Vec<&'a LocatedFingerprint<N>>,
        distances: Vec<f64>,
    ) -> PositioningResult<Self> {
        let mut solver = Self::new();
        solver.set_inputs(fingerprints, distances)?;
        Ok(solver)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Current regulariser value.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// The most recent estimate, if any solve has succeeded.
    pub fn estimated_position(&self) -> Option<Position<N>> {
        self.estimated
    }

    /// Set fingerprints and distances together (atomic, lock-step).
    ///
    /// Both slices must be non-empty and of equal length; on any error the
    /// previous inputs and state are left untouched.
    pub fn set_inputs(
        &mut self,
        fingerprints: Vec<&'a LocatedFingerprint<N>>,
        distances: Vec<f64>,
    ) -> PositioningResult<()> {
        if self.state == SolverState::Locked {
            return Err(PositioningError::Locked);
        }
        if fingerprints.is_empty() && distances.is_empty() {
            return Err(PositioningError::EmptyInput {
                what: "fingerprints and distances",
            });
        }
        if fingerprints.len() != distances.len() {
            return Err(PositioningError::LengthMismatch {
                fingerprints: fingerprints.len(),
                distances: distances.len(),
            });
        }
        self.fingerprints = fingerprints;
        self.distances = distances;
        self.state = SolverState::Ready;
        Ok(())
    }

    /// Set the distance regulariser. Must be strictly positive.
    pub fn set_epsilon(&mut self, epsilon: f64) -> PositioningResult<()> {
        if self.state == SolverState::Locked {
            return Err(PositioningError::Locked);
        }
        if epsilon <= 0.0 {
            return Err(PositioningError::NonPositive {
                what: "epsilon",
                value: epsilon,
            });
        }
        self.epsilon = epsilon;
        Ok(())
    }

    /// Attach or clear the lifecycle listener.
    pub fn set_listener(
        &mut self,
        listener: Option<Box<dyn SolveListener<N> + 'a>>,
    ) -> PositioningResult<()> {
        if self.state == SolverState::Locked {
            return Err(PositioningError::Locked);
        }
        self.listener = listener;
        Ok(())
    }

    /// Run the weighted solve and store the estimate.
    ///
    /// Requires `Ready`; returns [`PositioningError::NotReady`] before
    /// inputs are set and [`PositioningError::Locked`] when invoked
    /// re-entrantly from a listener hook.
    ///
    /// The computation is purely arithmetic — no iteration, no convergence
    /// criterion — and deterministic given its inputs. With a single
    /// fingerprint the result is exactly that fingerprint's position.
    pub fn solve(&mut self) -> PositioningResult<Position<N>> {
        match self.state {
            SolverState::Locked => return Err(PositioningError::Locked),
            SolverState::Unready => return Err(PositioningError::NotReady),
            SolverState::Ready => {}
        }
        self.state = SolverState::Locked;
        debug!(
            candidates = self.fingerprints.len(),
            epsilon = self.epsilon,
            "wknn solve start"
        );

        // Detach the listener so the hooks can take `&mut self`. Every
        // mutator rejects while Locked, so reattachment cannot clobber a
        // replacement listener.
        let mut listener = self.listener.take();
        if let Some(l) = listener.as_mut() {
            l.on_solve_start(self);
        }

        let estimate = if self.fingerprints.len() == 1 {
            // Weight cancels; return the position bit-for-bit.
            self.fingerprints[0].position
        } else {
            let mut weight_sum = 0.0;
            let mut weighted = Position::<N>::zeros();
            for (located, &d) in self.fingerprints.iter().zip(self.distances.iter()) {
                let w = 1.0 / (d * d + self.epsilon);
                weight_sum += w;
                weighted = weighted.add(&located.position.scale(w));
            }
            weighted.div(weight_sum)
        };
        self.estimated = Some(estimate);

        if let Some(l) = listener.as_mut() {
            l.on_solve_end(self);
        }
        self.listener = listener;
        self.state = SolverState::Ready;
        debug!(position = ?estimate.coords, "wknn solve end");
        Ok(estimate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn located(coords: [f64; 2]) -> LocatedFingerprint<2> {
        LocatedFingerprint::new(Fingerprint::new(), Position::new(coords))
    }

    #[test]
    fn test_unready_solve_rejected() {
        let mut solver = WeightedPositionSolver::<2>::new();
        assert_eq!(solver.state(), SolverState::Unready);
        assert_eq!(solver.solve().unwrap_err(), PositioningError::NotReady);
        assert_eq!(solver.estimated_position(), None);
    }

    #[test]
    fn test_input_validation() {
        let fp = located([1.0, 2.0]);
        let mut solver = WeightedPositionSolver::new();
        assert!(matches!(
            solver.set_inputs(Vec::new(), Vec::new()),
            Err(PositioningError::EmptyInput { .. })
        ));
        assert_eq!(
            solver.set_inputs(vec![&fp], vec![1.0, 2.0]).unwrap_err(),
            PositioningError::LengthMismatch {
                fingerprints: 1,
                distances: 2
            }
        );
        // Failed setters leave the solver unready
        assert_eq!(solver.state(), SolverState::Unready);
        solver.set_inputs(vec![&fp], vec![1.0]).unwrap();
        assert_eq!(solver.state(), SolverState::Ready);
    }

    #[test]
    fn test_epsilon_validation() {
        let mut solver = WeightedPositionSolver::<2>::new();
        assert!(matches!(
            solver.set_epsilon(0.0),
            Err(PositioningError::NonPositive { what: "epsilon", .. })
        ));
        assert!(solver.set_epsilon(1e-3).is_ok());
        assert_eq!(solver.epsilon(), 1e-3);
    }

    #[test]
    fn test_single_fingerprint_exact() {
        // K = 1 must return the fingerprint position with exact equality,
        // regardless of the reported distance.
        let fp = located([3.7, -12.25]);
        for d in [0.0, 1e-9, 5.0, 1e6] {
            let mut solver = WeightedPositionSolver::with_inputs(vec![&fp], vec![d]).unwrap();
            let estimate = solver.solve().unwrap();
            assert_eq!(estimate.coords, [3.7, -12.25]);
        }
    }

    #[test]
    fn test_unit_square_centroid() {
        // Four corners, equal distances: the exact centroid.
        let corners = [
            located([0.0, 0.0]),
            located([1.0, 0.0]),
            located([0.0, 1.0]),
            located([1.0, 1.0]),
        ];
        let refs: Vec<_> = corners.iter().collect();
        let mut solver =
            WeightedPositionSolver::with_inputs(refs, vec![2.5; 4]).unwrap();
        let estimate = solver.solve().unwrap();
        assert_eq!(estimate.coords, [0.5, 0.5]);
    }

    #[test]
    fn test_closer_fingerprint_dominates() {
        let a = located([0.0, 0.0]);
        let b = located([10.0, 0.0]);
        let mut solver =
            WeightedPositionSolver::with_inputs(vec![&a, &b], vec![1.0, 3.0]).unwrap();
        let estimate = solver.solve().unwrap();
        // Weight ratio 9:1 toward a -> x = 10 * (1/9) / (1 + 1/9) = 1.0
        assert!(
            estimate.coords[0] < 2.0,
            "estimate should lean toward the close fingerprint, got {:?}",
            estimate.coords
        );
        assert_eq!(solver.estimated_position(), Some(estimate));
    }

    #[test]
    fn test_zero_distance_uses_epsilon() {
        let a = located([0.0, 0.0]);
        let b = located([10.0, 0.0]);
        let mut solver =
            WeightedPositionSolver::with_inputs(vec![&a, &b], vec![0.0, 1.0]).unwrap();
        let estimate = solver.solve().unwrap();
        // w_a = 1/epsilon overwhelms w_b
        assert!(estimate.coords[0] < 1e-4, "got {:?}", estimate.coords);
    }

    #[test]
    fn test_state_returns_to_ready_after_solve() {
        let fp = located([1.0, 1.0]);
        let mut solver = WeightedPositionSolver::with_inputs(vec![&fp], vec![1.0]).unwrap();
        solver.solve().unwrap();
        assert_eq!(solver.state(), SolverState::Ready);
        // Re-solvable
        solver.solve().unwrap();
    }

    // -- Locked-state rejection --------------------------------------------

    #[derive(Default)]
    struct Observed {
        start_errors: Vec<PositioningError>,
        end_errors: Vec<PositioningError>,
        saw_locked_state: bool,
    }

    struct MutatingListener {
        observed: Rc<RefCell<Observed>>,
    }

    impl SolveListener<2> for MutatingListener {
        fn on_solve_start(&mut self, solver: &mut WeightedPositionSolver<'_, 2>) {
            let mut obs = self.observed.borrow_mut();
            obs.saw_locked_state = solver.state() == SolverState::Locked;
            obs.start_errors.push(solver.set_epsilon(0.5).unwrap_err());
            obs.start_errors
                .push(solver.set_inputs(Vec::new(), Vec::new()).unwrap_err());
            obs.start_errors.push(solver.set_listener(None).unwrap_err());
            obs.start_errors.push(solver.solve().unwrap_err());
        }

        fn on_solve_end(&mut self, solver: &mut WeightedPositionSolver<'_, 2>) {
            let mut obs = self.observed.borrow_mut();
            obs.end_errors.push(solver.solve().unwrap_err());
        }
    }

    #[test]
    fn test_locked_mutation_rejected_from_listener() {
        let fp = located([2.0, 4.0]);
        let observed = Rc::new(RefCell::new(Observed::default()));
        let mut solver = WeightedPositionSolver::with_inputs(vec![&fp], vec![1.0]).unwrap();
        solver
            .set_listener(Some(Box::new(MutatingListener {
                observed: Rc::clone(&observed),
            })))
            .unwrap();

        let estimate = solver.solve().unwrap();
        assert_eq!(estimate.coords, [2.0, 4.0]);

        let obs = observed.borrow();
        assert!(obs.saw_locked_state, "listener should see Locked state");
        assert_eq!(obs.start_errors.len(), 4);
        for err in &obs.start_errors {
            assert_eq!(*err, PositioningError::Locked);
        }
        assert_eq!(obs.end_errors, vec![PositioningError::Locked]);

        // Epsilon must be unchanged by the rejected mutation
        drop(obs);
        assert_eq!(solver.epsilon(), DEFAULT_EPSILON);
        // And the solver is usable again afterwards
        assert_eq!(solver.state(), SolverState::Ready);
        solver.set_epsilon(0.25).unwrap();
    }

    struct CountingListener {
        counts: Rc<RefCell<(usize, usize)>>,
    }

    impl SolveListener<2> for CountingListener {
        fn on_solve_start(&mut self, solver: &mut WeightedPositionSolver<'_, 2>) {
            // Estimate from a previous solve is still visible at start
            self.counts.borrow_mut().0 += 1;
            let _ = solver.estimated_position();
        }

        fn on_solve_end(&mut self, solver: &mut WeightedPositionSolver<'_, 2>) {
            self.counts.borrow_mut().1 += 1;
            assert!(
                solver.estimated_position().is_some(),
                "estimate must be stored before on_solve_end"
            );
        }
    }

    #[test]
    fn test_listener_invoked_each_solve() {
        let fp = located([1.0, 1.0]);
        let counts = Rc::new(RefCell::new((0usize, 0usize)));
        let mut solver = WeightedPositionSolver::with_inputs(vec![&fp], vec![1.0]).unwrap();
        solver
            .set_listener(Some(Box::new(CountingListener {
                counts: Rc::clone(&counts),
            })))
            .unwrap();
        solver.solve().unwrap();
        solver.solve().unwrap();
        assert_eq!(*counts.borrow(), (2, 2));
    }
}
