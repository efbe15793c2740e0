//! Asynchronous coordination of subproblem results.
//!
//! Each dispatch snapshots the multipliers and the stability-center
//! generation. Results trickle in per subproblem; once a request is
//! complete it is folded into the master exactly like a synchronous round.
//! A request whose generation no longer matches the master is dropped,
//! since its cuts were taken around a center that has since moved.

use std::collections::BTreeMap;

use super::{StepKind, TrustRegionMaster};
use crate::error::{DecompError, DecompResult, StateErrorCode};
use crate::model::MasterStatus;
use crate::worker::SubproblemEvaluation;

/// Identifier of a dispatched evaluation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SolutionKey(u64);

impl SolutionKey {
    /// Raw key value.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A request to evaluate subproblems at a multiplier snapshot.
#[derive(Debug, Clone)]
pub struct Dispatch {
    /// Key to quote when returning results.
    pub key: SolutionKey,

    /// Multipliers to evaluate at.
    pub multipliers: Vec<f64>,

    /// Stability-center generation at dispatch.
    pub generation: u64,

    /// Subproblems to evaluate.
    pub subproblems: Vec<usize>,
}

/// What happened to a returned result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncOutcome {
    /// The request completed and was folded into the master.
    Applied(StepKind),
    /// More results are outstanding for this request.
    Pending,
    /// The request was taken around an old center and was dropped.
    Stale,
}

#[derive(Debug)]
struct Request {
    multipliers: Vec<f64>,
    generation: u64,
    expected: Vec<usize>,
    results: Vec<SubproblemEvaluation>,
}

/// Pending-request table for one [`TrustRegionMaster`].
#[derive(Debug, Default)]
pub struct AsyncCoordinator {
    next_key: u64,
    pending: BTreeMap<SolutionKey, Request>,
}

impl AsyncCoordinator {
    /// Create an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request for every subproblem at the master's current
    /// multipliers.
    pub fn dispatch(&mut self, master: &TrustRegionMaster) -> Dispatch {
        let key = SolutionKey(self.next_key);
        self.next_key += 1;
        let dispatch = Dispatch {
            key,
            multipliers: master.multipliers().to_vec(),
            generation: master.generation(),
            subproblems: (0..master.num_subproblems()).collect(),
        };
        self.pending.insert(
            key,
            Request {
                multipliers: dispatch.multipliers.clone(),
                generation: dispatch.generation,
                expected: dispatch.subproblems.clone(),
                results: Vec::with_capacity(dispatch.subproblems.len()),
            },
        );
        log::debug!(
            "Dispatched request {} at generation {}",
            key.0,
            dispatch.generation
        );
        dispatch
    }

    /// Accept one subproblem result.
    ///
    /// When the request completes it is folded into `master` and, unless
    /// the master has converged, the master LP is re-solved.
    pub fn complete(
        &mut self,
        master: &mut TrustRegionMaster,
        key: SolutionKey,
        evaluation: SubproblemEvaluation,
    ) -> DecompResult<AsyncOutcome> {
        let request = self.pending.get_mut(&key).ok_or_else(|| {
            DecompError::state(
                StateErrorCode::UnknownSolutionKey,
                format!("no pending request with key {}", key.0),
            )
        })?;

        if request.generation != master.generation() {
            self.pending.remove(&key);
            log::debug!("Dropped stale request {}", key.0);
            return Ok(AsyncOutcome::Stale);
        }

        let expected = request.expected.contains(&evaluation.subproblem);
        let repeated = request
            .results
            .iter()
            .any(|r| r.subproblem == evaluation.subproblem);
        if !expected || repeated {
            return Err(DecompError::state(
                StateErrorCode::UnknownSubproblem,
                format!(
                    "request {} did not expect a result for subproblem {}",
                    key.0, evaluation.subproblem
                ),
            ));
        }
        request.results.push(evaluation);
        if request.results.len() < request.expected.len() {
            return Ok(AsyncOutcome::Pending);
        }

        let Some(request) = self.pending.remove(&key) else {
            return Ok(AsyncOutcome::Pending);
        };
        let step = master.update_problem(&request.multipliers, &request.results)?;
        if master.termination_test() {
            master.set_status(MasterStatus::Optimal);
        } else {
            master.solve()?;
        }
        Ok(AsyncOutcome::Applied(step))
    }

    /// Forget a request.
    pub fn cancel(&mut self, key: SolutionKey) -> bool {
        self.pending.remove(&key).is_some()
    }

    /// Number of requests still outstanding.
    pub fn num_pending(&self) -> usize {
        self.pending.len()
    }
}
