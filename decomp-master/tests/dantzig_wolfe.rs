//! Dantzig-Wolfe master on the two-scenario toy problem.

mod common;

use common::{assert_close, engine, toy_structure, RecordingEngine, VertexWorker};
use decomp_core::LpEngine;
use decomp_master::{
    BranchDirection, BranchingObject, DecompError, DecompResult, DwMaster, DwSettings,
    GeneratedColumn, MasterStatus, Phase, StateErrorCode, SubproblemStatus, SubproblemWorker,
};

fn master() -> DwMaster<VertexWorker> {
    DwMaster::new(toy_structure(), engine(), VertexWorker::toy(), DwSettings::default()).unwrap()
}

/// Enumerates like [`VertexWorker`] but, after the initial batch, reports
/// scenario 0 in phase 2 as merely feasible with an objective 5 too high.
struct InexactWorker {
    inner: VertexWorker,
}

impl SubproblemWorker for InexactWorker {
    fn num_subproblems(&self) -> usize {
        self.inner.num_subproblems()
    }

    fn generate_columns(&mut self, phase: Phase, price: &[f64]) -> DecompResult<Vec<GeneratedColumn>> {
        let initial = self.inner.calls == 0;
        let mut cols = self.inner.generate_columns(phase, price)?;
        if !initial && phase == Phase::Optimality {
            for g in cols.iter_mut().filter(|g| g.subproblem == 0) {
                g.status = SubproblemStatus::Feasible;
                g.objective += 5.0;
            }
        }
        Ok(cols)
    }

    fn set_column_bounds(&mut self, indices: &[usize], lower: &[f64], upper: &[f64]) -> DecompResult<()> {
        self.inner.set_column_bounds(indices, lower, upper)
    }

    fn set_gap_tolerance(&mut self, tol: f64) {
        self.inner.set_gap_tolerance(tol);
    }

    fn set_time_limit(&mut self, seconds: Option<f64>) {
        self.inner.set_time_limit(seconds);
    }
}

/// `x1 ≤ 0` on both scenario copies.
fn fix_x1_down(best_bound: f64) -> BranchingObject {
    let mut obj = BranchingObject::new(BranchDirection::Down);
    obj.push(0, 0.0, 0.0);
    obj.push(2, 0.0, 0.0);
    obj.best_bound = best_bound;
    obj
}

#[test]
fn test_init_layout() {
    let mut m = master();
    m.init().unwrap();
    // Two convexity rows and two non-anticipativity rows.
    assert_eq!(m.structure().num_rows(), 2);
    assert_eq!(m.structure().num_cols(), 2 * 2 + 2);
    assert_eq!(m.engine().num_rows(), 4);
    assert_eq!(m.engine().num_cols(), 0);
    assert_eq!(m.status(), MasterStatus::NotSolved);
}

#[test]
fn test_solve_toy_problem() {
    let mut m = master();
    let status = m.solve().unwrap();

    assert!(matches!(status, MasterStatus::Optimal | MasterStatus::Feasible));
    assert_eq!(m.phase(), Phase::Optimality);
    assert_close(m.best_primal_bound(), 1.5, 1e-6);
    assert_close(m.best_dual_bound(), 1.5, 1e-6);

    // x = (1, 0) in both scenarios, y = (0, 1).
    let x = m.primal_solution();
    for (v, want) in x.iter().zip([1.0, 0.0, 1.0, 0.0, 0.0, 1.0]) {
        assert_close(*v, want, 1e-6);
    }
    assert_eq!(m.best_primal_solution().len(), 6);
    assert!(m.worker().calls >= 2);
    assert_eq!(m.worker().gap_tolerance, Some(DwSettings::default().gap_tol));
    assert!(!m.history().is_empty());
}

#[test]
fn test_dual_bound_history_is_monotone() {
    let mut m = master();
    m.solve().unwrap();
    let hist = m.dual_bound_history();
    assert!(!hist.is_empty());
    assert!(hist.windows(2).all(|w| w[1] >= w[0]));
    assert_close(*hist.last().unwrap(), m.best_dual_bound(), 0.0);
}

#[test]
fn test_inexact_pricing_leaves_dual_bound_valid() {
    let worker = InexactWorker { inner: VertexWorker::toy() };
    let mut m = DwMaster::new(toy_structure(), engine(), worker, DwSettings::default()).unwrap();
    m.solve().unwrap();

    // Only the exactly priced initial batch may bound; it gives 1.5.
    assert_close(m.best_primal_bound(), 1.5, 1e-6);
    assert!(m.best_dual_bound() <= 1.5 + 1e-6, "dual bound {}", m.best_dual_bound());
    assert!(m.dual_bound_history().iter().all(|&b| b <= 1.5 + 1e-6));
}

#[test]
fn test_reduced_cost_fixing_is_sound() {
    // Scenario 1 ties at price zero, so the initial batch picks `(0,1,1)`,
    // which the optimum `(1,0,0)` + `(1,0,2)` at 2.0 leaves at weight zero.
    let points = vec![
        vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        vec![[0.0, 1.0, 1.0], [1.0, 0.0, 2.0]],
    ];
    let structure = toy_structure();
    let worker = VertexWorker::new(&structure, points);
    let mut m = DwMaster::new(structure, engine(), worker, DwSettings::default()).unwrap();
    m.solve().unwrap();
    assert_close(m.best_primal_bound(), 2.0, 1e-6);
    assert_close(m.best_dual_bound(), 2.0, 1e-6);
    // Nothing is fixed before the first primal bound exists.
    assert!(m.pool().iter().all(|(_, c)| c.active));
    assert_eq!(m.pool().len(), m.engine().num_cols());

    let rc = m.engine().reduced_costs().to_vec();
    let (best_dual, best_primal) = (m.best_dual_bound(), m.best_primal_bound());
    let before = m.pool().len();

    // The re-solve reuses the same LP, so it fixes with these reduced costs.
    m.solve().unwrap();
    let fixed: Vec<usize> = m
        .pool()
        .iter()
        .take(before)
        .enumerate()
        .filter(|(_, (_, c))| !c.active)
        .map(|(k, _)| k)
        .collect();
    assert!(!fixed.is_empty());
    for k in fixed {
        assert!(best_dual + rc[k] - best_primal > -1e-10, "column {} rc {}", k, rc[k]);
    }
    assert_close(m.primal_bound(), 2.0, 1e-6);
}

#[test]
fn test_time_limit_reaches_engine() {
    let (engine, limits) = RecordingEngine::boxed();
    let settings = DwSettings::default().with_time_limit(60.0);
    let mut m = DwMaster::new(toy_structure(), engine, VertexWorker::toy(), settings).unwrap();
    m.solve().unwrap();

    let limits = limits.borrow();
    assert!(!limits.is_empty());
    for limit in limits.iter() {
        let t = limit.unwrap();
        assert!((0.0..=60.0).contains(&t), "limit {}", t);
    }
    // Each resolve gets what is left of the budget.
    assert!(limits.windows(2).all(|w| w[1] <= w[0]));
}

#[test]
fn test_branch_child_optimum() {
    let mut m = master();
    m.init().unwrap();
    m.set_branching_objects(&fix_x1_down(f64::NEG_INFINITY)).unwrap();
    // One `≤` row per tightened copy.
    assert_eq!(m.engine().num_rows(), 4 + 2);

    let status = m.solve().unwrap();
    assert!(status.is_feasible());
    assert_close(m.best_primal_bound(), 2.0, 1e-6);
    let x = m.primal_solution();
    assert_close(x[0], 0.0, 1e-6);
    assert_close(x[1], 1.0, 1e-6);
    assert_close(x[2], 0.0, 1e-6);
    assert_close(x[3], 1.0, 1e-6);
}

#[test]
fn test_branching_rebuild_keeps_columns_consistent() {
    let mut m = master();
    m.solve().unwrap();
    let root_bound = m.best_dual_bound();
    let pool_size = m.pool().len();

    m.set_branching_objects(&fix_x1_down(root_bound)).unwrap();
    assert_eq!(m.phase(), Phase::Optimality);
    assert_eq!(m.pool().num_active(), pool_size);
    assert_eq!(m.engine().num_cols(), pool_size);
    assert_eq!(m.engine().num_rows(), 6);
    assert_eq!(m.best_dual_bound(), root_bound);
    assert_eq!(m.node_bounds().1[0], 0.0);
    assert_eq!(m.node_bounds().1[1], 1.0);

    for (stored, fresh) in m.reprojected_coefficients() {
        assert_eq!(stored.indices(), fresh.indices());
        for (a, b) in stored.data().iter().zip(fresh.data()) {
            assert!((a - b).abs() <= 1e-10);
        }
    }

    // The incumbent from the root prunes the child.
    let status = m.solve().unwrap();
    assert!(status.is_feasible());
    assert_close(m.best_primal_bound(), 1.5, 1e-6);
    assert!(m.best_dual_bound() >= root_bound);
}

#[test]
fn test_node_state_round_trip() {
    let mut m = master();
    m.solve().unwrap();
    let root = m.save_node_state();
    assert!(root.branching.is_none());

    m.set_branching_objects(&fix_x1_down(m.best_dual_bound())).unwrap();
    m.solve().unwrap();
    assert_eq!(m.engine().num_rows(), 6);

    m.restore_node_state(&root).unwrap();
    assert_eq!(m.engine().num_rows(), 4);
    assert!(m.branching_object().is_none());
    assert_eq!(m.node_bounds().1[0], 1.0);
    assert_eq!(m.best_dual_bound(), root.best_dual);

    m.solve().unwrap();
    assert_close(m.primal_bound(), 1.5, 1e-6);
}

#[test]
fn test_branching_index_out_of_range() {
    let mut m = master();
    m.init().unwrap();
    let mut obj = BranchingObject::new(BranchDirection::Up);
    obj.push(42, 1.0, 1.0);
    let err = m.set_branching_objects(&obj).unwrap_err();
    assert!(matches!(
        err,
        DecompError::InvalidState {
            code: StateErrorCode::BranchingIndexOutOfRange,
            ..
        }
    ));
    // Nothing was applied.
    assert_eq!(m.engine().num_rows(), 4);
}

#[test]
fn test_infeasible_node() {
    let mut m = master();
    m.init().unwrap();
    // Scenario 1 has no point with x1 = x2 = 0 and y ≤ 0.5.
    let mut obj = BranchingObject::new(BranchDirection::Down);
    obj.push(2, 0.0, 0.0);
    obj.push(3, 0.0, 0.0);
    obj.push(5, 0.0, 0.5);
    m.set_branching_objects(&obj).unwrap();
    assert_eq!(m.solve().unwrap(), MasterStatus::PrimalInfeasible);
}

#[test]
fn test_worker_size_mismatch() {
    let mut structure = toy_structure();
    structure.num_subproblems = 3;
    let err = DwMaster::new(structure, engine(), VertexWorker::toy(), DwSettings::default());
    assert!(matches!(err, Err(DecompError::InvalidModel(_))));
}
