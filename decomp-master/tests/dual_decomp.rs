//! Trust-region dual-decomposition master.

mod common;

use common::{assert_close, engine, toy_model, LagrangianWorker};
use decomp_core::{LpEngine, RowSense};
use decomp_master::{
    AsyncCoordinator, AsyncOutcome, CouplingModel, CutStatus, DecompError, MasterStatus,
    StateErrorCode, StepKind, SubproblemEvaluation, TrustRegionMaster, TrustRegionSettings,
};

/// One subproblem and one `≤` coupling row, so `λ ≥ 0`.
fn single_row_master(settings: TrustRegionSettings) -> TrustRegionMaster {
    let model = CouplingModel::new(1, vec![RowSense::Less], None).unwrap();
    let mut m = TrustRegionMaster::new(model, engine(), settings).unwrap();
    m.init().unwrap();
    m
}

/// Evaluation whose cut is `θ ≤ primal + residual·(λ − λᵏ)`.
fn cut_evaluation(primal: f64, dual: f64, residual: f64) -> SubproblemEvaluation {
    SubproblemEvaluation {
        subproblem: 0,
        primal_objective: primal,
        dual_objective: dual,
        coupling_residual: vec![residual],
    }
}

/// Evaluation whose cut is `θ + λ ≤ primal` at `λ = 0`.
fn evaluation(primal: f64, dual: f64) -> SubproblemEvaluation {
    cut_evaluation(primal, dual, -1.0)
}

/// Three rounds with cut age limit 1:
///
/// 1. steep cut `θ ≤ 250 − 100λ` (master: θ = 250 at λ = 0),
/// 2. rising cut `θ ≤ 1 + λ` (master: θ = 2 at λ = 1, steep cut slack),
/// 3. the rising cut again with a better dual bound: a serious step that
///    adds nothing and ages both cuts past the limit.
fn steep_and_rising_cuts() -> (TrustRegionMaster, StepKind) {
    let settings = TrustRegionSettings::default()
        .with_initial_radius(1.0)
        .with_cut_age_limit(1);
    let mut m = single_row_master(settings);

    m.update_problem(&[0.0], &[cut_evaluation(250.0, 0.0, -100.0)])
        .unwrap();
    m.solve().unwrap();
    assert_close(m.primal_bound(), 250.0, 1e-6);

    let lambda = m.multipliers().to_vec();
    let step = m
        .update_problem(&lambda, &[cut_evaluation(1.0, 1.0, 1.0)])
        .unwrap();
    assert_eq!(step, StepKind::Serious);
    m.solve().unwrap();
    assert_close(m.primal_bound(), 2.0, 1e-6);
    assert_close(m.multipliers()[0], 1.0, 1e-6);

    let lambda = m.multipliers().to_vec();
    let step = m
        .update_problem(&lambda, &[cut_evaluation(1.0 + lambda[0], 2.0, 1.0)])
        .unwrap();
    (m, step)
}

fn toy_master(settings: TrustRegionSettings) -> TrustRegionMaster {
    let model = CouplingModel::from_two_stage(&toy_model()).unwrap();
    TrustRegionMaster::new(model, engine(), settings).unwrap()
}

#[test]
fn test_init_layout() {
    let mut m = toy_master(TrustRegionSettings::default());
    m.init().unwrap();
    // Two surrogates, four multipliers, two normalization rows.
    assert_eq!(m.engine().num_cols(), 6);
    assert_eq!(m.engine().num_rows(), 2);
    assert_eq!(m.radius(), 0.1);
    assert_eq!(m.engine().column_bounds(2).unwrap(), (-0.1, 0.1));
    assert_eq!(m.engine().column_bounds(0).unwrap(), (f64::NEG_INFINITY, f64::INFINITY));
    assert!(m.multipliers().iter().all(|&v| v == 0.0));
}

#[test]
fn test_run_toy_problem() {
    let mut m = toy_master(TrustRegionSettings::default());
    let mut worker = LagrangianWorker::toy();
    let status = m.run(&mut worker).unwrap();

    assert_eq!(status, MasterStatus::Optimal);
    assert!(m.is_converged());
    assert_close(m.best_dual_bound(), 1.5, 1e-6);
    assert_close(m.primal_bound(), 1.5, 1e-5);
    assert!(worker.evaluations >= 2);
    assert!(!m.solve_records().is_empty());
    assert_eq!(m.history().len(), worker.evaluations);

    // Normalization rows hold at every solve.
    for rec in m.solve_records() {
        let lambda = &rec.solution[2..];
        assert_close(lambda[0] + lambda[2], 0.0, 1e-6);
        assert_close(lambda[1] + lambda[3], 0.0, 1e-6);
    }
}

#[test]
fn test_first_step_is_serious() {
    let mut m = single_row_master(TrustRegionSettings::default().with_initial_radius(1.0));
    let step = m.update_problem(&[0.0], &[evaluation(1.0, 0.8)]).unwrap();
    assert_eq!(step, StepKind::Serious);
    assert_eq!(m.best_dual_bound(), 0.8);
    assert_eq!(m.cuts().len(), 1);
    assert_eq!(m.engine().num_rows(), 1);
    // Unsolved: the center stays put.
    assert_eq!(m.generation(), 0);
}

#[test]
fn test_null_step_shrinks_radius() {
    let mut m = single_row_master(TrustRegionSettings::default().with_initial_radius(1.0));
    m.update_problem(&[0.0], &[evaluation(1.0, 0.8)]).unwrap();
    m.solve().unwrap();
    assert_close(m.primal_bound(), 1.0, 1e-6);

    // ρ = min(1, 1)·(0.8 − (−1))/(1 − 0.8) = 9 ≥ 3, so the radius drops by 4.
    let lambda = m.multipliers().to_vec();
    let step = m.update_problem(&lambda, &[evaluation(-1.0, -1.0)]).unwrap();
    assert_eq!(step, StepKind::Null);
    assert_eq!(m.radius(), 0.25);
    assert_eq!(m.best_dual_bound(), 0.8);
    assert_eq!(m.stability_center(), &[0.0]);
    assert_eq!(m.engine().column_bounds(1).unwrap(), (0.0, 0.25));
}

#[test]
fn test_serious_step_on_boundary_grows_radius() {
    let mut m = single_row_master(TrustRegionSettings::default().with_initial_radius(1.0));
    m.update_problem(&[0.0], &[evaluation(1.0, 0.8)]).unwrap();
    m.solve().unwrap();

    // λ sits on its lower bound and 0.95 ≥ 0.8 + 0.5·(1 − 0.8).
    let lambda = m.multipliers().to_vec();
    let step = m.update_problem(&lambda, &[evaluation(0.95, 0.95)]).unwrap();
    assert_eq!(step, StepKind::Serious);
    assert_eq!(m.radius(), 2.0);
    assert_eq!(m.generation(), 1);
    assert_eq!(m.best_dual_bound(), 0.95);
    let (lo, hi) = m.engine().column_bounds(1).unwrap();
    assert_eq!(lo, 0.0);
    assert_close(hi, 2.0, 1e-6);
}

#[test]
fn test_null_step_below_best_bound_grows_radius() {
    let mut m = single_row_master(TrustRegionSettings::default().with_initial_radius(1.0));
    // The cut caps the master at 0.5, below the reported bound 0.6.
    m.update_problem(&[0.0], &[evaluation(0.5, 0.6)]).unwrap();
    m.solve().unwrap();
    assert_close(m.primal_bound(), 0.5, 1e-6);

    let lambda = m.multipliers().to_vec();
    let step = m.update_problem(&lambda, &[evaluation(0.4, 0.4)]).unwrap();
    assert_eq!(step, StepKind::Null);
    assert_eq!(m.radius(), 2.0);
    assert_eq!(m.best_dual_bound(), 0.6);
    assert_eq!(m.generation(), 0);
    assert_eq!(m.stability_center(), &[0.0]);
    assert_eq!(m.engine().column_bounds(1).unwrap(), (0.0, 2.0));
}

#[test]
fn test_old_cut_with_zero_multiplier_is_deleted() {
    let (m, step) = steep_and_rising_cuts();
    assert_eq!(step, StepKind::Serious);

    let cuts: Vec<_> = m.cuts().iter().collect();
    assert_eq!(cuts.len(), 2);
    // The slack steep cut goes, the binding rising cut stays.
    assert_eq!(cuts[0].1.status, CutStatus::Deleted);
    assert_eq!(cuts[1].1.status, CutStatus::Active);
    assert_eq!(m.cuts().num_active(), 1);
    assert_eq!(m.engine().num_rows(), 1);
    // λ = 1 is on the boundary and the step gained more than half.
    assert_eq!(m.radius(), 2.0);
}

#[test]
fn test_violated_deleted_cut_is_recruited() {
    let (mut m, _) = steep_and_rising_cuts();
    m.solve().unwrap();
    // Without the steep cut the master climbs to λ = 3.
    assert_close(m.multipliers()[0], 3.0, 1e-6);
    assert_close(m.primal_bound(), 4.0, 1e-6);

    // No new cut, so the violated steep cut comes back.
    let lambda = m.multipliers().to_vec();
    let step = m
        .update_problem(&lambda, &[cut_evaluation(1.0 + lambda[0], 2.0, 1.0)])
        .unwrap();
    assert_eq!(step, StepKind::Null);

    let cuts: Vec<_> = m.cuts().iter().collect();
    assert_eq!(cuts.len(), 2);
    assert_eq!(cuts[0].1.status, CutStatus::Active);
    assert_eq!(cuts[0].1.age, 0);
    assert_eq!(m.engine().num_rows(), 2);
}

#[test]
fn test_disabled_trust_region_keeps_radius() {
    let mut m = single_row_master(TrustRegionSettings::default().without_trust_region());
    assert!(m.radius().is_infinite());

    m.update_problem(&[0.0], &[evaluation(1.0, 0.8)]).unwrap();
    m.solve().unwrap();
    let lambda = m.multipliers().to_vec();
    let step = m.update_problem(&lambda, &[evaluation(-1.0, -1.0)]).unwrap();

    assert_eq!(step, StepKind::Null);
    assert!(m.radius().is_infinite());
    assert_eq!(m.generation(), 0);
    assert_eq!(m.engine().column_bounds(1).unwrap(), (0.0, f64::INFINITY));
}

#[test]
fn test_duplicate_cut_is_not_added() {
    let mut m = single_row_master(TrustRegionSettings::default());
    m.update_problem(&[0.0], &[evaluation(1.0, 0.8)]).unwrap();
    m.update_problem(&[0.0], &[evaluation(1.0, 0.8)]).unwrap();
    assert_eq!(m.cuts().len(), 1);
    assert_eq!(m.engine().num_rows(), 1);
}

#[test]
fn test_rejects_repeated_subproblem() {
    let mut m = toy_master(TrustRegionSettings::default());
    m.init().unwrap();
    let worker = LagrangianWorker::toy();
    let lambda = vec![0.0; 4];
    let e = worker.evaluate_one(0, &lambda);
    let err = m.update_problem(&lambda, &[e.clone(), e]).unwrap_err();
    assert!(matches!(
        err,
        DecompError::InvalidState {
            code: StateErrorCode::UnknownSubproblem,
            ..
        }
    ));
    assert_eq!(m.cuts().len(), 0);
}

#[test]
fn test_async_pending_then_applied() {
    let mut m = toy_master(TrustRegionSettings::default());
    m.init().unwrap();
    let worker = LagrangianWorker::toy();
    let mut coord = AsyncCoordinator::new();

    let d = coord.dispatch(&m);
    assert_eq!(d.subproblems, vec![0, 1]);
    assert_eq!(coord.num_pending(), 1);

    let first = worker.evaluate_one(1, &d.multipliers);
    assert_eq!(coord.complete(&mut m, d.key, first).unwrap(), AsyncOutcome::Pending);
    let second = worker.evaluate_one(0, &d.multipliers);
    assert_eq!(
        coord.complete(&mut m, d.key, second).unwrap(),
        AsyncOutcome::Applied(StepKind::Serious)
    );
    assert_eq!(coord.num_pending(), 0);
    assert_close(m.best_dual_bound(), 1.5, 1e-12);
    assert!(!m.solve_records().is_empty());
}

#[test]
fn test_async_stale_result_is_dropped() {
    let mut m = single_row_master(TrustRegionSettings::default());
    let mut coord = AsyncCoordinator::new();

    let d0 = coord.dispatch(&m);
    assert_eq!(
        coord.complete(&mut m, d0.key, evaluation(1.0, 0.8)).unwrap(),
        AsyncOutcome::Applied(StepKind::Serious)
    );
    assert_eq!(m.generation(), 0);

    let d1 = coord.dispatch(&m);
    let d2 = coord.dispatch(&m);
    // A clear improvement moves the stability center.
    assert_eq!(
        coord.complete(&mut m, d1.key, evaluation(0.95, 0.95)).unwrap(),
        AsyncOutcome::Applied(StepKind::Serious)
    );
    assert_eq!(m.generation(), 1);

    assert_eq!(
        coord.complete(&mut m, d2.key, evaluation(0.9, 0.9)).unwrap(),
        AsyncOutcome::Stale
    );
    assert_eq!(coord.num_pending(), 0);
    assert_eq!(m.best_dual_bound(), 0.95);
}

#[test]
fn test_async_unknown_key() {
    let mut m = single_row_master(TrustRegionSettings::default());
    let mut coord = AsyncCoordinator::new();
    let d = coord.dispatch(&m);
    assert!(coord.cancel(d.key));

    let err = coord.complete(&mut m, d.key, evaluation(1.0, 1.0)).unwrap_err();
    assert!(matches!(
        err,
        DecompError::InvalidState {
            code: StateErrorCode::UnknownSolutionKey,
            ..
        }
    ));
}
