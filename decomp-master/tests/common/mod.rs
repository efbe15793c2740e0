//! Shared fixtures: a two-scenario toy problem and vertex-enumeration
//! workers for both masters.
//!
//! Scenario feasible sets are finite point lists over
//! `(x1, x2, y)`, so every subproblem is solved exactly by enumeration:
//!
//! - scenario 0: `(1,0,0)`, `(0,1,0)`, `(0,0,1)`, second-stage cost 3
//! - scenario 1: `(1,0,1)`, `(0,1,0)`, `(0,0,2)`, second-stage cost 1
//!
//! First-stage cost is `(1, 2)` and both scenarios have probability 0.5.
//! The convexified optimum is 1.5 at `x = (1, 0)`; with `x1` fixed to 0
//! it rises to 2.0 at `x = (0, 1)`.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use decomp_core::sparse::{sparse_vec, DROP_TOL};
use decomp_core::{
    Basis, ClarabelEngine, EngineResult, EngineSettings, LpEngine, LpProblem, LpStatus,
};
use decomp_master::{
    DecompResult, DualDecompWorker, GeneratedColumn, MasterStructure, Phase, StageColumns,
    SubproblemEvaluation, SubproblemStatus, SubproblemWorker, TwoStageModel,
};

pub const NUM_FIRST_STAGE: usize = 2;

pub fn assert_close(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "{} != {} (tol {})", a, b, tol);
}

pub fn engine() -> Box<dyn LpEngine> {
    Box::new(ClarabelEngine::new(EngineSettings::default()))
}

/// Time limits pushed to the engine, in call order.
pub type TimeLimitLog = Rc<RefCell<Vec<Option<f64>>>>;

/// Clarabel engine that records every `set_time_limit` call.
pub struct RecordingEngine {
    inner: ClarabelEngine,
    time_limits: TimeLimitLog,
}

impl RecordingEngine {
    pub fn boxed() -> (Box<dyn LpEngine>, TimeLimitLog) {
        let log = TimeLimitLog::default();
        let engine = Self {
            inner: ClarabelEngine::new(EngineSettings::default()),
            time_limits: Rc::clone(&log),
        };
        (Box::new(engine), log)
    }
}

impl LpEngine for RecordingEngine {
    fn load_problem(&mut self, problem: LpProblem) -> EngineResult<()> {
        self.inner.load_problem(problem)
    }
    fn resolve(&mut self) -> EngineResult<LpStatus> {
        self.inner.resolve()
    }
    fn status(&self) -> LpStatus {
        self.inner.status()
    }
    fn pivot_count(&self) -> Option<usize> {
        self.inner.pivot_count()
    }
    fn add_column(&mut self, coeffs: &[(usize, f64)], lb: f64, ub: f64, obj: f64) -> EngineResult<usize> {
        self.inner.add_column(coeffs, lb, ub, obj)
    }
    fn add_row(&mut self, coeffs: &[(usize, f64)], lb: f64, ub: f64) -> EngineResult<usize> {
        self.inner.add_row(coeffs, lb, ub)
    }
    fn delete_columns(&mut self, indices: &[usize]) -> EngineResult<()> {
        self.inner.delete_columns(indices)
    }
    fn delete_rows(&mut self, indices: &[usize]) -> EngineResult<()> {
        self.inner.delete_rows(indices)
    }
    fn num_rows(&self) -> usize {
        self.inner.num_rows()
    }
    fn num_cols(&self) -> usize {
        self.inner.num_cols()
    }
    fn row_duals(&self) -> &[f64] {
        self.inner.row_duals()
    }
    fn reduced_costs(&self) -> &[f64] {
        self.inner.reduced_costs()
    }
    fn column_solution(&self) -> &[f64] {
        self.inner.column_solution()
    }
    fn row_activity(&self) -> &[f64] {
        self.inner.row_activity()
    }
    fn objective_value(&self) -> f64 {
        self.inner.objective_value()
    }
    fn warm_start(&self) -> Option<Basis> {
        self.inner.warm_start()
    }
    fn set_warm_start(&mut self, basis: Basis) -> EngineResult<()> {
        self.inner.set_warm_start(basis)
    }
    fn set_column_bounds(&mut self, index: usize, lb: f64, ub: f64) -> EngineResult<()> {
        self.inner.set_column_bounds(index, lb, ub)
    }
    fn set_objective_coefficient(&mut self, index: usize, value: f64) -> EngineResult<()> {
        self.inner.set_objective_coefficient(index, value)
    }
    fn column_bounds(&self, index: usize) -> EngineResult<(f64, f64)> {
        self.inner.column_bounds(index)
    }
    fn row_bounds(&self, index: usize) -> EngineResult<(f64, f64)> {
        self.inner.row_bounds(index)
    }
    fn objective_coefficient(&self, index: usize) -> EngineResult<f64> {
        self.inner.objective_coefficient(index)
    }
    fn set_time_limit(&mut self, seconds: Option<f64>) {
        self.time_limits.borrow_mut().push(seconds);
        self.inner.set_time_limit(seconds);
    }
}

pub fn toy_model() -> TwoStageModel {
    TwoStageModel {
        first_stage: StageColumns::continuous(vec![0.0; 2], vec![1.0; 2], vec![1.0, 2.0]),
        second_stage: vec![
            StageColumns::continuous(vec![0.0], vec![2.0], vec![3.0]),
            StageColumns::continuous(vec![0.0], vec![2.0], vec![1.0]),
        ],
        probabilities: vec![0.5, 0.5],
    }
}

/// Feasible `(x1, x2, y)` points per scenario.
pub fn toy_points() -> Vec<Vec<[f64; 3]>> {
    vec![
        vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        vec![[1.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0, 2.0]],
    ]
}

pub fn toy_structure() -> MasterStructure {
    MasterStructure::from_two_stage(&toy_model()).unwrap()
}

/// One scenario: its points mapped onto master columns.
#[derive(Debug, Clone)]
struct Scenario {
    columns: Vec<usize>,
    points: Vec<Vec<f64>>,
}

/// Dantzig-Wolfe worker that prices by enumerating scenario points.
#[derive(Debug, Clone)]
pub struct VertexWorker {
    scenarios: Vec<Scenario>,
    cost: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    pub calls: usize,
    pub gap_tolerance: Option<f64>,
    pub bound_updates: usize,
}

impl VertexWorker {
    pub fn new(structure: &MasterStructure, points: Vec<Vec<[f64; 3]>>) -> Self {
        let nscen = points.len();
        let scenarios = points
            .into_iter()
            .enumerate()
            .map(|(s, pts)| Scenario {
                columns: vec![
                    s * NUM_FIRST_STAGE,
                    s * NUM_FIRST_STAGE + 1,
                    nscen * NUM_FIRST_STAGE + s,
                ],
                points: pts.iter().map(|p| p.to_vec()).collect(),
            })
            .collect();
        Self {
            scenarios,
            cost: structure.objective.clone(),
            lower: structure.col_lower.clone(),
            upper: structure.col_upper.clone(),
            calls: 0,
            gap_tolerance: None,
            bound_updates: 0,
        }
    }

    pub fn toy() -> Self {
        Self::new(&toy_structure(), toy_points())
    }

    fn admissible(&self, sc: &Scenario, point: &[f64]) -> bool {
        sc.columns
            .iter()
            .zip(point)
            .all(|(&j, &v)| v >= self.lower[j] - 1e-9 && v <= self.upper[j] + 1e-9)
    }
}

impl SubproblemWorker for VertexWorker {
    fn num_subproblems(&self) -> usize {
        self.scenarios.len()
    }

    fn generate_columns(&mut self, phase: Phase, price: &[f64]) -> DecompResult<Vec<GeneratedColumn>> {
        self.calls += 1;
        let ncols = self.cost.len();
        let mut out = Vec::with_capacity(self.scenarios.len());
        for (s, sc) in self.scenarios.iter().enumerate() {
            let mut best: Option<(f64, f64, &Vec<f64>)> = None;
            for p in sc.points.iter().filter(|p| self.admissible(sc, p)) {
                let native: f64 = sc.columns.iter().zip(p).map(|(&j, &v)| self.cost[j] * v).sum();
                let priced: f64 = sc.columns.iter().zip(p).map(|(&j, &v)| price[j] * v).sum();
                let obj = match phase {
                    Phase::Feasibility => -priced,
                    Phase::Optimality => native - priced,
                };
                if best.map_or(true, |(b, _, _)| obj < b) {
                    best = Some((obj, native, p));
                }
            }
            let col = match best {
                Some((objective, native_cost, p)) => GeneratedColumn {
                    subproblem: s,
                    status: SubproblemStatus::Optimal,
                    objective,
                    native_cost,
                    solution: sparse_vec(
                        ncols,
                        sc.columns.iter().copied().zip(p.iter().copied()),
                        DROP_TOL,
                    ),
                },
                None => GeneratedColumn {
                    subproblem: s,
                    status: SubproblemStatus::PrimalInfeasible,
                    objective: f64::INFINITY,
                    native_cost: 0.0,
                    solution: sparse_vec(ncols, std::iter::empty(), DROP_TOL),
                },
            };
            out.push(col);
        }
        Ok(out)
    }

    fn set_column_bounds(&mut self, indices: &[usize], lower: &[f64], upper: &[f64]) -> DecompResult<()> {
        for (k, &j) in indices.iter().enumerate() {
            self.lower[j] = lower[k];
            self.upper[j] = upper[k];
        }
        self.bound_updates += 1;
        Ok(())
    }

    fn set_gap_tolerance(&mut self, tol: f64) {
        self.gap_tolerance = Some(tol);
    }

    fn set_time_limit(&mut self, _seconds: Option<f64>) {}
}

/// Dual-decomposition worker: scenario `s` minimizes
/// `p_s (c x + q_s y) + λ_sᵀ x` over its points, where `λ_s` is the
/// scenario's block of non-anticipativity multipliers.
#[derive(Debug, Clone)]
pub struct LagrangianWorker {
    points: Vec<Vec<[f64; 3]>>,
    first_stage_cost: [f64; 2],
    second_stage_cost: Vec<f64>,
    probabilities: Vec<f64>,
    pub evaluations: usize,
}

impl LagrangianWorker {
    pub fn toy() -> Self {
        Self {
            points: toy_points(),
            first_stage_cost: [1.0, 2.0],
            second_stage_cost: vec![3.0, 1.0],
            probabilities: vec![0.5, 0.5],
            evaluations: 0,
        }
    }

    /// Evaluate one scenario at the full multiplier vector.
    pub fn evaluate_one(&self, s: usize, multipliers: &[f64]) -> SubproblemEvaluation {
        let nscen = self.points.len();
        let lambda = &multipliers[s * NUM_FIRST_STAGE..(s + 1) * NUM_FIRST_STAGE];
        let p = self.probabilities[s];
        let mut best = (f64::INFINITY, [0.0; 3]);
        for pt in &self.points[s] {
            let value = p * (self.first_stage_cost[0] * pt[0]
                + self.first_stage_cost[1] * pt[1]
                + self.second_stage_cost[s] * pt[2])
                + lambda[0] * pt[0]
                + lambda[1] * pt[1];
            if value < best.0 {
                best = (value, *pt);
            }
        }
        let mut residual = vec![0.0; nscen * NUM_FIRST_STAGE];
        residual[s * NUM_FIRST_STAGE] = best.1[0];
        residual[s * NUM_FIRST_STAGE + 1] = best.1[1];
        SubproblemEvaluation {
            subproblem: s,
            primal_objective: best.0,
            dual_objective: best.0,
            coupling_residual: residual,
        }
    }
}

impl DualDecompWorker for LagrangianWorker {
    fn num_subproblems(&self) -> usize {
        self.points.len()
    }

    fn evaluate(&mut self, multipliers: &[f64]) -> DecompResult<Vec<SubproblemEvaluation>> {
        self.evaluations += 1;
        Ok((0..self.points.len())
            .map(|s| self.evaluate_one(s, multipliers))
            .collect())
    }
}
