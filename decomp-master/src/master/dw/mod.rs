//! Dantzig-Wolfe restricted master with two-phase column generation.
//!
//! The LP holds one convexity row per subproblem, the coupling rows of the
//! original problem and one row per tightened branching bound. Columns are
//! convex-combination weights of subproblem extreme points (and rays).
//!
//! `solve` runs the phase state machine:
//!
//! - with an empty pool, price an initial batch (every finite point enters),
//!   then run phase 1;
//! - otherwise resume in phase 2, falling back to phase 1 if the restricted
//!   master became infeasible;
//! - a phase-1 run that reaches zero infeasibility continues into phase 2.
//!
//! Every round re-solves the LP, prices subproblems against the row duals,
//! updates the Lagrangian bound and adds the columns that price out.

mod layout;
mod node;
mod phase;
mod pricing;

use std::time::Instant;

use decomp_core::{LpEngine, LpProblem, LpStatus, ObjSense};

use self::layout::{ColumnTable, LpColumn, RowLayout};
use self::pricing::{column_coefficients, lagrangian_bound, price_vector, prices_in};
use crate::error::{DecompError, DecompResult, StateErrorCode};
use crate::model::{IterationRecord, MasterStatus, MasterStructure, Phase};
use crate::pool::ColumnPool;
use crate::search::BranchingObject;
use crate::settings::DwSettings;
use crate::worker::{GeneratedColumn, SubproblemStatus, SubproblemWorker};

/// Recovered values within this distance of an integer count as integral.
const INTEGRALITY_TOL: f64 = 1e-6;

/// Dantzig-Wolfe restricted master.
pub struct DwMaster<W: SubproblemWorker> {
    structure: MasterStructure,
    settings: DwSettings,
    engine: Box<dyn LpEngine>,
    worker: W,

    pool: ColumnPool,
    table: ColumnTable,
    layout: RowLayout,
    phase: Phase,
    status: MasterStatus,
    initialized: bool,

    /// Node bounds on original columns.
    node_lower: Vec<f64>,
    node_upper: Vec<f64>,
    branching: Option<BranchingObject>,

    /// Row duals used for the next pricing round.
    duals: Vec<f64>,
    primal_obj: f64,
    dual_obj: f64,
    rel_gap: f64,
    primal_solution: Vec<f64>,

    best_dual: f64,
    best_dual_solution: Vec<f64>,
    best_primal: f64,
    best_primal_solution: Vec<f64>,

    num_generated: usize,
    sub_infeasible: bool,

    iteration: usize,
    start: Instant,
    history: Vec<IterationRecord>,
    dual_bound_history: Vec<f64>,
}

impl<W: SubproblemWorker> DwMaster<W> {
    /// Create a master over `structure`. Call [`init`](Self::init) before solving.
    pub fn new(
        structure: MasterStructure,
        engine: Box<dyn LpEngine>,
        worker: W,
        settings: DwSettings,
    ) -> DecompResult<Self> {
        structure.validate()?;
        if worker.num_subproblems() != structure.num_subproblems {
            return Err(DecompError::InvalidModel(format!(
                "worker has {} subproblems, structure expects {}",
                worker.num_subproblems(),
                structure.num_subproblems
            )));
        }
        let ncols = structure.num_cols();
        Ok(Self {
            node_lower: structure.col_lower.clone(),
            node_upper: structure.col_upper.clone(),
            layout: RowLayout::new(structure.num_subproblems, structure.num_rows()),
            structure,
            settings,
            engine,
            worker,
            pool: ColumnPool::new(),
            table: ColumnTable::default(),
            phase: Phase::Optimality,
            status: MasterStatus::NotSolved,
            initialized: false,
            branching: None,
            duals: Vec::new(),
            primal_obj: f64::INFINITY,
            dual_obj: f64::NEG_INFINITY,
            rel_gap: f64::INFINITY,
            primal_solution: vec![0.0; ncols],
            best_dual: f64::NEG_INFINITY,
            best_dual_solution: Vec::new(),
            best_primal: f64::INFINITY,
            best_primal_solution: Vec::new(),
            num_generated: 0,
            sub_infeasible: false,
            iteration: 0,
            start: Instant::now(),
            history: Vec::new(),
            dual_bound_history: Vec::new(),
        })
    }

    /// Load an LP holding only the convexity and coupling rows.
    pub fn init(&mut self) -> DecompResult<()> {
        let nconv = self.structure.num_subproblems;
        let mut row_lower = vec![1.0; nconv];
        let mut row_upper = vec![1.0; nconv];
        row_lower.extend_from_slice(&self.structure.row_lower);
        row_upper.extend_from_slice(&self.structure.row_upper);

        self.engine
            .load_problem(LpProblem::with_rows(row_lower, row_upper, ObjSense::Minimize))?;
        self.layout = RowLayout::new(nconv, self.structure.num_rows());
        self.table.clear();
        self.pool = ColumnPool::new();
        self.phase = Phase::Optimality;
        self.status = MasterStatus::NotSolved;
        self.node_lower = self.structure.col_lower.clone();
        self.node_upper = self.structure.col_upper.clone();
        self.branching = None;
        self.best_dual = f64::NEG_INFINITY;
        self.dual_bound_history.clear();
        self.initialized = true;

        log::debug!(
            "Restricted master has {} rows ({} convexity, {} coupling)",
            self.layout.num_rows(),
            nconv,
            self.layout.num_orig
        );
        Ok(())
    }

    /// Run column generation until convergence, infeasibility or a limit.
    pub fn solve(&mut self) -> DecompResult<MasterStatus> {
        if !self.initialized {
            self.init()?;
        }
        self.iteration = 0;
        self.start = Instant::now();
        self.history.clear();

        if self.pool.is_empty() {
            self.initial_columns()?;
            self.update_best_dual();
            if self.sub_infeasible {
                self.status = MasterStatus::PrimalInfeasible;
                return Ok(self.status);
            }
            self.solve_phase1()?;
        } else if self.phase == Phase::Optimality {
            self.solve_phase2()?;
            if self.status == MasterStatus::PrimalInfeasible {
                log::debug!("Restricted master infeasible; returning to phase 1");
                self.solve_phase1()?;
            }
        } else {
            self.solve_phase1()?;
        }

        if self.phase == Phase::Feasibility && self.status.is_feasible() {
            if self.primal_obj > self.settings.feas_tol {
                self.status = MasterStatus::PrimalInfeasible;
            } else {
                log::debug!("Phase 1 reached feasibility; switching to phase 2");
                self.solve_phase2()?;
            }
        }

        self.switch_to_phase2()?;
        self.update_best_primal();

        if self.settings.verbose {
            log::info!(
                "Column generation finished: status {:?}, primal {:e}, best dual {:e}, {} columns ({} active)",
                self.status,
                self.primal_obj,
                self.best_dual,
                self.pool.len(),
                self.pool.num_active()
            );
        }
        Ok(self.status)
    }

    /// Price the first batch: convexity duals at +∞, coupling duals at 0.
    fn initial_columns(&mut self) -> DecompResult<()> {
        self.phase = Phase::Optimality;
        self.duals = vec![f64::INFINITY; self.layout.num_conv];
        self.duals.resize(self.layout.num_rows(), 0.0);
        self.generate_columns()?;
        log::debug!(
            "Generated {} initial columns; initial dual bound {:e}",
            self.num_generated,
            self.dual_obj
        );
        Ok(())
    }

    /// Column-generation loop for the current phase.
    fn run_loop(&mut self) -> DecompResult<()> {
        self.dual_obj = f64::NEG_INFINITY;
        self.solve_master()?;
        self.record_iteration();

        while self.status.is_feasible() {
            self.reduce_columns()?;
            if !self.status.is_feasible() {
                break;
            }

            self.generate_columns()?;
            if self.sub_infeasible {
                self.status = MasterStatus::PrimalInfeasible;
                break;
            }

            self.update_best_dual();
            self.solve_master()?;
            self.record_iteration();

            if self.termination_test() {
                break;
            }
        }
        Ok(())
    }

    /// Re-solve the LP and refresh duals, objective and recovered solution.
    fn solve_master(&mut self) -> DecompResult<()> {
        if let Some(limit) = self.settings.time_limit {
            let remaining = (limit - self.start.elapsed().as_secs_f64()).max(0.0);
            self.engine.set_time_limit(Some(remaining));
        }
        let lp_status = self.engine.resolve()?;
        self.status = lp_status.into();
        match lp_status {
            LpStatus::Optimal | LpStatus::Feasible => {
                self.primal_obj = self.engine.objective_value();
                self.duals = self.engine.row_duals().to_vec();
                self.recover_primal()?;
            }
            LpStatus::Abort | LpStatus::IterOrTimeLimit => {
                log::warn!("Restricted master stopped with LP status {:?}", lp_status);
            }
            _ => {}
        }
        let abs_gap = (self.primal_obj - self.best_dual).abs();
        self.rel_gap = abs_gap / (1e-10 + self.primal_obj.abs());
        Ok(())
    }

    /// `x = Σ_k λ_k x^k` over loaded pool columns.
    fn recover_primal(&mut self) -> DecompResult<()> {
        self.table.check(self.engine.as_ref())?;
        let lambda = self.engine.column_solution();
        let mut x = vec![0.0; self.structure.num_cols()];
        for (pos, id) in self.table.generated() {
            let w = lambda[pos];
            if w == 0.0 {
                continue;
            }
            if let Some(col) = self.pool.get(id) {
                for (j, &v) in col.solution.iter() {
                    x[j] += w * v;
                }
            }
        }
        self.primal_solution = x;
        Ok(())
    }

    /// Phase 2 only: age columns and drop those fixed out by reduced cost,
    /// then re-solve.
    fn reduce_columns(&mut self) -> DecompResult<()> {
        if self.phase != Phase::Optimality {
            return Ok(());
        }
        self.table.check(self.engine.as_ref())?;

        let rc = self.engine.reduced_costs().to_vec();
        let lambda = self.engine.column_solution().to_vec();
        let mut removed = Vec::new();
        for (pos, id) in self.table.generated() {
            self.pool.update_age(id, rc[pos]);
            // Only columns at zero weight are fixed or retired.
            if lambda[pos].abs() > INTEGRALITY_TOL {
                continue;
            }
            if self
                .pool
                .mark_reduced_cost_fixed(id, self.best_dual, rc[pos], self.best_primal)
            {
                removed.push(pos);
                continue;
            }
            if let Some(limit) = self.settings.column_age_limit {
                if self.pool.get(id).map_or(false, |c| c.age >= limit) {
                    self.pool.deactivate(id);
                    removed.push(pos);
                }
            }
        }

        if !removed.is_empty() {
            self.engine.delete_columns(&removed)?;
            self.table.remove_positions(&removed);
            log::debug!("Reduced cost fixing removed {} columns", removed.len());
            self.solve_master()?;
        }
        Ok(())
    }

    /// Price all subproblems, update the Lagrangian bound and add the
    /// columns that price out.
    fn generate_columns(&mut self) -> DecompResult<()> {
        self.layout.check(self.engine.as_ref())?;
        if self.duals.len() != self.layout.num_rows() {
            return Err(DecompError::state(
                StateErrorCode::RowLayoutMismatch,
                format!(
                    "{} duals for {} master rows",
                    self.duals.len(),
                    self.layout.num_rows()
                ),
            ));
        }

        let price = price_vector(&self.structure, &self.layout, &self.duals);
        let generated = self.worker.generate_columns(self.phase, &price)?;
        self.validate_generated(&generated)?;

        self.sub_infeasible = generated
            .iter()
            .any(|g| g.status == SubproblemStatus::PrimalInfeasible);
        if self.sub_infeasible {
            self.num_generated = 0;
            return Ok(());
        }

        if self.phase == Phase::Optimality {
            if let Some(objs) = self.subproblem_objectives(&generated) {
                self.dual_obj = lagrangian_bound(&self.structure, &self.layout, &self.duals, &objs);
            }
        }

        self.add_columns(generated)
    }

    fn validate_generated(&self, generated: &[GeneratedColumn]) -> DecompResult<()> {
        let ncols = self.structure.num_cols();
        for g in generated {
            if g.subproblem >= self.layout.num_conv {
                return Err(DecompError::state(
                    StateErrorCode::UnknownSubproblem,
                    format!(
                        "worker returned subproblem {} of {}",
                        g.subproblem, self.layout.num_conv
                    ),
                ));
            }
            if g.solution.dim() != ncols {
                return Err(DecompError::Worker(format!(
                    "subproblem {} solution has dimension {}, expected {}",
                    g.subproblem,
                    g.solution.dim(),
                    ncols
                )));
            }
            if !g.native_cost.is_finite() {
                return Err(DecompError::Worker(format!(
                    "subproblem {} returned cost {}",
                    g.subproblem, g.native_cost
                )));
            }
        }
        Ok(())
    }

    /// Best pricing objective per subproblem, or `None` unless every
    /// subproblem was solved to proven optimality (the Lagrangian bound is
    /// otherwise invalid).
    fn subproblem_objectives(&self, generated: &[GeneratedColumn]) -> Option<Vec<f64>> {
        let mut objs = vec![f64::INFINITY; self.layout.num_conv];
        for g in generated {
            if g.status != SubproblemStatus::Optimal {
                log::debug!(
                    "Subproblem {} finished with status {:?}; skipping the Lagrangian bound",
                    g.subproblem,
                    g.status
                );
                return None;
            }
            objs[g.subproblem] = objs[g.subproblem].min(g.objective);
        }
        if objs.iter().any(|o| !o.is_finite()) {
            return None;
        }
        Some(objs)
    }

    fn add_columns(&mut self, generated: Vec<GeneratedColumn>) -> DecompResult<()> {
        self.table.check(self.engine.as_ref())?;
        self.num_generated = 0;

        for g in generated {
            let cutoff = self.duals[g.subproblem];
            if !prices_in(g.status, g.objective, cutoff, self.settings.pricing_tol) {
                continue;
            }
            let is_ray = g.status == SubproblemStatus::DualInfeasible;
            let coeffs = column_coefficients(&self.structure, &self.layout, g.subproblem, &g.solution, is_ray);
            let entries: Vec<(usize, f64)> = coeffs.iter().map(|(i, &v)| (i, v)).collect();
            let lp_obj = match self.phase {
                Phase::Feasibility => 0.0,
                Phase::Optimality => g.native_cost,
            };

            self.engine.add_column(&entries, 0.0, f64::INFINITY, lp_obj)?;
            let id = self
                .pool
                .add_column(g.subproblem, g.solution, coeffs, g.native_cost, is_ray);
            self.table.push(LpColumn::Generated(id));
            self.num_generated += 1;
        }
        log::debug!(
            "Added {} columns; pool has {} ({} active)",
            self.num_generated,
            self.pool.len(),
            self.pool.num_active()
        );
        Ok(())
    }

    fn update_best_dual(&mut self) {
        if self.dual_obj > self.best_dual {
            self.best_dual = self.dual_obj;
            self.best_dual_solution = self.duals.clone();
        }
        self.dual_bound_history.push(self.best_dual);
    }

    /// Adopt the restricted master solution as incumbent if it is integral.
    fn update_best_primal(&mut self) {
        if !self.status.is_feasible() || self.phase != Phase::Optimality {
            return;
        }
        let integral = self
            .structure
            .integer
            .iter()
            .zip(&self.primal_solution)
            .all(|(&int, &v)| !int || (v - v.round()).abs() <= INTEGRALITY_TOL);
        if integral && self.primal_obj < self.best_primal {
            self.best_primal = self.primal_obj;
            self.best_primal_solution = self.primal_solution.clone();
            log::debug!("New best primal bound {:e}", self.best_primal);
        }
    }

    fn termination_test(&mut self) -> bool {
        if self.num_generated == 0 || self.engine.pivot_count() == Some(0) {
            return true;
        }
        if let Some(limit) = self.settings.time_limit {
            if self.start.elapsed().as_secs_f64() >= limit {
                self.status = MasterStatus::IterOrTimeLimit;
                return true;
            }
        }
        match self.phase {
            Phase::Feasibility => {
                if self.status.is_feasible() && self.primal_obj < self.settings.feas_tol {
                    self.status = MasterStatus::Feasible;
                    return true;
                }
                if self.iteration >= self.settings.iteration_limit {
                    self.status = MasterStatus::IterOrTimeLimit;
                    return true;
                }
                false
            }
            Phase::Optimality => {
                if self.iteration >= self.settings.iteration_limit {
                    self.status = MasterStatus::IterOrTimeLimit;
                    true
                } else if self.best_dual >= self.best_primal {
                    self.status = MasterStatus::Feasible;
                    true
                } else if self.rel_gap < self.settings.gap_tol {
                    self.status = MasterStatus::Optimal;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn record_iteration(&mut self) {
        let record = IterationRecord {
            iteration: self.iteration,
            phase: self.phase,
            status: self.engine.status(),
            primal_bound: self.primal_obj,
            dual_bound: self.best_dual,
            num_rows: self.engine.num_rows(),
            num_cols: self.engine.num_cols(),
            wall_time: self.start.elapsed().as_secs_f64(),
        };
        if self.settings.verbose && self.iteration % self.settings.log_freq.max(1) == 0 {
            let phase = match self.phase {
                Phase::Feasibility => 1,
                Phase::Optimality => 2,
            };
            log::info!(
                "[Phase {}] Iteration {:3}: master {:e}, lb {:e} (gap {:.2}%), nrows {}, ncols {}, {:.2}s, {:?}",
                phase,
                record.iteration,
                record.primal_bound,
                record.dual_bound,
                self.rel_gap * 100.0,
                record.num_rows,
                record.num_cols,
                record.wall_time,
                record.status
            );
        }
        self.history.push(record);
        self.iteration += 1;
    }

    /// Status of the last `solve`.
    pub fn status(&self) -> MasterStatus {
        self.status
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Restricted master objective of the last LP solve.
    pub fn primal_bound(&self) -> f64 {
        self.primal_obj
    }

    /// Lagrangian bound of the last pricing round.
    pub fn dual_bound(&self) -> f64 {
        self.dual_obj
    }

    /// Best Lagrangian bound at this node.
    pub fn best_dual_bound(&self) -> f64 {
        self.best_dual
    }

    /// Row duals at which the best dual bound was found.
    pub fn best_dual_solution(&self) -> &[f64] {
        &self.best_dual_solution
    }

    /// Best known primal objective.
    pub fn best_primal_bound(&self) -> f64 {
        self.best_primal
    }

    /// Solution of the best primal bound (empty if it came from outside).
    pub fn best_primal_solution(&self) -> &[f64] {
        &self.best_primal_solution
    }

    /// Push an incumbent value found elsewhere.
    pub fn set_best_primal_bound(&mut self, bound: f64) {
        if bound < self.best_primal {
            self.best_primal = bound;
        }
    }

    /// Original-space solution recovered from the last LP solve.
    pub fn primal_solution(&self) -> &[f64] {
        &self.primal_solution
    }

    /// Monotone sequence of best dual bounds since the last reset.
    pub fn dual_bound_history(&self) -> &[f64] {
        &self.dual_bound_history
    }

    /// Iterations of the last `solve`.
    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    /// Columns accepted in the last pricing round.
    pub fn num_generated(&self) -> usize {
        self.num_generated
    }

    /// Node lower and upper bounds on original columns.
    pub fn node_bounds(&self) -> (&[f64], &[f64]) {
        (&self.node_lower, &self.node_upper)
    }

    /// Branching object applied at this node.
    pub fn branching_object(&self) -> Option<&BranchingObject> {
        self.branching.as_ref()
    }

    /// Original-problem structure.
    pub fn structure(&self) -> &MasterStructure {
        &self.structure
    }

    /// Column pool.
    pub fn pool(&self) -> &ColumnPool {
        &self.pool
    }

    /// LP engine.
    pub fn engine(&self) -> &dyn LpEngine {
        self.engine.as_ref()
    }

    /// Subproblem worker.
    pub fn worker(&self) -> &W {
        &self.worker
    }

    /// Mutable subproblem worker.
    pub fn worker_mut(&mut self) -> &mut W {
        &mut self.worker
    }

    /// Settings.
    pub fn settings(&self) -> &DwSettings {
        &self.settings
    }
}
