use std::time::Instant;

use decomp_core::sparse::{from_triplets, sparse_vec, DROP_TOL};
use decomp_core::{LpEngine, LpProblem, LpStatus, ObjSense};

use super::StepKind;
use crate::error::{DecompError, DecompResult, StateErrorCode};
use crate::model::{CouplingModel, IterationRecord, MasterStatus, Phase, SolveRecord};
use crate::pool::{CutId, CutPool, CutRows};
use crate::settings::TrustRegionSettings;
use crate::worker::{DualDecompWorker, SubproblemEvaluation};

/// Required fraction of the predicted increase for a serious step.
const SERIOUS_STEP_FRAC: f64 = 1e-4;

/// Fraction of the predicted increase that allows the radius to grow.
const GROWTH_STEP_FRAC: f64 = 0.5;

/// A gap above this negative slack still counts as closed.
const ABS_GAP_TOL: f64 = -1e-6;

/// Trust-region dual-decomposition master.
///
/// LP columns are `[θ_0 … θ_{S-1} | λ_0 … λ_{m-1}]`. Rows are the
/// optional normalization block followed by cuts.
pub struct TrustRegionMaster {
    model: CouplingModel,
    settings: TrustRegionSettings,
    engine: Box<dyn LpEngine>,

    cuts: CutPool,
    rows: CutRows,
    num_thetas: usize,
    num_lambdas: usize,
    initialized: bool,
    solved: bool,

    radius: f64,
    center: Vec<f64>,
    generation: u64,
    /// Consecutive null steps with a positive ratio.
    trcnt: usize,
    /// Cuts added since the last serious step.
    minor_cuts: usize,
    last_step: Option<StepKind>,

    primal_solution: Vec<f64>,
    primal_obj: f64,
    best_dual: f64,
    best_primal: f64,
    /// Row duals of the last solve and the cuts they belong to.
    cut_duals: Vec<(CutId, f64)>,

    status: MasterStatus,
    converged: bool,
    iteration: usize,
    start: Instant,
    history: Vec<IterationRecord>,
    solves: Vec<SolveRecord>,
}

impl TrustRegionMaster {
    /// Create a master. Call [`init`](Self::init) (or [`run`](Self::run))
    /// before updating it.
    pub fn new(
        model: CouplingModel,
        engine: Box<dyn LpEngine>,
        settings: TrustRegionSettings,
    ) -> DecompResult<Self> {
        model.validate()?;
        let num_thetas = model.num_subproblems;
        let num_lambdas = model.num_multipliers();
        let radius = if settings.enabled {
            settings.initial_radius
        } else {
            f64::INFINITY
        };
        let mut primal_solution = vec![f64::INFINITY; num_thetas];
        primal_solution.resize(num_thetas + num_lambdas, 0.0);
        Ok(Self {
            model,
            settings,
            engine,
            cuts: CutPool::new(),
            rows: CutRows::new(0),
            num_thetas,
            num_lambdas,
            initialized: false,
            solved: false,
            radius,
            center: vec![0.0; num_lambdas],
            generation: 0,
            trcnt: 0,
            minor_cuts: 0,
            last_step: None,
            primal_solution,
            primal_obj: f64::INFINITY,
            best_dual: f64::NEG_INFINITY,
            best_primal: f64::INFINITY,
            cut_duals: Vec::new(),
            status: MasterStatus::NotSolved,
            converged: false,
            iteration: 0,
            start: Instant::now(),
            history: Vec::new(),
            solves: Vec::new(),
        })
    }

    /// Load the initial LP: free surrogates with unit objective, multipliers
    /// boxed around a zero center and the normalization rows if any.
    pub fn init(&mut self) -> DecompResult<()> {
        let ncols = self.num_thetas + self.num_lambdas;
        let block = self.model.normalization_block.unwrap_or(0);
        let mut triplets = Vec::with_capacity(block * self.num_thetas);
        for i in 0..block {
            for s in 0..self.num_thetas {
                triplets.push((i, self.num_thetas + s * block + i, 1.0));
            }
        }

        let mut col_lower = vec![f64::NEG_INFINITY; self.num_thetas];
        let mut col_upper = vec![f64::INFINITY; self.num_thetas];
        for i in 0..self.num_lambdas {
            let (lo, hi) = self.model.multiplier_bounds(i, 0.0, self.radius);
            col_lower.push(lo);
            col_upper.push(hi);
        }
        let mut objective = vec![1.0; self.num_thetas];
        objective.resize(ncols, 0.0);

        self.engine.load_problem(LpProblem {
            matrix: from_triplets(block, ncols, triplets),
            col_lower,
            col_upper,
            objective,
            row_lower: vec![0.0; block],
            row_upper: vec![0.0; block],
            sense: ObjSense::Maximize,
        })?;

        self.cuts = CutPool::new();
        self.rows = CutRows::new(block);
        self.center = vec![0.0; self.num_lambdas];
        self.primal_solution = vec![f64::INFINITY; self.num_thetas];
        self.primal_solution.resize(ncols, 0.0);
        self.primal_obj = f64::INFINITY;
        self.best_dual = f64::NEG_INFINITY;
        self.solved = false;
        self.converged = false;
        self.initialized = true;
        self.start = Instant::now();
        log::debug!(
            "Trust-region master: {} surrogates, {} multipliers, {} normalization rows",
            self.num_thetas,
            self.num_lambdas,
            block
        );
        Ok(())
    }

    /// Solve the master LP and record the solution.
    pub fn solve(&mut self) -> DecompResult<MasterStatus> {
        let t = Instant::now();
        let lp_status = self.engine.resolve()?;
        self.solved = true;

        if lp_status.has_solution() || lp_status == LpStatus::IterOrTimeLimit {
            self.primal_solution = self.engine.column_solution().to_vec();
            self.primal_obj = self.engine.objective_value();
            let duals = self.engine.row_duals();
            let offset = self.rows.offset();
            self.cut_duals = self
                .rows
                .cuts()
                .iter()
                .enumerate()
                .map(|(k, &id)| (id, duals.get(offset + k).copied().unwrap_or(0.0)))
                .collect();
            self.solves.push(SolveRecord {
                status: lp_status,
                primal_bound: self.primal_obj,
                dual_bound: self.best_dual,
                solution: self.primal_solution.clone(),
                wall_time: t.elapsed().as_secs_f64(),
            });
        } else {
            log::warn!("Trust-region master LP stopped with status {:?}", lp_status);
        }
        self.status = lp_status.into();
        Ok(self.status)
    }

    /// Fold one round of subproblem evaluations, taken at `multipliers`,
    /// into the master: add cuts, then classify the step and adjust the
    /// trust region.
    pub fn update_problem(
        &mut self,
        multipliers: &[f64],
        evaluations: &[SubproblemEvaluation],
    ) -> DecompResult<StepKind> {
        if !self.initialized {
            self.init()?;
        }
        self.validate_evaluations(multipliers, evaluations)?;
        self.rows.check(self.engine.as_ref())?;

        let curprim = self.primal_obj;
        let newprimal: f64 = evaluations.iter().map(|e| e.primal_objective).sum();
        let newdual: f64 = evaluations.iter().map(|e| e.dual_objective).sum();

        self.cuts.age_cuts();
        let new_cuts = self.add_cuts(multipliers, evaluations, curprim)?;
        let n_added = new_cuts.len();

        let serious = !self.solved || improves(newdual, self.best_dual, curprim, SERIOUS_STEP_FRAC);
        let step = if serious { StepKind::Serious } else { StepKind::Null };

        if self.settings.enabled {
            if serious {
                self.minor_cuts = n_added;
                for &id in &new_cuts {
                    self.cuts.protect(id);
                }
                if self.solved {
                    self.center = multipliers.to_vec();
                    self.generation += 1;
                    self.possibly_delete_cuts(curprim, newprimal)?;
                    if self.is_solution_boundary()?
                        && improves(newdual, self.best_dual, curprim, GROWTH_STEP_FRAC)
                    {
                        self.radius = (2.0 * self.radius).min(self.settings.max_radius);
                        log::debug!("Increased trust-region radius to {:e}", self.radius);
                    }
                    self.set_trust_region()?;
                }
                self.best_dual = newdual;
                self.trcnt = 0;
            } else {
                self.minor_cuts += n_added;
                if curprim < self.best_dual {
                    self.radius = (2.0 * self.radius).min(self.settings.max_radius);
                    log::debug!("Increased trust-region radius to {:e}", self.radius);
                    self.set_trust_region()?;
                } else if self.settings.allow_decrease {
                    let rho = self.radius.min(1.0) * (self.best_dual - newdual)
                        / (curprim - self.best_dual);
                    if rho > 0.0 {
                        self.trcnt += 1;
                    }
                    if rho >= 3.0 || (self.trcnt >= 3 && (rho - 2.0).abs() < 1.0) {
                        self.radius /= rho.min(4.0);
                        self.trcnt = 0;
                        log::debug!("Decreased trust-region radius to {:e}", self.radius);
                        self.set_trust_region()?;
                    }
                }
            }
        } else if serious {
            self.best_dual = newdual;
        }

        self.last_step = Some(step);
        if self.settings.verbose {
            log::info!(
                "  -> {:?} step: dual objective {:e}; master has {} rows and {} cols after adding {} cuts",
                step,
                newdual,
                self.engine.num_rows(),
                self.engine.num_cols(),
                n_added
            );
        }
        Ok(step)
    }

    /// Record the iteration and decide whether the outer loop stops.
    pub fn termination_test(&mut self) -> bool {
        let absgap = self.primal_obj - self.best_dual;
        let relgap = absgap / (1e-10 + self.primal_obj.abs());
        self.converged = self.primal_obj.is_finite() && absgap > ABS_GAP_TOL && relgap < self.settings.stop_tol;

        let record = IterationRecord {
            iteration: self.iteration,
            phase: Phase::Optimality,
            status: self.engine.status(),
            primal_bound: self.primal_obj,
            dual_bound: self.best_dual,
            num_rows: self.engine.num_rows(),
            num_cols: self.engine.num_cols(),
            wall_time: self.start.elapsed().as_secs_f64(),
        };
        if self.settings.verbose && self.iteration % self.settings.log_freq.max(1) == 0 {
            log::info!(
                "Iteration {:3}: dual bound {:e}, time elapsed {:.2} sec",
                record.iteration,
                record.dual_bound,
                record.wall_time
            );
        }
        self.history.push(record);
        self.iteration += 1;
        self.converged
    }

    /// Synchronous outer loop: evaluate, update, test, re-solve.
    pub fn run<D: DualDecompWorker>(&mut self, worker: &mut D) -> DecompResult<MasterStatus> {
        if worker.num_subproblems() != self.num_thetas {
            return Err(DecompError::InvalidModel(format!(
                "worker has {} subproblems, master expects {}",
                worker.num_subproblems(),
                self.num_thetas
            )));
        }
        if !self.initialized {
            self.init()?;
        }
        self.iteration = 0;
        self.start = Instant::now();

        loop {
            let lambda = self.multipliers().to_vec();
            let evaluations = worker.evaluate(&lambda)?;
            self.update_problem(&lambda, &evaluations)?;

            if self.termination_test() {
                self.status = MasterStatus::Optimal;
                break;
            }
            if self.iteration >= self.settings.iteration_limit {
                self.status = MasterStatus::IterOrTimeLimit;
                break;
            }
            if !self.solve()?.is_feasible() {
                break;
            }
        }

        log::info!(
            "Dual decomposition finished: status {:?}, best dual bound {:e}, {} iterations",
            self.status,
            self.best_dual,
            self.iteration
        );
        Ok(self.status)
    }

    fn validate_evaluations(
        &self,
        multipliers: &[f64],
        evaluations: &[SubproblemEvaluation],
    ) -> DecompResult<()> {
        if multipliers.len() != self.num_lambdas {
            return Err(DecompError::Worker(format!(
                "{} multipliers, master has {}",
                multipliers.len(),
                self.num_lambdas
            )));
        }
        let mut seen = vec![false; self.num_thetas];
        for e in evaluations {
            match seen.get_mut(e.subproblem) {
                Some(flag) if !*flag => *flag = true,
                _ => {
                    return Err(DecompError::state(
                        StateErrorCode::UnknownSubproblem,
                        format!("unexpected or repeated subproblem {}", e.subproblem),
                    ))
                }
            }
            if e.coupling_residual.len() != self.num_lambdas {
                return Err(DecompError::Worker(format!(
                    "subproblem {} reported {} coupling residuals, expected {}",
                    e.subproblem,
                    e.coupling_residual.len(),
                    self.num_lambdas
                )));
            }
            if !e.primal_objective.is_finite() {
                return Err(DecompError::Worker(format!(
                    "subproblem {} returned objective {}",
                    e.subproblem, e.primal_objective
                )));
            }
        }
        if seen.iter().any(|&f| !f) {
            return Err(DecompError::Worker(format!(
                "{} of {} subproblems evaluated",
                evaluations.len(),
                self.num_thetas
            )));
        }
        Ok(())
    }

    /// Aggregate one cut per surrogate and load the violated, new ones.
    /// Recruits deleted cuts when nothing new is added.
    fn add_cuts(
        &mut self,
        multipliers: &[f64],
        evaluations: &[SubproblemEvaluation],
        curprim: f64,
    ) -> DecompResult<Vec<CutId>> {
        let ncols = self.num_thetas + self.num_lambdas;
        let mut coeffs = vec![vec![0.0; self.num_lambdas]; self.num_thetas];
        let mut rhs = vec![0.0; self.num_thetas];
        for e in evaluations {
            let k = e.subproblem % self.num_thetas;
            rhs[k] += e.primal_objective;
            for (i, &hx_d) in e.coupling_residual.iter().enumerate() {
                coeffs[k][i] -= hx_d;
                rhs[k] -= hx_d * multipliers[i];
            }
        }

        let mut added = Vec::new();
        for (k, (lambda_row, mut b)) in coeffs.into_iter().zip(rhs).enumerate() {
            let entries = std::iter::once((k, 1.0)).chain(
                lambda_row
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (self.num_thetas + i, v)),
            );
            let row = sparse_vec(ncols, entries, DROP_TOL);
            if b.abs() < DROP_TOL {
                b = 0.0;
            }
            let violation = decomp_core::sparse::dot_dense(&row, &self.primal_solution) - b;
            if violation <= self.settings.cut_violation_tol {
                continue;
            }
            if let Some(id) = self.cuts.add_cut(row, b, curprim, true) {
                added.push(id);
            }
        }

        if added.is_empty() {
            let violated = self
                .cuts
                .violated_deleted(&self.primal_solution, self.settings.cut_violation_tol);
            let n = self
                .cuts
                .recruit_all(self.engine.as_mut(), &mut self.rows, &violated)?;
            if n > 0 {
                log::debug!("Recruited {} deleted cuts", n);
            }
        } else {
            self.cuts
                .load_rows(self.engine.as_mut(), &mut self.rows, &added)?;
        }
        Ok(added)
    }

    /// Flag old cuts with a zero multiplier, or minor cuts that have seen
    /// enough primal progress, and purge them.
    fn possibly_delete_cuts(&mut self, curprim: f64, subobj: f64) -> DecompResult<()> {
        let loaded = self.rows.cuts().to_vec();
        if loaded.is_empty() {
            return Ok(());
        }
        let minor_start = self.cuts.len().saturating_sub(self.minor_cuts);
        for id in loaded {
            let Some(cut) = self.cuts.get(id) else {
                continue;
            };
            let pi = self
                .cut_duals
                .iter()
                .find(|(c, _)| *c == id)
                .map_or(f64::INFINITY, |&(_, v)| v);
            let delete = cut.age >= self.settings.cut_age_limit
                && (pi.abs() < self.settings.cut_dual_tol
                    || (id.index() >= minor_start
                        && (curprim - subobj)
                            > self.settings.cut_del_param * (cut.master_obj_at_add - subobj)));
            if delete {
                self.cuts.mark_deletable(id);
            } else {
                self.cuts.protect(id);
            }
        }
        self.cuts.purge(self.engine.as_mut(), &mut self.rows)?;
        Ok(())
    }

    /// True if every multiplier sits within epsilon of one of its bounds.
    fn is_solution_boundary(&self) -> DecompResult<bool> {
        let mut maxdiff: f64 = 0.0;
        for j in self.num_thetas..self.num_thetas + self.num_lambdas {
            let (lo, hi) = self.engine.column_bounds(j)?;
            let x = self.primal_solution[j];
            maxdiff = maxdiff.max((hi - x).min(x - lo));
        }
        Ok(maxdiff.abs() < self.settings.boundary_eps)
    }

    fn set_trust_region(&mut self) -> DecompResult<()> {
        for i in 0..self.num_lambdas {
            let (lo, hi) = self.model.multiplier_bounds(i, self.center[i], self.radius);
            self.engine
                .set_column_bounds(self.num_thetas + i, lo, hi)?;
        }
        Ok(())
    }

    /// Multipliers of the last master solution.
    pub fn multipliers(&self) -> &[f64] {
        &self.primal_solution[self.num_thetas..]
    }

    /// Full master solution, surrogates first.
    pub fn primal_solution(&self) -> &[f64] {
        &self.primal_solution
    }

    /// Master objective of the last solve.
    pub fn primal_bound(&self) -> f64 {
        self.primal_obj
    }

    /// Best Lagrangian bound.
    pub fn best_dual_bound(&self) -> f64 {
        self.best_dual
    }

    /// Best known primal objective of the original problem.
    pub fn best_primal_bound(&self) -> f64 {
        self.best_primal
    }

    /// Push an incumbent value found elsewhere.
    pub fn set_best_primal_bound(&mut self, bound: f64) {
        if bound < self.best_primal {
            self.best_primal = bound;
        }
    }

    /// Trust-region radius; infinite when the trust region is disabled.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Stability center.
    pub fn stability_center(&self) -> &[f64] {
        &self.center
    }

    /// Counter bumped whenever the stability center moves.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Kind of the last step.
    pub fn last_step(&self) -> Option<StepKind> {
        self.last_step
    }

    /// True once the termination test has passed.
    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// Status of the last solve or run.
    pub fn status(&self) -> MasterStatus {
        self.status
    }

    pub(super) fn set_status(&mut self, status: MasterStatus) {
        self.status = status;
    }

    /// Cut pool.
    pub fn cuts(&self) -> &CutPool {
        &self.cuts
    }

    /// LP engine.
    pub fn engine(&self) -> &dyn LpEngine {
        self.engine.as_ref()
    }

    /// Outer-iteration records.
    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    /// Per-solve records.
    pub fn solve_records(&self) -> &[SolveRecord] {
        &self.solves
    }

    /// Number of subproblems.
    pub fn num_subproblems(&self) -> usize {
        self.num_thetas
    }

    /// Settings.
    pub fn settings(&self) -> &TrustRegionSettings {
        &self.settings
    }
}

/// `new ≥ best + frac·(predicted − best)`, with an unset best always beaten.
fn improves(new: f64, best: f64, predicted: f64, frac: f64) -> bool {
    if !best.is_finite() {
        return new > best;
    }
    if !predicted.is_finite() {
        return new >= best;
    }
    new >= best + frac * (predicted - best)
}
