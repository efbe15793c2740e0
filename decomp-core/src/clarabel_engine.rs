//! LP engine backed by the Clarabel interior-point solver.
//!
//! The stored LP is converted at every resolve into Clarabel's conic form
//! `min qᵀx  s.t.  A x + s = b,  s ∈ K`:
//!
//! - equality rows and fixed columns go to the zero cone,
//! - every finite non-equality row or column bound becomes one row of the
//!   nonnegative orthant (`a x + s = u` for upper, `-a x + s = -l` for lower).
//!
//! Row duals and reduced costs are recovered from the conic multipliers.
//! An interior-point method does not pivot, so [`LpEngine::pivot_count`]
//! returns `None`. The basis reported by [`LpEngine::warm_start`] is a
//! snapshot of which bounds are active at the returned point.

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use std::time::Instant;

use crate::basis::{Basis, BasisStatus};
use crate::engine::LpEngine;
use crate::error::{EngineError, EngineResult};
use crate::problem::{EngineSettings, LpProblem, LpStatus, ObjSense, RowSense};

/// Activity within this (scaled) distance of a bound counts as at the bound.
const ACTIVE_TOL: f64 = 1e-7;

/// Conic rows generated for one LP row or column bound pair.
#[derive(Debug, Clone, Copy, Default)]
struct ConeSlots {
    /// Row of `a x + s = u` (zero cone for equalities).
    upper: Option<usize>,
    /// Row of `-a x + s = -l`.
    lower: Option<usize>,
}

/// Clarabel-backed [`LpEngine`].
pub struct ClarabelEngine {
    settings: EngineSettings,
    time_limit: Option<f64>,

    sense: ObjSense,
    columns: Vec<Vec<(usize, f64)>>,
    col_lower: Vec<f64>,
    col_upper: Vec<f64>,
    objective: Vec<f64>,
    row_lower: Vec<f64>,
    row_upper: Vec<f64>,

    status: LpStatus,
    x: Vec<f64>,
    activity: Vec<f64>,
    duals: Vec<f64>,
    reduced: Vec<f64>,
    obj_val: f64,
    iterations: u32,
    solve_time: f64,
    basis: Option<Basis>,
}

impl ClarabelEngine {
    /// Create an engine with no rows or columns.
    pub fn new(settings: EngineSettings) -> Self {
        let time_limit = match settings.time_limit_ms {
            0 => None,
            ms => Some(ms as f64 / 1000.0),
        };
        Self {
            settings,
            time_limit,
            sense: ObjSense::Minimize,
            columns: Vec::new(),
            col_lower: Vec::new(),
            col_upper: Vec::new(),
            objective: Vec::new(),
            row_lower: Vec::new(),
            row_upper: Vec::new(),
            status: LpStatus::NotSolved,
            x: Vec::new(),
            activity: Vec::new(),
            duals: Vec::new(),
            reduced: Vec::new(),
            obj_val: 0.0,
            iterations: 0,
            solve_time: 0.0,
            basis: None,
        }
    }

    /// Interior-point iterations used by the last resolve.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Wall time of the last resolve in seconds.
    pub fn solve_time(&self) -> f64 {
        self.solve_time
    }

    fn check_row(&self, index: usize) -> EngineResult<()> {
        if index >= self.row_lower.len() {
            return Err(EngineError::IndexOutOfRange {
                kind: "row",
                index,
                size: self.row_lower.len(),
            });
        }
        Ok(())
    }

    fn check_col(&self, index: usize) -> EngineResult<()> {
        if index >= self.columns.len() {
            return Err(EngineError::IndexOutOfRange {
                kind: "column",
                index,
                size: self.columns.len(),
            });
        }
        Ok(())
    }

    fn check_bounds(kind: &str, index: usize, lb: f64, ub: f64) -> EngineResult<()> {
        if lb.is_nan() || ub.is_nan() || lb > ub {
            return Err(EngineError::InvalidProblem(format!(
                "{} {} has bounds [{}, {}]",
                kind, index, lb, ub
            )));
        }
        Ok(())
    }

    fn reset_solution(&mut self) {
        let (m, n) = (self.row_lower.len(), self.columns.len());
        self.x = vec![0.0; n];
        self.reduced = vec![0.0; n];
        self.activity = vec![0.0; m];
        self.duals = vec![0.0; m];
        self.obj_val = 0.0;
    }

    fn compute_activity(&mut self) {
        let mut act = vec![0.0; self.row_lower.len()];
        for (col, &xj) in self.columns.iter().zip(&self.x) {
            for &(i, v) in col {
                act[i] += v * xj;
            }
        }
        self.activity = act;
    }

    /// d = c − Aᵀπ from the stored columns.
    fn compute_reduced_costs(&mut self) {
        self.reduced = self
            .columns
            .iter()
            .zip(&self.objective)
            .map(|(col, &c)| c - col.iter().map(|&(i, v)| v * self.duals[i]).sum::<f64>())
            .collect();
    }

    fn snapshot_basis(&self) -> Basis {
        let at = |v: f64, b: f64| b.is_finite() && (v - b).abs() <= ACTIVE_TOL * (1.0 + b.abs());

        let structural = self
            .x
            .iter()
            .enumerate()
            .map(|(j, &v)| {
                if at(v, self.col_lower[j]) {
                    BasisStatus::AtLower
                } else if at(v, self.col_upper[j]) {
                    BasisStatus::AtUpper
                } else {
                    BasisStatus::Basic
                }
            })
            .collect();
        let artificial = self
            .activity
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                if at(v, self.row_lower[i]) {
                    BasisStatus::AtLower
                } else if at(v, self.row_upper[i]) {
                    BasisStatus::AtUpper
                } else {
                    BasisStatus::Basic
                }
            })
            .collect();
        Basis {
            structural,
            artificial,
        }
    }

    /// Solve a problem with no columns: feasible iff every row admits 0.
    fn solve_empty(&mut self) -> LpStatus {
        let tol = self.settings.tol_feas;
        let feasible = self
            .row_lower
            .iter()
            .zip(&self.row_upper)
            .all(|(&l, &u)| l <= tol && u >= -tol);
        if feasible {
            LpStatus::Optimal
        } else {
            LpStatus::PrimalInfeasible
        }
    }

    fn build_settings(&self) -> EngineResult<clarabel::solver::DefaultSettings<f64>> {
        DefaultSettingsBuilder::default()
            .verbose(self.settings.verbose)
            .max_iter(self.settings.max_iter)
            .time_limit(self.time_limit.unwrap_or(f64::INFINITY))
            .tol_feas(self.settings.tol_feas)
            .tol_gap_abs(self.settings.tol_gap)
            .tol_gap_rel(self.settings.tol_gap)
            .build()
            .map_err(|e| EngineError::Backend(format!("Clarabel settings error: {:?}", e)))
    }

    fn solve_conic(&mut self) -> EngineResult<LpStatus> {
        let m = self.row_lower.len();
        let n = self.columns.len();

        // Assign conic rows: zero cone first, then the nonnegative block.
        let mut row_slots = vec![ConeSlots::default(); m];
        let mut col_slots = vec![ConeSlots::default(); n];
        let mut rhs: Vec<f64> = Vec::new();

        for i in 0..m {
            if RowSense::from_bounds(self.row_lower[i], self.row_upper[i]) == RowSense::Equal {
                row_slots[i].upper = Some(rhs.len());
                rhs.push(self.row_upper[i]);
            }
        }
        for j in 0..n {
            if RowSense::from_bounds(self.col_lower[j], self.col_upper[j]) == RowSense::Equal {
                col_slots[j].upper = Some(rhs.len());
                rhs.push(self.col_upper[j]);
            }
        }
        let n_zero = rhs.len();

        for i in 0..m {
            let sense = RowSense::from_bounds(self.row_lower[i], self.row_upper[i]);
            if sense == RowSense::Equal {
                continue;
            }
            if sense.has_upper() {
                row_slots[i].upper = Some(rhs.len());
                rhs.push(self.row_upper[i]);
            }
            if sense.has_lower() {
                row_slots[i].lower = Some(rhs.len());
                rhs.push(-self.row_lower[i]);
            }
        }
        for j in 0..n {
            let sense = RowSense::from_bounds(self.col_lower[j], self.col_upper[j]);
            if sense == RowSense::Equal {
                continue;
            }
            if sense.has_upper() {
                col_slots[j].upper = Some(rhs.len());
                rhs.push(self.col_upper[j]);
            }
            if sense.has_lower() {
                col_slots[j].lower = Some(rhs.len());
                rhs.push(-self.col_lower[j]);
            }
        }
        let n_cone = rhs.len();
        let n_nonneg = n_cone - n_zero;

        let sign = match self.sense {
            ObjSense::Minimize => 1.0,
            ObjSense::Maximize => -1.0,
        };
        let q: Vec<f64> = self.objective.iter().map(|&c| sign * c).collect();

        if n_cone == 0 {
            // Nothing restricts x: bounded only if the objective vanishes.
            return Ok(if q.iter().all(|&c| c == 0.0) {
                LpStatus::Optimal
            } else {
                LpStatus::DualInfeasible
            });
        }

        let mut colptr = Vec::with_capacity(n + 1);
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();
        colptr.push(0);
        for (j, col) in self.columns.iter().enumerate() {
            let mut entries: Vec<(usize, f64)> = Vec::with_capacity(2 * col.len() + 2);
            for &(i, v) in col {
                if let Some(r) = row_slots[i].upper {
                    entries.push((r, v));
                }
                if let Some(r) = row_slots[i].lower {
                    entries.push((r, -v));
                }
            }
            if let Some(r) = col_slots[j].upper {
                entries.push((r, 1.0));
            }
            if let Some(r) = col_slots[j].lower {
                entries.push((r, -1.0));
            }
            entries.sort_by_key(|&(r, _)| r);
            for (r, v) in entries {
                rowval.push(r);
                nzval.push(v);
            }
            colptr.push(rowval.len());
        }

        let a = CscMatrix::new(n_cone, n, colptr, rowval, nzval);
        let p = CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());

        let mut cones: Vec<SupportedConeT<f64>> = Vec::new();
        if n_zero > 0 {
            cones.push(SupportedConeT::ZeroConeT(n_zero));
        }
        if n_nonneg > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(n_nonneg));
        }

        let settings = self.build_settings()?;
        let mut solver = DefaultSolver::new(&p, &q, &a, &rhs, &cones, settings)
            .map_err(|e| EngineError::Backend(format!("Clarabel initialization failed: {:?}", e)))?;
        solver.solve();

        let sol = solver.solution;
        self.iterations = sol.iterations;
        let status = match sol.status {
            SolverStatus::Solved => LpStatus::Optimal,
            SolverStatus::AlmostSolved => LpStatus::Feasible,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                LpStatus::PrimalInfeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                LpStatus::DualInfeasible
            }
            SolverStatus::MaxIterations | SolverStatus::MaxTime => LpStatus::IterOrTimeLimit,
            other => {
                log::warn!("Clarabel returned status {:?}", other);
                LpStatus::Abort
            }
        };

        if status.has_solution() {
            self.x = sol.x.clone();
            let z = &sol.z;
            self.duals = row_slots
                .iter()
                .map(|s| {
                    let zl = s.lower.map_or(0.0, |r| z[r]);
                    let zu = s.upper.map_or(0.0, |r| z[r]);
                    sign * (zl - zu)
                })
                .collect();
        }
        Ok(status)
    }
}

impl LpEngine for ClarabelEngine {
    fn load_problem(&mut self, problem: LpProblem) -> EngineResult<()> {
        problem.validate()?;

        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); problem.num_cols()];
        for (&v, (i, j)) in problem.matrix.iter() {
            if v != 0.0 {
                columns[j].push((i, v));
            }
        }
        for col in &mut columns {
            col.sort_by_key(|&(i, _)| i);
        }

        self.sense = problem.sense;
        self.columns = columns;
        self.col_lower = problem.col_lower;
        self.col_upper = problem.col_upper;
        self.objective = problem.objective;
        self.row_lower = problem.row_lower;
        self.row_upper = problem.row_upper;
        self.status = LpStatus::NotSolved;
        self.basis = None;
        self.reset_solution();

        log::debug!(
            "Loaded LP with {} rows and {} columns",
            self.row_lower.len(),
            self.columns.len()
        );
        Ok(())
    }

    fn resolve(&mut self) -> EngineResult<LpStatus> {
        let start = Instant::now();
        let (m, n) = (self.row_lower.len(), self.columns.len());

        if let Some(basis) = &self.basis {
            if !basis.matches(m, n) {
                log::debug!(
                    "Discarding warm start of size {}x{} for LP of size {}x{}",
                    basis.num_rows(),
                    basis.num_cols(),
                    m,
                    n
                );
                self.basis = None;
            }
        }

        self.reset_solution();
        self.iterations = 0;

        let status = if n == 0 {
            self.solve_empty()
        } else {
            self.solve_conic()?
        };

        if status.has_solution() {
            self.compute_activity();
            self.compute_reduced_costs();
            self.obj_val = self
                .objective
                .iter()
                .zip(&self.x)
                .map(|(c, x)| c * x)
                .sum();
            self.basis = Some(self.snapshot_basis());
        } else {
            self.reset_solution();
        }

        self.status = status;
        self.solve_time = start.elapsed().as_secs_f64();
        Ok(status)
    }

    fn status(&self) -> LpStatus {
        self.status
    }

    fn pivot_count(&self) -> Option<usize> {
        None
    }

    fn add_column(
        &mut self,
        coeffs: &[(usize, f64)],
        lb: f64,
        ub: f64,
        obj: f64,
    ) -> EngineResult<usize> {
        let index = self.columns.len();
        Self::check_bounds("column", index, lb, ub)?;
        if !obj.is_finite() {
            return Err(EngineError::InvalidProblem(format!(
                "column {} has objective {}",
                index, obj
            )));
        }
        for &(i, _) in coeffs {
            self.check_row(i)?;
        }

        let mut col: Vec<(usize, f64)> = coeffs.iter().copied().filter(|&(_, v)| v != 0.0).collect();
        col.sort_by_key(|&(i, _)| i);
        col.dedup_by(|b, a| {
            if a.0 == b.0 {
                a.1 += b.1;
                true
            } else {
                false
            }
        });

        self.columns.push(col);
        self.col_lower.push(lb);
        self.col_upper.push(ub);
        self.objective.push(obj);
        self.x.push(0.0);
        self.reduced.push(obj);
        if let Some(basis) = &mut self.basis {
            basis.push_column(BasisStatus::AtLower);
        }
        Ok(index)
    }

    fn add_row(&mut self, coeffs: &[(usize, f64)], lb: f64, ub: f64) -> EngineResult<usize> {
        let index = self.row_lower.len();
        Self::check_bounds("row", index, lb, ub)?;
        for &(j, _) in coeffs {
            self.check_col(j)?;
        }

        for &(j, v) in coeffs {
            if v == 0.0 {
                continue;
            }
            match self.columns[j].last_mut() {
                Some(last) if last.0 == index => last.1 += v,
                _ => self.columns[j].push((index, v)),
            }
        }
        self.row_lower.push(lb);
        self.row_upper.push(ub);
        self.duals.push(0.0);
        self.activity.push(0.0);
        if let Some(basis) = &mut self.basis {
            basis.push_row(BasisStatus::Basic);
        }
        Ok(index)
    }

    fn delete_columns(&mut self, indices: &[usize]) -> EngineResult<()> {
        for &j in indices {
            self.check_col(j)?;
        }
        let mut keep = vec![true; self.columns.len()];
        for &j in indices {
            keep[j] = false;
        }

        let filter = |v: &mut Vec<f64>| {
            let mut k = 0;
            v.retain(|_| {
                k += 1;
                keep[k - 1]
            });
        };
        let mut k = 0;
        self.columns.retain(|_| {
            k += 1;
            keep[k - 1]
        });
        filter(&mut self.col_lower);
        filter(&mut self.col_upper);
        filter(&mut self.objective);
        filter(&mut self.x);
        filter(&mut self.reduced);
        if let Some(basis) = &mut self.basis {
            basis.delete_columns(indices);
        }
        Ok(())
    }

    fn delete_rows(&mut self, indices: &[usize]) -> EngineResult<()> {
        for &i in indices {
            self.check_row(i)?;
        }
        let m = self.row_lower.len();
        let mut new_index: Vec<Option<usize>> = vec![Some(0); m];
        for &i in indices {
            new_index[i] = None;
        }
        let mut next = 0;
        for slot in new_index.iter_mut() {
            if slot.is_some() {
                *slot = Some(next);
                next += 1;
            }
        }

        for col in &mut self.columns {
            *col = col
                .iter()
                .filter_map(|&(i, v)| new_index[i].map(|ni| (ni, v)))
                .collect();
        }
        let filter = |v: &mut Vec<f64>| {
            let mut k = 0;
            v.retain(|_| {
                k += 1;
                new_index[k - 1].is_some()
            });
        };
        filter(&mut self.row_lower);
        filter(&mut self.row_upper);
        filter(&mut self.duals);
        filter(&mut self.activity);
        if let Some(basis) = &mut self.basis {
            basis.delete_rows(indices);
        }
        Ok(())
    }

    fn num_rows(&self) -> usize {
        self.row_lower.len()
    }

    fn num_cols(&self) -> usize {
        self.columns.len()
    }

    fn row_duals(&self) -> &[f64] {
        &self.duals
    }

    fn reduced_costs(&self) -> &[f64] {
        &self.reduced
    }

    fn column_solution(&self) -> &[f64] {
        &self.x
    }

    fn row_activity(&self) -> &[f64] {
        &self.activity
    }

    fn objective_value(&self) -> f64 {
        self.obj_val
    }

    fn warm_start(&self) -> Option<Basis> {
        self.basis.clone()
    }

    fn set_warm_start(&mut self, basis: Basis) -> EngineResult<()> {
        let (m, n) = (self.row_lower.len(), self.columns.len());
        if !basis.matches(m, n) {
            return Err(EngineError::WarmStart(format!(
                "basis is {}x{}, LP is {}x{}",
                basis.num_rows(),
                basis.num_cols(),
                m,
                n
            )));
        }
        self.basis = Some(basis);
        Ok(())
    }

    fn set_column_bounds(&mut self, index: usize, lb: f64, ub: f64) -> EngineResult<()> {
        self.check_col(index)?;
        Self::check_bounds("column", index, lb, ub)?;
        self.col_lower[index] = lb;
        self.col_upper[index] = ub;
        Ok(())
    }

    fn set_objective_coefficient(&mut self, index: usize, value: f64) -> EngineResult<()> {
        self.check_col(index)?;
        if !value.is_finite() {
            return Err(EngineError::InvalidProblem(format!(
                "column {} has objective {}",
                index, value
            )));
        }
        self.objective[index] = value;
        Ok(())
    }

    fn column_bounds(&self, index: usize) -> EngineResult<(f64, f64)> {
        self.check_col(index)?;
        Ok((self.col_lower[index], self.col_upper[index]))
    }

    fn row_bounds(&self, index: usize) -> EngineResult<(f64, f64)> {
        self.check_row(index)?;
        Ok((self.row_lower[index], self.row_upper[index]))
    }

    fn objective_coefficient(&self, index: usize) -> EngineResult<f64> {
        self.check_col(index)?;
        Ok(self.objective[index])
    }

    fn set_time_limit(&mut self, seconds: Option<f64>) {
        self.time_limit = seconds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::from_triplets;

    fn small_lp() -> LpProblem {
        // min x + 2y  s.t.  x + y >= 1,  x <= 0.4,  x, y >= 0
        LpProblem {
            matrix: from_triplets(2, 2, vec![(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0)]),
            col_lower: vec![0.0, 0.0],
            col_upper: vec![f64::INFINITY; 2],
            objective: vec![1.0, 2.0],
            row_lower: vec![1.0, f64::NEG_INFINITY],
            row_upper: vec![f64::INFINITY, 0.4],
            sense: ObjSense::Minimize,
        }
    }

    #[test]
    fn test_resolve_and_duals() {
        let mut eng = ClarabelEngine::new(EngineSettings::default());
        eng.load_problem(small_lp()).unwrap();
        let status = eng.resolve().unwrap();
        assert_eq!(status, LpStatus::Optimal);

        let x = eng.column_solution();
        assert!((x[0] - 0.4).abs() < 1e-6);
        assert!((x[1] - 0.6).abs() < 1e-6);
        assert!((eng.objective_value() - 1.6).abs() < 1e-6);

        // π = (2, -1): the covering row prices y, the cap on x is binding.
        let pi = eng.row_duals();
        assert!((pi[0] - 2.0).abs() < 1e-5);
        assert!((pi[1] + 1.0).abs() < 1e-5);
        for d in eng.reduced_costs() {
            assert!(d.abs() < 1e-5);
        }
        assert_eq!(eng.pivot_count(), None);
    }

    #[test]
    fn test_maximize_reports_same_convention() {
        // max -x - 2y is the same LP; c − Aᵀπ = d must hold for c = (-1, -2).
        let mut lp = small_lp();
        lp.objective = vec![-1.0, -2.0];
        lp.sense = ObjSense::Maximize;

        let mut eng = ClarabelEngine::new(EngineSettings::default());
        eng.load_problem(lp).unwrap();
        assert_eq!(eng.resolve().unwrap(), LpStatus::Optimal);
        assert!((eng.objective_value() + 1.6).abs() < 1e-6);
        let pi = eng.row_duals();
        assert!((pi[0] + 2.0).abs() < 1e-5);
        assert!((pi[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_add_and_delete_keep_dimensions() {
        let mut eng = ClarabelEngine::new(EngineSettings::default());
        eng.load_problem(small_lp()).unwrap();
        eng.resolve().unwrap();

        let j = eng.add_column(&[(0, 1.0)], 0.0, f64::INFINITY, 0.5).unwrap();
        assert_eq!(j, 2);
        let r = eng.add_row(&[(2, 1.0)], f64::NEG_INFINITY, 10.0).unwrap();
        assert_eq!(r, 2);
        assert_eq!(eng.warm_start().map(|b| (b.num_rows(), b.num_cols())), Some((3, 3)));

        assert_eq!(eng.resolve().unwrap(), LpStatus::Optimal);
        assert!((eng.objective_value() - 0.5).abs() < 1e-6);

        eng.delete_rows(&[1]).unwrap();
        eng.delete_columns(&[0]).unwrap();
        assert_eq!((eng.num_rows(), eng.num_cols()), (2, 2));
        assert_eq!(eng.row_bounds(1).unwrap(), (f64::NEG_INFINITY, 10.0));
        assert_eq!(eng.objective_coefficient(1).unwrap(), 0.5);
        assert_eq!(eng.warm_start().map(|b| (b.num_rows(), b.num_cols())), Some((2, 2)));

        assert_eq!(eng.resolve().unwrap(), LpStatus::Optimal);
        assert!((eng.objective_value() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_index_errors() {
        let mut eng = ClarabelEngine::new(EngineSettings::default());
        eng.load_problem(small_lp()).unwrap();
        assert!(matches!(
            eng.set_objective_coefficient(5, 1.0),
            Err(EngineError::IndexOutOfRange { kind: "column", .. })
        ));
        assert!(matches!(
            eng.add_column(&[(7, 1.0)], 0.0, 1.0, 0.0),
            Err(EngineError::IndexOutOfRange { kind: "row", .. })
        ));
        assert!(eng.set_warm_start(Basis::slack(1, 1)).is_err());
    }

    #[test]
    fn test_infeasible_and_empty() {
        let mut eng = ClarabelEngine::new(EngineSettings::default());
        let lp = LpProblem::with_rows(vec![1.0], vec![1.0], ObjSense::Minimize);
        eng.load_problem(lp).unwrap();
        assert_eq!(eng.resolve().unwrap(), LpStatus::PrimalInfeasible);

        eng.add_column(&[(0, 1.0)], 0.0, 2.0, 3.0).unwrap();
        assert_eq!(eng.resolve().unwrap(), LpStatus::Optimal);
        assert!((eng.objective_value() - 3.0).abs() < 1e-6);
        assert!((eng.row_duals()[0] - 3.0).abs() < 1e-5);

        eng.set_column_bounds(0, 2.0, 2.0).unwrap();
        assert_eq!(eng.resolve().unwrap(), LpStatus::PrimalInfeasible);
    }
}
