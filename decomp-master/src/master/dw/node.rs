//! Branching rows and node snapshots of the restricted master.

use decomp_core::SparseVec;

use super::layout::{BranchRow, LpColumn};
use super::pricing::column_coefficients;
use super::DwMaster;
use crate::error::{DecompError, DecompResult, StateErrorCode};
use crate::model::{MasterStatus, Phase};
use crate::search::{BranchingObject, BranchingView, NodeState};
use crate::worker::SubproblemWorker;

impl<W: SubproblemWorker> DwMaster<W> {
    /// Apply a child's bound restrictions.
    ///
    /// Branching rows are rebuilt from the bounds that are tighter than the
    /// root, every pool column is reactivated and re-projected, and the node
    /// bounds are pushed to the worker. The best dual bound restarts from
    /// the bound the object inherited from its parent.
    pub fn set_branching_objects(&mut self, obj: &BranchingObject) -> DecompResult<()> {
        if !self.initialized {
            self.init()?;
        }
        self.pool.activate_all();
        self.rebuild(Some(obj))?;

        self.status = MasterStatus::NotSolved;
        // Restart from −∞ and inherit the parent's bound; +∞ would prune every child.
        self.best_dual = f64::NEG_INFINITY;
        self.best_dual_solution.clear();
        self.dual_bound_history.clear();
        if obj.best_bound > self.best_dual {
            self.best_dual = obj.best_bound;
            self.best_dual_solution = obj.dual_solution.clone();
        }
        log::debug!(
            "Applied branching object with {} bounds ({} branching rows), inherited bound {:e}",
            obj.len(),
            self.layout.branch.len(),
            self.best_dual
        );
        Ok(())
    }

    /// Capture the node-local state.
    pub fn save_node_state(&self) -> NodeState {
        NodeState {
            branching: self.branching.clone(),
            active: self.pool.active_flags(),
            phase: self.phase,
            node_lower: self.node_lower.clone(),
            node_upper: self.node_upper.clone(),
            best_dual: self.best_dual,
            best_dual_solution: self.best_dual_solution.clone(),
            status: self.status,
        }
    }

    /// Rebuild the LP for a previously captured node.
    ///
    /// Columns generated after the capture stay active.
    pub fn restore_node_state(&mut self, state: &NodeState) -> DecompResult<()> {
        if !self.initialized {
            self.init()?;
        }
        if state.active.len() > self.pool.len() {
            return Err(DecompError::state(
                StateErrorCode::ColumnTableMismatch,
                format!(
                    "node state has {} column flags, pool has {} columns",
                    state.active.len(),
                    self.pool.len()
                ),
            ));
        }
        let ncols = self.structure.num_cols();
        if state.node_lower.len() != ncols || state.node_upper.len() != ncols {
            return Err(DecompError::InvalidModel(format!(
                "node state bounds have {}/{} entries, expected {}",
                state.node_lower.len(),
                state.node_upper.len(),
                ncols
            )));
        }

        self.pool.activate_all();
        self.pool.set_active_flags(&state.active);
        self.rebuild(state.branching.as_ref())?;
        if state.phase == Phase::Feasibility {
            self.enter_phase1()?;
        }

        self.best_dual = state.best_dual;
        self.best_dual_solution = state.best_dual_solution.clone();
        self.status = state.status;
        Ok(())
    }

    /// Inputs for the branching generator.
    pub fn branching_view(&self) -> BranchingView<'_> {
        BranchingView {
            solution: &self.primal_solution,
            node_lower: &self.node_lower,
            node_upper: &self.node_upper,
            root_lower: &self.structure.col_lower,
            root_upper: &self.structure.col_upper,
            best_bound: self.best_dual,
            dual_solution: &self.best_dual_solution,
        }
    }

    /// `(stored, re-projected)` master-row coefficients of every loaded pool
    /// column. Both sides agree whenever the row layout is current.
    pub fn reprojected_coefficients(&self) -> Vec<(SparseVec, SparseVec)> {
        self.table
            .generated()
            .into_iter()
            .filter_map(|(_, id)| self.pool.get(id))
            .map(|col| {
                let fresh = column_coefficients(
                    &self.structure,
                    &self.layout,
                    col.subproblem,
                    &col.solution,
                    col.is_ray,
                );
                (col.coefficients.clone(), fresh)
            })
            .collect()
    }

    /// Drop every branching row and LP column, then reload rows for `obj`
    /// and the active pool columns. Leaves the master in phase 2.
    fn rebuild(&mut self, obj: Option<&BranchingObject>) -> DecompResult<()> {
        let ncols = self.structure.num_cols();
        if let Some(obj) = obj {
            obj.validate(ncols)?;
        }
        self.layout.check(self.engine.as_ref())?;
        self.table.check(self.engine.as_ref())?;

        let mut lower = self.structure.col_lower.clone();
        let mut upper = self.structure.col_upper.clone();
        let mut rows = Vec::new();
        if let Some(obj) = obj {
            for ((&j, &lb), &ub) in obj.indices.iter().zip(&obj.lower).zip(&obj.upper) {
                lower[j] = lb;
                upper[j] = ub;
                if lb > self.structure.col_lower[j] {
                    rows.push(BranchRow {
                        column: j,
                        lower: lb,
                        upper: f64::INFINITY,
                    });
                }
                if ub < self.structure.col_upper[j] {
                    rows.push(BranchRow {
                        column: j,
                        lower: f64::NEG_INFINITY,
                        upper: ub,
                    });
                }
            }
        }

        let indices: Vec<usize> = (0..ncols).collect();
        self.worker.set_column_bounds(&indices, &lower, &upper)?;

        let core = self.layout.num_core();
        let old_rows: Vec<usize> = (core..self.layout.num_rows()).collect();
        let old_cols: Vec<usize> = (0..self.table.len()).collect();
        self.engine.delete_rows(&old_rows)?;
        self.layout.branch.clear();
        self.engine.delete_columns(&old_cols)?;
        self.table.clear();

        for row in rows {
            self.engine.add_row(&[], row.lower, row.upper)?;
            self.layout.branch.push(row);
        }
        self.load_active_columns()?;
        self.phase = Phase::Optimality;
        self.node_lower = lower;
        self.node_upper = upper;
        self.branching = obj.cloned();
        Ok(())
    }

    fn load_active_columns(&mut self) -> DecompResult<()> {
        for id in self.pool.active_ids() {
            let Some(col) = self.pool.get(id) else {
                continue;
            };
            let coeffs = column_coefficients(
                &self.structure,
                &self.layout,
                col.subproblem,
                &col.solution,
                col.is_ray,
            );
            let entries: Vec<(usize, f64)> = coeffs.iter().map(|(i, &v)| (i, v)).collect();
            self.engine
                .add_column(&entries, col.lower, col.upper, col.objective)?;
            self.pool.set_coefficients(id, coeffs);
            self.table.push(LpColumn::Generated(id));
        }
        Ok(())
    }
}
