//! Phase transitions of the restricted master.

use decomp_core::RowSense;

use super::layout::LpColumn;
use super::DwMaster;
use crate::error::{DecompError, DecompResult, StateErrorCode};
use crate::model::Phase;
use crate::worker::SubproblemWorker;

impl<W: SubproblemWorker> DwMaster<W> {
    /// Zero all objectives and add unit-cost slacks on every coupling and
    /// branching row. Does nothing if already in phase 1.
    pub(super) fn enter_phase1(&mut self) -> DecompResult<()> {
        if self.phase == Phase::Feasibility {
            return Ok(());
        }
        self.table.check(self.engine.as_ref())?;
        self.layout.check(self.engine.as_ref())?;

        for pos in 0..self.table.len() {
            self.engine.set_objective_coefficient(pos, 0.0)?;
        }

        let mut added = 0;
        for row in self.layout.num_conv..self.layout.num_rows() {
            let (lo, hi) = self.engine.row_bounds(row)?;
            let mut signs = Vec::with_capacity(2);
            match RowSense::from_bounds(lo, hi) {
                RowSense::Greater => signs.push(1.0),
                RowSense::Less => signs.push(-1.0),
                RowSense::Equal | RowSense::Range => {
                    signs.push(1.0);
                    signs.push(-1.0);
                }
                RowSense::Free => {}
            }
            for sign in signs {
                self.engine.add_column(&[(row, sign)], 0.0, f64::INFINITY, 1.0)?;
                self.table.push(LpColumn::Auxiliary);
                added += 1;
            }
        }
        self.phase = Phase::Feasibility;
        log::debug!("Entered phase 1 with {} auxiliary columns", added);
        Ok(())
    }

    /// Remove auxiliary columns and restore pool objectives.
    ///
    /// Every surviving position is validated before the LP is touched.
    pub(super) fn switch_to_phase2(&mut self) -> DecompResult<()> {
        if self.phase == Phase::Optimality {
            return Ok(());
        }
        self.table.check(self.engine.as_ref())?;

        let aux = self.table.auxiliary_positions();
        let mut remaining = self.table.clone();
        remaining.remove_positions(&aux);
        let ncols = self.engine.num_cols() - aux.len();
        let mut objectives = Vec::new();
        for (pos, id) in remaining.generated() {
            if pos >= ncols {
                return Err(DecompError::state(
                    StateErrorCode::ColumnIndexOutOfRange,
                    format!("column position {} beyond {} LP columns", pos, ncols),
                ));
            }
            let col = self.pool.get(id).ok_or_else(|| {
                DecompError::state(
                    StateErrorCode::ColumnIndexOutOfRange,
                    format!("column {} not in pool of {}", id.index(), self.pool.len()),
                )
            })?;
            objectives.push((pos, col.objective));
        }

        self.engine.delete_columns(&aux)?;
        self.table = remaining;
        for (pos, obj) in objectives {
            self.engine.set_objective_coefficient(pos, obj)?;
        }
        self.phase = Phase::Optimality;
        log::debug!("Switched to phase 2; removed {} auxiliary columns", aux.len());
        Ok(())
    }

    pub(super) fn solve_phase1(&mut self) -> DecompResult<()> {
        self.enter_phase1()?;
        self.worker.set_gap_tolerance(0.0);
        self.run_loop()
    }

    pub(super) fn solve_phase2(&mut self) -> DecompResult<()> {
        self.switch_to_phase2()?;
        self.worker.set_gap_tolerance(self.settings.gap_tol);
        self.worker.set_time_limit(self.settings.sub_time_limit);
        self.run_loop()
    }
}
