//! Column and cut pools.
//!
//! Pools own every generated column or cut for the lifetime of a master.
//! Records are never freed: leaving the LP only clears a flag, so a record
//! can be brought back when the node or the row layout changes.

mod column;
mod cut;

pub use column::{Column, ColumnId, ColumnPool, RC_FIX_TOL};
pub use cut::{Cut, CutId, CutPool, CutRows, CutStatus};
