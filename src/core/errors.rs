/*!
 * Error Types
 * Allocation failures surfaced by arenas and arena-resident objects
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allocation operation result
pub type AllocResult<T> = Result<T, AllocationError>;

/// Out-of-memory class failures
///
/// Every variant means the same thing to a caller: the backing allocator
/// could not supply the bytes. The payload only exists for diagnostics.
/// Failures are never retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum AllocationError {
    #[error("Failed to reserve initial arena region of {requested} bytes")]
    #[diagnostic(
        code(arena::reservation_failed),
        help("The backing allocator refused the initial chunk. Lower the initial capacity or free memory.")
    )]
    ReservationFailed { requested: usize },

    #[error("Arena exhausted: requested {requested} bytes with {reserved} bytes reserved (limit: {limit:?})")]
    #[diagnostic(
        code(arena::exhausted),
        help("Raise the arena allocation limit or split the work across several arenas.")
    )]
    Exhausted {
        requested: usize,
        reserved: usize,
        limit: Option<usize>,
    },

    #[error("Ledger budget exceeded: requested {requested} bytes, available {available} bytes")]
    #[diagnostic(
        code(arena::budget_exceeded),
        help("The shared ledger budget is spent. Drop or clear other arenas drawing from it.")
    )]
    BudgetExceeded { requested: usize, available: usize },

    #[error("Invalid allocation layout: size {size}, align {align}")]
    #[diagnostic(
        code(arena::layout_overflow),
        help("Size rounded up to the alignment must not exceed isize::MAX.")
    )]
    LayoutOverflow { size: usize, align: usize },
}

impl AllocationError {
    /// Bytes the failing operation asked for
    pub fn requested(&self) -> usize {
        match self {
            AllocationError::ReservationFailed { requested }
            | AllocationError::Exhausted { requested, .. }
            | AllocationError::BudgetExceeded { requested, .. } => *requested,
            AllocationError::LayoutOverflow { size, .. } => *size,
        }
    }
}
