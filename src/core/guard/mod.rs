/*!
 * RAII Resource Guards
 *
 * Scoped acquisition with release on every exit path, including early
 * returns through `?`.
 *
 * ## Guard Types
 *
 * - **Reservation**: ledger bytes held while an arena is being created
 *
 * ## Example
 *
 * ```rust
 * use hierarchical_arena::core::guard::{Guard, Reservation};
 * use hierarchical_arena::ArenaLedger;
 * use std::sync::Arc;
 *
 * let ledger = Arc::new(ArenaLedger::with_budget(4096));
 * {
 *     let reservation = Reservation::acquire(Some(&ledger), 1024).unwrap();
 *     assert!(reservation.is_active());
 *     // Dropped without commit: bytes go back to the ledger
 * }
 * assert_eq!(ledger.reserved_bytes(), 0);
 * ```
 */

mod reservation;
mod traits;

pub use reservation::Reservation;
pub use traits::Guard;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors that can occur during guard operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("Resource already released")]
    AlreadyReleased,
}
