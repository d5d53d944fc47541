/*!
 * Hierarchical Arena Library
 * Pool allocation for short-lived, tree-shaped interpreter data
 *
 * Two disciplines behind one allocation interface:
 * - **Arena**: many objects, one externally owned arena, one teardown
 * - **Rooted**: one object owning a private arena that takes its whole
 *   subtree down with it
 *
 * Allocation failure is the only error, reported as [`AllocationError`].
 * Nothing here is thread-safe without external locking; see
 * [`SharedArena`] and [`with_thread_arena`].
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::config::ArenaConfig;
pub use crate::core::errors::{AllocResult, AllocationError};
pub use crate::core::memory::{
    with_thread_arena, Allocatable, Arena, ArenaLedger, ArenaResident, ArenaStats,
    LedgerSnapshot, Ownership, Placed, Rooted, SharedArena,
};
pub use monitoring::{init_tracing, try_init_tracing};
