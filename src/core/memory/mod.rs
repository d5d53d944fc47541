/*!
 * Memory Utilities
 *
 * Arena allocation for tree-shaped interpreter data:
 * - Arena allocation for bulk allocations freed together
 * - Self-owned objects whose arena dies with them
 * - Ledger accounting shared across arenas
 *
 * # Performance
 *
 * - Arena: O(1) bump allocation, single deallocation
 * - Rooted: one arena per tree, one teardown per tree
 *
 * # Use Cases
 *
 * - **Arena**: many related nodes, one teardown point
 * - **Rooted**: independent top-level objects reclaimed with their subtree
 * - **Placed**: children built inside an existing tree's arena
 */

mod arena;
mod ledger;
mod owned;
mod shared;

pub use arena::{with_thread_arena, Arena, ArenaStats};
pub use ledger::{ArenaLedger, LedgerSnapshot};
pub use owned::{Allocatable, ArenaResident, Ownership, Placed, Rooted};
pub use shared::SharedArena;
