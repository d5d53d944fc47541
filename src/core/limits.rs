/*!
 * Arena Limits and Constants
 *
 * Centralized sizing defaults for arenas.
 *
 * - Performance-critical constants are marked with [PERF]
 */

// =============================================================================
// ARENA SIZING
// =============================================================================

/// Default initial arena capacity (8KB)
/// [PERF] Matches the block size of classic pool allocators
pub const DEFAULT_ARENA_CAPACITY: usize = 8 * 1024;

/// Small arena capacity (1KB)
/// For short-lived arenas holding a handful of nodes
pub const SMALL_ARENA_CAPACITY: usize = 1024;

/// Per-thread scratch arena capacity (64KB)
/// [PERF] Reused across calls, so a larger first chunk amortizes well
pub const THREAD_ARENA_CAPACITY: usize = 64 * 1024;

/// Minimum capacity for a self-owned root arena (64 bytes)
/// Roots smaller than this still get one cache line of headroom
pub const ROOT_ARENA_MIN_CAPACITY: usize = 64;
