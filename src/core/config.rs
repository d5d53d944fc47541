/*!
 * Arena Configuration
 *
 * Construction-time settings for arenas
 */

use super::limits::{
    DEFAULT_ARENA_CAPACITY, ROOT_ARENA_MIN_CAPACITY, SMALL_ARENA_CAPACITY, THREAD_ARENA_CAPACITY,
};
use crate::core::memory::ArenaLedger;
use serde::{Deserialize, Serialize};
use std::alloc::Layout;
use std::sync::Arc;

/// Arena configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Bytes reserved up front when the arena is created
    pub initial_capacity: usize,
    /// Upper bound on bytes the arena may reserve over its lifetime
    pub allocation_limit: Option<usize>,
    /// Accounting ledger shared with other arenas
    #[serde(skip)]
    pub ledger: Option<Arc<ArenaLedger>>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_ARENA_CAPACITY,
            allocation_limit: None,
            ledger: None,
        }
    }
}

impl ArenaConfig {
    /// Configuration for arenas holding only a few small nodes
    pub const fn small() -> Self {
        Self {
            initial_capacity: SMALL_ARENA_CAPACITY,
            allocation_limit: None,
            ledger: None,
        }
    }

    /// Configuration for reusable per-thread scratch arenas
    pub const fn scratch() -> Self {
        Self {
            initial_capacity: THREAD_ARENA_CAPACITY,
            allocation_limit: None,
            ledger: None,
        }
    }

    #[inline]
    pub fn with_initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }

    #[inline]
    pub fn with_allocation_limit(mut self, bytes: usize) -> Self {
        self.allocation_limit = Some(bytes);
        self
    }

    #[inline]
    pub fn with_ledger(mut self, ledger: Arc<ArenaLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Resize the initial capacity to exactly fit one value of `layout`
    ///
    /// Used by self-owned roots: the arena starts just big enough for the
    /// root and grows through the root's own sub-allocations.
    pub fn sized_for(mut self, layout: Layout) -> Self {
        let padded = layout.size().saturating_add(layout.align());
        self.initial_capacity = padded.max(ROOT_ARENA_MIN_CAPACITY);
        self
    }
}
