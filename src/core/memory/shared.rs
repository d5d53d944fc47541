/*!
 * Shared Arenas
 * Lock-guarded arena for hosts that allocate from several threads
 */

use super::arena::{Arena, ArenaStats};
use crate::core::config::ArenaConfig;
use crate::core::errors::AllocResult;
use parking_lot::Mutex;
use std::sync::Arc;

/// Arena behind a mutex, cloneable across threads
///
/// Allocation happens inside [`with`](SharedArena::with), so handles cannot
/// outlive the lock that protects them. Prefer one arena per worker; use
/// this only when several workers must build into the same tree.
#[derive(Clone)]
pub struct SharedArena {
    inner: Arc<Mutex<Arena>>,
}

impl SharedArena {
    pub fn new(config: ArenaConfig) -> AllocResult<Self> {
        Ok(Self::from_arena(Arena::with_config(config)?))
    }

    pub fn from_arena(arena: Arena) -> Self {
        Self {
            inner: Arc::new(Mutex::new(arena)),
        }
    }

    /// Run `f` with exclusive access to the arena
    #[inline]
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Arena) -> R,
    {
        let arena = self.inner.lock();
        f(&arena)
    }

    /// Clear the arena for every holder
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn stats(&self) -> ArenaStats {
        self.inner.lock().stats()
    }

    /// Number of handles sharing this arena
    #[inline]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}
