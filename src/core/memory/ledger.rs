/*!
 * Arena Ledger
 * Byte accounting shared by every arena drawing from one backing budget
 */

use crate::core::errors::{AllocResult, AllocationError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::warn;

/// Accounting view of the backing allocator
///
/// Arenas report every chunk they reserve or give back. An optional budget
/// caps the total, which is how backing-allocator exhaustion is simulated
/// and how hosts bound interpreter memory.
///
/// All counters are atomic so one ledger can be shared by arenas living
/// on different threads. The arenas themselves still need external locking.
#[derive(Debug)]
pub struct ArenaLedger {
    budget: Option<usize>,
    reserved_bytes: AtomicUsize,
    peak_bytes: AtomicUsize,
    live_arenas: AtomicUsize,
    arenas_created: AtomicU64,
    arenas_released: AtomicU64,
    failed_reservations: AtomicU64,
}

/// Point-in-time copy of ledger counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub budget: Option<usize>,
    pub reserved_bytes: usize,
    pub peak_bytes: usize,
    pub live_arenas: usize,
    pub arenas_created: u64,
    pub arenas_released: u64,
    pub failed_reservations: u64,
}

impl ArenaLedger {
    /// Ledger that only counts
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Ledger that refuses reservations past `bytes`
    pub fn with_budget(bytes: usize) -> Self {
        Self::new(Some(bytes))
    }

    fn new(budget: Option<usize>) -> Self {
        Self {
            budget,
            reserved_bytes: AtomicUsize::new(0),
            peak_bytes: AtomicUsize::new(0),
            live_arenas: AtomicUsize::new(0),
            arenas_created: AtomicU64::new(0),
            arenas_released: AtomicU64::new(0),
            failed_reservations: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn budget(&self) -> Option<usize> {
        self.budget
    }

    /// Bytes currently reserved by live arenas
    #[inline]
    pub fn reserved_bytes(&self) -> usize {
        self.reserved_bytes.load(Ordering::Acquire)
    }

    /// Bytes still available under the budget, `None` when unbounded
    pub fn available(&self) -> Option<usize> {
        self.budget
            .map(|budget| budget.saturating_sub(self.reserved_bytes()))
    }

    #[inline]
    pub fn live_arenas(&self) -> usize {
        self.live_arenas.load(Ordering::Acquire)
    }

    /// Reserve `bytes` against the budget
    ///
    /// Either the whole amount is reserved or nothing is.
    pub fn try_reserve(&self, bytes: usize) -> AllocResult<()> {
        let result = self
            .reserved_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let next = current.checked_add(bytes)?;
                match self.budget {
                    Some(budget) if next > budget => None,
                    _ => Some(next),
                }
            });

        match result {
            Ok(previous) => {
                self.peak_bytes
                    .fetch_max(previous + bytes, Ordering::AcqRel);
                Ok(())
            }
            Err(current) => {
                self.failed_reservations.fetch_add(1, Ordering::Relaxed);
                let available = self
                    .budget
                    .map_or(usize::MAX - current, |b| b.saturating_sub(current));
                warn!(
                    requested = bytes,
                    available = available,
                    "ledger refused reservation"
                );
                Err(AllocationError::BudgetExceeded {
                    requested: bytes,
                    available,
                })
            }
        }
    }

    /// Account for bytes an arena already obtained from its backend
    ///
    /// Arenas cap their growth to [`available`](Self::available) before
    /// allocating, so this only overshoots the budget under cross-thread races.
    pub(crate) fn record_growth(&self, bytes: usize) {
        let previous = self.reserved_bytes.fetch_add(bytes, Ordering::AcqRel);
        self.peak_bytes
            .fetch_max(previous.saturating_add(bytes), Ordering::AcqRel);
    }

    /// Return `bytes` to the budget
    pub fn release(&self, bytes: usize) {
        let _ = self
            .reserved_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_sub(bytes))
            });
    }

    pub(crate) fn arena_opened(&self) {
        self.live_arenas.fetch_add(1, Ordering::AcqRel);
        self.arenas_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn arena_closed(&self) {
        self.live_arenas.fetch_sub(1, Ordering::AcqRel);
        self.arenas_released.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed_reservations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            budget: self.budget,
            reserved_bytes: self.reserved_bytes(),
            peak_bytes: self.peak_bytes.load(Ordering::Acquire),
            live_arenas: self.live_arenas(),
            arenas_created: self.arenas_created.load(Ordering::Relaxed),
            arenas_released: self.arenas_released.load(Ordering::Relaxed),
            failed_reservations: self.failed_reservations.load(Ordering::Relaxed),
        }
    }
}

impl Default for ArenaLedger {
    fn default() -> Self {
        Self::unbounded()
    }
}
