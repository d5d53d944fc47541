/*!
 * Arena Allocation
 * Bump allocation with single-step teardown
 */

use super::ledger::ArenaLedger;
use crate::core::config::ArenaConfig;
use crate::core::errors::{AllocResult, AllocationError};
use crate::core::guard::Reservation;
use bumpalo::Bump;
use serde::{Deserialize, Serialize};
use std::alloc::Layout;
use std::cell::{Cell, RefCell};
use std::ffi::CStr;
use std::ptr::{self, NonNull};
use std::slice;
use tracing::{debug, trace, warn};

/// Arena owning one pool of raw memory
///
/// Every handle returned by an arena borrows it, so handles stay valid
/// until the next [`clear`](Arena::clear) (which needs `&mut self`) or until
/// the arena is dropped. Use-after-clear is a compile error:
///
/// ```compile_fail
/// # use hierarchical_arena::Arena;
/// # fn main() -> Result<(), hierarchical_arena::AllocationError> {
/// let mut arena = Arena::new()?;
/// let bytes = arena.allocate(4)?;
/// arena.clear();
/// bytes[0] = 1;
/// # Ok(())
/// # }
/// ```
///
/// # Performance
///
/// - **Allocation**: O(1), bumps a pointer, a new chunk only when full
/// - **Teardown**: O(chunks), no per-object work
///
/// # Destructors
///
/// The arena never runs destructors of values placed in it. Values that
/// hold file handles or other non-memory resources leak those resources
/// unless something else drops them (see [`Placed`](super::Placed)).
///
/// # Threading
///
/// `Arena` is `Send` but not `Sync`. Share one between threads only behind
/// a lock, e.g. [`SharedArena`](super::SharedArena).
#[derive(Debug)]
pub struct Arena {
    bump: Bump,
    config: ArenaConfig,
    reserved: Cell<usize>,
    allocations: Cell<usize>,
    requested_bytes: Cell<usize>,
    generation: u64,
}

/// Per-arena statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaStats {
    /// Bytes held in backing chunks
    pub reserved_bytes: usize,
    /// Allocations since creation or the last clear
    pub allocations: usize,
    /// Bytes requested since creation or the last clear
    pub requested_bytes: usize,
    /// Number of clears so far
    pub generation: u64,
    pub allocation_limit: Option<usize>,
}

impl Arena {
    /// Create an arena with the default configuration
    pub fn new() -> AllocResult<Self> {
        Self::with_config(ArenaConfig::default())
    }

    /// Create an arena reserving `bytes` up front
    pub fn with_capacity(bytes: usize) -> AllocResult<Self> {
        Self::with_config(ArenaConfig::default().with_initial_capacity(bytes))
    }

    /// Create an arena from an explicit configuration
    ///
    /// The ledger reservation is taken first and rolled back if the backing
    /// allocator refuses the initial chunk, so a failed creation leaves
    /// nothing reserved. The backend may round the chunk up; the rounded
    /// size must also fit the ledger budget.
    pub fn with_config(config: ArenaConfig) -> AllocResult<Self> {
        let capacity = config.initial_capacity;

        if let Some(limit) = config.allocation_limit {
            if capacity > limit {
                warn!(capacity, limit, "initial capacity exceeds allocation limit");
                return Err(AllocationError::Exhausted {
                    requested: capacity,
                    reserved: 0,
                    limit: Some(limit),
                });
            }
        }

        let mut reservation = Reservation::acquire(config.ledger.as_ref(), capacity)?;

        let bump = Bump::try_with_capacity(capacity).map_err(|_| {
            warn!(capacity, "backing allocator refused initial arena region");
            if let Some(ref ledger) = config.ledger {
                ledger.record_failure();
            }
            AllocationError::ReservationFailed {
                requested: capacity,
            }
        })?;

        let actual = bump.allocated_bytes();
        if actual > capacity {
            reservation.extend(actual - capacity).map_err(|err| match err {
                AllocationError::BudgetExceeded { available, .. } => {
                    warn!(capacity, actual, "rounded initial chunk exceeds ledger budget");
                    AllocationError::BudgetExceeded {
                        requested: actual,
                        available: available.saturating_add(capacity),
                    }
                }
                other => other,
            })?;
        }

        let promised = reservation.commit();
        if let Some(ref ledger) = config.ledger {
            reconcile(ledger, promised, actual);
            ledger.arena_opened();
        }

        debug!(capacity, reserved = actual, "arena created");

        Ok(Self {
            bump,
            config,
            reserved: Cell::new(actual),
            allocations: Cell::new(0),
            requested_bytes: Cell::new(0),
            generation: 0,
        })
    }

    /// Allocate `size` zero-initialized bytes
    pub fn allocate(&self, size: usize) -> AllocResult<&mut [u8]> {
        if size == 0 {
            return Ok(&mut []);
        }

        let ptr = self.allocate_layout(byte_layout(size)?)?;

        // SAFETY: `ptr` is a fresh allocation of `size` bytes owned by this
        // arena and not aliased by any other handle.
        unsafe {
            ptr::write_bytes(ptr.as_ptr(), 0, size);
            Ok(slice::from_raw_parts_mut(ptr.as_ptr(), size))
        }
    }

    /// Allocate uninitialized storage for `layout`
    ///
    /// Separates storage acquisition from initialization; the caller writes
    /// the value later.
    pub fn allocate_layout(&self, layout: Layout) -> AllocResult<NonNull<u8>> {
        self.refresh_limit();
        let result = self.bump.try_alloc_layout(layout);
        self.sync_reserved();

        match result {
            Ok(ptr) => {
                self.count(layout.size());
                Ok(ptr)
            }
            Err(_) => Err(self.exhausted(layout.size())),
        }
    }

    /// Move `value` into the arena
    ///
    /// The arena will not run `T`'s destructor.
    pub fn place<T>(&self, value: T) -> AllocResult<&mut T> {
        self.refresh_limit();
        let result = self.bump.try_alloc(value);
        self.sync_reserved();

        match result {
            Ok(slot) => {
                self.count(std::mem::size_of::<T>());
                Ok(slot)
            }
            Err(_) => Err(self.exhausted(std::mem::size_of::<T>())),
        }
    }

    /// Copy a slice of plain values into the arena
    pub fn place_slice<T: Copy>(&self, values: &[T]) -> AllocResult<&mut [T]> {
        if values.is_empty() {
            return Ok(&mut []);
        }

        let layout = Layout::array::<T>(values.len()).map_err(|_| AllocationError::LayoutOverflow {
            size: values.len().saturating_mul(std::mem::size_of::<T>()),
            align: std::mem::align_of::<T>(),
        })?;
        let ptr = self.allocate_layout(layout)?.cast::<T>();

        // SAFETY: `ptr` is a fresh, properly aligned allocation for
        // `values.len()` elements and cannot overlap `values`.
        unsafe {
            ptr::copy_nonoverlapping(values.as_ptr(), ptr.as_ptr(), values.len());
            Ok(slice::from_raw_parts_mut(ptr.as_ptr(), values.len()))
        }
    }

    /// Copy exactly `bytes` into the arena
    #[inline]
    pub fn duplicate(&self, bytes: &[u8]) -> AllocResult<&mut [u8]> {
        self.place_slice(bytes)
    }

    /// Copy a string into the arena
    pub fn duplicate_str(&self, s: &str) -> AllocResult<&mut str> {
        let bytes = self.duplicate(s.as_bytes())?;
        // SAFETY: the bytes were copied verbatim from a valid `str`.
        Ok(unsafe { std::str::from_utf8_unchecked_mut(bytes) })
    }

    /// Copy a NUL-terminated string, terminator included
    pub fn duplicate_cstr(&self, s: &CStr) -> AllocResult<&CStr> {
        let bytes = self.duplicate(s.to_bytes_with_nul())?;
        // SAFETY: copied from a valid `CStr`, so exactly one trailing NUL.
        Ok(unsafe { CStr::from_bytes_with_nul_unchecked(bytes) })
    }

    /// Copy at most `max_len` bytes, stopping at the first NUL
    ///
    /// The copy is always NUL-terminated, even when `bytes` is not.
    pub fn duplicate_bounded(&self, bytes: &[u8], max_len: usize) -> AllocResult<&CStr> {
        let window = &bytes[..max_len.min(bytes.len())];
        let len = window.iter().position(|&b| b == 0).unwrap_or(window.len());
        let size = len + 1;

        let ptr = self.allocate_layout(byte_layout(size)?)?;

        // SAFETY: `ptr` holds `size` fresh bytes; `window[..len]` has no NUL
        // and the final byte is set to NUL.
        unsafe {
            ptr::copy_nonoverlapping(window.as_ptr(), ptr.as_ptr(), len);
            ptr.as_ptr().add(len).write(0);
            Ok(CStr::from_bytes_with_nul_unchecked(slice::from_raw_parts(
                ptr.as_ptr(),
                size,
            )))
        }
    }

    /// Reset to empty, keeping the largest chunk for reuse
    ///
    /// Invalidates every handle issued so far; the borrow checker enforces
    /// this through `&mut self`.
    pub fn clear(&mut self) {
        self.bump.reset();
        self.generation += 1;
        self.allocations.set(0);
        self.requested_bytes.set(0);
        self.sync_reserved();

        trace!(
            generation = self.generation,
            reserved = self.reserved.get(),
            "arena cleared"
        );
    }

    /// Release the arena and everything allocated from it
    pub fn destroy(self) {
        drop(self);
    }

    /// Number of clears performed on this arena
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bytes held in backing chunks
    #[inline]
    pub fn reserved_bytes(&self) -> usize {
        self.reserved.get()
    }

    #[inline]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Raw backing allocator, for bumpalo collections
    #[inline]
    pub fn as_bump(&self) -> &Bump {
        &self.bump
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            reserved_bytes: self.reserved.get(),
            allocations: self.allocations.get(),
            requested_bytes: self.requested_bytes.get(),
            generation: self.generation,
            allocation_limit: self.config.allocation_limit,
        }
    }

    /// Cap chunk growth to both the configured limit and the ledger budget
    fn refresh_limit(&self) {
        let budget_cap = self
            .config
            .ledger
            .as_ref()
            .and_then(|ledger| ledger.available())
            .map(|available| self.reserved.get().saturating_add(available));

        let limit = match (self.config.allocation_limit, budget_cap) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.bump.set_allocation_limit(limit);
    }

    /// Report chunk growth or shrinkage to the ledger
    fn sync_reserved(&self) {
        let now = self.bump.allocated_bytes();
        let before = self.reserved.replace(now);
        if let Some(ref ledger) = self.config.ledger {
            reconcile(ledger, before, now);
        }
    }

    fn count(&self, bytes: usize) {
        self.allocations.set(self.allocations.get() + 1);
        self.requested_bytes
            .set(self.requested_bytes.get().saturating_add(bytes));
    }

    fn exhausted(&self, requested: usize) -> AllocationError {
        let reserved = self.reserved.get();
        let available = self
            .config
            .ledger
            .as_ref()
            .and_then(|ledger| ledger.available());

        if let Some(ref ledger) = self.config.ledger {
            ledger.record_failure();
        }

        warn!(
            requested,
            reserved,
            limit = ?self.config.allocation_limit,
            "arena allocation failed"
        );

        // The ledger is the binding constraint unless the arena's own limit is tighter
        match available {
            Some(available)
                if self
                    .config
                    .allocation_limit
                    .map_or(true, |limit| reserved.saturating_add(available) <= limit) =>
            {
                AllocationError::BudgetExceeded {
                    requested,
                    available,
                }
            }
            _ => AllocationError::Exhausted {
                requested,
                reserved,
                limit: self.config.allocation_limit,
            },
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        let reserved = self.reserved.get();
        if let Some(ref ledger) = self.config.ledger {
            ledger.release(reserved);
            ledger.arena_closed();
        }

        trace!(reserved, generation = self.generation, "arena destroyed");
    }
}

fn byte_layout(size: usize) -> AllocResult<Layout> {
    Layout::array::<u8>(size).map_err(|_| AllocationError::LayoutOverflow { size, align: 1 })
}

fn reconcile(ledger: &ArenaLedger, before: usize, now: usize) {
    if now > before {
        ledger.record_growth(now - before);
    } else if before > now {
        ledger.release(before - now);
    }
}

// Per-thread scratch arena, one per worker
//
// # Example
//
// ```
// let len = with_thread_arena(|arena| {
//     let name = arena.duplicate_str("temporary")?;
//     Ok::<_, AllocationError>(name.len())
// })??;
// ```
thread_local! {
    static THREAD_ARENA: RefCell<Option<Arena>> = const { RefCell::new(None) };
}

/// Execute closure with this thread's scratch arena
///
/// The arena is cleared before each use and kept for the next one. A nested
/// call on the same thread gets a fresh temporary arena instead.
pub fn with_thread_arena<F, R>(f: F) -> AllocResult<R>
where
    F: FnOnce(&Arena) -> R,
{
    THREAD_ARENA.with(|cell| {
        let Ok(mut slot) = cell.try_borrow_mut() else {
            trace!("thread arena busy, using temporary arena");
            let arena = Arena::with_config(ArenaConfig::small())?;
            return Ok(f(&arena));
        };

        let arena = match &mut *slot {
            Some(arena) => arena,
            empty => empty.insert(Arena::with_config(ArenaConfig::scratch())?),
        };

        arena.clear();
        Ok(f(arena))
    })
}
