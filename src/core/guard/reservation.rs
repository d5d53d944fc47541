/*!
 * Reservation Guards
 *
 * Ledger bytes that are given back unless explicitly committed
 */

use super::traits::Guard;
use super::{GuardError, GuardResult};
use crate::core::errors::AllocResult;
use crate::core::memory::ArenaLedger;
use std::sync::Arc;
use tracing::trace;

/// Scoped ledger reservation
///
/// Taken before touching the backing allocator. If anything after it fails,
/// dropping the guard returns the bytes, so a failed arena creation never
/// leaves budget behind.
///
/// # Example
///
/// ```ignore
/// let reservation = Reservation::acquire(ledger.as_ref(), capacity)?;
/// let bump = Bump::try_with_capacity(capacity)?; // early return releases
/// reservation.commit();
/// ```
pub struct Reservation {
    ledger: Option<Arc<ArenaLedger>>,
    bytes: usize,
    active: bool,
}

impl Reservation {
    /// Reserve `bytes` on `ledger`; with no ledger the guard is a no-op
    pub fn acquire(ledger: Option<&Arc<ArenaLedger>>, bytes: usize) -> AllocResult<Self> {
        if let Some(ledger) = ledger {
            ledger.try_reserve(bytes)?;
        }

        Ok(Self {
            ledger: ledger.cloned(),
            bytes,
            active: true,
        })
    }

    /// Reserve `extra` more bytes under the same guard
    ///
    /// On refusal the guard still holds only what it held before.
    pub fn extend(&mut self, extra: usize) -> AllocResult<()> {
        if let Some(ref ledger) = self.ledger {
            ledger.try_reserve(extra)?;
        }
        self.bytes += extra;
        Ok(())
    }

    #[inline]
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Keep the bytes reserved and hand their accounting to the caller
    pub fn commit(mut self) -> usize {
        self.active = false;
        self.bytes
    }
}

impl Guard for Reservation {
    fn resource_type(&self) -> &'static str {
        "ledger_reservation"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn release(&mut self) -> GuardResult<()> {
        if !self.active {
            return Err(GuardError::AlreadyReleased);
        }

        self.active = false;
        if let Some(ref ledger) = self.ledger {
            ledger.release(self.bytes);
            trace!(bytes = self.bytes, "reservation rolled back");
        }
        Ok(())
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.active {
            let _ = self.release();
        }
    }
}
