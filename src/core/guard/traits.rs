/*!
 * Guard Traits
 *
 * Core abstraction for RAII resource guards
 */

use super::GuardResult;

/// Core guard trait
///
/// All guards must implement this to provide:
/// - Resource type identification
/// - Manual release capability
pub trait Guard {
    /// Resource type name for logging/debugging
    fn resource_type(&self) -> &'static str;

    /// Check if guard is still active
    fn is_active(&self) -> bool;

    /// Manually release the resource
    ///
    /// Returns `Err` if already released
    fn release(&mut self) -> GuardResult<()>;
}
