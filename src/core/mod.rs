/*!
 * Core Module
 * Arena types, configuration and error handling
 */

pub mod config;
pub mod errors;
pub mod guard;
pub mod limits;
pub mod memory;

// Re-export for convenience
pub use config::ArenaConfig;
pub use errors::*;
pub use memory::*;
