//! Remote synchronization layer.
//!
//! # Responsibility
//! - Define the contracts the core consumes from the server.
//! - Turn nested server payloads into flat store records.
//!
//! # Invariants
//! - Nothing in this module writes to the entity stores directly.

pub mod memory_remote;
pub mod normalizer;
pub mod records;
pub mod remote;
