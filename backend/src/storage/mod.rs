//! # Storage Module
//!
//! Abstractions over the externally owned target and leave services, plus
//! in-memory implementations used by tests and local demos.
//!
//! - **traits**: `TargetStorage` and `LeaveStorage`, the seams the domain depends on
//! - **memory**: thread-safe in-memory repositories with failure injection

pub mod memory;
pub mod traits;

pub use memory::{InMemoryLeaveRepository, InMemoryTargetRepository};
pub use traits::{LeaveStorage, TargetStorage};
