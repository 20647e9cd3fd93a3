//! In-memory repositories.
//!
//! Both repositories are cheap to clone; clones share the same underlying
//! data, so a test can keep a handle while the services own another.

pub mod leave_repository;
pub mod target_repository;

pub use leave_repository::InMemoryLeaveRepository;
pub use target_repository::InMemoryTargetRepository;

use anyhow::{anyhow, Result};
use std::sync::{Mutex, MutexGuard};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| anyhow!("In-memory store lock poisoned"))
}
