//! # Storage Traits
//!
//! Collaborator interfaces the domain layer talks to. The target and leave
//! services are owned elsewhere (usually behind REST); the domain only sees
//! these traits, so any transport can be plugged in.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{BulkCreateLeaveRequest, DateRange, LeaveRecord, TargetRef};

/// Read access to daily work targets
#[async_trait]
pub trait TargetStorage: Send + Sync {
    /// Targets logged for one calendar day
    async fn get_targets_for_date(&self, date: NaiveDate) -> Result<Vec<TargetRef>>;

    /// Every target of the current user
    async fn get_my_targets(&self) -> Result<Vec<TargetRef>>;
}

/// Leave records of the current user
#[async_trait]
pub trait LeaveStorage: Send + Sync {
    /// Leave records whose date falls inside `range` (inclusive)
    async fn list_leaves(&self, range: DateRange) -> Result<Vec<LeaveRecord>>;

    /// Delete all given records in one call
    /// Returns the number of records actually deleted
    async fn bulk_delete(&self, ids: &[String]) -> Result<usize>;

    /// Create one record per requested date
    async fn bulk_create(&self, request: &BulkCreateLeaveRequest) -> Result<Vec<LeaveRecord>>;
}
