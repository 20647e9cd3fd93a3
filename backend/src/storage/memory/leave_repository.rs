use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{BulkCreateLeaveRequest, DateRange, LeaveRecord, LeaveType};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

use super::lock;
use crate::storage::LeaveStorage;

#[derive(Default)]
struct LeaveState {
    records: BTreeMap<NaiveDate, LeaveRecord>,
    fail_deletes: bool,
    fail_creates: bool,
    delete_calls: usize,
    create_calls: usize,
}

/// Leave service keeping at most one record per day
#[derive(Clone, Default)]
pub struct InMemoryLeaveRepository {
    state: Arc<Mutex<LeaveState>>,
}

impl InMemoryLeaveRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record directly, returning its generated id
    pub fn insert(&self, date: NaiveDate, leave_type: LeaveType) -> Result<String> {
        let mut state = lock(&self.state)?;
        if state.records.contains_key(&date) {
            bail!("Leave already recorded for {}", date);
        }
        let record = new_record(date, leave_type, None);
        let id = record.id.clone();
        state.records.insert(date, record);
        Ok(id)
    }

    pub fn set_fail_deletes(&self, fail: bool) -> Result<()> {
        lock(&self.state)?.fail_deletes = fail;
        Ok(())
    }

    pub fn set_fail_creates(&self, fail: bool) -> Result<()> {
        lock(&self.state)?.fail_creates = fail;
        Ok(())
    }

    pub fn records(&self) -> Vec<LeaveRecord> {
        lock(&self.state)
            .map(|state| state.records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn delete_calls(&self) -> usize {
        lock(&self.state).map(|state| state.delete_calls).unwrap_or_default()
    }

    pub fn create_calls(&self) -> usize {
        lock(&self.state).map(|state| state.create_calls).unwrap_or_default()
    }
}

fn new_record(date: NaiveDate, leave_type: LeaveType, note: Option<String>) -> LeaveRecord {
    LeaveRecord {
        id: format!("leave::{}", Uuid::new_v4()),
        date,
        leave_type,
        note,
    }
}

#[async_trait]
impl LeaveStorage for InMemoryLeaveRepository {
    async fn list_leaves(&self, range: DateRange) -> Result<Vec<LeaveRecord>> {
        let state = lock(&self.state)?;
        Ok(state
            .records
            .range(range.start..=range.end)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn bulk_delete(&self, ids: &[String]) -> Result<usize> {
        let mut state = lock(&self.state)?;
        state.delete_calls += 1;
        if state.fail_deletes {
            return Err(anyhow!("Leave service rejected bulk delete"));
        }

        let before = state.records.len();
        state.records.retain(|_, record| !ids.contains(&record.id));
        let deleted = before - state.records.len();
        info!("Deleted {} of {} requested leave records", deleted, ids.len());
        Ok(deleted)
    }

    async fn bulk_create(&self, request: &BulkCreateLeaveRequest) -> Result<Vec<LeaveRecord>> {
        let mut state = lock(&self.state)?;
        state.create_calls += 1;
        if state.fail_creates {
            return Err(anyhow!("Leave service rejected bulk create"));
        }

        // All-or-nothing: validate the whole batch before inserting
        if let Some(taken) = request.dates.iter().find(|date| state.records.contains_key(*date)) {
            bail!("Leave already recorded for {}", taken);
        }

        let created: Vec<LeaveRecord> = request
            .dates
            .iter()
            .map(|date| new_record(*date, request.leave_type, request.note.clone()))
            .collect();
        for record in &created {
            state.records.insert(record.date, record.clone());
        }
        info!("Created {} {} leave records", created.len(), request.leave_type);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let repo = InMemoryLeaveRepository::new();
        let request = BulkCreateLeaveRequest {
            dates: vec![date(10), date(11)],
            leave_type: LeaveType::Annual,
            note: Some("Family trip".to_string()),
        };

        let created = repo.bulk_create(&request).await.unwrap();
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|r| r.note.as_deref() == Some("Family trip")));

        let listed = repo.list_leaves(DateRange::new(date(11), date(31))).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].date, date(11));

        let ids = vec![created[0].id.clone(), "leave::missing".to_string()];
        assert_eq!(repo.bulk_delete(&ids).await.unwrap(), 1);
        assert_eq!(repo.records().len(), 1);
        assert_eq!(repo.delete_calls(), 1);
        assert_eq!(repo.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_taken_day() {
        let repo = InMemoryLeaveRepository::new();
        repo.insert(date(12), LeaveType::Sick).unwrap();

        let request = BulkCreateLeaveRequest {
            dates: vec![date(11), date(12)],
            leave_type: LeaveType::Annual,
            note: None,
        };
        assert!(repo.bulk_create(&request).await.is_err());
        // Nothing from the rejected batch was stored
        assert_eq!(repo.records().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let repo = InMemoryLeaveRepository::new();
        repo.set_fail_deletes(true).unwrap();
        repo.set_fail_creates(true).unwrap();

        assert!(repo.bulk_delete(&["x".to_string()]).await.is_err());
        let request = BulkCreateLeaveRequest {
            dates: vec![date(10)],
            leave_type: LeaveType::Annual,
            note: None,
        };
        assert!(repo.bulk_create(&request).await.is_err());
        assert!(repo.records().is_empty());
    }
}
