use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::TargetRef;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::lock;
use crate::storage::TargetStorage;

#[derive(Default)]
struct TargetState {
    targets: Vec<TargetRef>,
    failing_dates: HashSet<NaiveDate>,
    fetched_dates: Vec<NaiveDate>,
}

/// Target service backed by a vector of targets
#[derive(Clone, Default)]
pub struct InMemoryTargetRepository {
    state: Arc<Mutex<TargetState>>,
}

impl InMemoryTargetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets(targets: Vec<TargetRef>) -> Self {
        let repository = Self::new();
        if let Ok(mut state) = lock(&repository.state) {
            state.targets = targets;
        }
        repository
    }

    pub fn add_target(&self, target: TargetRef) -> Result<()> {
        lock(&self.state)?.targets.push(target);
        Ok(())
    }

    /// Make `get_targets_for_date` fail for the given day
    pub fn fail_fetch_for(&self, date: NaiveDate) -> Result<()> {
        lock(&self.state)?.failing_dates.insert(date);
        Ok(())
    }

    /// Days passed to `get_targets_for_date`, in call order
    pub fn fetched_dates(&self) -> Vec<NaiveDate> {
        lock(&self.state)
            .map(|state| state.fetched_dates.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TargetStorage for InMemoryTargetRepository {
    async fn get_targets_for_date(&self, date: NaiveDate) -> Result<Vec<TargetRef>> {
        let mut state = lock(&self.state)?;
        state.fetched_dates.push(date);

        if state.failing_dates.contains(&date) {
            return Err(anyhow!("Target service unavailable for {}", date));
        }

        let targets: Vec<TargetRef> = state
            .targets
            .iter()
            .filter(|target| target.calendar_date() == Some(date))
            .cloned()
            .collect();
        debug!("Found {} targets for {}", targets.len(), date);
        Ok(targets)
    }

    async fn get_my_targets(&self) -> Result<Vec<TargetRef>> {
        Ok(lock(&self.state)?.targets.clone())
    }
}
