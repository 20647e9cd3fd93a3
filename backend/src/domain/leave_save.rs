//! # Leave Bulk Save
//!
//! Commits a [`LeaveSelectionSession`] against the leave and target services.
//!
//! ## Phases
//!
//! 1. **Removal**: one bulk-delete call for every id marked for removal.
//!    Failure aborts the commit before anything is created.
//! 2. **Validation**: every candidate day that is not a weekend gets its
//!    targets re-fetched, all days concurrently. Days that gained a target
//!    since they were selected are skipped. A failed fetch follows the
//!    configured [`RevalidationPolicy`].
//! 3. **Creation**: one bulk-create call for the remaining days, sharing the
//!    session's leave type and an optional note.
//!
//! On success the session is cleared and callers re-fetch the leave map for
//! the affected range; only counts and skip reasons are returned.

use anyhow::anyhow;
use chrono::NaiveDate;
use shared::{BulkCreateLeaveRequest, SaveResult, SkipReason, SkippedDay, TargetRef};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::{CalendarConfig, RevalidationPolicy};
use crate::domain::leave_selection::{LeaveSelectionSession, SessionPhase};
use crate::domain::notifications::{Notice, Notifier};
use crate::storage::{LeaveStorage, TargetStorage};

/// Phase of a commit that can fail as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePhase {
    Removal,
    Creation,
}

impl fmt::Display for SavePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SavePhase::Removal => write!(f, "removal"),
            SavePhase::Creation => write!(f, "creation"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LeaveSaveError {
    #[error("Failed to remove leave records: {0}")]
    RemovalFailed(#[source] anyhow::Error),
    #[error("Failed to create leave records ({removed} removed before the failure): {source}")]
    CreationFailed {
        removed: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error("There are no changes to save")]
    NothingToSave,
    #[error("Choose a leave type before saving new leave days")]
    MissingLeaveType,
    #[error("A save is already in progress")]
    SessionBusy,
}

impl LeaveSaveError {
    /// The phase that failed, for phase-level errors
    pub fn phase(&self) -> Option<SavePhase> {
        match self {
            LeaveSaveError::RemovalFailed(_) => Some(SavePhase::Removal),
            LeaveSaveError::CreationFailed { .. } => Some(SavePhase::Creation),
            _ => None,
        }
    }
}

/// Outcome of re-checking one candidate day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayCheck {
    Valid,
    Skip(SkipReason),
}

/// Service that commits leave selections
pub struct LeaveSaveService<T, L> {
    target_storage: Arc<T>,
    leave_storage: Arc<L>,
    notifier: Arc<dyn Notifier>,
    calendar: CalendarConfig,
    policy: RevalidationPolicy,
}

impl<T, L> Clone for LeaveSaveService<T, L> {
    fn clone(&self) -> Self {
        Self {
            target_storage: Arc::clone(&self.target_storage),
            leave_storage: Arc::clone(&self.leave_storage),
            notifier: Arc::clone(&self.notifier),
            calendar: self.calendar.clone(),
            policy: self.policy,
        }
    }
}

impl<T, L> LeaveSaveService<T, L>
where
    T: TargetStorage + 'static,
    L: LeaveStorage,
{
    pub fn new(
        target_storage: Arc<T>,
        leave_storage: Arc<L>,
        notifier: Arc<dyn Notifier>,
        calendar: CalendarConfig,
        policy: RevalidationPolicy,
    ) -> Self {
        Self {
            target_storage,
            leave_storage,
            notifier,
            calendar,
            policy,
        }
    }

    /// Commit the session. `note` is applied to every record created.
    ///
    /// On success the session is reset. On a removal failure it is left as it
    /// was; on a creation failure only the already-deleted removal ids are
    /// dropped from it. The same holds if the returned future is dropped
    /// before it completes.
    pub async fn commit(
        &self,
        session: &mut LeaveSelectionSession,
        note: Option<String>,
    ) -> Result<SaveResult, LeaveSaveError> {
        if session.phase() == SessionPhase::Saving {
            return Err(LeaveSaveError::SessionBusy);
        }
        if !session.has_changes() {
            return Err(LeaveSaveError::NothingToSave);
        }
        if !session.can_save() {
            return Err(LeaveSaveError::MissingLeaveType);
        }

        let mut guard = session.begin_save();
        let snapshot = guard.snapshot().clone();
        info!(
            "💾 Saving leave: {} removals, {} candidate days",
            snapshot.pending_removal_ids.len(),
            snapshot.candidate_dates.len()
        );

        let mut result = SaveResult::default();

        if !snapshot.pending_removal_ids.is_empty() {
            let ids: Vec<String> = snapshot.pending_removal_ids.iter().cloned().collect();
            match self.leave_storage.bulk_delete(&ids).await {
                Ok(removed) => {
                    info!("Removed {} leave records", removed);
                    result.removed = removed;
                    guard.mark_removals_applied();
                }
                Err(e) => {
                    error!("Bulk leave removal failed: {:?}", e);
                    guard.fail();
                    let err = LeaveSaveError::RemovalFailed(e);
                    self.notifier.notify(Notice::error(err.to_string()));
                    return Err(err);
                }
            }
        }

        if !snapshot.candidate_dates.is_empty() {
            let candidates: Vec<NaiveDate> = snapshot.candidate_dates.iter().copied().collect();
            let checks = self.revalidate(&candidates).await;

            let mut valid_dates = Vec::new();
            for date in candidates {
                match checks.get(&date).copied().unwrap_or(DayCheck::Valid) {
                    DayCheck::Valid => valid_dates.push(date),
                    DayCheck::Skip(reason) => result.skipped.push(SkippedDay { date, reason }),
                }
            }

            let leave_type = snapshot.chosen_leave_type.filter(|_| !valid_dates.is_empty());
            if let Some(leave_type) = leave_type {
                let request = BulkCreateLeaveRequest {
                    dates: valid_dates,
                    leave_type,
                    note,
                };
                match self.leave_storage.bulk_create(&request).await {
                    Ok(created) => {
                        info!("Created {} {} leave records", created.len(), leave_type);
                        result.created = created.len();
                    }
                    Err(e) => {
                        error!("Bulk leave creation failed: {:?}", e);
                        guard.fail();
                        let err = LeaveSaveError::CreationFailed {
                            removed: result.removed,
                            source: e,
                        };
                        self.notifier.notify(Notice::error(err.to_string()));
                        return Err(err);
                    }
                }
            }
        }

        guard.succeed();
        self.notify_result(&result);
        Ok(result)
    }

    /// Re-check every candidate. Weekends are decided locally without a
    /// fetch; other days are fetched concurrently and joined before returning.
    async fn revalidate(&self, candidates: &[NaiveDate]) -> BTreeMap<NaiveDate, DayCheck> {
        let mut checks = BTreeMap::new();
        let mut fetches: JoinSet<(NaiveDate, anyhow::Result<Vec<TargetRef>>)> = JoinSet::new();

        for &date in candidates {
            if self.calendar.is_weekend(date) {
                debug!("Skipping {}: weekend", date);
                checks.insert(date, DayCheck::Skip(SkipReason::Weekend));
                continue;
            }
            let target_storage = Arc::clone(&self.target_storage);
            fetches.spawn(async move {
                let targets = target_storage.get_targets_for_date(date).await;
                (date, targets)
            });
        }

        while let Some(joined) = fetches.join_next().await {
            let (date, fetched) = match joined {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    warn!("Target re-validation task failed: {}", join_error);
                    continue;
                }
            };
            checks.insert(date, self.check_fetched(date, fetched));
        }

        // A panicked task loses its date; treat those days like a failed fetch
        for &date in candidates {
            checks
                .entry(date)
                .or_insert_with(|| self.check_fetched(date, Err(anyhow!("re-validation task aborted"))));
        }

        checks
    }

    fn check_fetched(&self, date: NaiveDate, fetched: anyhow::Result<Vec<TargetRef>>) -> DayCheck {
        match fetched {
            Ok(targets) if targets.is_empty() => DayCheck::Valid,
            Ok(targets) => {
                debug!("Skipping {}: {} targets appeared", date, targets.len());
                DayCheck::Skip(SkipReason::HasTarget)
            }
            Err(e) => match self.policy {
                RevalidationPolicy::Optimistic => {
                    warn!("Could not re-validate {}, keeping it: {}", date, e);
                    DayCheck::Valid
                }
                RevalidationPolicy::Strict => {
                    warn!("Could not re-validate {}, skipping it: {}", date, e);
                    DayCheck::Skip(SkipReason::ValidationFailed)
                }
            },
        }
    }

    fn notify_result(&self, result: &SaveResult) {
        let mut parts = Vec::new();
        if result.created > 0 {
            parts.push(format!("{} leave day(s) added", result.created));
        }
        if result.removed > 0 {
            parts.push(format!("{} leave day(s) removed", result.removed));
        }

        if !parts.is_empty() {
            self.notifier.notify(Notice::success(parts.join(", ")));
        }
        if !result.skipped.is_empty() {
            let skipped: Vec<String> = result
                .skipped
                .iter()
                .map(|day| format!("{} ({})", day.date, day.reason))
                .collect();
            self.notifier
                .notify(Notice::warning(format!("Skipped: {}", skipped.join(", "))));
        }
    }
}
