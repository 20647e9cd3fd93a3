//! Edit-mode leave selection.
//!
//! A `LeaveSelectionSession` tracks which days the user wants to put on leave,
//! which existing leave records are marked for deletion, and the leave type
//! the new records will get. It enforces the eligibility rules at toggle time;
//! the save transaction re-checks targets against fresh data at commit time.
//!
//! ## Rules
//!
//! - Weekend days never become candidates
//! - Days with at least one target never become candidates
//! - A day carrying leave becomes a candidate only once that leave is marked
//!   for removal; un-marking the removal evicts the candidate again
//! - A leave type must be chosen before any day is added
//! - While a save is in flight every mutation is rejected; a save that is
//!   dropped before finishing unfreezes the session

use chrono::NaiveDate;
use shared::{DayFacts, LeaveType};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Why a day cannot be added to the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IneligibleDay {
    #[error("Leave cannot be placed on a weekend")]
    Weekend,
    #[error("This day already has a target")]
    HasTarget,
    #[error("This day already has leave; mark it for removal first")]
    AlreadyOnLeave,
    #[error("Choose a leave type first")]
    NoLeaveType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Changes are being saved")]
    Saving,
    #[error(transparent)]
    Ineligible(#[from] IneligibleDay),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Dirty,
    Saving,
}

/// Snapshot of the session's editable state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub candidate_dates: BTreeSet<NaiveDate>,
    pub chosen_leave_type: Option<LeaveType>,
    pub pending_removal_ids: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct LeaveSelectionSession {
    state: SelectionState,
    /// Candidates admitted because the leave on their day is marked for
    /// removal, keyed by that leave's id
    replacements: HashMap<String, NaiveDate>,
    saving: bool,
}

impl LeaveSelectionSession {
    /// Empty session, as created when edit mode is entered
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        if self.saving {
            SessionPhase::Saving
        } else if self.has_changes() {
            SessionPhase::Dirty
        } else {
            SessionPhase::Idle
        }
    }

    pub fn is_candidate(&self, date: NaiveDate) -> bool {
        self.state.candidate_dates.contains(&date)
    }

    pub fn is_marked_for_removal(&self, leave_id: &str) -> bool {
        self.state.pending_removal_ids.contains(leave_id)
    }

    /// Replace the leave type. Existing candidates are kept.
    pub fn set_leave_type(&mut self, leave_type: Option<LeaveType>) -> Result<(), SelectionError> {
        self.ensure_editable()?;
        self.state.chosen_leave_type = leave_type;
        Ok(())
    }

    /// Add the day to the candidates, or drop it if it is already one.
    /// Dropping is always allowed; adding is checked against `facts`.
    pub fn toggle_day(&mut self, facts: &DayFacts) -> Result<ToggleOutcome, SelectionError> {
        self.ensure_editable()?;

        let date = facts.date;
        if self.state.candidate_dates.remove(&date) {
            self.replacements.retain(|_, candidate| *candidate != date);
            debug!("Deselected {} for leave", date);
            return Ok(ToggleOutcome::Removed);
        }

        self.check_eligible(facts)?;

        self.state.candidate_dates.insert(date);
        if let Some(leave_id) = &facts.existing_leave_id {
            self.replacements.insert(leave_id.clone(), date);
        }
        debug!("Selected {} for leave", date);
        Ok(ToggleOutcome::Added)
    }

    fn check_eligible(&self, facts: &DayFacts) -> Result<(), IneligibleDay> {
        if facts.is_weekend {
            return Err(IneligibleDay::Weekend);
        }
        if facts.has_target {
            return Err(IneligibleDay::HasTarget);
        }
        if let Some(leave_id) = &facts.existing_leave_id {
            if !self.state.pending_removal_ids.contains(leave_id) {
                return Err(IneligibleDay::AlreadyOnLeave);
            }
        }
        if self.state.chosen_leave_type.is_none() {
            return Err(IneligibleDay::NoLeaveType);
        }
        Ok(())
    }

    /// Mark or unmark an existing leave record for deletion.
    /// Returns whether the record is marked afterwards.
    pub fn toggle_removal(&mut self, leave_id: &str) -> Result<bool, SelectionError> {
        self.ensure_editable()?;

        if self.state.pending_removal_ids.remove(leave_id) {
            if let Some(date) = self.replacements.remove(leave_id) {
                self.state.candidate_dates.remove(&date);
                debug!("Dropped candidate {} after unmarking leave {}", date, leave_id);
            }
            Ok(false)
        } else {
            self.state.pending_removal_ids.insert(leave_id.to_string());
            Ok(true)
        }
    }

    /// Discard every change and the chosen leave type
    pub fn reset(&mut self) -> Result<(), SelectionError> {
        self.ensure_editable()?;
        self.clear();
        Ok(())
    }

    pub fn has_changes(&self) -> bool {
        !self.state.candidate_dates.is_empty() || !self.state.pending_removal_ids.is_empty()
    }

    /// Removal-only saves need no leave type
    pub fn can_save(&self) -> bool {
        self.has_changes()
            && (self.state.chosen_leave_type.is_some() || self.state.candidate_dates.is_empty())
    }

    fn ensure_editable(&self) -> Result<(), SelectionError> {
        if self.saving {
            Err(SelectionError::Saving)
        } else {
            Ok(())
        }
    }

    fn clear(&mut self) {
        self.state = SelectionState::default();
        self.replacements.clear();
    }

    /// Freeze the session for a save. The session stays frozen until the
    /// returned guard is finished or dropped.
    pub(crate) fn begin_save(&mut self) -> SaveGuard<'_> {
        self.saving = true;
        let snapshot = self.state.clone();
        SaveGuard {
            session: self,
            snapshot,
            removals_applied: false,
        }
    }
}

/// Exclusive hold on a session for the length of one save.
///
/// Dropping the guard without `succeed` (a failed phase, or a commit future
/// cancelled mid-flight) returns the session to editing with its changes
/// intact, minus any removal ids that were already applied.
pub(crate) struct SaveGuard<'a> {
    session: &'a mut LeaveSelectionSession,
    snapshot: SelectionState,
    removals_applied: bool,
}

impl SaveGuard<'_> {
    /// State captured when the save began
    pub(crate) fn snapshot(&self) -> &SelectionState {
        &self.snapshot
    }

    pub(crate) fn session(&self) -> &LeaveSelectionSession {
        &*self.session
    }

    /// The removal phase went through; a retry must not repeat it
    pub(crate) fn mark_removals_applied(&mut self) {
        self.removals_applied = true;
    }

    pub(crate) fn succeed(mut self) {
        self.session.saving = false;
        self.session.clear();
    }

    pub(crate) fn fail(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.session.saving = false;
        if self.removals_applied {
            self.session.state.pending_removal_ids.clear();
            self.session.replacements.clear();
        }
    }
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        if self.session.saving {
            warn!("Leave save abandoned before completion, session unfrozen");
            self.release();
        }
    }
}
