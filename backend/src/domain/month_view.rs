//! Month loading for the calendar view.
//!
//! Fetches the user's targets and the leave records covering the grid, then
//! hands everything to the composer. Also derives the per-month progress
//! summary shown next to the calendar.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use shared::{CalendarMonthView, DecoratedDay, LeaveType, MonthSummary, TargetStatus, YearMonth};
use std::sync::Arc;
use tracing::info;

use crate::domain::calendar::CalendarService;
use crate::domain::day_state::{build_leave_map, DayStateComposer};
use crate::storage::{LeaveStorage, TargetStorage};

pub struct MonthViewService<T, L> {
    calendar: CalendarService,
    composer: DayStateComposer,
    target_storage: Arc<T>,
    leave_storage: Arc<L>,
}

impl<T, L> MonthViewService<T, L>
where
    T: TargetStorage,
    L: LeaveStorage,
{
    pub fn new(calendar: CalendarService, target_storage: Arc<T>, leave_storage: Arc<L>) -> Self {
        let composer = DayStateComposer::new(calendar.config().clone());
        Self {
            calendar,
            composer,
            target_storage,
            leave_storage,
        }
    }

    pub fn calendar(&self) -> &CalendarService {
        &self.calendar
    }

    /// Build and decorate the grid for `month`
    pub async fn load_month(
        &self,
        month: YearMonth,
        selected: Option<NaiveDate>,
    ) -> Result<CalendarMonthView> {
        let grid = self.calendar.build_grid(month, selected);
        let range = self.calendar.grid_range(month);

        let targets = self
            .target_storage
            .get_my_targets()
            .await
            .context("Failed to load targets")?;
        let leaves = self
            .leave_storage
            .list_leaves(range)
            .await
            .with_context(|| format!("Failed to load leave for {} to {}", range.start, range.end))?;

        let leave_map = build_leave_map(leaves);
        let days = self.composer.compose(&grid, &targets, &leave_map);
        let summary = summarize(&days, self.calendar.today());

        info!(
            "🗓️ Loaded {}: {} targets, {} leave days, {} missing days",
            month,
            targets.len(),
            leave_map.len(),
            summary.missing_days.len()
        );

        Ok(CalendarMonthView {
            year_month: month,
            days,
            summary,
        })
    }

    /// Load the month the calendar is focused on
    pub async fn load_focused_month(&self, selected: Option<NaiveDate>) -> Result<CalendarMonthView> {
        self.load_month(self.calendar.focus_date(), selected).await
    }
}

/// Count statuses and leave over current-month cells. Missing days are
/// working days up to `today` with neither a target nor leave.
pub fn summarize(days: &[DecoratedDay], today: NaiveDate) -> MonthSummary {
    let mut summary = MonthSummary::default();

    for day in days.iter().filter(|d| d.day.is_current_month) {
        match day.aggregate_status {
            Some(TargetStatus::Reached) => summary.reached_days += 1,
            Some(TargetStatus::Partial) => summary.partial_days += 1,
            Some(TargetStatus::Failed) => summary.failed_days += 1,
            Some(TargetStatus::NotSet) => summary.not_set_days += 1,
            None => {}
        }

        match day.leave.as_ref().map(|leave| leave.leave_type) {
            Some(LeaveType::Annual) => summary.annual_leave_days += 1,
            Some(LeaveType::Sick) => summary.sick_leave_days += 1,
            Some(LeaveType::Assignment) => summary.assignment_leave_days += 1,
            None => {}
        }

        if !day.is_weekend && day.date() <= today && !day.has_target() && day.leave.is_none() {
            summary.missing_days.push(day.date());
        }
    }

    summary
}
