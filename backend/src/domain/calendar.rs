//! Calendar domain logic for the target tracker.
//!
//! Builds the fixed six-week month grid and keeps the month the user is
//! currently looking at. Rendering layers only draw the cells produced here;
//! every date computation lives in this module.

use chrono::{Days, NaiveDate};
use shared::{CalendarDay, DateRange, YearMonth};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::config::CalendarConfig;
use crate::domain::clock::Clock;

/// Number of cells in every month grid (six rows of seven days)
pub const GRID_CELLS: usize = 42;

/// Calendar service that handles grid construction and month navigation
#[derive(Clone)]
pub struct CalendarService {
    config: CalendarConfig,
    clock: Arc<dyn Clock>,
    /// Month currently in view; kept in memory only
    focus: Arc<Mutex<YearMonth>>,
}

impl CalendarService {
    /// Create a calendar focused on the clock's current month
    pub fn new(config: CalendarConfig, clock: Arc<dyn Clock>) -> Self {
        let focus = YearMonth::of(clock.today());
        Self {
            config,
            clock,
            focus: Arc::new(Mutex::new(focus)),
        }
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        self.config.is_weekend(date)
    }

    /// Build the 42 cells shown for `month`, padded with trailing days of the
    /// previous month and leading days of the next one.
    pub fn build_grid(&self, month: YearMonth, selected: Option<NaiveDate>) -> Vec<CalendarDay> {
        let today = self.clock.today();
        let start = self.grid_start(month);

        let days: Vec<CalendarDay> = start
            .iter_days()
            .take(GRID_CELLS)
            .map(|date| CalendarDay {
                date,
                is_current_month: month.contains(date),
                is_today: date == today,
                is_selected_for_viewing: selected == Some(date),
            })
            .collect();

        debug!(
            "🗓️ Built grid for {}: {} cells starting {}",
            month,
            days.len(),
            start
        );
        days
    }

    /// Inclusive range of dates covered by the grid of `month`
    pub fn grid_range(&self, month: YearMonth) -> DateRange {
        let start = self.grid_start(month);
        let end = start
            .checked_add_days(Days::new(GRID_CELLS as u64 - 1))
            .unwrap_or(start);
        DateRange::new(start, end)
    }

    fn grid_start(&self, month: YearMonth) -> NaiveDate {
        let first = month.first_day();
        let leading = self.config.week_start.column_of(first);
        first
            .checked_sub_days(Days::new(u64::from(leading)))
            .unwrap_or(first)
    }

    /// Get the human-readable name for a month number
    pub fn month_name(&self, month: u32) -> &'static str {
        match month {
            1 => "January",
            2 => "February",
            3 => "March",
            4 => "April",
            5 => "May",
            6 => "June",
            7 => "July",
            8 => "August",
            9 => "September",
            10 => "October",
            11 => "November",
            12 => "December",
            _ => "Invalid Month",
        }
    }

    /// Title shown above the grid, e.g. "March 2025"
    pub fn month_title(&self, month: YearMonth) -> String {
        format!("{} {}", self.month_name(month.month()), month.year())
    }

    /// Get the month currently in view
    pub fn focus_date(&self) -> YearMonth {
        *self.focus.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the month in view
    pub fn set_focus_date(&self, month: u32, year: i32) -> Result<YearMonth, String> {
        let focus = YearMonth::new(year, month)
            .ok_or_else(|| format!("Invalid month: {}. Must be between 1 and 12", month))?;
        *self.focus.lock().unwrap_or_else(PoisonError::into_inner) = focus;
        Ok(focus)
    }

    /// Move the focus one month back
    pub fn navigate_previous_month(&self) -> YearMonth {
        let mut focus = self.focus.lock().unwrap_or_else(PoisonError::into_inner);
        *focus = focus.previous();
        *focus
    }

    /// Move the focus one month forward
    pub fn navigate_next_month(&self) -> YearMonth {
        let mut focus = self.focus.lock().unwrap_or_else(PoisonError::into_inner);
        *focus = focus.next();
        *focus
    }
}
