use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical `YYYY-MM-DD` key for a calendar day
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` key back into a calendar date
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d").ok()
}

/// Kind of leave a user can record for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveType {
    Annual,
    Sick,
    Assignment,
}

impl LeaveType {
    pub const ALL: [LeaveType; 3] = [LeaveType::Annual, LeaveType::Sick, LeaveType::Assignment];
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            LeaveType::Annual => "ANNUAL",
            LeaveType::Sick => "SICK",
            LeaveType::Assignment => "ASSIGNMENT",
        };
        write!(f, "{}", code)
    }
}

/// A recorded day off. Owned by the leave service; one record per date per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRecord {
    pub id: String,
    /// Calendar day the leave applies to (serialized as `YYYY-MM-DD`)
    pub date: NaiveDate,
    pub leave_type: LeaveType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Goal status logged against a daily target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetStatus {
    Reached,
    Partial,
    Failed,
    NotSet,
}

impl TargetStatus {
    /// Display priority, higher wins when several statuses share a day
    pub fn display_rank(&self) -> u8 {
        match self {
            TargetStatus::Reached => 3,
            TargetStatus::Partial => 2,
            TargetStatus::Failed => 1,
            TargetStatus::NotSet => 0,
        }
    }
}

/// A daily work target as returned by the target query service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    pub id: String,
    pub project: String,
    /// Timestamp with offset (RFC 3339), e.g. "2025-03-10T08:00:00+01:00"
    pub date: String,
    pub status: TargetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TargetRef {
    /// Calendar day of the target, read from the leading `YYYY-MM-DD` of the
    /// timestamp whatever separator follows. No offset conversion is applied.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.date.trim_start().get(..10).and_then(parse_date_key)
    }
}

#[derive(Serialize, Deserialize)]
struct YearMonthRepr {
    year: i32,
    month: u32,
}

/// A calendar month. Always refers to a representable first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "YearMonthRepr", try_from = "YearMonthRepr")]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    /// Month from a 1-based month number; `None` when the month is out of range
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    /// Month from a zero-based month index that may overflow in either
    /// direction: index -1 is December of the previous year, 12 is January
    /// of the next one.
    pub fn normalized(year: i32, month_index: i32) -> Option<Self> {
        let total = i64::from(year) * 12 + i64::from(month_index);
        let normalized_year = i32::try_from(total.div_euclid(12)).ok()?;
        let normalized_month = total.rem_euclid(12) as u32 + 1;
        Self::new(normalized_year, normalized_month)
    }

    /// Month containing the given date
    pub fn of(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    /// 1-based month number
    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first
            .checked_add_months(Months::new(1))
            .and_then(|next_first| next_first.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// Previous month; stays put at the lower edge of the representable range
    pub fn previous(&self) -> Self {
        Self::normalized(self.year(), self.month() as i32 - 2).unwrap_or(*self)
    }

    /// Next month; stays put at the upper edge of the representable range
    pub fn next(&self) -> Self {
        Self::normalized(self.year(), self.month() as i32).unwrap_or(*self)
    }
}

impl From<YearMonth> for YearMonthRepr {
    fn from(value: YearMonth) -> Self {
        Self {
            year: value.year(),
            month: value.month(),
        }
    }
}

impl TryFrom<YearMonthRepr> for YearMonth {
    type Error = String;

    fn try_from(value: YearMonthRepr) -> Result<Self, Self::Error> {
        YearMonth::new(value.year, value.month)
            .ok_or_else(|| format!("Invalid month: {}-{}", value.year, value.month))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days in the range, both ends included
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// One cell of the fixed 6x7 month grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_current_month: bool,
    pub is_today: bool,
    pub is_selected_for_viewing: bool,
}

impl CalendarDay {
    pub fn date_key(&self) -> String {
        date_key(self.date)
    }
}

/// Per-day facts the leave selection rules are evaluated against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayFacts {
    pub date: NaiveDate,
    pub is_weekend: bool,
    pub has_target: bool,
    /// Id of the leave record already on this day, if any
    pub existing_leave_id: Option<String>,
}

/// A grid cell annotated with its targets and leave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoratedDay {
    pub day: CalendarDay,
    pub is_weekend: bool,
    /// Targets of this day, in the order the target service returned them
    pub targets: Vec<TargetRef>,
    /// Best status present; informational only
    pub aggregate_status: Option<TargetStatus>,
    pub leave: Option<LeaveRecord>,
}

impl DecoratedDay {
    pub fn date(&self) -> NaiveDate {
        self.day.date
    }

    pub fn has_target(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn facts(&self) -> DayFacts {
        DayFacts {
            date: self.day.date,
            is_weekend: self.is_weekend,
            has_target: self.has_target(),
            existing_leave_id: self.leave.as_ref().map(|leave| leave.id.clone()),
        }
    }
}

/// Payload of the leave service bulk-create call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCreateLeaveRequest {
    pub dates: Vec<NaiveDate>,
    pub leave_type: LeaveType,
    /// Applied to every record created by the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Why a candidate day was left out of a bulk create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    HasTarget,
    Weekend,
    ValidationFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::HasTarget => "has_target",
            SkipReason::Weekend => "weekend",
            SkipReason::ValidationFailed => "validation_failed",
        };
        write!(f, "{}", reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDay {
    pub date: NaiveDate,
    pub reason: SkipReason,
}

/// Outcome of committing a leave selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResult {
    pub removed: usize,
    pub created: usize,
    /// Skipped candidates in date order
    pub skipped: Vec<SkippedDay>,
}

/// Progress counters for the current-month cells of a grid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub reached_days: u32,
    pub partial_days: u32,
    pub failed_days: u32,
    pub not_set_days: u32,
    pub annual_leave_days: u32,
    pub sick_leave_days: u32,
    pub assignment_leave_days: u32,
    /// Working days up to today with neither a target nor leave
    pub missing_days: Vec<NaiveDate>,
}

impl MonthSummary {
    pub fn leave_days(&self, leave_type: LeaveType) -> u32 {
        match leave_type {
            LeaveType::Annual => self.annual_leave_days,
            LeaveType::Sick => self.sick_leave_days,
            LeaveType::Assignment => self.assignment_leave_days,
        }
    }
}

/// A fully loaded month ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonthView {
    pub year_month: YearMonth,
    pub days: Vec<DecoratedDay>,
    pub summary: MonthSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_key_round_trip() {
        assert_eq!(date_key(date(2025, 3, 9)), "2025-03-09");
        assert_eq!(parse_date_key("2025-03-09"), Some(date(2025, 3, 9)));
        assert_eq!(parse_date_key("2025-13-09"), None);
    }

    #[test]
    fn test_target_calendar_date_ignores_offset() {
        let target = TargetRef {
            id: "t1".to_string(),
            project: "Tower A".to_string(),
            date: "2025-03-10T23:30:00-05:00".to_string(),
            status: TargetStatus::Reached,
            description: None,
        };
        // 04:30 UTC on the 11th, but the stored local day is the 10th
        assert_eq!(target.calendar_date(), Some(date(2025, 3, 10)));

        let bare = TargetRef { date: "2025-03-10".to_string(), ..target.clone() };
        assert_eq!(bare.calendar_date(), Some(date(2025, 3, 10)));

        let spaced = TargetRef { date: "2025-03-10 08:00:00".to_string(), ..target.clone() };
        assert_eq!(spaced.calendar_date(), Some(date(2025, 3, 10)));

        let broken = TargetRef { date: "yesterday".to_string(), ..target.clone() };
        assert_eq!(broken.calendar_date(), None);

        let truncated = TargetRef { date: "2025-03".to_string(), ..target };
        assert_eq!(truncated.calendar_date(), None);
    }

    #[test]
    fn test_year_month_normalization() {
        let december = YearMonth::normalized(2025, -1).unwrap();
        assert_eq!((december.year(), december.month()), (2024, 12));

        let january = YearMonth::normalized(2025, 12).unwrap();
        assert_eq!((january.year(), january.month()), (2026, 1));

        let march = YearMonth::normalized(2025, 2).unwrap();
        assert_eq!((march.year(), march.month()), (2025, 3));

        let far_back = YearMonth::normalized(2025, -25).unwrap();
        assert_eq!((far_back.year(), far_back.month()), (2022, 12));

        assert!(YearMonth::new(2025, 0).is_none());
        assert!(YearMonth::new(2025, 13).is_none());
    }

    #[test]
    fn test_year_month_navigation_and_bounds() {
        let january = YearMonth::new(2025, 1).unwrap();
        assert_eq!(january.previous(), YearMonth::new(2024, 12).unwrap());
        assert_eq!(january.next(), YearMonth::new(2025, 2).unwrap());
        assert_eq!(YearMonth::new(2025, 12).unwrap().next(), YearMonth::new(2026, 1).unwrap());

        let february = YearMonth::new(2024, 2).unwrap();
        assert_eq!(february.days_in_month(), 29);
        assert_eq!(february.last_day(), date(2024, 2, 29));
        assert!(february.contains(date(2024, 2, 10)));
        assert!(!february.contains(date(2025, 2, 10)));
        assert_eq!(YearMonth::of(date(2024, 2, 17)), february);
    }

    #[test]
    fn test_month_lengths() {
        let days = |y, m| YearMonth::new(y, m).unwrap().days_in_month();
        assert_eq!(days(2025, 2), 28);
        assert_eq!(days(2024, 2), 29);
        assert_eq!(days(1900, 2), 28);
        assert_eq!(days(2000, 2), 29);
        assert_eq!(days(2025, 4), 30);
        assert_eq!(days(2025, 12), 31);
        assert_eq!(YearMonth::new(2025, 12).unwrap().last_day(), date(2025, 12, 31));
    }

    #[test]
    fn test_year_month_serde() {
        let month = YearMonth::new(2025, 3).unwrap();
        let json = serde_json::to_string(&month).unwrap();
        assert_eq!(json, r#"{"year":2025,"month":3}"#);
        let back: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, month);
        assert!(serde_json::from_str::<YearMonth>(r#"{"year":2025,"month":14}"#).is_err());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&SkipReason::HasTarget).unwrap(), r#""has_target""#);
        assert_eq!(serde_json::to_string(&LeaveType::Assignment).unwrap(), r#""ASSIGNMENT""#);
        assert_eq!(serde_json::to_string(&TargetStatus::NotSet).unwrap(), r#""NOT_SET""#);
        assert_eq!(SkipReason::Weekend.to_string(), "weekend");
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::new(date(2025, 3, 31), date(2025, 3, 1));
        assert_eq!(range.start, date(2025, 3, 1));
        assert_eq!(range.len_days(), 31);
        assert!(range.contains(date(2025, 3, 15)));
        assert!(!range.contains(date(2025, 4, 1)));
    }

    #[test]
    fn test_decorated_day_facts() {
        let day = DecoratedDay {
            day: CalendarDay {
                date: date(2025, 3, 10),
                is_current_month: true,
                is_today: false,
                is_selected_for_viewing: false,
            },
            is_weekend: false,
            targets: Vec::new(),
            aggregate_status: None,
            leave: Some(LeaveRecord {
                id: "leave-1".to_string(),
                date: date(2025, 3, 10),
                leave_type: LeaveType::Sick,
                note: None,
            }),
        };

        let facts = day.facts();
        assert!(!facts.has_target);
        assert_eq!(facts.existing_leave_id.as_deref(), Some("leave-1"));
    }
}
