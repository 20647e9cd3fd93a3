//! Overlay of targets and leave records onto the month grid.
//!
//! Composition is a pure function of its inputs: the same grid, targets and
//! leave map always produce the same decorated cells, so it can be rerun on
//! every render.

use chrono::NaiveDate;
use shared::{CalendarDay, DecoratedDay, LeaveRecord, TargetRef, TargetStatus};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::config::CalendarConfig;

/// Leave records keyed by their calendar day
pub type LeaveMap = BTreeMap<NaiveDate, LeaveRecord>;

/// Merges target and leave data into grid cells
#[derive(Debug, Clone, Default)]
pub struct DayStateComposer {
    calendar: CalendarConfig,
}

impl DayStateComposer {
    pub fn new(calendar: CalendarConfig) -> Self {
        Self { calendar }
    }

    /// Decorate every cell with its targets, aggregate status and leave
    pub fn compose(
        &self,
        days: &[CalendarDay],
        targets: &[TargetRef],
        leave_map: &LeaveMap,
    ) -> Vec<DecoratedDay> {
        let targets_by_day = group_targets_by_day(targets);

        days.iter()
            .map(|day| {
                let day_targets = targets_by_day.get(&day.date).cloned().unwrap_or_default();
                let aggregate_status = aggregate_status(&day_targets);
                DecoratedDay {
                    day: day.clone(),
                    is_weekend: self.calendar.is_weekend(day.date),
                    targets: day_targets,
                    aggregate_status,
                    leave: leave_map.get(&day.date).cloned(),
                }
            })
            .collect()
    }
}

/// Group targets by the calendar day written in their timestamp, keeping the
/// input order within each day
fn group_targets_by_day(targets: &[TargetRef]) -> HashMap<NaiveDate, Vec<TargetRef>> {
    let mut targets_by_day: HashMap<NaiveDate, Vec<TargetRef>> = HashMap::new();

    for target in targets {
        match target.calendar_date() {
            Some(date) => targets_by_day.entry(date).or_default().push(target.clone()),
            None => warn!("Ignoring target {} with unparseable date {:?}", target.id, target.date),
        }
    }

    targets_by_day
}

/// Best status present on a day: REACHED over PARTIAL over FAILED over NOT_SET.
/// `None` when the day has no targets.
pub fn aggregate_status(targets: &[TargetRef]) -> Option<TargetStatus> {
    targets.iter().map(|target| target.status).fold(None, |best, status| match best {
        Some(current) if current.display_rank() >= status.display_rank() => Some(current),
        _ => Some(status),
    })
}

/// Index leave records by day. The leave service guarantees one record per
/// day; should it ever send two, the later one wins.
pub fn build_leave_map(records: impl IntoIterator<Item = LeaveRecord>) -> LeaveMap {
    let mut leave_map = LeaveMap::new();
    for record in records {
        let date = record.date;
        if let Some(previous) = leave_map.insert(date, record) {
            warn!("Duplicate leave for {}: replacing record {}", date, previous.id);
        }
    }
    leave_map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::CalendarService;
    use crate::domain::clock::FixedClock;
    use shared::{LeaveType, YearMonth};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn target(id: &str, timestamp: &str, status: TargetStatus) -> TargetRef {
        TargetRef {
            id: id.to_string(),
            project: "Hospital BIM".to_string(),
            date: timestamp.to_string(),
            status,
            description: None,
        }
    }

    fn leave(id: &str, day: NaiveDate, leave_type: LeaveType) -> LeaveRecord {
        LeaveRecord {
            id: id.to_string(),
            date: day,
            leave_type,
            note: None,
        }
    }

    fn march_grid() -> Vec<CalendarDay> {
        let service = CalendarService::new(
            CalendarConfig::default(),
            Arc::new(FixedClock(date(2025, 3, 10))),
        );
        service.build_grid(YearMonth::new(2025, 3).unwrap(), None)
    }

    fn cell(days: &[DecoratedDay], day: NaiveDate) -> &DecoratedDay {
        days.iter().find(|d| d.date() == day).unwrap()
    }

    #[test]
    fn test_aggregate_status_priority() {
        assert_eq!(aggregate_status(&[]), None);

        let mixed = vec![
            target("a", "2025-03-10T08:00:00Z", TargetStatus::Failed),
            target("b", "2025-03-10T09:00:00Z", TargetStatus::Reached),
            target("c", "2025-03-10T10:00:00Z", TargetStatus::Partial),
        ];
        assert_eq!(aggregate_status(&mixed), Some(TargetStatus::Reached));

        let weak = vec![
            target("a", "2025-03-10T08:00:00Z", TargetStatus::NotSet),
            target("b", "2025-03-10T09:00:00Z", TargetStatus::Failed),
        ];
        assert_eq!(aggregate_status(&weak), Some(TargetStatus::Failed));

        let unset = vec![target("a", "2025-03-10T08:00:00Z", TargetStatus::NotSet)];
        assert_eq!(aggregate_status(&unset), Some(TargetStatus::NotSet));
    }

    #[test]
    fn test_compose_attaches_targets_and_leave() {
        let grid = march_grid();
        let targets = vec![
            target("t1", "2025-03-10T08:00:00+01:00", TargetStatus::Partial),
            target("t2", "2025-03-10T16:00:00+01:00", TargetStatus::Reached),
            target("t3", "2025-03-12T08:00:00+01:00", TargetStatus::Failed),
        ];
        let leave_map = build_leave_map(vec![leave("l1", date(2025, 3, 14), LeaveType::Annual)]);

        let composer = DayStateComposer::default();
        let days = composer.compose(&grid, &targets, &leave_map);
        assert_eq!(days.len(), grid.len());

        let monday = cell(&days, date(2025, 3, 10));
        let ids: Vec<&str> = monday.targets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(monday.aggregate_status, Some(TargetStatus::Reached));
        assert!(monday.leave.is_none());

        let friday = cell(&days, date(2025, 3, 14));
        assert!(friday.targets.is_empty());
        assert_eq!(friday.aggregate_status, None);
        assert_eq!(friday.leave.as_ref().map(|l| l.id.as_str()), Some("l1"));

        let saturday = cell(&days, date(2025, 3, 15));
        assert!(saturday.is_weekend);
        assert!(!monday.is_weekend);
    }

    #[test]
    fn test_compose_uses_written_date_not_utc() {
        let grid = march_grid();
        // Late evening west of UTC: the UTC instant is already the next day
        let targets = vec![target("late", "2025-03-10T22:30:00-07:00", TargetStatus::Reached)];

        let days = DayStateComposer::default().compose(&grid, &targets, &LeaveMap::new());

        assert_eq!(cell(&days, date(2025, 3, 10)).targets.len(), 1);
        assert!(cell(&days, date(2025, 3, 11)).targets.is_empty());
    }

    #[test]
    fn test_compose_accepts_space_separated_timestamps() {
        let grid = march_grid();
        let targets = vec![target("plain", "2025-03-10 08:00:00", TargetStatus::Partial)];

        let days = DayStateComposer::default().compose(&grid, &targets, &LeaveMap::new());

        let monday = cell(&days, date(2025, 3, 10));
        assert_eq!(monday.targets.len(), 1);
        assert!(monday.facts().has_target);
    }

    #[test]
    fn test_compose_covers_padding_cells() {
        let grid = march_grid();
        let targets = vec![target("feb", "2025-02-24T08:00:00Z", TargetStatus::Reached)];
        let leave_map = build_leave_map(vec![leave("apr", date(2025, 4, 4), LeaveType::Sick)]);

        let days = DayStateComposer::default().compose(&grid, &targets, &leave_map);

        assert_eq!(days[0].targets.len(), 1);
        assert!(cell(&days, date(2025, 4, 4)).leave.is_some());
    }

    #[test]
    fn test_compose_is_idempotent() {
        let grid = march_grid();
        let targets = vec![
            target("t1", "2025-03-03T08:00:00Z", TargetStatus::NotSet),
            target("bad", "not a date", TargetStatus::Reached),
        ];
        let leave_map = build_leave_map(vec![leave("l1", date(2025, 3, 5), LeaveType::Assignment)]);
        let composer = DayStateComposer::default();

        let first = composer.compose(&grid, &targets, &leave_map);
        let second = composer.compose(&grid, &targets, &leave_map);
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_leave_map_last_wins() {
        let day = date(2025, 3, 5);
        let leave_map = build_leave_map(vec![
            leave("first", day, LeaveType::Annual),
            leave("second", day, LeaveType::Sick),
        ]);
        assert_eq!(leave_map.len(), 1);
        assert_eq!(leave_map[&day].id, "second");
    }

    #[test]
    fn test_facts_from_decorated_day() {
        let grid = march_grid();
        let targets = vec![target("t1", "2025-03-11T08:00:00Z", TargetStatus::Reached)];
        let leave_map = build_leave_map(vec![leave("l1", date(2025, 3, 12), LeaveType::Annual)]);
        let days = DayStateComposer::default().compose(&grid, &targets, &leave_map);

        let with_target = cell(&days, date(2025, 3, 11)).facts();
        assert!(with_target.has_target);
        assert!(!with_target.is_weekend);

        let with_leave = cell(&days, date(2025, 3, 12)).facts();
        assert_eq!(with_leave.existing_leave_id.as_deref(), Some("l1"));

        let sunday = cell(&days, date(2025, 3, 16)).facts();
        assert!(sunday.is_weekend);
    }
}
