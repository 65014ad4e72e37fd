//! Month and week grids for calendar display.
//!
//! Weeks start on Sunday. A month grid always has 6 rows of 7 days so its
//! height does not jump between months.

use chrono::{Datelike, Duration, NaiveDate};

use crate::query::{CalendarMeeting, DateWindow};

pub const GRID_DAYS: usize = 42;

pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// The 7 days of the week containing `cursor`.
pub fn week_days(cursor: NaiveDate) -> Vec<NaiveDate> {
    start_of_week(cursor).iter_days().take(7).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub meetings: Vec<CalendarMeeting>,
}

#[derive(Debug, Clone)]
pub struct MonthGrid {
    pub month: DateWindow,
    pub cells: Vec<DayCell>,
}

impl MonthGrid {
    pub fn new(cursor: NaiveDate, meetings: &[CalendarMeeting]) -> Self {
        let month = DateWindow::month_of(cursor);
        let first = start_of_week(month.from);

        let cells = first
            .iter_days()
            .take(GRID_DAYS)
            .map(|date| DayCell {
                date,
                in_month: month.contains(date),
                meetings: meetings.iter().filter(|m| m.occurs_on(date)).cloned().collect(),
            })
            .collect();

        MonthGrid { month, cells }
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell]> {
        self.cells.chunks(7)
    }
}

/// One week of cells, all marked in-month.
pub fn week_cells(cursor: NaiveDate, meetings: &[CalendarMeeting]) -> Vec<DayCell> {
    week_days(cursor)
        .into_iter()
        .map(|date| DayCell {
            date,
            in_month: true,
            meetings: meetings.iter().filter(|m| m.occurs_on(date)).cloned().collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::PublicId;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2024-03-06 is a Wednesday
        let days = week_days(date(2024, 3, 6));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], date(2024, 3, 3));
        assert_eq!(days[0].weekday(), Weekday::Sun);
        assert_eq!(days[6], date(2024, 3, 9));
    }

    #[test]
    fn sunday_is_its_own_week_start() {
        assert_eq!(start_of_week(date(2024, 3, 3)), date(2024, 3, 3));
    }

    #[test]
    fn month_grid_shape() {
        let grid = MonthGrid::new(date(2024, 3, 20), &[]);
        assert_eq!(grid.cells.len(), GRID_DAYS);
        assert_eq!(grid.weeks().count(), 6);
        // March 2024 starts on a Friday
        assert_eq!(grid.cells[0].date, date(2024, 2, 25));
        assert!(!grid.cells[0].in_month);
        assert!(grid.cells[5].in_month);
        assert_eq!(grid.cells.iter().filter(|c| c.in_month).count(), 31);
    }

    #[test]
    fn meetings_land_in_their_cells() {
        let standup = CalendarMeeting {
            id: PublicId::parse("3f2b8c1e-9d4a-4b7e-8c21-5a6f7e8d9c0b").unwrap(),
            title: "Standup".into(),
            all_day: false,
            start: date(2024, 3, 1).and_hms_opt(9, 0, 0).unwrap(),
            end: date(2024, 3, 1).and_hms_opt(9, 15, 0).unwrap(),
            updated_at: None,
        };

        let grid = MonthGrid::new(date(2024, 3, 1), std::slice::from_ref(&standup));
        let with_meetings: Vec<_> = grid.cells.iter().filter(|c| !c.meetings.is_empty()).collect();
        assert_eq!(with_meetings.len(), 1);
        assert_eq!(with_meetings[0].date, date(2024, 3, 1));

        let week = week_cells(date(2024, 2, 28), &[standup]);
        assert_eq!(week.iter().filter(|c| !c.meetings.is_empty()).count(), 1);
    }
}
