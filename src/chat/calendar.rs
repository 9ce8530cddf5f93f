//! Pure month-grid builder for the in-chat calendar.

use chrono::{Datelike, Months, NaiveDate};

use crate::api::types::{normalize_time, SlotMap};

/// A rendered month: header label plus a 7-column grid of day cells.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MonthGrid {
    /// Header label, e.g. `"May 2024"`.
    pub label: String,
    /// Offset from the real current month this grid was built for.
    pub month_offset: i32,
    /// Week rows, Sunday first. Leading blanks pad the first row; the final
    /// row may be partial.
    pub weeks: Vec<Vec<DayCell>>,
}

/// One cell of the month grid.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DayCell {
    /// Padding before the first day of the month.
    Blank,
    /// A calendar day.
    Day {
        /// Day of month, 1-based.
        day: u32,
        /// Date key (`YYYY-MM-DD`).
        date: String,
        /// Whether the date appears in the slot map; only bookable cells are
        /// clickable.
        bookable: bool,
        /// Whether this is the real current date, independent of the offset.
        today: bool,
    },
}

/// The time-list opened under the grid for one selected day.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimeList {
    /// The selected date key.
    pub date: String,
    /// Button labels, normalized to `HH:MM`.
    pub times: Vec<String>,
}

/// Build the grid for the month at `today + month_offset` months.
///
/// Pure in its inputs; `today` is injected so surfaces pass the real current
/// date and tests pass a fixed one. The offset is unbounded in both
/// directions.
#[must_use]
pub fn month_grid(slots: &SlotMap, month_offset: i32, today: NaiveDate) -> MonthGrid {
    let first = shift_months(first_of_month(today), month_offset);
    let first_weekday = first.weekday().num_days_from_sunday();
    let day_count = days_in_month(first);
    let label = first.format("%B %Y").to_string();

    let mut weeks = Vec::new();
    let mut row: Vec<DayCell> = (0..first_weekday).map(|_| DayCell::Blank).collect();
    for day in 1..=day_count {
        let date = format!("{:04}-{:02}-{:02}", first.year(), first.month(), day);
        row.push(DayCell::Day {
            day,
            bookable: slots.contains_key(&date),
            today: first.year() == today.year()
                && first.month() == today.month()
                && day == today.day(),
            date,
        });
        // Row break on week boundary; the trailing partial row still lands.
        if (first_weekday + day) % 7 == 0 || day == day_count {
            weeks.push(std::mem::take(&mut row));
        }
    }

    MonthGrid {
        label,
        month_offset,
        weeks,
    }
}

/// Build the time-list for one day, normalizing each entry for display.
#[must_use]
pub fn time_list(date: &str, times: &[String]) -> TimeList {
    TimeList {
        date: date.to_string(),
        times: times
            .iter()
            .map(|time| normalize_time(time).to_string())
            .collect(),
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn shift_months(date: NaiveDate, offset: i32) -> NaiveDate {
    let months = Months::new(offset.unsigned_abs());
    let shifted = if offset >= 0 {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    };
    shifted.unwrap_or(date)
}

fn days_in_month(first: NaiveDate) -> u32 {
    let next = shift_months(first, 1);
    u32::try_from(next.signed_duration_since(first).num_days()).unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // November 2023: 30 days, the 1st falls on a Wednesday.
    #[test]
    fn test_grid_shape_for_month_starting_wednesday() {
        let grid = month_grid(&SlotMap::new(), 0, date(2023, 11, 15));
        assert_eq!(grid.label, "November 2023");
        assert_eq!(grid.weeks.len(), 5);

        let first_row = &grid.weeks[0];
        assert_eq!(first_row.len(), 7);
        assert!(matches!(first_row[0], DayCell::Blank));
        assert!(matches!(first_row[1], DayCell::Blank));
        assert!(matches!(first_row[2], DayCell::Blank));
        assert!(matches!(first_row[3], DayCell::Day { day: 1, .. }));

        // (3 + 30) % 7 == 5 cells in the trailing partial row.
        assert_eq!(grid.weeks[4].len(), 5);
    }

    #[test]
    fn test_bookable_iff_date_present() {
        let mut slots = SlotMap::new();
        slots.insert("2023-11-10".to_string(), vec!["09:00".to_string()]);
        let grid = month_grid(&slots, 0, date(2023, 11, 15));

        let cells: Vec<&DayCell> = grid.weeks.iter().flatten().collect();
        for cell in cells {
            if let DayCell::Day { date, bookable, .. } = cell {
                assert_eq!(*bookable, date == "2023-11-10");
            }
        }
    }

    #[test]
    fn test_today_marker_only_in_real_month() {
        let today = date(2023, 11, 15);
        let current = month_grid(&SlotMap::new(), 0, today);
        let marked: Vec<_> = current
            .weeks
            .iter()
            .flatten()
            .filter(|cell| matches!(cell, DayCell::Day { today: true, .. }))
            .collect();
        assert_eq!(marked.len(), 1);
        assert!(matches!(marked[0], DayCell::Day { day: 15, .. }));

        let next = month_grid(&SlotMap::new(), 1, today);
        assert_eq!(next.label, "December 2023");
        assert!(!next
            .weeks
            .iter()
            .flatten()
            .any(|cell| matches!(cell, DayCell::Day { today: true, .. })));
    }

    #[test]
    fn test_navigation_crosses_year_boundaries() {
        let today = date(2024, 1, 10);
        assert_eq!(month_grid(&SlotMap::new(), -1, today).label, "December 2023");
        assert_eq!(month_grid(&SlotMap::new(), 13, today).label, "February 2025");
    }

    #[test]
    fn test_time_list_normalizes_entries() {
        let times = vec!["09:00".to_string(), "09:30:00".to_string()];
        let list = time_list("2024-05-10", &times);
        assert_eq!(list.times, vec!["09:00", "09:30"]);
    }
}
