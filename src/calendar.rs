//! Month boundaries and Monday-start week partitioning.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use crate::error::{Result, TimesheetError};

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// First and last calendar day of the target month, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBounds {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A date interval with inclusive bounds. Before clipping it always runs
/// Monday to Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekInterval {
    /// Restricts the week to the days that fall inside `month`.
    pub fn clip(&self, month: &MonthBounds) -> WeekInterval {
        WeekInterval {
            start: self.start.max(month.start),
            end: self.end.min(month.end),
        }
    }
}

/// Resolves a 1-indexed `month` of `year` into its bounds and every Monday-start
/// week overlapping it, in chronological order.
pub fn resolve(year: i32, month: i32) -> Result<(MonthBounds, Vec<WeekInterval>)> {
    let bounds = month_bounds(year, month)?;
    let weeks = weeks_overlapping(&bounds);
    debug!(
        year,
        month,
        start = %bounds.start,
        end = %bounds.end,
        weeks = weeks.len(),
        "resolved month"
    );
    Ok((bounds, weeks))
}

pub fn month_bounds(year: i32, month: i32) -> Result<MonthBounds> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(TimesheetError::InvalidDate(format!(
            "year {year} is outside {MIN_YEAR}-{MAX_YEAR}"
        )));
    }
    // chrono months are 1-based, same as the CLI, so this cast is the only conversion.
    let month = u32::try_from(month)
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| TimesheetError::InvalidDate(format!("month {month} is outside 1-12")))?;

    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| TimesheetError::InvalidDate(format!("{year}-{month:02} does not exist")))?;

    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| TimesheetError::InvalidDate(format!("{year}-{month:02} has no last day")))?;

    Ok(MonthBounds { start, end })
}

/// Every Monday-to-Sunday week that shares at least one day with `month`.
pub fn weeks_overlapping(month: &MonthBounds) -> Vec<WeekInterval> {
    let offset = i64::from(month.start.weekday().num_days_from_monday());
    let mut week_start = month.start - Duration::days(offset);
    let mut weeks = Vec::with_capacity(6);

    while week_start <= month.end {
        weeks.push(WeekInterval {
            start: week_start,
            end: week_start + Duration::days(6),
        });
        week_start += Duration::days(7);
    }
    weeks
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekdays in the half-open range `[start, end)`. Holidays are not considered.
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> u32 {
    start
        .iter_days()
        .take_while(|d| *d < end)
        .filter(|d| is_business_day(*d))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn february_2021_is_four_full_weeks() {
        let (bounds, weeks) = resolve(2021, 2).unwrap();
        assert_eq!(bounds.start, date(2021, 2, 1));
        assert_eq!(bounds.end, date(2021, 2, 28));
        assert_eq!(weeks.len(), 4);
        for week in &weeks {
            assert_eq!(week.clip(&bounds), *week);
            assert_eq!(week.start.weekday(), Weekday::Mon);
            assert_eq!(week.end.weekday(), Weekday::Sun);
        }
    }

    #[test]
    fn june_2024_clips_both_ends() {
        let (bounds, weeks) = resolve(2024, 6).unwrap();
        assert_eq!(weeks.len(), 5);

        let first = weeks[0].clip(&bounds);
        assert_eq!(first.start, date(2024, 6, 1));
        assert_eq!(first.end, date(2024, 6, 2));

        let last = weeks[4].clip(&bounds);
        assert_eq!(last.start, date(2024, 6, 24));
        assert_eq!(last.end, date(2024, 6, 30));
    }

    #[test]
    fn december_ends_on_the_31st() {
        let bounds = month_bounds(2023, 12).unwrap();
        assert_eq!(bounds.end, date(2023, 12, 31));
    }

    #[test]
    fn leap_february_has_29_days() {
        assert_eq!(month_bounds(2024, 2).unwrap().end, date(2024, 2, 29));
        assert_eq!(month_bounds(1900, 2).unwrap().end, date(1900, 2, 28));
    }

    #[test]
    fn clipped_weeks_cover_the_month_without_gaps() {
        for year in 1999..=2031 {
            for month in 1..=12 {
                let (bounds, weeks) = resolve(year, month).unwrap();
                assert!((4..=6).contains(&weeks.len()), "{year}-{month}");

                let clipped: Vec<_> = weeks.iter().map(|w| w.clip(&bounds)).collect();
                assert_eq!(clipped[0].start, bounds.start);
                assert_eq!(clipped[clipped.len() - 1].end, bounds.end);
                for pair in clipped.windows(2) {
                    assert_eq!(pair[0].end.succ_opt().unwrap(), pair[1].start);
                }
                for week in &clipped {
                    assert!(week.start <= week.end);
                }
            }
        }
    }

    #[test]
    fn rejects_out_of_range_months() {
        for month in [0, 13, -1] {
            assert!(matches!(
                resolve(2024, month),
                Err(TimesheetError::InvalidDate(_))
            ));
        }
    }

    #[test]
    fn rejects_out_of_range_years() {
        assert!(matches!(resolve(0, 1), Err(TimesheetError::InvalidDate(_))));
        assert!(matches!(resolve(10_000, 1), Err(TimesheetError::InvalidDate(_))));
    }

    #[test]
    fn business_days_skip_weekends() {
        // Mon 2021-02-01 .. Mon 2021-02-08 (exclusive)
        assert_eq!(business_days_between(date(2021, 2, 1), date(2021, 2, 8)), 5);
        // Sat + Sun
        assert_eq!(business_days_between(date(2024, 6, 1), date(2024, 6, 3)), 0);
        // Empty and inverted ranges
        assert_eq!(business_days_between(date(2024, 6, 3), date(2024, 6, 3)), 0);
        assert_eq!(business_days_between(date(2024, 6, 5), date(2024, 6, 3)), 0);
    }
}
