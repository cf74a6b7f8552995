//! Turns clipped weeks into timesheet rows.

use chrono::Duration;
use tracing::debug;

use crate::calendar::{MonthBounds, WeekInterval, business_days_between};
use crate::config::Config;

/// One exported line. Dates are already rendered with the configured pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct TimesheetRow {
    pub date_from: String,
    pub date_to: String,
    pub client: String,
    pub project_name: String,
    pub project_hours: f64,
    /// Always 0, filled in by hand after export.
    pub internal_hours: f64,
}

pub fn build_row(week: &WeekInterval, month: &MonthBounds, config: &Config) -> TimesheetRow {
    let clipped = week.clip(month);
    let days = business_days_between(clipped.start, clipped.end + Duration::days(1));
    let project_hours = f64::from(days) * config.work_hours;

    debug!(from = %clipped.start, to = %clipped.end, days, project_hours, "built row");

    TimesheetRow {
        date_from: config.date_format.format(clipped.start),
        date_to: config.date_format.format(clipped.end),
        client: config.client.clone(),
        project_name: config.project_name.clone(),
        project_hours,
        internal_hours: 0.0,
    }
}

pub fn build_rows(weeks: &[WeekInterval], month: &MonthBounds, config: &Config) -> Vec<TimesheetRow> {
    weeks.iter().map(|week| build_row(week, month, config)).collect()
}
