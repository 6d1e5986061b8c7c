//! Month calendar projection for rendering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::daily::per_day;
use super::month::MonthYear;
use crate::error::ValidationError;
use crate::session::FocusSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub has_focus_session: bool,
    pub total_focus_time: i64,
    pub completed_sessions: u32,
    pub is_today: bool,
}

/// One entry per day of the month, in order.
///
/// `month0` is zero-based: 0 is January, 11 is December.
pub fn calendar_for_month(
    sessions: &[FocusSession],
    year: i32,
    month0: u32,
    today: NaiveDate,
) -> Result<Vec<CalendarDay>, ValidationError> {
    if month0 > 11 {
        return Err(ValidationError::InvalidMonth(month0));
    }
    let month = MonthYear::new(year, month0 + 1)?;
    let totals = per_day(sessions);

    let days = (1..=month.days_in_month())
        .filter_map(|d| NaiveDate::from_ymd_opt(year, month.month, d))
        .map(|date| {
            let (total_focus_time, completed_sessions) = totals
                .get(&date)
                .map(|s| (s.total_focus_time, s.completed_sessions))
                .unwrap_or((0, 0));
            CalendarDay {
                date,
                has_focus_session: completed_sessions > 0,
                total_focus_time,
                completed_sessions,
                is_today: date == today,
            }
        })
        .collect();
    Ok(days)
}
