use clap::Subcommand;
use focusroom_core::clock::{parse_day, Clock, SystemClock};
use focusroom_core::stats::MonthYear;
use focusroom_core::storage::Database;
use focusroom_core::StatsEngine;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals for one day
    Day {
        /// dd.MM.yyyy or yyyy-MM-dd (default: today)
        date: Option<String>,
    },
    /// Rollup for one month
    Month {
        /// MM.yyyy (default: current month)
        month: Option<String>,
    },
    /// Per-day view of one month
    Calendar {
        /// MM.yyyy (default: current month)
        month: Option<String>,
    },
    /// Current and longest streak
    Streak,
    /// Rebuild the daily totals cache from the session log
    Rebuild,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let clock = SystemClock;
    let stats = StatsEngine::new(&db, &db, &clock);

    match action {
        StatsAction::Day { date } => {
            let date = match date {
                Some(d) => parse_day(&d)?,
                None => clock.today(),
            };
            println!("{}", serde_json::to_string_pretty(&stats.daily_stats(date)?)?);
        }
        StatsAction::Month { month } => {
            let month = match month {
                Some(m) => stats.month_stats(&m)?,
                None => stats.current_month_stats()?,
            };
            println!("{}", serde_json::to_string_pretty(&month)?);
        }
        StatsAction::Calendar { month } => {
            let month: MonthYear = match month {
                Some(m) => m.parse()?,
                None => MonthYear::current(&clock),
            };
            let days = stats.calendar_for_month(month.year, month.month - 1)?;
            println!("{}", serde_json::to_string_pretty(&days)?);
        }
        StatsAction::Streak => {
            println!("{}", serde_json::to_string_pretty(&stats.streaks()?)?);
        }
        StatsAction::Rebuild => {
            let rows = stats.rebuild_daily_cache()?;
            println!("{{\"rebuilt_days\": {rows}}}");
        }
    }
    Ok(())
}
