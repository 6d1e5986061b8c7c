//! Block planning: turn one requested duration into work blocks and breaks.

use serde::{Deserialize, Serialize};

/// Minutes used when a duration string cannot be understood.
pub const DEFAULT_DURATION_MIN: i64 = 25;

/// Work/break layout derived from a requested total duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPlan {
    /// Number of work blocks (at least 1).
    pub total_blocks: u32,
    /// Length of each work block in minutes (at least 1).
    pub work_block_duration: u32,
    /// Length of each break in minutes. Breaks sit between work blocks only.
    pub break_duration: u32,
}

impl BlockPlan {
    /// Plan a session of `total_minutes`. Non-positive input is treated as 1.
    pub fn for_minutes(total_minutes: i64) -> Self {
        let total = total_minutes.max(1);

        let (total_blocks, break_duration): (i64, i64) = match total {
            i64::MIN..=5 => (1, 0),
            6..=15 => (2, 1),
            16..=30 => (2, 2),
            31..=60 => (3, 3),
            _ => (4, 5),
        };

        let break_total = break_duration * (total_blocks - 1);
        let mut work = ((total - break_total) / total_blocks).max(1);

        // Flooring to 1 can overshoot tiny requests; one correction pass
        // is enough for every bucket above.
        if work * total_blocks + break_total > total {
            work = ((total - break_total) / total_blocks).max(1);
        }

        Self {
            total_blocks: total_blocks as u32,
            work_block_duration: u32::try_from(work).unwrap_or(u32::MAX),
            break_duration: break_duration as u32,
        }
    }

    /// Number of breaks in the plan.
    pub fn break_count(&self) -> u32 {
        self.total_blocks.saturating_sub(1)
    }

    /// Work block length in milliseconds.
    pub fn work_block_ms(&self) -> u64 {
        u64::from(self.work_block_duration).saturating_mul(60_000)
    }

    /// Break length in milliseconds.
    pub fn break_ms(&self) -> u64 {
        u64::from(self.break_duration).saturating_mul(60_000)
    }

    /// Minutes covered by all work blocks and breaks.
    pub fn span_min(&self) -> u64 {
        u64::from(self.work_block_duration) * u64::from(self.total_blocks)
            + u64::from(self.break_duration) * u64::from(self.break_count())
    }

    /// Full span in milliseconds.
    pub fn span_ms(&self) -> u64 {
        self.span_min().saturating_mul(60_000)
    }
}

/// Parse a requested duration into whole minutes.
///
/// Accepts `HH:MM:SS`, `HH:MM` and `MM:SS`. Two-part input is read as
/// `HH:MM` when the first part is below 24 and the second below 60, and as
/// `MM:SS` otherwise. Seconds are dropped. Anything else, including values
/// too large to count in minutes, yields [`DEFAULT_DURATION_MIN`].
pub fn parse_duration_minutes(input: &str) -> i64 {
    let parts: Option<Vec<i64>> = input
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<i64>().ok())
        .collect();

    let minutes = match parts.as_deref() {
        Some([hours, minutes, _seconds]) => to_minutes(*hours, *minutes),
        Some([first, second]) if *first < 24 && *second < 60 => to_minutes(*first, *second),
        Some([first, _second]) => Some(*first),
        _ => None,
    };
    minutes.unwrap_or(DEFAULT_DURATION_MIN)
}

fn to_minutes(hours: i64, minutes: i64) -> Option<i64> {
    hours.checked_mul(60)?.checked_add(minutes)
}

/// Parse `input` and plan it in one step.
pub fn plan_blocks(input: &str) -> BlockPlan {
    BlockPlan::for_minutes(parse_duration_minutes(input))
}

/// Render seconds as zero-padded `HH:MM:SS`. Negative input renders as zero.
pub fn format_hms(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Render milliseconds as `HH:MM:SS`, truncating sub-second remainders.
pub fn format_hms_ms(millis: i64) -> String {
    format_hms(millis / 1000)
}
