mod engine;
mod plan;
mod scheduler;

pub use engine::{Outcome, Phase, SchedulerState, TimerInput, Transition};
pub use plan::{
    format_hms, format_hms_ms, parse_duration_minutes, plan_blocks, BlockPlan,
    DEFAULT_DURATION_MIN,
};
pub use scheduler::FocusScheduler;
