use focusroom_core::timer::{parse_duration_minutes, BlockPlan};
use focusroom_core::Config;
use serde::Serialize;

#[derive(Serialize)]
struct PlanOutput {
    requested_minutes: i64,
    #[serde(flatten)]
    plan: BlockPlan,
    span_minutes: u64,
}

pub fn run(duration: Option<String>, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let duration = duration.unwrap_or_else(|| config.timer.default_duration.clone());
    let requested_minutes = parse_duration_minutes(&duration);
    let plan = BlockPlan::for_minutes(requested_minutes);
    let output = PlanOutput {
        requested_minutes,
        plan,
        span_minutes: plan.span_min(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
