pub mod config;
pub mod plan;
pub mod stats;
pub mod task;
pub mod timer;

use focusroom_core::Event;

/// Print events as pretty JSON on stdout.
pub(crate) fn print_events(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", serde_json::to_string_pretty(event)?);
    }
    Ok(())
}
