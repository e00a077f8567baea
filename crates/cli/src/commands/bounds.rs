use agentquote_core::cpq::timeline::delivery_bounds;

use crate::commands::{load_config, CommandResult};

pub fn run(standard_weeks: u32) -> CommandResult {
    let config = match load_config("bounds") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let bounds = delivery_bounds(standard_weeks, &config.timeline_policy());
    CommandResult::success(
        "bounds",
        format!(
            "delivery window for {standard_weeks} standard weeks: {}..={} weeks",
            bounds.min_weeks, bounds.max_weeks
        ),
    )
}
