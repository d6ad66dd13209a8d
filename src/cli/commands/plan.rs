//! Plan command - preview batch grouping

use crate::cli::args::PlanArgs;
use crate::error::HoistResult;
use crate::invoke::{plan_batches, ExecutionMode, TargetName};
use console::style;

/// Execute the plan command
pub async fn execute(args: PlanArgs) -> HoistResult<()> {
    let targets = args
        .targets
        .iter()
        .map(TargetName::new)
        .collect::<HoistResult<Vec<_>>>()?;
    let mode = args.mode.parse::<ExecutionMode>()?;

    let batches = plan_batches(&targets, mode)?;

    println!(
        "{} {} batch(es) in {} mode",
        style("Plan:").bold(),
        batches.len(),
        mode
    );
    for (index, batch) in batches.iter().enumerate() {
        println!("  {}. [{}]", index + 1, batch.label());
    }

    Ok(())
}
