use crate::cli::context;
use crate::cli::output;
use crate::cli::Cli;
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::models::cycle_report::{BatchStatus, CycleReport};

/// Execute the `keysync sync` command.
///
/// Runs exactly one reconciliation cycle and exits. The exit code is
/// non-zero only when the cycle aborted before mutating (a fetch
/// failure); per-key rejections and failed batches are reported but
/// the cycle still counts as complete.
pub fn execute(cli: &Cli) -> Result<()> {
    let config = AppConfig::resolve(cli, None)?;
    let cycle = context::cycle_service(&config)?;
    let rt = context::runtime()?;

    output::header("🔑 keysync sync");

    let report = rt.block_on(cycle.run_cycle())?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &CycleReport) {
    output::success(&format!(
        "Custodian lists {} keys, client holds {}",
        report.custodian_keys, report.client_keys
    ));

    if report.custodian_was_empty() {
        output::warning(
            "Custodian listing is empty — every key loaded on the client is stale",
        );
    }

    print_batch("Additions", &report.additions);
    print_batch("Removals", &report.removals);

    println!();
    output::success(&format!(
        "{} added, {} removed, {} failed in {:.1?}",
        report.added(),
        report.removed(),
        report.failed(),
        report.duration
    ));
}

fn print_batch(label: &str, status: &BatchStatus) {
    match status {
        BatchStatus::Skipped => output::success(&format!("{label}: nothing to do")),
        BatchStatus::Completed(outcomes) => {
            let failed: Vec<_> = outcomes.iter().filter(|o| !o.succeeded).collect();
            output::success(&format!(
                "{label}: {}/{} applied",
                outcomes.len() - failed.len(),
                outcomes.len()
            ));
            for outcome in failed {
                let note = if outcome.message.is_empty() {
                    "rejected by client"
                } else {
                    outcome.message.as_str()
                };
                output::key_note(&outcome.identifier, note);
            }
        }
        BatchStatus::Failed(reason) => {
            output::warning(&format!(
                "{label} batch failed: {reason} (will retry next cycle)"
            ));
        }
        BatchStatus::Withheld => output::warning(&format!(
            "{label} withheld: custodian listing was empty and allow_empty_custodian is off"
        )),
    }
}
