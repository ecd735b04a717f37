use std::{env, io::Write, path::Path};

use colored::Colorize;
use eyre::{eyre, Result};
use ledgervm_executor::{ExecutionReport, Status};

/// build a standardized output path for the given parameters. follows the following cases:
/// - if `output` is `print`, the caller prints instead
/// - if `output` is the default value (`output`), return `{cwd}/output/{batch file stem}/{filename}`
/// - if `output` is specified, return `/{output}/{filename}`
pub(crate) fn build_output_path(output: &str, batch: &str, filename: &str) -> Result<String> {
    // if output is the default value, build a path based on the batch file
    if output == "output" {
        // get the current working directory
        let cwd = env::current_dir()?
            .into_os_string()
            .into_string()
            .map_err(|_| eyre!("Unable to get current working directory"))?;

        let stem = Path::new(batch)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or("batch");
        return Ok(format!("{}/output/{}/{}", cwd, stem, filename));
    }

    // output is specified, return the path
    Ok(format!("{}/{}", output, filename))
}

/// pass the input to the `less` command
pub(crate) fn print_with_less(input: &str) -> Result<()> {
    let mut child =
        std::process::Command::new("less").stdin(std::process::Stdio::piped()).spawn()?;

    let stdin = child.stdin.as_mut().ok_or_else(|| eyre!("unable to get stdin for less"))?;
    stdin.write_all(input.as_bytes())?;

    child.wait()?;
    Ok(())
}

/// a one line per transaction overview of an executed batch
pub(crate) fn summarize(report: &ExecutionReport) -> String {
    let mut lines = Vec::with_capacity(report.executed.len() + 2);

    for (index, result) in report.executed.results.iter().enumerate() {
        let status = match result.status {
            Status::Applied => "applied".green(),
            Status::Reverted => "reverted".yellow(),
            Status::RejectedNoState => "rejected".red(),
        };
        let address = result
            .outcome
            .new_address
            .map(|address| format!(" created {address}"))
            .unwrap_or_default();

        lines.push(format!(
            "{index:>4} {status:<9} {:<24} gas {:>10} fee {:>8} refund {:>8}{address}",
            result.outcome.exception.to_string(),
            result.charge.gas_used,
            result.charge.fee,
            result.charge.refund,
        ));
    }

    let settlement = &report.executed.settlement;
    lines.push(format!(
        "{} {} gas used, {} fee, {} refunded in {} outputs, {} transfer transactions",
        "total:".bold(),
        settlement.total_gas_used,
        settlement.total_fee,
        settlement.total_refund,
        settlement.refund_outputs.len(),
        settlement.transfers.len(),
    ));
    lines.push(format!("{} {}", "state root:".bold(), report.state_root));

    lines.join("\n")
}
