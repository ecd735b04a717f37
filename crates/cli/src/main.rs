pub(crate) mod error;
pub(crate) mod log_args;
pub(crate) mod output;

use error::Error;
use log_args::LogArgs;
use output::{build_output_path, print_with_less, summarize};
use tracing::{info, Level};

use clap::{Parser, Subcommand};

use ledgervm_common::utils::io::file::write_file;
use ledgervm_config::{config, ConfigArgs};
use ledgervm_executor::{execute, ExecuteArgs};

#[derive(Debug, Parser)]
#[clap(name = "ledgervm", version)]
pub(crate) struct Arguments {
    #[clap(subcommand)]
    pub(crate) sub: Subcommands,

    #[clap(flatten)]
    logs: LogArgs,
}

#[derive(Debug, Subcommand)]
#[clap(
    about = "ledgervm executes batches of contract transactions embedded in a UTXO ledger and settles their gas and value movement."
)]
pub(crate) enum Subcommands {
    #[clap(
        name = "execute",
        about = "Execute a batch of transactions against a VM state snapshot"
    )]
    Execute(ExecuteArgs),

    #[clap(name = "config", about = "Display and edit the current chain parameters")]
    Config(ConfigArgs),
}

fn main() -> Result<(), Error> {
    let args = Arguments::parse();

    // setup logging, keeping the file writer alive until exit
    let _guard = args.logs.init_tracing().unwrap_or_default();

    match args.sub {
        Subcommands::Execute(cmd) => {
            let report = execute(cmd.clone())?;

            if args.logs.verbosity.level() >= Some(Level::WARN) && cmd.output != "print" {
                println!("{}", summarize(&report));
            }

            let json = serde_json::to_string_pretty(&report)?;
            if cmd.output == "print" {
                print_with_less(&json)
                    .map_err(|e| Error::Generic(format!("failed to print report: {}", e)))?;
            } else {
                let output_path = build_output_path(&cmd.output, &cmd.batch, "report.json")
                    .map_err(|e| Error::Generic(format!("failed to build output path: {}", e)))?;

                write_file(&output_path, &json)
                    .map_err(|e| Error::Generic(format!("failed to write report: {}", e)))?;
                info!("wrote execution report to '{}'", output_path);
            }
        }

        Subcommands::Config(cmd) => {
            config(cmd).map_err(|e| Error::Generic(format!("failed to update parameters: {}", e)))?;
        }
    }

    Ok(())
}
