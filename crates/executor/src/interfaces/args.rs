use clap::Parser;
use derive_builder::Builder;

/// Arguments of the `execute` command
#[derive(Debug, Clone, Parser, Builder)]
#[clap(
    about = "Executes a batch of VM transactions and reports its settlement",
    override_usage = "ledgervm execute <BATCH_FILE> [OPTIONS]"
)]
pub struct ExecuteArgs {
    /// JSON file holding the recorded scripts and the transactions to execute.
    #[clap(required = true)]
    pub batch: String,

    /// Chain parameter file to use instead of the user's parameters.
    #[clap(long, short, default_value = "", hide_default_value = true)]
    pub params: String,

    /// VM state snapshot to execute against. It is created if missing and updated after a
    /// successful batch.
    #[clap(long, short, default_value = "", hide_default_value = true)]
    pub state: String,

    /// The output directory to write the report to or 'print' to print it to the console
    #[clap(long = "output", short = 'o', default_value = "output", hide_default_value = true)]
    pub output: String,
}

impl ExecuteArgsBuilder {
    /// Creates a builder with every optional argument at its default.
    pub fn new() -> Self {
        Self {
            batch: Some(String::new()),
            params: Some(String::new()),
            state: Some(String::new()),
            output: Some(String::from("print")),
        }
    }
}
