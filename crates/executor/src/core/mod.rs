pub(crate) mod batch;
pub(crate) mod condense;
pub(crate) mod gas;

use std::{path::Path, time::Instant};

use ledgervm_common::utils::io::file::{read_file, write_file};
use ledgervm_config::ChainParams;
use ledgervm_state::VmState;
use tracing::{debug, info};

use crate::{
    core::batch::BatchExecutor,
    error::Error,
    interfaces::{ExecuteArgs, ExecutionReport},
    replay::{ReplayBatch, ReplayInterpreter},
};

/// Executes a recorded batch file.
///
/// Chain parameters come from `args.params` when given, from the user's parameter file
/// otherwise. The batch runs against the state snapshot at `args.state` (an empty state when
/// the snapshot does not exist yet) with a [`ReplayInterpreter`] built from the batch's
/// scripts, and the snapshot is written back afterwards.
pub fn execute(args: ExecuteArgs) -> Result<ExecutionReport, Error> {
    let start_time = Instant::now();

    let params = if args.params.is_empty() {
        ChainParams::load()?
    } else {
        ChainParams::from_file(&args.params)?
    };
    debug!("using chain parameters: {:?}", params);

    let batch = ReplayBatch::from_file(&args.batch)?;
    debug!(
        "loaded {} transactions and {} scripts from {}",
        batch.transactions.len(),
        batch.scripts.len(),
        args.batch
    );

    let mut state = if !args.state.is_empty() && Path::new(&args.state).exists() {
        serde_json::from_str::<VmState>(&read_file(&args.state)?)?
    } else {
        VmState::new()
    };

    let interpreter = ReplayInterpreter::new(params.clone())?.with_scripts(batch.scripts);
    let executed =
        BatchExecutor::new(params, interpreter)?.execute(&mut state, &batch.transactions)?;

    if !args.state.is_empty() {
        write_file(&args.state, &serde_json::to_string_pretty(&state)?)?;
        debug!("saved state snapshot to {}", args.state);
    }

    let report = ExecutionReport { executed, state_root: state.state_root() };
    info!("state root after batch: {}", report.state_root);
    debug!("execution took {:?}", start_time.elapsed());

    Ok(report)
}
