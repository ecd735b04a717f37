//! A deterministic interpreter that replays recorded executions.
//!
//! The executor treats the bytecode interpreter as an external component. [`ReplayInterpreter`]
//! stands in for it wherever a real one is not wired in (tests, benchmarks, the `execute`
//! command): each [`ReplayScript`] records what running some code with some call data did to
//! the state, and the interpreter re-applies those effects through the VM State Store.

use std::{collections::VecDeque, path::Path};

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use eyre::{bail, WrapErr};
use hashbrown::HashMap;
use ledgervm_common::utils::io::file::read_file;
use ledgervm_config::ChainParams;
use ledgervm_state::VmState;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    core::gas::GasAccountant,
    error::Error,
    interfaces::{
        ExecutionOutcome, Interpreter, TransactionException, TransferKind, ValueTransfer,
        VmTransaction,
    },
};

/// A state change performed by the executing contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Sends value to another account.
    Transfer {
        /// Receiver.
        to: Address,
        /// Amount sent.
        value: U256,
    },

    /// Creates a contract with the given runtime code.
    Create {
        /// Runtime code of the new contract.
        code: Bytes,
        /// Endowment moved to the new contract.
        #[serde(default)]
        value: U256,
    },

    /// Self-destructs, paying the whole balance to `beneficiary`.
    SelfDestruct {
        /// Receiver of the balance.
        beneficiary: Address,
    },

    /// Writes a storage word.
    Store {
        /// Storage slot.
        key: B256,
        /// New value, zero clears the slot.
        value: B256,
    },
}

/// One recorded execution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayScript {
    /// The code that ran: constructor code for a creation, runtime code for a call.
    pub code: Bytes,

    /// The call data this script answers to. `None` answers to any call data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,

    /// How the execution ended.
    #[serde(default)]
    pub exception: TransactionException,

    /// Gas consumed, intrinsic cost included.
    pub gas_used: u64,

    /// Returned bytes. For a successful creation these become the runtime code.
    #[serde(default)]
    pub output: Bytes,

    /// State changes, applied in order. Faulting scripts may carry partial effects.
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl ReplayScript {
    /// A successful execution of `code` that answers to any call data.
    pub fn new(code: impl Into<Bytes>, gas_used: u64) -> Self {
        Self { code: code.into(), gas_used, ..Default::default() }
    }

    /// Restricts the script to the given call data.
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Sets the returned bytes.
    pub fn with_output(mut self, output: impl Into<Bytes>) -> Self {
        self.output = output.into();
        self
    }

    /// Makes the execution end with `exception`.
    pub fn with_exception(mut self, exception: TransactionException) -> Self {
        self.exception = exception;
        self
    }

    /// Appends an effect.
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// A batch file as consumed by the `execute` command.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayBatch {
    /// Recorded executions, in recording order.
    #[serde(default)]
    pub scripts: Vec<ReplayScript>,

    /// The VM transactions to execute, in batch order.
    pub transactions: Vec<VmTransaction>,
}

impl ReplayBatch {
    /// Reads a batch from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = read_file(path.as_ref())
            .wrap_err_with(|| format!("failed to read batch file {}", path.as_ref().display()))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// An [`Interpreter`] replaying [`ReplayScript`]s.
///
/// Scripts are looked up by the hash of the executed code and the call data, falling back to
/// a script recorded for the code alone. When several scripts share a key they are used in
/// recording order and the last one keeps answering once the others are used up.
///
/// Calls and transfers to accounts without code need no script: they deliver the value and use
/// the intrinsic gas.
#[derive(Clone, Debug, Default)]
pub struct ReplayInterpreter {
    accountant: GasAccountant,
    exact: HashMap<(B256, Bytes), VecDeque<ReplayScript>>,
    fallback: HashMap<B256, VecDeque<ReplayScript>>,
}

impl ReplayInterpreter {
    /// Creates an interpreter without any scripts.
    pub fn new(params: ChainParams) -> Result<Self, Error> {
        Ok(Self { accountant: GasAccountant::new(params)?, ..Default::default() })
    }

    /// Adds scripts, see [`ReplayInterpreter::record`].
    pub fn with_scripts(mut self, scripts: impl IntoIterator<Item = ReplayScript>) -> Self {
        for script in scripts {
            self.record(script);
        }
        self
    }

    /// Adds a script behind any already recorded for the same key.
    pub fn record(&mut self, script: ReplayScript) {
        let code_hash = keccak256(&script.code);
        match script.data.clone() {
            Some(data) => self.exact.entry((code_hash, data)).or_default().push_back(script),
            None => self.fallback.entry(code_hash).or_default().push_back(script),
        }
    }

    fn next_script(&mut self, code: &[u8], data: &Bytes) -> Option<ReplayScript> {
        let code_hash = keccak256(code);
        let queue = match self.exact.get_mut(&(code_hash, data.clone())) {
            Some(queue) => queue,
            None => self.fallback.get_mut(&code_hash)?,
        };

        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Interpreter for ReplayInterpreter {
    fn execute(
        &mut self,
        tx: &VmTransaction,
        target: Address,
        state: &mut VmState,
    ) -> eyre::Result<ExecutionOutcome> {
        let (code, data) = if tx.is_creation() {
            (tx.data.clone(), Bytes::new())
        } else {
            (state.code(&target).cloned().unwrap_or_default(), tx.data.clone())
        };

        let Some(script) = self.next_script(&code, &data) else {
            if tx.is_creation() || !code.is_empty() {
                bail!("no recorded script for code {} with call data {}", keccak256(&code), data);
            }

            trace!(%target, value = %tx.value, "plain transfer");
            state.transfer(tx.sender, target, tx.value)?;
            return Ok(ExecutionOutcome {
                gas_used: self.accountant.intrinsic_gas(tx),
                ..Default::default()
            });
        };
        debug!(
            %target,
            exception = %script.exception,
            gas_used = script.gas_used,
            effects = script.effects.len(),
            "replaying script"
        );

        state.transfer(tx.sender, target, tx.value)?;

        let mut outcome = ExecutionOutcome {
            exception: script.exception,
            gas_used: script.gas_used,
            ..Default::default()
        };
        if script.exception.is_none() {
            if tx.is_creation() {
                state.deploy(target, script.output.clone())?;
                outcome.new_address = Some(target);
            }
            outcome.output = script.output.clone();
        }

        for (i, effect) in script.effects.iter().enumerate() {
            apply(effect, target, state, &mut outcome.transfers)
                .wrap_err_with(|| format!("effect {i} of the script for {target} failed"))?;
        }

        Ok(outcome)
    }
}

fn apply(
    effect: &Effect,
    executing: Address,
    state: &mut VmState,
    transfers: &mut Vec<ValueTransfer>,
) -> eyre::Result<()> {
    match effect {
        Effect::Transfer { to, value } => {
            state.transfer(executing, *to, *value)?;
            if !value.is_zero() {
                transfers.push(ValueTransfer {
                    from: executing,
                    to: *to,
                    value: *value,
                    kind: TransferKind::Call,
                });
            }
        }
        Effect::Create { code, value } => {
            let created = state.create_contract(executing, code.clone(), *value)?;
            trace!(creator = %executing, %created, "nested creation");
            if !value.is_zero() {
                transfers.push(ValueTransfer {
                    from: executing,
                    to: created,
                    value: *value,
                    kind: TransferKind::Call,
                });
            }
        }
        Effect::SelfDestruct { beneficiary } => {
            let paid = state.self_destruct(executing, *beneficiary)?;
            if !paid.is_zero() {
                transfers.push(ValueTransfer {
                    from: executing,
                    to: *beneficiary,
                    value: paid,
                    kind: TransferKind::SelfDestruct,
                });
            }
        }
        Effect::Store { key, value } => state.set_storage(executing, *key, *value)?,
    }
    Ok(())
}
