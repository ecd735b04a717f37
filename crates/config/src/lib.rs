//! Chain parameter management for ledgervm
//!
//! The executor never hard-codes consensus constants: intrinsic gas costs, the block gas
//! ceiling, the gas-to-amount scaling and the refund dust threshold all come from a
//! [`ChainParams`] value. This crate provides the defaults, and loading, saving, updating and
//! deleting the parameter file.

/// Error types for the configuration module
pub mod error;

use std::path::{Path, PathBuf};

use crate::error::Error;
use clap::Parser;
use ledgervm_common::utils::io::file::{delete_path, read_file, write_file};
use serde::{Deserialize, Serialize};
#[allow(deprecated)]
use std::env::home_dir;
use tracing::{debug, error, info};

/// Environment variable overriding the directory holding `params.toml`.
pub const HOME_ENV: &str = "LEDGERVM_HOME";

/// Command line arguments for the configuration command
#[derive(Debug, Clone, Parser)]
#[clap(
    about = "Display and edit the current chain parameters",
    override_usage = "ledgervm config [OPTIONS]"
)]
pub struct ConfigArgs {
    /// The target key to update.
    #[clap(required = false, default_value = "")]
    key: String,

    /// The value to set the key to.
    #[clap(required = false, default_value = "")]
    value: String,
}

/// The [`ChainParams`] struct holds every externally configured constant the executor
/// consults.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ChainParams {
    /// Ceiling on the cumulative gas a single batch may consume
    pub block_gas_limit: u64,

    /// Intrinsic gas of a call or plain transfer
    pub tx_gas: u64,

    /// Intrinsic gas of a contract creation
    pub tx_create_gas: u64,

    /// Intrinsic gas per zero byte of input data
    pub tx_data_zero_gas: u64,

    /// Intrinsic gas per non-zero byte of input data
    pub tx_data_non_zero_gas: u64,

    /// How many gas × gas price units make up one ledger amount unit
    pub gas_price_divisor: u64,

    /// Refunds smaller than this are kept as fee instead of producing an output
    pub min_refund: u64,
}

impl Default for ChainParams {
    fn default() -> Self {
        ChainParams {
            block_gas_limit: 1 << 30,
            tx_gas: 21_000,
            tx_create_gas: 53_000,
            tx_data_zero_gas: 4,
            tx_data_non_zero_gas: 68,
            gas_price_divisor: 10_000,
            min_refund: 1,
        }
    }
}

#[allow(deprecated)]
fn params_path() -> Result<PathBuf, Error> {
    let mut home = match std::env::var_os(HOME_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let mut home = home_dir().ok_or_else(|| {
                Error::Generic(
                    "failed to get home directory. does your os support `std::env::home_dir()`?"
                        .to_string(),
                )
            })?;
            home.push(".ledgervm");
            home
        }
    };
    home.push("params.toml");
    Ok(home)
}

impl ChainParams {
    /// Returns the current parameters, creating the parameter file with defaults if it does
    /// not exist.
    pub fn load() -> Result<Self, Error> {
        let path = params_path()?;

        // if the params file doesn't exist, create it
        if !path.exists() {
            debug!("no parameter file at {}, writing defaults", path.display());
            ChainParams::default().save()?;
        }

        Self::from_file(&path)
    }

    /// Reads parameters from an explicit TOML file. Missing keys take their default value.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = read_file(path.as_ref())
            .map_err(|e| Error::Generic(format!("failed to read parameter file: {e}")))?;

        let params: ChainParams = toml::from_str(&contents)
            .map_err(|e| Error::ParseError(format!("failed to parse parameter file: {e}")))?;
        params.validate()?;

        Ok(params)
    }

    /// Saves the current parameters to disk.
    pub fn save(&self) -> Result<(), Error> {
        let path = params_path()?;

        write_file(
            &path,
            &toml::to_string(&self)
                .map_err(|e| Error::ParseError(format!("failed to serialize params: {e}")))?,
        )
        .map_err(|e| Error::Generic(format!("failed to write parameter file: {e}")))?;

        Ok(())
    }

    /// Deletes the parameter file.
    pub fn delete() -> Result<(), Error> {
        let path = params_path()?;

        delete_path(&path)
            .map_err(|e| Error::Generic(format!("failed to delete parameter file: {e}")))
    }

    /// Rejects parameter sets the gas accountant cannot work with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.gas_price_divisor == 0 {
            return Err(Error::InvalidParameter {
                key: "gas_price_divisor",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.min_refund == 0 {
            return Err(Error::InvalidParameter {
                key: "min_refund",
                reason: "must be greater than zero, zero-value refund outputs are not allowed"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Update a single key/value pair in the parameters and persist them.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let parsed = value.trim().replace('_', "").parse::<u64>().map_err(|e| {
            Error::ParseError(format!("invalid value '{value}' for '{key}': {e}"))
        })?;

        let mut updated = self.clone();
        match key {
            "block_gas_limit" => updated.block_gas_limit = parsed,
            "tx_gas" => updated.tx_gas = parsed,
            "tx_create_gas" => updated.tx_create_gas = parsed,
            "tx_data_zero_gas" => updated.tx_data_zero_gas = parsed,
            "tx_data_non_zero_gas" => updated.tx_data_non_zero_gas = parsed,
            "gas_price_divisor" => updated.gas_price_divisor = parsed,
            "min_refund" => updated.min_refund = parsed,
            _ => {
                return Err(Error::Generic(format!(
                    "invalid key: \'{key}\' is not a valid parameter key."
                )))
            }
        }
        updated.validate()?;
        *self = updated;

        // write the updated params to disk
        self.save()?;

        Ok(())
    }
}

/// The `config` command is used to display and edit the current chain parameters.
pub fn config(args: ConfigArgs) -> Result<(), Error> {
    if !args.key.is_empty() {
        if !args.value.is_empty() {
            // read the params file and update the key/value pair
            let mut params = ChainParams::load()?;
            params.update(&args.key, &args.value)?;
            info!("updated parameters! Set \'{}\' = \'{}\' .", &args.key, &args.value);
        } else {
            // key is set, but no value is set
            error!("found key but no value to set. Please specify a value to set, use `ledgervm config --help` for more information.");
        }
    } else {
        // no key is set, print the params file
        println!("{:#?}", ChainParams::load()?);
        info!("use `ledgervm config <KEY> <VALUE>` to set a key/value pair.");
    }

    Ok(())
}
