use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use hashbrown::HashMap;
use ledgervm_common::{ether::address::nested_contract_address, ledger::Coin};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{account::Account, error::Error};

/// What an address held before the first write inside a checkpoint.
#[derive(Clone, Debug)]
enum Slot {
    Vacant,
    Live(Account),
    Retired(Account),
}

/// The [`VmState`] struct holds every account known to the VM.
///
/// Live accounts are the ones visible to execution. Self-destructed contracts move to the
/// retired set: they keep their record (so the address can never be created again and any
/// custody coin can still be spent) but no longer show up in [`VmState::addresses`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VmState {
    accounts: HashMap<Address, Account>,

    #[serde(default)]
    retired: HashMap<Address, Account>,

    #[serde(skip)]
    journal: Vec<HashMap<Address, Slot>>,
}

impl VmState {
    /// Creates an empty [`VmState`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every account and every open checkpoint.
    pub fn reset(&mut self) {
        trace!("resetting vm state");
        *self = Self::default();
    }

    /// The balance of a live account, zero if it does not exist.
    ///
    /// ```
    /// use alloy::primitives::{Address, U256};
    /// use ledgervm_state::VmState;
    ///
    /// let mut state = VmState::new();
    /// let address = Address::repeat_byte(0x01);
    /// state.add_balance(address, U256::from(1300));
    ///
    /// assert_eq!(state.balance(&address), U256::from(1300));
    /// assert_eq!(state.balance(&Address::ZERO), U256::ZERO);
    /// ```
    pub fn balance(&self, address: &Address) -> U256 {
        self.accounts.get(address).map(|account| account.balance).unwrap_or_default()
    }

    /// A snapshot of every live account and its balance.
    pub fn addresses(&self) -> HashMap<Address, U256> {
        self.accounts.iter().map(|(address, account)| (*address, account.balance)).collect()
    }

    /// A live account.
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// The runtime code of a live contract.
    pub fn code(&self, address: &Address) -> Option<&Bytes> {
        self.accounts.get(address).and_then(|account| account.code.as_ref())
    }

    /// The creation counter of a live account, zero if it does not exist.
    pub fn nonce(&self, address: &Address) -> u64 {
        self.accounts.get(address).map(|account| account.nonce).unwrap_or_default()
    }

    /// A storage word of a live account, zero if unset.
    pub fn storage_at(&self, address: &Address, key: &B256) -> B256 {
        self.accounts
            .get(address)
            .and_then(|account| account.storage.get(key).copied())
            .unwrap_or_default()
    }

    /// Whether the address is a live account.
    pub fn exists(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    /// Whether the address is a live contract.
    pub fn is_contract(&self, address: &Address) -> bool {
        self.accounts.get(address).is_some_and(Account::is_contract)
    }

    /// Whether the address was self-destructed.
    pub fn is_retired(&self, address: &Address) -> bool {
        self.retired.contains_key(address)
    }

    /// Whether the address can no longer be used for a contract creation.
    pub fn is_used(&self, address: &Address) -> bool {
        self.is_retired(address) ||
            self.accounts.get(address).is_some_and(|account| {
                account.is_contract() || account.nonce > 0
            })
    }

    /// The custody coin of a live or retired contract.
    pub fn custody(&self, address: &Address) -> Option<Coin> {
        self.accounts
            .get(address)
            .or_else(|| self.retired.get(address))
            .and_then(|account| account.custody)
    }

    /// Number of open checkpoints.
    pub fn depth(&self) -> usize {
        self.journal.len()
    }

    /// Credits an account, creating it if needed. Zero credits are a no-op.
    pub fn add_balance(&mut self, address: Address, value: U256) {
        if value.is_zero() {
            return;
        }

        trace!(%address, %value, "credit");
        let account = self.live_mut(address);
        account.balance = account.balance.saturating_add(value);
    }

    /// Debits an account.
    pub fn sub_balance(&mut self, address: Address, value: U256) -> Result<(), Error> {
        if value.is_zero() {
            return Ok(());
        }

        let balance = self.balance(&address);
        if balance < value {
            return Err(Error::InsufficientBalance { address, balance, required: value });
        }

        trace!(%address, %value, "debit");
        self.live_mut(address).balance = balance - value;
        Ok(())
    }

    /// Moves `value` from one account to another.
    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), Error> {
        self.sub_balance(from, value)?;
        self.add_balance(to, value);
        Ok(())
    }

    /// Writes a storage word of a live account.
    pub fn set_storage(&mut self, address: Address, key: B256, value: B256) -> Result<(), Error> {
        if !self.exists(&address) {
            return Err(Error::UnknownAccount(address));
        }

        let account = self.live_mut(address);
        if value.is_zero() {
            account.storage.remove(&key);
        } else {
            account.storage.insert(key, value);
        }
        Ok(())
    }

    /// Installs runtime code at `address`.
    ///
    /// The address may already hold a balance (value can be sent to an address before a
    /// contract is created there) but must not hold code, must not have created anything,
    /// and must never have been retired.
    pub fn deploy(&mut self, address: Address, code: Bytes) -> Result<(), Error> {
        if self.is_used(&address) {
            return Err(Error::AddressInUse(address));
        }

        trace!(%address, size = code.len(), "deploy");
        let account = self.live_mut(address);
        account.code = Some(code);
        account.nonce = 1;
        Ok(())
    }

    /// Creates a contract on behalf of `creator`, as done by contract code during execution.
    ///
    /// The new address is derived from the creator and its current nonce, and the nonce is
    /// advanced. `value` moves from the creator to the new contract.
    pub fn create_contract(
        &mut self,
        creator: Address,
        code: Bytes,
        value: U256,
    ) -> Result<Address, Error> {
        if !self.exists(&creator) {
            return Err(Error::UnknownAccount(creator));
        }

        let nonce = self.nonce(&creator);
        let address = nested_contract_address(&creator, nonce);
        self.live_mut(creator).nonce = nonce + 1;

        self.deploy(address, code)?;
        self.transfer(creator, address, value)?;
        Ok(address)
    }

    /// Destroys a contract: its whole balance moves to `beneficiary` and the account is
    /// retired. Returns the amount paid out.
    pub fn self_destruct(&mut self, address: Address, beneficiary: Address) -> Result<U256, Error> {
        if address == beneficiary {
            return Err(Error::SelfDestructToSelf(address));
        }
        if !self.exists(&address) {
            return Err(Error::UnknownAccount(address));
        }

        let balance = self.balance(&address);
        self.transfer(address, beneficiary, balance)?;

        self.touch(address);
        if let Some(account) = self.accounts.remove(&address) {
            trace!(%address, %beneficiary, %balance, "self-destruct");
            self.retired.insert(address, account);
        }
        Ok(balance)
    }

    /// Removes a code-less account whose funds now live in a ledger output. Returns the
    /// balance it held.
    pub fn sweep(&mut self, address: Address) -> Result<U256, Error> {
        let Some(account) = self.accounts.get(&address) else { return Ok(U256::ZERO) };
        if account.is_contract() {
            return Err(Error::ContractAccount(address));
        }

        self.touch(address);
        let balance = self.accounts.remove(&address).map(|a| a.balance).unwrap_or_default();
        trace!(%address, %balance, "sweep");
        Ok(balance)
    }

    /// Records the ledger output holding a contract's balance.
    pub fn set_custody(&mut self, address: Address, coin: Option<Coin>) -> Result<(), Error> {
        if !self.accounts.contains_key(&address) && !self.retired.contains_key(&address) {
            return Err(Error::UnknownAccount(address));
        }

        self.touch(address);
        let account = match self.accounts.get_mut(&address) {
            Some(account) => account,
            None => self.retired.get_mut(&address).ok_or(Error::UnknownAccount(address))?,
        };
        account.custody = coin;
        Ok(())
    }

    /// Opens a checkpoint.
    pub fn checkpoint(&mut self) {
        self.journal.push(HashMap::new());
        trace!(depth = self.journal.len(), "checkpoint");
    }

    /// Keeps every change made since the last checkpoint.
    pub fn commit(&mut self) -> Result<(), Error> {
        let frame = self.journal.pop().ok_or(Error::NoCheckpoint)?;
        trace!(depth = self.journal.len(), touched = frame.len(), "commit");

        // the parent must still be able to undo to what it saw first
        if let Some(parent) = self.journal.last_mut() {
            for (address, slot) in frame {
                parent.entry(address).or_insert(slot);
            }
        }
        Ok(())
    }

    /// Undoes every change made since the last checkpoint.
    pub fn revert(&mut self) -> Result<(), Error> {
        let frame = self.journal.pop().ok_or(Error::NoCheckpoint)?;
        trace!(depth = self.journal.len(), touched = frame.len(), "revert");

        for (address, slot) in frame {
            self.accounts.remove(&address);
            self.retired.remove(&address);
            match slot {
                Slot::Vacant => {}
                Slot::Live(account) => {
                    self.accounts.insert(address, account);
                }
                Slot::Retired(account) => {
                    self.retired.insert(address, account);
                }
            }
        }
        Ok(())
    }

    /// Reverts every checkpoint opened above `depth`. `revert_to(0)` discards every open
    /// checkpoint.
    pub fn revert_to(&mut self, depth: usize) {
        while self.journal.len() > depth {
            if self.revert().is_err() {
                break;
            }
        }
    }

    /// A deterministic digest of the whole account set, live and retired.
    pub fn state_root(&self) -> B256 {
        let mut entries = self
            .accounts
            .iter()
            .map(|(address, account)| (address, 0u8, account))
            .chain(self.retired.iter().map(|(address, account)| (address, 1u8, account)))
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut preimage = Vec::with_capacity(entries.len() * 128);
        for (address, tag, account) in entries {
            preimage.extend_from_slice(address.as_slice());
            preimage.push(tag);
            preimage.extend_from_slice(&account.nonce.to_be_bytes());
            preimage.extend_from_slice(&account.balance.to_be_bytes::<32>());
            match &account.code {
                Some(code) => preimage.extend_from_slice(keccak256(code).as_slice()),
                None => preimage.extend_from_slice(B256::ZERO.as_slice()),
            }

            let mut storage = account.storage.iter().collect::<Vec<_>>();
            storage.sort();
            preimage.extend_from_slice(&(storage.len() as u64).to_be_bytes());
            for (key, value) in storage {
                preimage.extend_from_slice(key.as_slice());
                preimage.extend_from_slice(value.as_slice());
            }

            if let Some(coin) = &account.custody {
                preimage.extend_from_slice(coin.outpoint.hash.as_slice());
                preimage.extend_from_slice(&coin.outpoint.index.to_be_bytes());
                preimage.extend_from_slice(&coin.value.to_be_bytes());
            }
        }

        keccak256(preimage)
    }

    /// Records what `address` held before the first write in the current checkpoint.
    fn touch(&mut self, address: Address) {
        let Some(frame) = self.journal.last_mut() else { return };
        if frame.contains_key(&address) {
            return;
        }

        let slot = match (self.accounts.get(&address), self.retired.get(&address)) {
            (Some(account), _) => Slot::Live(account.clone()),
            (None, Some(account)) => Slot::Retired(account.clone()),
            (None, None) => Slot::Vacant,
        };
        frame.insert(address, slot);
    }

    /// A journaled mutable handle to a live account, created on demand.
    fn live_mut(&mut self, address: Address) -> &mut Account {
        self.touch(address);
        self.accounts.entry(address).or_default()
    }
}
