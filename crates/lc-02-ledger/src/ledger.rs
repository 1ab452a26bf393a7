//! The account balance store.

use std::collections::HashMap;

use primitive_types::U256;
use shared_types::Address;
use tracing::debug;

/// In-memory `address -> balance` store.
///
/// Cloning snapshots the balances; block application works on a snapshot so
/// a refused block leaves no partial effects.
#[derive(Debug, Default, Clone)]
pub struct AccountLedger {
    balances: HashMap<Address, U256>,
}

impl AccountLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account unconditionally.
    ///
    /// No authorization check: callers decide when issuance is legitimate
    /// (genesis allocation, or an incoming cross-shard receipt whose trust
    /// was established by consensus).
    pub fn issue(&mut self, account: &Address, amount: U256) {
        let balance = self.balances.entry(account.clone()).or_insert_with(U256::zero);
        *balance += amount;
        debug!(%account, %balance, "issued");
    }

    /// Whether `from` can afford a debit of `amount`.
    ///
    /// False for a zero amount and for unknown accounts.
    pub fn check_transaction(&self, from: &Address, amount: U256) -> bool {
        match self.balances.get(from) {
            Some(balance) => amount > U256::zero() && *balance >= amount,
            None => false,
        }
    }

    /// Atomically debit `from` and credit `to`, iff the check passes.
    ///
    /// Returns false (leaving both balances untouched) otherwise.
    pub fn transact(&mut self, from: &Address, to: &Address, amount: U256) -> bool {
        if !self.check_transaction(from, amount) {
            return false;
        }

        if let Some(balance) = self.balances.get_mut(from) {
            *balance -= amount;
        }
        self.issue(to, amount);

        true
    }

    /// Debit-only half of a cross-shard transfer.
    ///
    /// The credit is applied on the destination shard when its receipt
    /// commits there.
    pub fn transact_outer(&mut self, from: &Address, amount: U256) -> bool {
        if !self.check_transaction(from, amount) {
            return false;
        }

        if let Some(balance) = self.balances.get_mut(from) {
            *balance -= amount;
        }

        true
    }

    /// Current balance; zero for unknown accounts.
    pub fn balance(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_else(U256::zero)
    }

    /// Number of accounts ever referenced.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Whether no account was ever referenced.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}
