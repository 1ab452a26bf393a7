//! Outbound port: contract execution.

use shared_types::{ExecuteContract, Hash, SetContract};

/// Pluggable execution capability for contract payloads.
///
/// The core carries and signature-checks contract transactions like any
/// other payload but never executes them; an embedding application may plug
/// a sandbox in here. Returning false rejects the enclosing block.
pub trait ContractExecutor: Send + Sync {
    /// Install a contract. `tx_hash` identifies the installing transaction
    /// and doubles as the contract's address.
    fn set_contract(&self, tx_hash: &Hash, contract: &SetContract) -> bool;

    /// Invoke an installed contract.
    fn execute_contract(&self, call: &ExecuteContract) -> bool;
}

/// Default capability: accept and ignore every contract payload.
pub struct NoopContractExecutor;

impl ContractExecutor for NoopContractExecutor {
    fn set_contract(&self, _tx_hash: &Hash, _contract: &SetContract) -> bool {
        true
    }

    fn execute_contract(&self, _call: &ExecuteContract) -> bool {
        true
    }
}
