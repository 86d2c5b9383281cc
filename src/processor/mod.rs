use thiserror::Error;

use crate::{
    command::{InvocationArgs, WalletCommandError, WalletOperation},
    ledger::{LedgerError, Outcome},
    store::StoreError,
};

pub mod in_memory_processor;

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error(transparent)]
    CommandErr(#[from] WalletCommandError),
    #[error(transparent)]
    LedgerErr(#[from] LedgerError),
    #[error("Invocation was not committed: {0}")]
    CommitErr(#[source] StoreError),
}

/// Runs one ledger operation as a single all-or-nothing invocation.
pub trait InvocationProcessor {
    fn process_invocation(
        &mut self,
        operation: WalletOperation,
        args: InvocationArgs,
    ) -> Result<Outcome, InvocationError>;
}
