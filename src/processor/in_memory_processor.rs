use tracing::debug;

use crate::{
    command::{InvocationArgs, WalletCommand, WalletOperation},
    ledger::{Outcome, WalletLedger},
    store::in_memory_store::InMemoryStore,
};

use super::{InvocationError, InvocationProcessor};

#[derive(Debug, Default)]
pub struct InMemoryInvocationProcessor {
    pub store: InMemoryStore,
    ledger: WalletLedger,
}

impl InMemoryInvocationProcessor {
    pub fn new(store: InMemoryStore, ledger: WalletLedger) -> Self {
        Self { store, ledger }
    }
}

impl InvocationProcessor for InMemoryInvocationProcessor {
    fn process_invocation(
        &mut self,
        operation: WalletOperation,
        args: InvocationArgs,
    ) -> Result<Outcome, InvocationError> {
        let cmd = WalletCommand::parse_command(operation, args)?;
        let mut tx = self.store.begin();
        // on error the transaction is dropped, discarding whatever was staged
        let outcome = self.ledger.execute(&mut tx, cmd)?;
        if operation.mutates() {
            debug!(
                parent: self.ledger.span(),
                %operation,
                staged = tx.staged_writes(),
                "committing invocation"
            );
            tx.commit().map_err(InvocationError::CommitErr)?;
        }
        Ok(outcome)
    }
}
