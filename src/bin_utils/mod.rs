//! Replays a CSV file of invocations against an in-memory store and prints
//! the resulting wallets. Used by the `wallet-ledger` binary and the
//! integration tests.

use std::io::{Read, Write};

use crate::{
    command::{InvocationArgs, WalletOperation},
    ledger::{Outcome, WalletLedger},
    processor::{
        InvocationError, InvocationProcessor, in_memory_processor::InMemoryInvocationProcessor,
    },
    store::in_memory_store::InMemoryStore,
};
use anyhow::{Context, Result};
use csv_parser::CsvInvocationParser;
use csv_printer::print_wallets;
use tracing::Span;
pub mod csv_parser;
pub mod csv_printer;

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(u64, InvocationError)>,
    pub span: Span,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let parser = CsvInvocationParser::new(self.input);

        let ledger = WalletLedger::new(self.span.clone());
        let store = InMemoryStore::with_span(self.span.clone());
        let mut processor = InMemoryInvocationProcessor::new(store, ledger);

        for (line, row) in parser {
            let (operation, args) = row
                .with_context(|| format!("Malformed invocation at line {line}"))?
                .into_parts();
            if let Err(err) = processor.process_invocation(operation, args) {
                (self.error_printer)(line, err);
            }
        }

        let Outcome::WalletList(entries) =
            processor.process_invocation(WalletOperation::QueryAll, InvocationArgs::default())?
        else {
            anyhow::bail!("Wallet query returned an unexpected outcome");
        };

        print_wallets(self.output, entries)
    }
}
