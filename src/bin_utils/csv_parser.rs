use std::io::Read;

use crate::command::{InvocationArgs, WalletOperation};
use csv::{DeserializeRecordsIntoIter, Trim};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Invocation {
    pub op: WalletOperation,
    pub key: Option<String>,
    pub to: Option<String>,
    pub owner: Option<String>,
    pub amount: Option<i64>,
}

impl Invocation {
    pub fn into_parts(self) -> (WalletOperation, InvocationArgs) {
        (
            self.op,
            InvocationArgs {
                key: self.key,
                to: self.to,
                owner: self.owner,
                amount: self.amount,
            },
        )
    }
}

/// Parses an invocation list in CSV format, yielding each row with its line number.
pub struct CsvInvocationParser<R> {
    iter: DeserializeRecordsIntoIter<R, Invocation>,
}

impl<R> CsvInvocationParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R> Iterator for CsvInvocationParser<R>
where
    R: Read,
{
    type Item = (u64, csv::Result<Invocation>);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row))
    }
}
