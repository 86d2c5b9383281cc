use std::io::Write;

use anyhow::Context;
use csv::Writer;
use serde::Serialize;

use crate::{
    ledger::{ScanEntry, ScannedRecord},
    wallet::{Balance, WalletKey},
};

/// One output row. Values that did not decode as wallets keep their key and
/// land in `raw`, with `owner` and `balance` left empty.
#[derive(Debug, Serialize)]
struct WalletRow {
    key: WalletKey,
    owner: Option<String>,
    balance: Option<Balance>,
    raw: Option<String>,
}

impl From<ScanEntry> for WalletRow {
    fn from(entry: ScanEntry) -> Self {
        match entry.record {
            ScannedRecord::Wallet(record) => Self {
                key: entry.key,
                owner: Some(record.owner_id),
                balance: Some(record.balance),
                raw: None,
            },
            ScannedRecord::Raw(raw) => Self {
                key: entry.key,
                owner: None,
                balance: None,
                raw: Some(raw),
            },
        }
    }
}

pub fn print_wallets<W>(output: &mut W, entries: Vec<ScanEntry>) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for entry in entries {
        let key = entry.key.clone();
        writer
            .serialize(WalletRow::from(entry))
            .with_context(|| format!("Failed to write wallet `{key}` to CSV"))?;
    }
    writer.flush().context("Failed to flush CSV writer")
}
