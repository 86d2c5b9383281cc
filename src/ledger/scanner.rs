use serde::Serialize;
use tracing::{Span, debug, warn};

use crate::{
    store::{StateCursor, StateEntry, StateStore, StoreError},
    wallet::{WalletKey, WalletRecord},
};

use super::{LedgerError, WalletLedger};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ScannedRecord {
    Wallet(WalletRecord),
    /// Stored value that did not decode as a wallet, as lossy UTF-8.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    #[serde(rename = "Key")]
    pub key: WalletKey,
    #[serde(rename = "Record")]
    pub record: ScannedRecord,
}

/// Closes the cursor when dropped, unless it was closed explicitly.
struct CursorGuard<'c> {
    cursor: Box<dyn StateCursor + 'c>,
    closed: bool,
    span: Span,
}

impl CursorGuard<'_> {
    fn next_entry(&mut self) -> Result<Option<StateEntry>, StoreError> {
        self.cursor.next_entry()
    }

    fn close(mut self) -> Result<(), StoreError> {
        self.closed = true;
        self.cursor.close()
    }
}

impl Drop for CursorGuard<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.cursor.close() {
            warn!(parent: &self.span, error = %err, "failed to release range cursor");
        }
    }
}

impl WalletLedger {
    /// Collects every stored wallet in key order.
    ///
    /// Values that fail to decode are kept as raw strings instead of failing
    /// the scan. Empty values count as absent and are skipped. The whole key
    /// space is read before returning, and the cursor is released on every
    /// path out of this function.
    pub fn scan_all<S: StateStore>(&self, store: &mut S) -> Result<Vec<ScanEntry>, LedgerError> {
        let mut cursor = CursorGuard {
            cursor: store.range_scan("", "")?,
            closed: false,
            span: self.span.clone(),
        };

        let mut entries = Vec::new();
        while let Some(StateEntry { key, value }) = cursor.next_entry()? {
            if value.is_empty() {
                continue;
            }
            let record = match WalletRecord::decode(&value) {
                Ok(record) => ScannedRecord::Wallet(record),
                Err(err) => {
                    warn!(
                        parent: &self.span,
                        key = key.as_str(),
                        error = %err,
                        "keeping undecodable wallet as raw value"
                    );
                    ScannedRecord::Raw(String::from_utf8_lossy(&value).into_owned())
                }
            };
            entries.push(ScanEntry { key, record });
        }
        cursor.close()?;

        debug!(parent: &self.span, wallets = entries.len(), "scan complete");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use crate::store::in_memory_store::InMemoryStore;

    use super::*;

    fn wallet(key: &str, owner: &str, balance: u64) -> ScanEntry {
        ScanEntry {
            key: key.to_string(),
            record: ScannedRecord::Wallet(WalletRecord::new(owner, balance)),
        }
    }

    /// Yields one entry, then fails.
    struct BrokenCursor {
        yielded: bool,
        closed: Rc<Cell<bool>>,
    }

    impl StateCursor for BrokenCursor {
        fn next_entry(&mut self) -> Result<Option<StateEntry>, StoreError> {
            if self.yielded {
                return Err(StoreError::Unavailable("peer went away".to_string()));
            }
            self.yielded = true;
            Ok(Some(StateEntry {
                key: "1001".to_string(),
                value: WalletRecord::new("alice", 1).encode().unwrap(),
            }))
        }

        fn close(&mut self) -> Result<(), StoreError> {
            self.closed.set(true);
            Ok(())
        }
    }

    struct BrokenStore {
        closed: Rc<Cell<bool>>,
    }

    impl StateStore for BrokenStore {
        fn get(&mut self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        fn put(&mut self, _key: &str, _value: Vec<u8>) -> Result<(), StoreError> {
            Ok(())
        }

        fn delete(&mut self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }

        fn range_scan<'s>(
            &'s mut self,
            _start: &str,
            _end: &str,
        ) -> Result<Box<dyn StateCursor + 's>, StoreError> {
            Ok(Box::new(BrokenCursor {
                yielded: false,
                closed: self.closed.clone(),
            }))
        }
    }

    #[test]
    fn scan_follows_creates_and_deletes() {
        let store = InMemoryStore::new();
        let ledger = WalletLedger::default();

        let mut tx = store.begin();
        ledger.create(&mut tx, "1002", "bob", 50).unwrap();
        ledger.create(&mut tx, "1001", "alice", 100).unwrap();
        tx.commit().unwrap();

        let entries = ledger.scan_all(&mut store.begin()).unwrap();
        assert_eq!(
            entries,
            [wallet("1001", "alice", 100), wallet("1002", "bob", 50)]
        );

        let mut tx = store.begin();
        ledger.delete(&mut tx, "1001").unwrap();
        tx.commit().unwrap();

        let entries = ledger.scan_all(&mut store.begin()).unwrap();
        assert_eq!(entries, [wallet("1002", "bob", 50)]);
        assert_eq!(store.open_cursors(), 0);
    }

    #[test]
    fn undecodable_values_are_kept_raw() {
        let store = InMemoryStore::new();
        let mut tx = store.begin();
        tx.put("1001", WalletRecord::new("alice", 3).encode().unwrap())
            .unwrap();
        tx.put("1002", b"legacy wallet".to_vec()).unwrap();
        tx.put("1003", Vec::new()).unwrap();
        tx.commit().unwrap();

        let entries = WalletLedger::default()
            .scan_all(&mut store.begin())
            .unwrap();
        assert_eq!(
            entries,
            [
                wallet("1001", "alice", 3),
                ScanEntry {
                    key: "1002".to_string(),
                    record: ScannedRecord::Raw("legacy wallet".to_string()),
                }
            ]
        );
    }

    #[test]
    fn cursor_failure_aborts_and_releases() {
        let closed = Rc::new(Cell::new(false));
        let mut store = BrokenStore {
            closed: closed.clone(),
        };
        let err = WalletLedger::default().scan_all(&mut store).unwrap_err();
        assert!(matches!(err, LedgerError::Store(StoreError::Unavailable(_))));
        assert!(closed.get());
    }

    #[test]
    fn scan_serializes_as_key_record_pairs() {
        let entries = [
            wallet("1001", "alice", 70),
            ScanEntry {
                key: "1002".to_string(),
                record: ScannedRecord::Raw("oops".to_string()),
            },
        ];
        assert_eq!(
            serde_json::to_string(&entries).unwrap(),
            r#"[{"Key":"1001","Record":{"ownerId":"alice","balance":70}},{"Key":"1002","Record":"oops"}]"#
        );
    }
}
