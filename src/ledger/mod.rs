use thiserror::Error;
use tracing::{Span, debug, info};

use crate::{
    command::{WalletCommand, WalletOperation},
    store::{StateStore, StoreError},
    wallet::{Balance, DecodeError, EncodeError, WalletKey, WalletRecord},
};

pub mod scanner;

pub use scanner::{ScanEntry, ScannedRecord};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("The user wallet {} does not exist", .keys.join(", "))]
    NotFound { keys: Vec<WalletKey> },
    #[error("The user wallet {key} already exists")]
    AlreadyExists { key: WalletKey },
    #[error("Invalid amount {amount} for {operation}")]
    InvalidAmount {
        operation: WalletOperation,
        amount: i64,
    },
    #[error("The user wallet {key} doesn't have enough token: balance {balance}, requested {requested}")]
    InsufficientBalance {
        key: WalletKey,
        balance: Balance,
        requested: Balance,
    },
    #[error("The user wallet {key} cannot hold the transferred amount")]
    BalanceOverflow { key: WalletKey },
    #[error("The user wallet {key} is unreadable: {source}")]
    Decode { key: WalletKey, source: DecodeError },
    #[error("The user wallet {key} cannot be stored: {source}")]
    Encode { key: WalletKey, source: EncodeError },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    fn not_found(key: &str) -> Self {
        Self::NotFound {
            keys: vec![key.to_string()],
        }
    }
}

/// Result of a successful [`WalletLedger::execute`], shaped after the
/// operation's [`crate::command::ReturnContract`].
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Flag(bool),
    Wallet(WalletRecord),
    Nothing,
    WalletList(Vec<ScanEntry>),
}

/// Wallet operations on top of a [`StateStore`].
///
/// The ledger keeps no state between calls. Each operation assumes the store
/// commits everything it staged during the invocation as a single unit, or
/// nothing if the operation fails; that is what makes a transfer's two puts
/// atomic.
#[derive(Debug, Clone)]
pub struct WalletLedger {
    span: Span,
}

impl Default for WalletLedger {
    fn default() -> Self {
        Self::new(Span::none())
    }
}

impl WalletLedger {
    /// Every event is emitted as a child of `span`.
    pub fn new(span: Span) -> Self {
        Self { span }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn execute<S: StateStore>(
        &self,
        store: &mut S,
        command: WalletCommand,
    ) -> Result<Outcome, LedgerError> {
        match command {
            WalletCommand::Exists { key } => self.exists(store, &key).map(Outcome::Flag),
            WalletCommand::Create {
                key,
                owner_id,
                initial_balance,
            } => self
                .create(store, &key, &owner_id, initial_balance)
                .map(|_| Outcome::Nothing),
            WalletCommand::Read { key } => self.read(store, &key).map(Outcome::Wallet),
            WalletCommand::Update { key, new_balance } => self
                .update(store, &key, new_balance)
                .map(|_| Outcome::Nothing),
            WalletCommand::Delete { key } => self.delete(store, &key).map(|_| Outcome::Nothing),
            WalletCommand::Transfer { from, to, amount } => self
                .transfer(store, &from, &to, amount)
                .map(|_| Outcome::Nothing),
            WalletCommand::QueryAll => self.scan_all(store).map(Outcome::WalletList),
        }
    }

    pub fn exists<S: StateStore>(&self, store: &mut S, key: &str) -> Result<bool, LedgerError> {
        Ok(Self::stored_value(store, key)?.is_some())
    }

    pub fn create<S: StateStore>(
        &self,
        store: &mut S,
        key: &str,
        owner_id: &str,
        initial_balance: i64,
    ) -> Result<(), LedgerError> {
        if Self::stored_value(store, key)?.is_some() {
            return Err(LedgerError::AlreadyExists {
                key: key.to_string(),
            });
        }
        let balance = Self::non_negative(WalletOperation::Create, initial_balance)?;
        store.put(key, Self::encode(key, &WalletRecord::new(owner_id, balance))?)?;
        info!(parent: &self.span, key, owner_id, balance, "wallet created");
        Ok(())
    }

    pub fn read<S: StateStore>(
        &self,
        store: &mut S,
        key: &str,
    ) -> Result<WalletRecord, LedgerError> {
        let record = self
            .fetch(store, key)?
            .ok_or_else(|| LedgerError::not_found(key))?;
        debug!(parent: &self.span, key, balance = record.balance, "wallet read");
        Ok(record)
    }

    /// Replaces the balance, keeping the owner.
    pub fn update<S: StateStore>(
        &self,
        store: &mut S,
        key: &str,
        new_balance: i64,
    ) -> Result<(), LedgerError> {
        let mut record = self
            .fetch(store, key)?
            .ok_or_else(|| LedgerError::not_found(key))?;
        record.balance = Self::non_negative(WalletOperation::Update, new_balance)?;
        store.put(key, Self::encode(key, &record)?)?;
        info!(parent: &self.span, key, balance = record.balance, "wallet updated");
        Ok(())
    }

    pub fn delete<S: StateStore>(&self, store: &mut S, key: &str) -> Result<(), LedgerError> {
        if Self::stored_value(store, key)?.is_none() {
            return Err(LedgerError::not_found(key));
        }
        store.delete(key)?;
        info!(parent: &self.span, key, "wallet deleted");
        Ok(())
    }

    /// Moves `amount` tokens from `from_key` to `to_key`.
    ///
    /// Both records are re-encoded and staged with two separate puts. The
    /// puts only become visible together, when the store commits the
    /// invocation, so no reader can observe tokens in flight. A transfer from
    /// a wallet to itself is validated like any other and stages nothing:
    /// the store has no read-your-own-write, so two puts of the same key would
    /// keep only the credited one.
    pub fn transfer<S: StateStore>(
        &self,
        store: &mut S,
        from_key: &str,
        to_key: &str,
        amount: i64,
    ) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount {
                operation: WalletOperation::Transfer,
                amount,
            });
        }
        let amount = amount.unsigned_abs();

        let from = self.fetch(store, from_key)?;
        let to = if from_key == to_key {
            from.clone()
        } else {
            self.fetch(store, to_key)?
        };
        let (mut from, mut to) = match (from, to) {
            (Some(from), Some(to)) => (from, to),
            (from, to) => {
                let mut keys = Vec::new();
                if from.is_none() {
                    keys.push(from_key.to_string());
                }
                if to.is_none() && from_key != to_key {
                    keys.push(to_key.to_string());
                }
                return Err(LedgerError::NotFound { keys });
            }
        };

        if from.balance < amount {
            return Err(LedgerError::InsufficientBalance {
                key: from_key.to_string(),
                balance: from.balance,
                requested: amount,
            });
        }
        if from_key == to_key {
            debug!(parent: &self.span, key = from_key, amount, "self transfer, nothing staged");
            return Ok(());
        }

        from.balance -= amount;
        to.balance = to
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                key: to_key.to_string(),
            })?;

        let debited = Self::encode(from_key, &from)?;
        let credited = Self::encode(to_key, &to)?;
        store.put(from_key, debited)?;
        store.put(to_key, credited)?;
        info!(
            parent: &self.span,
            from = from_key,
            to = to_key,
            amount,
            "transfer staged"
        );
        Ok(())
    }

    /// Present and non-empty value stored under `key`.
    fn stored_value<S: StateStore>(
        store: &mut S,
        key: &str,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(store.get(key)?.filter(|value| !value.is_empty()))
    }

    /// Existence check and read in one store round trip.
    fn fetch<S: StateStore>(
        &self,
        store: &mut S,
        key: &str,
    ) -> Result<Option<WalletRecord>, LedgerError> {
        Self::stored_value(store, key)?
            .map(|bytes| {
                WalletRecord::decode(&bytes).map_err(|source| LedgerError::Decode {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    fn encode(key: &str, record: &WalletRecord) -> Result<Vec<u8>, LedgerError> {
        record.encode().map_err(|source| LedgerError::Encode {
            key: key.to_string(),
            source,
        })
    }

    fn non_negative(operation: WalletOperation, amount: i64) -> Result<Balance, LedgerError> {
        Balance::try_from(amount).map_err(|_| LedgerError::InvalidAmount { operation, amount })
    }
}
