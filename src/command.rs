use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::wallet::WalletKey;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WalletOperation {
    Exists,
    Create,
    Read,
    Update,
    Delete,
    Transfer,
    QueryAll,
}

/// What a successful invocation of an operation hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnContract {
    Flag,
    Wallet,
    Nothing,
    WalletList,
}

impl WalletOperation {
    pub const ALL: [WalletOperation; 7] = [
        Self::Exists,
        Self::Create,
        Self::Read,
        Self::Update,
        Self::Delete,
        Self::Transfer,
        Self::QueryAll,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Transfer => "transfer",
            Self::QueryAll => "query_all",
        }
    }

    /// Whether invocations of this operation stage writes that must be committed.
    pub const fn mutates(self) -> bool {
        match self {
            Self::Exists | Self::Read | Self::QueryAll => false,
            Self::Create | Self::Update | Self::Delete | Self::Transfer => true,
        }
    }

    pub const fn returns(self) -> ReturnContract {
        match self {
            Self::Exists => ReturnContract::Flag,
            Self::Read => ReturnContract::Wallet,
            Self::QueryAll => ReturnContract::WalletList,
            Self::Create | Self::Update | Self::Delete | Self::Transfer => ReturnContract::Nothing,
        }
    }
}

impl fmt::Display for WalletOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCommand {
    Exists {
        key: WalletKey,
    },
    Create {
        key: WalletKey,
        owner_id: String,
        initial_balance: i64,
    },
    Read {
        key: WalletKey,
    },
    Update {
        key: WalletKey,
        new_balance: i64,
    },
    Delete {
        key: WalletKey,
    },
    Transfer {
        from: WalletKey,
        to: WalletKey,
        amount: i64,
    },
    QueryAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Argument {
    Key,
    To,
    Owner,
    Amount,
}

#[derive(Debug, Error)]
pub enum WalletCommandError {
    #[error("{argument:?} is required for {operation}")]
    MissingArgument {
        operation: WalletOperation,
        argument: Argument,
    },
}

/// Loosely typed invocation arguments, as they arrive from a client.
#[derive(Debug, Clone, Default)]
pub struct InvocationArgs {
    pub key: Option<WalletKey>,
    pub to: Option<WalletKey>,
    pub owner: Option<String>,
    pub amount: Option<i64>,
}

impl WalletCommand {
    pub fn operation(&self) -> WalletOperation {
        match self {
            Self::Exists { .. } => WalletOperation::Exists,
            Self::Create { .. } => WalletOperation::Create,
            Self::Read { .. } => WalletOperation::Read,
            Self::Update { .. } => WalletOperation::Update,
            Self::Delete { .. } => WalletOperation::Delete,
            Self::Transfer { .. } => WalletOperation::Transfer,
            Self::QueryAll => WalletOperation::QueryAll,
        }
    }

    pub fn parse_command(
        operation: WalletOperation,
        args: InvocationArgs,
    ) -> Result<Self, WalletCommandError> {
        let InvocationArgs {
            key,
            to,
            owner,
            amount,
        } = args;
        let require = |value: Option<String>, argument: Argument| {
            value.ok_or(WalletCommandError::MissingArgument {
                operation,
                argument,
            })
        };
        match operation {
            WalletOperation::Exists => Ok(Self::Exists {
                key: require(key, Argument::Key)?,
            }),
            WalletOperation::Create => Ok(Self::Create {
                key: require(key, Argument::Key)?,
                owner_id: require(owner, Argument::Owner)?,
                initial_balance: Self::require_amount(operation, amount)?,
            }),
            WalletOperation::Read => Ok(Self::Read {
                key: require(key, Argument::Key)?,
            }),
            WalletOperation::Update => Ok(Self::Update {
                key: require(key, Argument::Key)?,
                new_balance: Self::require_amount(operation, amount)?,
            }),
            WalletOperation::Delete => Ok(Self::Delete {
                key: require(key, Argument::Key)?,
            }),
            WalletOperation::Transfer => Ok(Self::Transfer {
                from: require(key, Argument::Key)?,
                to: require(to, Argument::To)?,
                amount: Self::require_amount(operation, amount)?,
            }),
            WalletOperation::QueryAll => Ok(Self::QueryAll),
        }
    }

    fn require_amount(
        operation: WalletOperation,
        amount: Option<i64>,
    ) -> Result<i64, WalletCommandError> {
        amount.ok_or(WalletCommandError::MissingArgument {
            operation,
            argument: Argument::Amount,
        })
    }
}
