use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type WalletKey = String;
pub type Balance = u64;

#[derive(Debug, Error)]
#[error("Malformed wallet record: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

#[derive(Debug, Error)]
#[error("Wallet record could not be encoded: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub owner_id: String,
    pub balance: Balance,
}

impl WalletRecord {
    pub fn new(owner_id: impl Into<String>, balance: Balance) -> Self {
        Self {
            owner_id: owner_id.into(),
            balance,
        }
    }

    /// Encodes the record as a JSON object, `ownerId` then `balance`.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a stored value. Unknown fields are ignored, missing fields and
    /// negative balances are rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
