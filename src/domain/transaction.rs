use super::account::{AccountRef, UserId};
use super::money::Amount;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const MAX_TRANSACTION_ID_LEN: usize = 64;

/// The idempotency key of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::MalformedInput(
                "transaction_id must not be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > MAX_TRANSACTION_ID_LEN {
            return Err(LedgerError::MalformedInput(format!(
                "transaction_id longer than {} characters",
                MAX_TRANSACTION_ID_LEN
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// A fresh random (v4) UUID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TransactionId {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A signed payment instruction as submitted by a downstream system.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInstruction {
    pub transaction_id: TransactionId,
    #[serde(rename = "account_id")]
    pub account_ref: AccountRef,
    pub user_id: UserId,
    pub amount: Amount,
    pub signature: String,
}

// Signatures stay out of logs.
impl fmt::Debug for TransactionInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionInstruction")
            .field("transaction_id", &self.transaction_id)
            .field("account_ref", &self.account_ref)
            .field("user_id", &self.user_id)
            .field("amount", &self.amount)
            .field("signature", &"<redacted>")
            .finish()
    }
}

/// An outbound order is a signed instruction awaiting submission.
pub type PaymentOrder = TransactionInstruction;

/// Fields for generating a [`PaymentOrder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    #[serde(rename = "account_id")]
    pub account_ref: AccountRef,
    pub user_id: UserId,
    pub amount: Amount,
}
