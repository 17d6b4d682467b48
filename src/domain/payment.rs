use super::account::{AccountId, UserId};
use super::money::Amount;
use super::transaction::TransactionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An applied balance change. Append-only; keyed by `transaction_id`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct PaymentRecord {
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    pub account_id: AccountId,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn new(
        transaction_id: TransactionId,
        user_id: UserId,
        account_id: AccountId,
        amount: Amount,
    ) -> Self {
        Self {
            transaction_id,
            user_id,
            account_id,
            amount,
            created_at: Utc::now(),
        }
    }
}
