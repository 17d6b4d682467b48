use super::money::{Amount, Balance};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type AccountId = u64;
/// The caller-facing account reference ("account_id" on the wire).
pub type AccountRef = u64;

/// Reference given to the account provisioned at user registration.
pub const DEFAULT_ACCOUNT_REF: AccountRef = 1;

/// A balance-holding account ("score") owned by a single user.
///
/// `(user_id, account_ref)` and `account_number` are each unique across the
/// ledger. The balance only changes through [`Account::apply`], which the
/// store calls inside its unit of work.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Account {
    /// Internal identifier assigned by the store.
    pub id: AccountId,
    /// The owning user.
    pub user_id: UserId,
    /// External reference used by instructions to address this account.
    pub account_ref: AccountRef,
    /// Generated 20-digit account number.
    pub account_number: String,
    pub balance: Balance,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        id: AccountId,
        user_id: UserId,
        account_ref: AccountRef,
        account_number: String,
    ) -> Self {
        Self {
            id,
            user_id,
            account_ref,
            account_number,
            balance: Balance::ZERO,
            created_at: Utc::now(),
        }
    }

    /// Applies a credit or debit. On error the balance is left untouched.
    pub fn apply(&mut self, amount: Amount) -> Result<()> {
        self.balance = self.balance.apply(amount)?;
        Ok(())
    }
}
