use super::account::{Account, AccountId, AccountRef, UserId};
use super::money::Amount;
use super::payment::PaymentRecord;
use super::transaction::TransactionId;
use super::user::User;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Persistence for users, accounts and payment records.
///
/// Each method is one unit of work: it either fully applies or leaves the
/// store unchanged. Implementations serialize read-then-write operations on
/// the same account.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Idempotency probe.
    async fn find_payment(&self, transaction_id: &TransactionId) -> Result<Option<PaymentRecord>>;

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>>;

    async fn find_account(&self, user_id: UserId, account_ref: AccountRef) -> Result<Option<Account>>;

    async fn account_number_exists(&self, account_number: &str) -> Result<bool>;

    /// Inserts a zero-balance account unless `(user_id, account_ref)` already has
    /// one, in which case the existing account is returned unchanged.
    ///
    /// Fails with `UnknownUser` for a missing owner and `AccountResolutionFailed`
    /// when `account_number` is already taken.
    async fn create_account(
        &self,
        user_id: UserId,
        account_ref: AccountRef,
        account_number: String,
    ) -> Result<Account>;

    /// Atomically re-checks idempotency and funds, applies `amount` to the
    /// account and appends the payment record.
    async fn apply_and_record(
        &self,
        account_id: AccountId,
        amount: Amount,
        transaction_id: TransactionId,
        user_id: UserId,
    ) -> Result<(Account, PaymentRecord)>;

    /// Creates a user together with its default account.
    async fn register_user(&self, email: &str, account_number: String) -> Result<(User, Account)>;

    /// Deletes a user with all of its accounts and payment records.
    async fn remove_user(&self, user_id: UserId) -> Result<()>;

    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>>;

    async fn list_payments(&self, user_id: UserId) -> Result<Vec<PaymentRecord>>;

    async fn all_accounts(&self) -> Result<Vec<Account>>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
