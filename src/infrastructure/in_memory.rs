use crate::domain::account::{Account, AccountId, AccountRef, DEFAULT_ACCOUNT_REF, UserId};
use crate::domain::money::Amount;
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::LedgerStore;
use crate::domain::transaction::TransactionId;
use crate::domain::user::User;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// An account row behind its own lock. `removed` is set when the owner is
/// deleted so that writers still holding the slot cannot resurrect it.
#[derive(Debug)]
struct AccountSlot {
    account: Account,
    removed: bool,
}

#[derive(Default)]
struct UserTable {
    users: HashMap<UserId, User>,
    next_id: UserId,
}

#[derive(Default)]
struct AccountTable {
    by_id: HashMap<AccountId, Arc<Mutex<AccountSlot>>>,
    by_ref: HashMap<(UserId, AccountRef), AccountId>,
    by_number: HashMap<String, AccountId>,
    next_id: AccountId,
}

impl AccountTable {
    fn insert(&mut self, user_id: UserId, account_ref: AccountRef, account_number: String) -> Account {
        self.next_id += 1;
        let account = Account::new(self.next_id, user_id, account_ref, account_number);
        self.by_ref.insert((user_id, account_ref), account.id);
        self.by_number.insert(account.account_number.clone(), account.id);
        self.by_id.insert(
            account.id,
            Arc::new(Mutex::new(AccountSlot {
                account: account.clone(),
                removed: false,
            })),
        );
        account
    }
}

/// A thread-safe in-memory ledger.
///
/// Tables sit behind `tokio::sync::RwLock`s and every account has its own
/// `Mutex`, so balance updates on one account never wait on another. Locks are
/// always taken in the order users, accounts, account slot, payments.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    users: Arc<RwLock<UserTable>>,
    accounts: Arc<RwLock<AccountTable>>,
    payments: Arc<RwLock<HashMap<TransactionId, PaymentRecord>>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn find_payment(&self, transaction_id: &TransactionId) -> Result<Option<PaymentRecord>> {
        let payments = self.payments.read().await;
        Ok(payments.get(transaction_id).cloned())
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.users.get(&user_id).cloned())
    }

    async fn find_account(&self, user_id: UserId, account_ref: AccountRef) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        let Some(slot) = accounts
            .by_ref
            .get(&(user_id, account_ref))
            .and_then(|id| accounts.by_id.get(id))
        else {
            return Ok(None);
        };
        let slot = slot.lock().await;
        Ok(Some(slot.account.clone()))
    }

    async fn account_number_exists(&self, account_number: &str) -> Result<bool> {
        let accounts = self.accounts.read().await;
        Ok(accounts.by_number.contains_key(account_number))
    }

    async fn create_account(
        &self,
        user_id: UserId,
        account_ref: AccountRef,
        account_number: String,
    ) -> Result<Account> {
        let users = self.users.read().await;
        if !users.users.contains_key(&user_id) {
            return Err(LedgerError::UnknownUser { user_id });
        }

        let mut accounts = self.accounts.write().await;
        if let Some(slot) = accounts
            .by_ref
            .get(&(user_id, account_ref))
            .and_then(|id| accounts.by_id.get(id))
        {
            return Ok(slot.lock().await.account.clone());
        }
        if accounts.by_number.contains_key(&account_number) {
            return Err(LedgerError::AccountResolutionFailed(format!(
                "account number {} already taken",
                account_number
            )));
        }
        Ok(accounts.insert(user_id, account_ref, account_number))
    }

    async fn apply_and_record(
        &self,
        account_id: AccountId,
        amount: Amount,
        transaction_id: TransactionId,
        user_id: UserId,
    ) -> Result<(Account, PaymentRecord)> {
        let slot = {
            let accounts = self.accounts.read().await;
            accounts.by_id.get(&account_id).cloned().ok_or_else(|| {
                LedgerError::AccountResolutionFailed(format!("account {} not found", account_id))
            })?
        };

        let mut slot = slot.lock().await;
        if slot.removed {
            return Err(LedgerError::AccountResolutionFailed(format!(
                "account {} was removed",
                account_id
            )));
        }
        if slot.account.user_id != user_id {
            return Err(LedgerError::AccountResolutionFailed(format!(
                "account {} is not owned by user {}",
                account_id, user_id
            )));
        }

        let mut payments = self.payments.write().await;
        if payments.contains_key(&transaction_id) {
            return Err(LedgerError::AlreadyProcessed {
                transaction_id: transaction_id.to_string(),
            });
        }

        // Stage on a copy so a rejected debit leaves the slot untouched.
        let mut updated = slot.account.clone();
        updated.apply(amount)?;

        let record = PaymentRecord::new(transaction_id, user_id, account_id, amount);
        payments.insert(record.transaction_id.clone(), record.clone());
        slot.account = updated.clone();

        Ok((updated, record))
    }

    async fn register_user(&self, email: &str, account_number: String) -> Result<(User, Account)> {
        let mut users = self.users.write().await;
        if users.users.values().any(|u| u.email == email) {
            return Err(LedgerError::MalformedInput(
                "The email address is already in use".to_string(),
            ));
        }

        let mut accounts = self.accounts.write().await;
        if accounts.by_number.contains_key(&account_number) {
            return Err(LedgerError::AccountResolutionFailed(format!(
                "account number {} already taken",
                account_number
            )));
        }

        users.next_id += 1;
        let user = User::new(users.next_id, email);
        users.users.insert(user.id, user.clone());
        let account = accounts.insert(user.id, DEFAULT_ACCOUNT_REF, account_number);

        Ok((user, account))
    }

    async fn remove_user(&self, user_id: UserId) -> Result<()> {
        let mut users = self.users.write().await;
        if users.users.remove(&user_id).is_none() {
            return Err(LedgerError::UnknownUser { user_id });
        }

        let mut accounts = self.accounts.write().await;
        let owned: Vec<(AccountRef, AccountId)> = accounts
            .by_ref
            .iter()
            .filter(|((owner, _), _)| *owner == user_id)
            .map(|((_, account_ref), id)| (*account_ref, *id))
            .collect();

        for (account_ref, id) in owned {
            accounts.by_ref.remove(&(user_id, account_ref));
            if let Some(slot) = accounts.by_id.remove(&id) {
                let mut slot = slot.lock().await;
                slot.removed = true;
                accounts.by_number.remove(&slot.account.account_number);
            }
        }

        let mut payments = self.payments.write().await;
        payments.retain(|_, record| record.user_id != user_id);
        Ok(())
    }

    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut owned = Vec::new();
        for ((owner, _), id) in accounts.by_ref.iter() {
            if *owner != user_id {
                continue;
            }
            if let Some(slot) = accounts.by_id.get(id) {
                owned.push(slot.lock().await.account.clone());
            }
        }
        owned.sort_by_key(|a| a.id);
        Ok(owned)
    }

    async fn list_payments(&self, user_id: UserId) -> Result<Vec<PaymentRecord>> {
        let payments = self.payments.read().await;
        let mut records: Vec<PaymentRecord> = payments
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.transaction_id.cmp(&b.transaction_id))
        });
        Ok(records)
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut all = Vec::with_capacity(accounts.by_id.len());
        for slot in accounts.by_id.values() {
            all.push(slot.lock().await.account.clone());
        }
        all.sort_by_key(|a| a.id);
        Ok(all)
    }
}
