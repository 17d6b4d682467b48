use crate::domain::account::{Account, AccountId, AccountRef, DEFAULT_ACCOUNT_REF, UserId};
use crate::domain::money::Amount;
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::LedgerStore;
use crate::domain::transaction::TransactionId;
use crate::domain::user::User;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Users by id.
pub const CF_USERS: &str = "users";
/// Accounts by internal id.
pub const CF_ACCOUNTS: &str = "accounts";
/// `(user_id, account_ref)` index into `accounts`.
pub const CF_ACCOUNT_REFS: &str = "account_refs";
/// Account number index into `accounts`.
pub const CF_ACCOUNT_NUMBERS: &str = "account_numbers";
/// Payment records by transaction id.
pub const CF_PAYMENTS: &str = "payments";
/// Id counters.
pub const CF_META: &str = "meta";

const NEXT_USER_ID: &[u8] = b"next_user_id";
const NEXT_ACCOUNT_ID: &[u8] = b"next_account_id";

fn ref_key(user_id: UserId, account_ref: AccountRef) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&user_id.to_be_bytes());
    key[8..].copy_from_slice(&account_ref.to_be_bytes());
    key
}

fn decode_id(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LedgerError::PersistenceFailure("corrupt id value".to_string()))?;
    Ok(u64::from_be_bytes(raw))
}

/// A persistent ledger backed by RocksDB.
///
/// Every mutation is a single `WriteBatch`, so a crash or a dropped future
/// never leaves a balance updated without its payment record. Writers queue on
/// one async mutex; reads go straight to the database.
#[derive(Clone)]
pub struct RocksDbLedgerStore {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

impl RocksDbLedgerStore {
    /// Opens or creates a database at `path` with all ledger column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [
            CF_USERS,
            CF_ACCOUNTS,
            CF_ACCOUNT_REFS,
            CF_ACCOUNT_NUMBERS,
            CF_PAYMENTS,
            CF_META,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::PersistenceFailure(format!("{} column family not found", name))
        })
    }

    fn get_json<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, batch: &mut WriteBatch, cf: &str, key: &[u8], value: &T) -> Result<()> {
        batch.put_cf(self.cf(cf)?, key, serde_json::to_vec(value)?);
        Ok(())
    }

    fn values<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    fn account_by_id(&self, account_id: AccountId) -> Result<Option<Account>> {
        self.get_json(CF_ACCOUNTS, &account_id.to_be_bytes())
    }

    fn account_id_by_ref(&self, user_id: UserId, account_ref: AccountRef) -> Result<Option<AccountId>> {
        self.db
            .get_cf(self.cf(CF_ACCOUNT_REFS)?, ref_key(user_id, account_ref))?
            .map(|bytes| decode_id(&bytes))
            .transpose()
    }

    fn next_id(&self, batch: &mut WriteBatch, counter: &[u8]) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        let current = match self.db.get_cf(cf, counter)? {
            Some(bytes) => decode_id(&bytes)?,
            None => 0,
        };
        let next = current + 1;
        batch.put_cf(cf, counter, next.to_be_bytes());
        Ok(next)
    }

    fn stage_account(
        &self,
        batch: &mut WriteBatch,
        user_id: UserId,
        account_ref: AccountRef,
        account_number: String,
    ) -> Result<Account> {
        let id = self.next_id(batch, NEXT_ACCOUNT_ID)?;
        let account = Account::new(id, user_id, account_ref, account_number);
        self.put_json(batch, CF_ACCOUNTS, &id.to_be_bytes(), &account)?;
        batch.put_cf(self.cf(CF_ACCOUNT_REFS)?, ref_key(user_id, account_ref), id.to_be_bytes());
        batch.put_cf(
            self.cf(CF_ACCOUNT_NUMBERS)?,
            account.account_number.as_bytes(),
            id.to_be_bytes(),
        );
        Ok(account)
    }
}

#[async_trait]
impl LedgerStore for RocksDbLedgerStore {
    async fn find_payment(&self, transaction_id: &TransactionId) -> Result<Option<PaymentRecord>> {
        self.get_json(CF_PAYMENTS, transaction_id.as_str().as_bytes())
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        self.get_json(CF_USERS, &user_id.to_be_bytes())
    }

    async fn find_account(&self, user_id: UserId, account_ref: AccountRef) -> Result<Option<Account>> {
        match self.account_id_by_ref(user_id, account_ref)? {
            Some(id) => self.account_by_id(id),
            None => Ok(None),
        }
    }

    async fn account_number_exists(&self, account_number: &str) -> Result<bool> {
        let result = self
            .db
            .get_pinned_cf(self.cf(CF_ACCOUNT_NUMBERS)?, account_number.as_bytes())?;
        Ok(result.is_some())
    }

    async fn create_account(
        &self,
        user_id: UserId,
        account_ref: AccountRef,
        account_number: String,
    ) -> Result<Account> {
        let _guard = self.writer.lock().await;

        if self.find_user(user_id).await?.is_none() {
            return Err(LedgerError::UnknownUser { user_id });
        }
        if let Some(existing) = self.find_account(user_id, account_ref).await? {
            return Ok(existing);
        }
        if self.account_number_exists(&account_number).await? {
            return Err(LedgerError::AccountResolutionFailed(format!(
                "account number {} already taken",
                account_number
            )));
        }

        let mut batch = WriteBatch::default();
        let account = self.stage_account(&mut batch, user_id, account_ref, account_number)?;
        self.db.write(batch)?;
        Ok(account)
    }

    async fn apply_and_record(
        &self,
        account_id: AccountId,
        amount: Amount,
        transaction_id: TransactionId,
        user_id: UserId,
    ) -> Result<(Account, PaymentRecord)> {
        let _guard = self.writer.lock().await;

        let mut account = self.account_by_id(account_id)?.ok_or_else(|| {
            LedgerError::AccountResolutionFailed(format!("account {} not found", account_id))
        })?;
        if account.user_id != user_id {
            return Err(LedgerError::AccountResolutionFailed(format!(
                "account {} is not owned by user {}",
                account_id, user_id
            )));
        }
        if self.find_payment(&transaction_id).await?.is_some() {
            return Err(LedgerError::AlreadyProcessed {
                transaction_id: transaction_id.to_string(),
            });
        }

        account.apply(amount)?;
        let record = PaymentRecord::new(transaction_id, user_id, account_id, amount);

        let mut batch = WriteBatch::default();
        self.put_json(&mut batch, CF_ACCOUNTS, &account_id.to_be_bytes(), &account)?;
        self.put_json(
            &mut batch,
            CF_PAYMENTS,
            record.transaction_id.as_str().as_bytes(),
            &record,
        )?;
        self.db.write(batch)?;

        Ok((account, record))
    }

    async fn register_user(&self, email: &str, account_number: String) -> Result<(User, Account)> {
        let _guard = self.writer.lock().await;

        let users: Vec<User> = self.values(CF_USERS)?;
        if users.iter().any(|u| u.email == email) {
            return Err(LedgerError::MalformedInput(
                "The email address is already in use".to_string(),
            ));
        }
        if self.account_number_exists(&account_number).await? {
            return Err(LedgerError::AccountResolutionFailed(format!(
                "account number {} already taken",
                account_number
            )));
        }

        let mut batch = WriteBatch::default();
        let user = User::new(self.next_id(&mut batch, NEXT_USER_ID)?, email);
        self.put_json(&mut batch, CF_USERS, &user.id.to_be_bytes(), &user)?;
        let account = self.stage_account(&mut batch, user.id, DEFAULT_ACCOUNT_REF, account_number)?;
        self.db.write(batch)?;

        Ok((user, account))
    }

    async fn remove_user(&self, user_id: UserId) -> Result<()> {
        let _guard = self.writer.lock().await;

        if self.find_user(user_id).await?.is_none() {
            return Err(LedgerError::UnknownUser { user_id });
        }

        let accounts = self.list_accounts(user_id).await?;
        let payments = self.list_payments(user_id).await?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_USERS)?, user_id.to_be_bytes());
        for account in accounts {
            batch.delete_cf(self.cf(CF_ACCOUNTS)?, account.id.to_be_bytes());
            batch.delete_cf(self.cf(CF_ACCOUNT_REFS)?, ref_key(user_id, account.account_ref));
            batch.delete_cf(self.cf(CF_ACCOUNT_NUMBERS)?, account.account_number.as_bytes());
        }
        for record in payments {
            batch.delete_cf(self.cf(CF_PAYMENTS)?, record.transaction_id.as_str().as_bytes());
        }

        self.db.write(batch)?;
        Ok(())
    }

    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>> {
        let prefix = user_id.to_be_bytes();
        let iter = self.db.iterator_cf(
            self.cf(CF_ACCOUNT_REFS)?,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut accounts = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            if let Some(account) = self.account_by_id(decode_id(&value)?)? {
                accounts.push(account);
            }
        }
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn list_payments(&self, user_id: UserId) -> Result<Vec<PaymentRecord>> {
        let mut records: Vec<PaymentRecord> = self
            .values::<PaymentRecord>(CF_PAYMENTS)?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.transaction_id.cmp(&b.transaction_id))
        });
        Ok(records)
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        self.values(CF_ACCOUNTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDbLedgerStore::open(dir.path()).expect("Failed to open RocksDB");

        for name in [CF_USERS, CF_ACCOUNTS, CF_ACCOUNT_REFS, CF_ACCOUNT_NUMBERS, CF_PAYMENTS, CF_META] {
            assert!(store.db.cf_handle(name).is_some());
        }
    }

    #[tokio::test]
    async fn test_rocksdb_apply_and_record() {
        let dir = tempdir().unwrap();
        let store = RocksDbLedgerStore::open(dir.path()).unwrap();

        let (user, account) = store
            .register_user("alice@example.com", "40817000000000000001".to_string())
            .await
            .unwrap();
        let tx = TransactionId::new("t1").unwrap();
        let (updated, _) = store
            .apply_and_record(account.id, Amount::new(dec!(100.00)).unwrap(), tx.clone(), user.id)
            .await
            .unwrap();
        assert_eq!(updated.balance.value(), dec!(100.00));

        let again = store
            .apply_and_record(account.id, Amount::new(dec!(100.00)).unwrap(), tx.clone(), user.id)
            .await;
        assert!(matches!(again, Err(LedgerError::AlreadyProcessed { .. })));

        let overdraft = store
            .apply_and_record(
                account.id,
                Amount::new(dec!(-500.00)).unwrap(),
                TransactionId::new("t2").unwrap(),
                user.id,
            )
            .await;
        assert!(matches!(overdraft, Err(LedgerError::InsufficientFunds { .. })));

        let stored = store.find_account(user.id, DEFAULT_ACCOUNT_REF).await.unwrap().unwrap();
        assert_eq!(stored.balance.value(), dec!(100.00));
        assert!(store.find_payment(&tx).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_survives_reopen() {
        let dir = tempdir().unwrap();
        let (user_id, account_id) = {
            let store = RocksDbLedgerStore::open(dir.path()).unwrap();
            let (user, account) = store
                .register_user("bob@example.com", "40817000000000000002".to_string())
                .await
                .unwrap();
            store
                .apply_and_record(
                    account.id,
                    Amount::new(dec!(42.00)).unwrap(),
                    TransactionId::new("t1").unwrap(),
                    user.id,
                )
                .await
                .unwrap();
            (user.id, account.id)
        };

        let store = RocksDbLedgerStore::open(dir.path()).unwrap();
        let accounts = store.list_accounts(user_id).await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, account_id);
        assert_eq!(accounts[0].balance.value(), dec!(42.00));

        let (second, _) = store
            .register_user("carol@example.com", "40817000000000000003".to_string())
            .await
            .unwrap();
        assert_ne!(second.id, user_id);
    }

    #[tokio::test]
    async fn test_rocksdb_remove_user_cascades() {
        let dir = tempdir().unwrap();
        let store = RocksDbLedgerStore::open(dir.path()).unwrap();
        let (user, account) = store
            .register_user("dave@example.com", "40817000000000000004".to_string())
            .await
            .unwrap();
        store
            .apply_and_record(
                account.id,
                Amount::new(dec!(1.00)).unwrap(),
                TransactionId::new("t1").unwrap(),
                user.id,
            )
            .await
            .unwrap();

        store.remove_user(user.id).await.unwrap();

        assert!(store.find_user(user.id).await.unwrap().is_none());
        assert!(store.all_accounts().await.unwrap().is_empty());
        assert!(store.list_payments(user.id).await.unwrap().is_empty());
        assert!(!store.account_number_exists("40817000000000000004").await.unwrap());
    }
}
