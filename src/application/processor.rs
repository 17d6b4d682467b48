use crate::config::Config;
use crate::domain::account::{Account, AccountId, AccountRef, UserId};
use crate::domain::money::Balance;
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::LedgerStoreRef;
use crate::domain::transaction::{OrderRequest, PaymentOrder, TransactionId, TransactionInstruction};
use crate::domain::user::User;
use crate::error::{LedgerError, Result};
use crate::signature;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Progress of a single instruction. A rejection is reported together with
/// the last state the instruction reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingState {
    Received,
    SignatureValid,
    DuplicateChecked,
    AccountResolved,
    FundsChecked,
    Committed,
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "RECEIVED",
            Self::SignatureValid => "SIGNATURE_VALID",
            Self::DuplicateChecked => "DUPLICATE_CHECKED",
            Self::AccountResolved => "ACCOUNT_RESOLVED",
            Self::FundsChecked => "FUNDS_CHECKED",
            Self::Committed => "COMMITTED",
        };
        f.write_str(name)
    }
}

/// What the caller gets back for a committed instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub transaction_id: TransactionId,
    pub account_id: AccountId,
    pub account_number: String,
    pub balance: Balance,
    pub state: ProcessingState,
}

/// Applies signed instructions to the ledger.
///
/// `TransactionProcessor` is cheap to clone and meant to be shared between
/// tasks; the store behind it is the only shared mutable state. Retrying an
/// instruction after a transient failure is always safe because the
/// transaction id is checked again inside the store's unit of work.
#[derive(Clone)]
pub struct TransactionProcessor {
    store: LedgerStoreRef,
    config: Arc<Config>,
}

impl TransactionProcessor {
    /// Creates a new `TransactionProcessor`.
    ///
    /// # Arguments
    ///
    /// * `store` - The ledger storage backend.
    /// * `config` - Signing secret and account-number policy, fixed for the
    ///   processor's lifetime.
    pub fn new(store: LedgerStoreRef, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &LedgerStoreRef {
        &self.store
    }

    /// Produces a signed order for a downstream system to submit later.
    /// Touches no storage.
    pub fn generate_order(&self, request: OrderRequest) -> PaymentOrder {
        signature::sign_order(request, &self.config.secret_key)
    }

    /// Runs one instruction through verification, idempotency, account
    /// resolution, funds check and commit.
    pub async fn process(&self, instruction: TransactionInstruction) -> Result<Receipt> {
        let transaction_id = instruction.transaction_id.clone();
        let mut state = ProcessingState::Received;

        match self.run(instruction, &mut state).await {
            Ok(receipt) => {
                info!(
                    transaction_id = %transaction_id,
                    account_id = receipt.account_id,
                    balance = %receipt.balance,
                    "instruction committed"
                );
                Ok(receipt)
            }
            Err(err) => {
                warn!(
                    transaction_id = %transaction_id,
                    state = %state,
                    reason = err.reason(),
                    "instruction rejected: {}",
                    err
                );
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        instruction: TransactionInstruction,
        state: &mut ProcessingState,
    ) -> Result<Receipt> {
        if !signature::verify(&instruction, &self.config.secret_key) {
            return Err(LedgerError::InvalidSignature {
                transaction_id: instruction.transaction_id.to_string(),
            });
        }
        *state = ProcessingState::SignatureValid;

        if self
            .store
            .find_payment(&instruction.transaction_id)
            .await?
            .is_some()
        {
            return Err(LedgerError::AlreadyProcessed {
                transaction_id: instruction.transaction_id.to_string(),
            });
        }
        *state = ProcessingState::DuplicateChecked;

        if self.store.find_user(instruction.user_id).await?.is_none() {
            return Err(LedgerError::UnknownUser {
                user_id: instruction.user_id,
            });
        }
        let account = self
            .resolve_account(instruction.user_id, instruction.account_ref)
            .await?;
        *state = ProcessingState::AccountResolved;

        let amount = instruction.amount;
        if amount.is_debit() && amount.magnitude() > account.balance.value() {
            return Err(LedgerError::InsufficientFunds {
                balance: account.balance.value(),
                requested: amount.magnitude(),
            });
        }
        *state = ProcessingState::FundsChecked;

        let (account, _) = self
            .store
            .apply_and_record(
                account.id,
                amount,
                instruction.transaction_id.clone(),
                instruction.user_id,
            )
            .await?;
        *state = ProcessingState::Committed;

        Ok(Receipt {
            transaction_id: instruction.transaction_id,
            account_id: account.id,
            account_number: account.account_number,
            balance: account.balance,
            state: *state,
        })
    }

    /// Finds the account for `(user_id, account_ref)`, provisioning an empty one
    /// when it does not exist yet.
    async fn resolve_account(&self, user_id: UserId, account_ref: AccountRef) -> Result<Account> {
        if let Some(account) = self.store.find_account(user_id, account_ref).await? {
            return Ok(account);
        }

        debug!(user_id, account_ref, "account not found, provisioning");
        let account_number = self
            .config
            .account_numbers
            .allocate(self.store.as_ref())
            .await?;
        let account = self
            .store
            .create_account(user_id, account_ref, account_number)
            .await?;
        info!(user_id, account_ref, account_id = account.id, "account resolved");
        Ok(account)
    }

    /// Registers a user together with its default account.
    pub async fn register_user(&self, email: &str) -> Result<(User, Account)> {
        let account_number = self
            .config
            .account_numbers
            .allocate(self.store.as_ref())
            .await?;
        let (user, account) = self.store.register_user(email, account_number).await?;
        info!(user_id = user.id, account_id = account.id, "user registered");
        Ok((user, account))
    }

    /// Removes a user and, with it, every account and payment record it owns.
    pub async fn remove_user(&self, user_id: UserId) -> Result<()> {
        self.store.remove_user(user_id).await?;
        info!(user_id, "user removed");
        Ok(())
    }

    pub async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>> {
        self.store.list_accounts(user_id).await
    }

    pub async fn list_payments(&self, user_id: UserId) -> Result<Vec<PaymentRecord>> {
        self.store.list_payments(user_id).await
    }

    /// Final state of every account in the ledger.
    pub async fn into_results(self) -> Result<Vec<Account>> {
        self.store.all_accounts().await
    }
}
