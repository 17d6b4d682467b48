#![allow(dead_code)]

use sigledger::application::processor::TransactionProcessor;
use sigledger::config::{Config, SecretKey};
use sigledger::domain::account::{AccountRef, UserId};
use sigledger::domain::transaction::{OrderRequest, TransactionId, TransactionInstruction};
use sigledger::infrastructure::in_memory::InMemoryLedgerStore;
use sigledger::signature;
use std::io::Error;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub const SECRET: &str = "integration-secret";

pub fn secret() -> SecretKey {
    SecretKey::new(SECRET).unwrap()
}

pub async fn processor_with_users(users: usize) -> TransactionProcessor {
    let processor = TransactionProcessor::new(
        Arc::new(InMemoryLedgerStore::new()),
        Config::with_secret(SECRET).unwrap(),
    );
    for i in 1..=users {
        processor
            .register_user(&format!("user{}@example.com", i))
            .await
            .unwrap();
    }
    processor
}

pub fn signed(id: &str, account_ref: AccountRef, user_id: UserId, amount: &str) -> TransactionInstruction {
    signature::sign_order(
        OrderRequest {
            transaction_id: Some(TransactionId::new(id).unwrap()),
            account_ref,
            user_id,
            amount: amount.parse().unwrap(),
        },
        &secret(),
    )
}

/// Writes instructions to a temporary CSV file with the standard header.
pub fn instructions_csv(rows: &[TransactionInstruction]) -> Result<NamedTempFile, Error> {
    let file = NamedTempFile::new()?;
    let mut wtr = csv::Writer::from_path(file.path())?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(file)
}
