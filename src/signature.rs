//! Keyed SHA-256 signatures over the canonical instruction fields.
//!
//! The canonical payload is `account_ref ++ amount ++ transaction_id ++ user_id ++ secret`
//! with the amount in its fixed two-decimal form, so `100`, `100.0` and `100.00`
//! all sign identically.

use crate::config::SecretKey;
use crate::domain::account::{AccountRef, UserId};
use crate::domain::money::Amount;
use crate::domain::transaction::{OrderRequest, PaymentOrder, TransactionId, TransactionInstruction};
use sha2::{Digest, Sha256};

fn digest(
    account_ref: AccountRef,
    amount: &Amount,
    transaction_id: &TransactionId,
    user_id: UserId,
    secret: &SecretKey,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(account_ref.to_string().as_bytes());
    hasher.update(amount.to_string().as_bytes());
    hasher.update(transaction_id.as_str().as_bytes());
    hasher.update(user_id.to_string().as_bytes());
    hasher.update(secret.expose().as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Lowercase hex SHA-256 signature of the instruction fields.
pub fn sign(
    account_ref: AccountRef,
    amount: &Amount,
    transaction_id: &TransactionId,
    user_id: UserId,
    secret: &SecretKey,
) -> String {
    hex::encode(digest(account_ref, amount, transaction_id, user_id, secret))
}

/// Recomputes the signature and compares it with the one supplied.
///
/// Non-hex or wrong-length signatures are rejected. Hex case is ignored.
pub fn verify(instruction: &TransactionInstruction, secret: &SecretKey) -> bool {
    let Ok(provided) = hex::decode(instruction.signature.trim()) else {
        return false;
    };
    let expected = digest(
        instruction.account_ref,
        &instruction.amount,
        &instruction.transaction_id,
        instruction.user_id,
        secret,
    );
    constant_time_eq(&provided, &expected)
}

/// Builds a signed order, generating a transaction id when none is given.
pub fn sign_order(request: OrderRequest, secret: &SecretKey) -> PaymentOrder {
    let transaction_id = request
        .transaction_id
        .unwrap_or_else(TransactionId::generate);
    let signature = sign(
        request.account_ref,
        &request.amount,
        &transaction_id,
        request.user_id,
        secret,
    );
    PaymentOrder {
        transaction_id,
        account_ref: request.account_ref,
        user_id: request.user_id,
        amount: request.amount,
        signature,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
