//! Process-wide configuration, built once at startup and handed to the
//! processor by value. Nothing here is mutated afterwards.

use crate::account_number::AccountNumberPolicy;
use crate::error::{LedgerError, Result};
use std::fmt;

/// Environment variable the CLI reads the signing secret from.
pub const SECRET_KEY_ENV: &str = "LEDGER_SECRET_KEY";

/// The shared secret mixed into every signature.
///
/// `Debug` and `Display` never print the key.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(LedgerError::MalformedInput(
                "secret key must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: SecretKey,
    pub account_numbers: AccountNumberPolicy,
}

impl Config {
    pub fn new(secret_key: SecretKey, account_numbers: AccountNumberPolicy) -> Self {
        Self {
            secret_key,
            account_numbers,
        }
    }

    /// Configuration with the default account-number policy.
    pub fn with_secret(secret: &str) -> Result<Self> {
        Ok(Self::new(
            SecretKey::new(secret)?,
            AccountNumberPolicy::default(),
        ))
    }
}
