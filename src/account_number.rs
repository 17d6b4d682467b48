//! Generation of external account numbers.

use crate::domain::ports::LedgerStore;
use crate::error::{LedgerError, Result};
use rand::Rng;
use tracing::debug;

pub const DEFAULT_PREFIX: &str = "40817";
pub const DEFAULT_LENGTH: usize = 20;
pub const DEFAULT_MAX_ATTEMPTS: usize = 20;

/// Longest account number a policy may describe.
pub const MAX_LENGTH: usize = 64;

/// Shape of generated account numbers and how hard to look for a free one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountNumberPolicy {
    prefix: String,
    length: usize,
    max_attempts: usize,
}

impl Default for AccountNumberPolicy {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            length: DEFAULT_LENGTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl AccountNumberPolicy {
    pub fn new(prefix: impl Into<String>, length: usize, max_attempts: usize) -> Result<Self> {
        let prefix = prefix.into();
        if !prefix.chars().all(|c| c.is_ascii_digit()) {
            return Err(LedgerError::MalformedInput(format!(
                "account prefix '{}' must be numeric",
                prefix
            )));
        }
        if length > MAX_LENGTH {
            return Err(LedgerError::MalformedInput(format!(
                "account number length {} exceeds {}",
                length, MAX_LENGTH
            )));
        }
        if prefix.len() >= length {
            return Err(LedgerError::MalformedInput(format!(
                "account prefix '{}' leaves no room in a {}-digit number",
                prefix, length
            )));
        }
        if max_attempts == 0 {
            return Err(LedgerError::MalformedInput(
                "max allocation attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            prefix,
            length,
            max_attempts,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// A random candidate: the prefix followed by random digits.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> String {
        let mut number = String::with_capacity(self.length);
        number.push_str(&self.prefix);
        for _ in self.prefix.len()..self.length {
            number.push(char::from(b'0' + rng.gen_range(0..10u8)));
        }
        number
    }

    /// Syntactic check only; says nothing about uniqueness.
    pub fn is_valid(&self, number: &str) -> bool {
        number.len() == self.length
            && number.starts_with(&self.prefix)
            && number.chars().all(|c| c.is_ascii_digit())
    }

    /// Draws candidates until one is not present in `store`.
    ///
    /// Gives up with `GenerationExhausted` after `max_attempts` collisions.
    pub async fn allocate(&self, store: &dyn LedgerStore) -> Result<String> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.generate(&mut rand::thread_rng());
            if !store.account_number_exists(&candidate).await? {
                return Ok(candidate);
            }
            debug!(attempt, "account number collision");
        }
        Err(LedgerError::GenerationExhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Generates a candidate with the given prefix and total length.
pub fn generate(prefix: &str, length: usize) -> Result<String> {
    let policy = AccountNumberPolicy::new(prefix, length, DEFAULT_MAX_ATTEMPTS)?;
    Ok(policy.generate(&mut rand::thread_rng()))
}
