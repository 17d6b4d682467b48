use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits every stored amount carries.
pub const SCALE: u32 = 2;

/// Total significant digits a stored amount may carry (NUMERIC(15, 2)).
const MAX_DIGITS: u32 = 15;

fn fixed_point(value: Decimal) -> Result<Decimal> {
    if value.normalize().scale() > SCALE {
        return Err(LedgerError::MalformedInput(format!(
            "Amount {} has more than {} decimal places",
            value, SCALE
        )));
    }
    let mut scaled = value;
    scaled.rescale(SCALE);
    if scaled.is_zero() {
        scaled.set_sign_positive(true);
    }
    if scaled.mantissa().unsigned_abs() >= 10u128.pow(MAX_DIGITS) {
        return Err(LedgerError::MalformedInput(format!(
            "Amount {} exceeds {} digits",
            value, MAX_DIGITS
        )));
    }
    Ok(scaled)
}

/// A signed, non-zero balance delta with exactly two decimal places.
///
/// Positive amounts are credits, negative amounts are debits. The textual form
/// is always the fixed two-decimal rendering (`100.00`, `-50.00`), which is what
/// the signature codec hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_zero() {
            return Err(LedgerError::MalformedInput(
                "Amount must be non-zero".to_string(),
            ));
        }
        fixed_point(value).map(Self)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_debit(&self) -> bool {
        self.0.is_sign_negative()
    }

    /// Magnitude of the change, always positive.
    pub fn magnitude(&self) -> Decimal {
        self.0.abs()
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let value = Decimal::from_str_exact(s.trim())
            .map_err(|e| LedgerError::MalformedInput(format!("Invalid amount '{}': {}", s, e)))?;
        Self::new(value)
    }
}

impl TryFrom<String> for Amount {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The funds held by an account. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Balance(Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, SCALE));

    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(LedgerError::MalformedInput(format!(
                "Balance {} is negative",
                value
            )));
        }
        fixed_point(value).map(Self)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the balance after applying `amount`, refusing to go below zero.
    pub fn apply(self, amount: Amount) -> Result<Self> {
        let next = self.0 + amount.value();
        if next.is_sign_negative() && !next.is_zero() {
            return Err(LedgerError::InsufficientFunds {
                balance: self.0,
                requested: amount.magnitude(),
            });
        }
        if next.mantissa().unsigned_abs() >= 10u128.pow(MAX_DIGITS) {
            return Err(LedgerError::MalformedInput(format!(
                "balance limit exceeded: {} + {} needs more than {} digits",
                self, amount, MAX_DIGITS
            )));
        }
        fixed_point(next).map(Self)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<String> for Balance {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        let decimal = Decimal::from_str_exact(value.trim())
            .map_err(|e| LedgerError::MalformedInput(format!("Invalid balance '{}': {}", value, e)))?;
        Self::new(decimal)
    }
}

impl From<Balance> for String {
    fn from(balance: Balance) -> Self {
        balance.to_string()
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0;
        value.rescale(SCALE);
        write!(f, "{}", value)
    }
}
