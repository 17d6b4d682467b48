use rust_decimal::Decimal;
use thiserror::Error;

/// Every way a ledger operation can fail.
///
/// Business-rule rejections (signature, duplicate, funds, unknown user) are
/// expected outcomes and map to client errors. `PersistenceFailure` is the only
/// transient variant: the enclosing unit of work was rolled back and the caller
/// may resubmit the same instruction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid signature for transaction {transaction_id}")]
    InvalidSignature { transaction_id: String },

    #[error("The payment #{transaction_id} is processed")]
    AlreadyProcessed { transaction_id: String },

    #[error("User by id: #{user_id} not found")]
    UnknownUser { user_id: u64 },

    #[error("Account resolution failed: {0}")]
    AccountResolutionFailed(String),

    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    #[error("No free account number after {attempts} attempts")]
    GenerationExhausted { attempts: usize },

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// Short machine-readable code, safe to log next to a transaction id.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidSignature { .. } => "invalid_signature",
            Self::AlreadyProcessed { .. } => "already_processed",
            Self::UnknownUser { .. } => "unknown_user",
            Self::AccountResolutionFailed(_) => "account_resolution_failed",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::GenerationExhausted { .. } => "generation_exhausted",
            Self::PersistenceFailure(_) => "persistence_failure",
            Self::MalformedInput(_) => "malformed_input",
        }
    }

    /// Whether resubmitting the same instruction can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::PersistenceFailure(_))
    }

    /// HTTP-style status a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::PersistenceFailure(_) | Self::GenerationExhausted { .. } => 500,
            _ => 400,
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::PersistenceFailure(err.to_string())
    }
}

impl From<csv::Error> for LedgerError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            Self::PersistenceFailure(err.to_string())
        } else {
            Self::MalformedInput(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::PersistenceFailure(format!("Serialization error: {}", err))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        Self::PersistenceFailure(err.into_string())
    }
}
