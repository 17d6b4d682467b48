//! Response bodies a transport layer hands back to callers.

use crate::application::processor::Receipt;
use crate::domain::money::Balance;
use crate::domain::transaction::TransactionId;
use crate::error::{LedgerError, Result};
use serde::Serialize;

/// `{"result": "ok"}` on success, `{"error": ..., "status": ...}` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ok {
        result: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        balance: Option<Balance>,
    },
    Error {
        error: String,
        status: u16,
    },
}

impl Response {
    pub fn ok() -> Self {
        Self::Ok {
            result: "ok",
            balance: None,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Ok { .. } => 200,
            Self::Error { status, .. } => *status,
        }
    }
}

impl From<&LedgerError> for Response {
    fn from(err: &LedgerError) -> Self {
        Self::Error {
            error: err.to_string(),
            status: err.status_code(),
        }
    }
}

impl From<&Result<Receipt>> for Response {
    fn from(result: &Result<Receipt>) -> Self {
        match result {
            Ok(receipt) => Self::Ok {
                result: "ok",
                balance: Some(receipt.balance),
            },
            Err(err) => err.into(),
        }
    }
}

/// One line of a processing report: the response tagged with its transaction.
#[derive(Debug, Clone, Serialize)]
pub struct ReportLine {
    pub transaction_id: TransactionId,
    #[serde(flatten)]
    pub response: Response,
}
