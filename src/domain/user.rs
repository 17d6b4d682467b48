use super::account::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The slice of a user the ledger cares about: existence and the cascade target.
/// Credentials live with the authentication layer.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            created_at: Utc::now(),
        }
    }
}
