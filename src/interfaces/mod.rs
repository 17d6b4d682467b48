//! Adapters between the ledger and the outside world.

pub mod csv;
pub mod response;
