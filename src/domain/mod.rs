//! Domain types and the storage port.

pub mod account;
pub mod money;
pub mod payment;
pub mod ports;
pub mod transaction;
pub mod user;
