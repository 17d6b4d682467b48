//! A transactional ledger that applies externally signed payment instructions
//! at most once.

pub mod account_number;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod signature;
