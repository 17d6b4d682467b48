//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `TransactionProcessor`, the single entry point that
//! turns signed instructions into committed ledger changes.

pub mod processor;
