use crate::domain::transaction::TransactionInstruction;
use crate::error::{LedgerError, Result};
use std::io::Read;

/// Reads signed instructions from a CSV source.
///
/// Expects the header `transaction_id, account_id, user_id, amount, signature`.
/// Whitespace around fields is trimmed; a malformed row yields an error for
/// that row only and the stream continues.
pub struct InstructionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> InstructionReader<R> {
    /// Creates a new `InstructionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes instructions.
    pub fn instructions(self) -> impl Iterator<Item = Result<TransactionInstruction>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
