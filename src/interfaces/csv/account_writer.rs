use crate::domain::account::Account;
use crate::error::Result;
use std::io::Write;

/// Writes account balances as CSV: `user_id,account_id,account_number,balance`.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_accounts(&mut self, accounts: impl IntoIterator<Item = Account>) -> Result<()> {
        self.writer
            .write_record(["user_id", "account_id", "account_number", "balance"])?;
        for account in accounts {
            self.writer.write_record([
                account.user_id.to_string(),
                account.account_ref.to_string(),
                account.account_number,
                account.balance.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Amount;

    #[test]
    fn test_writes_fixed_point_balances() {
        let mut account = Account::new(1, 2, 3, "40817000000000000001".to_string());
        account.apply("12.5".parse::<Amount>().unwrap()).unwrap();

        let mut out = Vec::new();
        AccountWriter::new(&mut out)
            .write_accounts(vec![account])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "user_id,account_id,account_number,balance\n2,3,40817000000000000001,12.50\n"
        );
    }
}
