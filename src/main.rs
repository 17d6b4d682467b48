use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use sigledger::account_number::{
    AccountNumberPolicy, DEFAULT_LENGTH, DEFAULT_MAX_ATTEMPTS, DEFAULT_PREFIX,
};
use sigledger::application::processor::TransactionProcessor;
use sigledger::config::{Config, SecretKey};
use sigledger::domain::money::Amount;
use sigledger::domain::ports::LedgerStoreRef;
use sigledger::domain::transaction::{OrderRequest, TransactionId};
use sigledger::infrastructure::in_memory::InMemoryLedgerStore;
#[cfg(feature = "storage-rocksdb")]
use sigledger::infrastructure::rocksdb::RocksDbLedgerStore;
use sigledger::interfaces::csv::account_writer::AccountWriter;
use sigledger::interfaces::csv::instruction_reader::InstructionReader;
use sigledger::interfaces::response::{ReportLine, Response};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Shared secret used to sign and verify instructions
    #[arg(long, env = "LEDGER_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Leading digits of generated account numbers
    #[arg(long, default_value = DEFAULT_PREFIX)]
    account_prefix: String,

    /// Total length of generated account numbers
    #[arg(long, default_value_t = DEFAULT_LENGTH)]
    account_number_length: usize,

    /// Attempts to find a free account number before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_allocation_attempts: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a signed payment order
    Order {
        #[arg(long)]
        account_id: u64,
        #[arg(long)]
        user_id: u64,
        #[arg(long, allow_hyphen_values = true)]
        amount: Amount,
        /// Generated when omitted
        #[arg(long)]
        transaction_id: Option<String>,
    },
    /// Apply signed instructions from a CSV file
    Process {
        /// Input instructions CSV file
        input: PathBuf,
        /// Ensure users 1..=N exist before processing
        #[arg(long, default_value_t = 0)]
        users: u64,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn open_store(db_path: Option<PathBuf>) -> Result<LedgerStoreRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => Ok(Arc::new(RocksDbLedgerStore::open(path).into_diagnostic()?)),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryLedgerStore::new()))
        }
        None => Ok(Arc::new(InMemoryLedgerStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::new(
        SecretKey::new(cli.secret_key).into_diagnostic()?,
        AccountNumberPolicy::new(
            cli.account_prefix,
            cli.account_number_length,
            cli.max_allocation_attempts,
        )
        .into_diagnostic()?,
    );

    match cli.command {
        Command::Order {
            account_id,
            user_id,
            amount,
            transaction_id,
        } => {
            let transaction_id = transaction_id
                .map(TransactionId::new)
                .transpose()
                .into_diagnostic()?;
            let processor = TransactionProcessor::new(Arc::new(InMemoryLedgerStore::new()), config);
            let order = processor.generate_order(OrderRequest {
                transaction_id,
                account_ref: account_id,
                user_id,
                amount,
            });
            println!("{}", serde_json::to_string_pretty(&order).into_diagnostic()?);
        }
        Command::Process { input, users } => {
            let processor = TransactionProcessor::new(open_store(cli.db_path)?, config);

            for user_id in 1..=users {
                if processor
                    .store()
                    .find_user(user_id)
                    .await
                    .into_diagnostic()?
                    .is_none()
                {
                    processor
                        .register_user(&format!("user{}@ledger.local", user_id))
                        .await
                        .into_diagnostic()?;
                }
            }

            // One task per instruction; results are reported in input order.
            let file = File::open(input).into_diagnostic()?;
            let reader = InstructionReader::new(file);
            let mut tasks = Vec::new();
            for item in reader.instructions() {
                match item {
                    Ok(instruction) => {
                        let processor = processor.clone();
                        tasks.push(tokio::spawn(async move {
                            let transaction_id = instruction.transaction_id.clone();
                            let result = processor.process(instruction).await;
                            ReportLine {
                                transaction_id,
                                response: Response::from(&result),
                            }
                        }));
                    }
                    Err(e) => {
                        warn!("Error reading instruction: {}", e);
                    }
                }
            }
            for task in tasks {
                let line = task.await.into_diagnostic()?;
                println!("{}", serde_json::to_string(&line).into_diagnostic()?);
            }

            let accounts = processor.into_results().await.into_diagnostic()?;
            let stdout = io::stdout();
            let mut writer = AccountWriter::new(stdout.lock());
            writer.write_accounts(accounts).into_diagnostic()?;
        }
    }

    Ok(())
}
