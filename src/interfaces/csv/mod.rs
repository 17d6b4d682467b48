pub mod account_writer;
pub mod instruction_reader;
