//! Transactions: the income, expense, and transfer records everything else
//! aggregates over.
//!
//! This module contains the `Transaction` model and builder plus the database
//! functions for storing and querying transactions. There are no HTTP
//! endpoints here; transaction CRUD belongs to an external collaborator and
//! rows are written by the recurring-payment confirmation flow or read by the
//! budget engine and statistics aggregator.

mod core;
mod query;

pub use core::{
    Transaction, TransactionBuilder, TransactionId, TransactionKind, create_transaction,
    create_transaction_table, get_transaction, map_transaction_row, update_series_schedule,
};
pub use query::transactions_in_range;
