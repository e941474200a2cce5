//! Database initialization for the application's tables.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    category::create_category_table, goal::create_goal_table, limit::create_limit_table,
    profile::create_profile_table, rates::create_exchange_rate_table,
    transaction::create_transaction_table,
};

/// Create the application's tables if they do not exist yet.
///
/// Tables are created inside a single exclusive transaction so a partially
/// initialized database is never left behind.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is some other
/// SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_goal_table(&transaction)?;
    create_limit_table(&transaction)?;
    create_profile_table(&transaction)?;
    create_exchange_rate_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
