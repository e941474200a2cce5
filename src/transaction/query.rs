//! Range queries over the transaction table.

use rusqlite::Connection;

use crate::{
    Error,
    calendar::InstantRange,
    transaction::{Transaction, map_transaction_row},
};

/// Retrieve the transactions that occurred within `range` (inclusive),
/// ordered by occurrence time.
///
/// Recurring series templates are excluded; only concrete transactions count
/// towards budgets and statistics.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn transactions_in_range(
    range: InstantRange,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, kind, amount_cents, currency, occurred_at, category_id,
                description, transfer_id, is_recurring, frequency,
                next_occurrence, total_occurrences, remaining_occurrences, is_paid
             FROM \"transaction\"
             WHERE is_recurring = 0 AND occurred_at BETWEEN :start AND :end
             ORDER BY occurred_at",
        )?
        .query_map(
            &[(":start", &range.start), (":end", &range.end)],
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}
