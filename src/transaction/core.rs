//! Defines the core data model and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, category::CategoryId, recurring::Frequency};

/// The ID of a transaction in the database.
pub type TransactionId = i64;

/// Whether a transaction brings money in, takes money out, or moves it
/// between the user's own accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Money earned. Counts towards the monthly envelope.
    Income,
    /// Money spent. Counts against the daily allowance.
    Expense,
    /// One leg of a movement between the user's own accounts. Never counted
    /// as income or spending.
    Transfer,
}

impl TransactionKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
            Self::Transfer => "TRANSFER",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "INCOME" => Some(Self::Income),
            "EXPENSE" => Some(Self::Expense),
            "TRANSFER" => Some(Self::Transfer),
            _ => None,
        }
    }
}

/// An event where money was earned, spent, or moved.
///
/// Amounts are always non-negative integer minor units; the sign is implied
/// by [TransactionKind]. To create a new `Transaction`, use
/// [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// Income, expense, or transfer.
    pub kind: TransactionKind,
    /// The amount of money in minor units of `currency`.
    pub amount_cents: i64,
    /// The ISO 4217 code of the currency the amount is denominated in.
    pub currency: String,
    /// When the transaction happened, stored UTC.
    pub occurred_at: OffsetDateTime,
    /// The category the transaction belongs to, if any.
    pub category_id: Option<CategoryId>,
    /// A text description of what the transaction was for.
    pub description: String,
    /// Links the two legs of a transfer. Transactions carrying a transfer ID
    /// are excluded from income and expense totals.
    pub transfer_id: Option<String>,
    /// Whether this row is a recurring series template rather than a concrete
    /// transaction.
    pub is_recurring: bool,
    /// How often the series recurs. Only set when `is_recurring` is true.
    pub frequency: Option<Frequency>,
    /// The next date an occurrence of the series is due.
    pub next_occurrence: Option<Date>,
    /// How many occurrences the series has in total. `None` means indefinite.
    pub total_occurrences: Option<u32>,
    /// How many occurrences are left. Reaching 0 terminates the series.
    pub remaining_occurrences: Option<u32>,
    /// Whether the current period's occurrence has been confirmed. Reset to
    /// false on confirmation so the next period shows up as pending again.
    pub is_paid: bool,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        kind: TransactionKind,
        amount_cents: i64,
        currency: &str,
        occurred_at: OffsetDateTime,
    ) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            amount_cents,
            currency: currency.to_owned(),
            occurred_at,
            category_id: None,
            description: String::new(),
            transfer_id: None,
            recurring: None,
        }
    }
}

/// The recurring-series fields of a [TransactionBuilder].
#[derive(Debug, PartialEq, Clone)]
pub struct RecurringFields {
    /// How often the series recurs.
    pub frequency: Frequency,
    /// When the first (or next) occurrence is due.
    pub next_occurrence: Date,
    /// The total number of occurrences, or `None` for an indefinite series.
    pub total_occurrences: Option<u32>,
}

/// A builder for creating [Transaction] instances.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Income, expense, or transfer.
    pub kind: TransactionKind,
    /// The non-negative amount in minor units.
    pub amount_cents: i64,
    /// The ISO 4217 currency code.
    pub currency: String,
    /// When the transaction happened (UTC).
    pub occurred_at: OffsetDateTime,
    /// The category to file the transaction under.
    pub category_id: Option<CategoryId>,
    /// A human-readable description.
    pub description: String,
    /// The transfer pairing ID, for transfer legs.
    pub transfer_id: Option<String>,
    /// Present when the row is a recurring series template.
    pub recurring: Option<RecurringFields>,
}

impl TransactionBuilder {
    /// Set the category for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Mark the transaction as one leg of a transfer.
    pub fn transfer_id(mut self, transfer_id: Option<String>) -> Self {
        self.transfer_id = transfer_id;
        self
    }

    /// Turn the row into a recurring series template.
    pub fn recurring(
        mut self,
        frequency: Frequency,
        next_occurrence: Date,
        total_occurrences: Option<u32>,
    ) -> Self {
        self.recurring = Some(RecurringFields {
            frequency,
            next_occurrence,
            total_occurrences,
        });
        self
    }
}

/// Create a new transaction in the database from a builder.
///
/// A recurring builder starts its series with `remaining_occurrences` equal
/// to `total_occurrences`.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if the amount is negative,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if builder.amount_cents < 0 {
        return Err(Error::NegativeAmount(builder.amount_cents));
    }

    let (is_recurring, frequency, next_occurrence, total_occurrences) = match &builder.recurring {
        Some(fields) => (
            true,
            Some(fields.frequency),
            Some(fields.next_occurrence),
            fields.total_occurrences,
        ),
        None => (false, None, None, None),
    };

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (
                kind, amount_cents, currency, occurred_at, category_id,
                description, transfer_id, is_recurring, frequency,
                next_occurrence, total_occurrences, remaining_occurrences, is_paid
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11, 0)
             RETURNING id, kind, amount_cents, currency, occurred_at, category_id,
                description, transfer_id, is_recurring, frequency,
                next_occurrence, total_occurrences, remaining_occurrences, is_paid",
        )?
        .query_one(
            (
                builder.kind.as_str(),
                builder.amount_cents,
                &builder.currency,
                builder.occurred_at,
                builder.category_id,
                &builder.description,
                &builder.transfer_id,
                is_recurring,
                frequency.map(Frequency::as_str),
                next_occurrence,
                total_occurrences,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, kind, amount_cents, currency, occurred_at, category_id,
                description, transfer_id, is_recurring, frequency,
                next_occurrence, total_occurrences, remaining_occurrences, is_paid
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Persist the scheduling fields of a recurring series after an occurrence
/// has been confirmed.
///
/// This is the only sanctioned mutation of a series' schedule: the confirm
/// flow advances `next_occurrence`, decrements `remaining_occurrences`, and
/// resets `is_paid`. Clients never edit these fields directly.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction in the store,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_series_schedule(
    id: TransactionId,
    next_occurrence: Date,
    remaining_occurrences: Option<u32>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_updated = connection.execute(
        "UPDATE \"transaction\"
         SET next_occurrence = ?1, remaining_occurrences = ?2, is_paid = 0
         WHERE id = ?3",
        (next_occurrence, remaining_occurrences, id),
    )?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL CHECK (kind IN ('INCOME', 'EXPENSE', 'TRANSFER')),
                amount_cents INTEGER NOT NULL CHECK (amount_cents >= 0),
                currency TEXT NOT NULL,
                occurred_at TEXT NOT NULL,
                category_id INTEGER,
                description TEXT NOT NULL DEFAULT '',
                transfer_id TEXT,
                is_recurring INTEGER NOT NULL DEFAULT 0,
                frequency TEXT,
                next_occurrence TEXT,
                total_occurrences INTEGER,
                remaining_occurrences INTEGER,
                is_paid INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Composite index used by the budget summary and statistics range queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_occurred_kind
         ON \"transaction\"(occurred_at, kind);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let kind_raw: String = row.get(1)?;
    let kind = TransactionKind::parse(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown transaction kind {kind_raw}").into(),
        )
    })?;

    let frequency = match row.get::<_, Option<String>>(9)? {
        Some(raw) => Some(Frequency::parse(&raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                9,
                rusqlite::types::Type::Text,
                format!("unknown frequency {raw}").into(),
            )
        })?),
        None => None,
    };

    Ok(Transaction {
        id: row.get(0)?,
        kind,
        amount_cents: row.get(2)?,
        currency: row.get(3)?,
        occurred_at: row.get(4)?,
        category_id: row.get(5)?,
        description: row.get(6)?,
        transfer_id: row.get(7)?,
        is_recurring: row.get(8)?,
        frequency,
        next_occurrence: row.get(10)?,
        total_occurrences: row.get(11)?,
        remaining_occurrences: row.get(12)?,
        is_paid: row.get(13)?,
    })
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        Error,
        db::initialize,
        recurring::Frequency,
        transaction::{Transaction, TransactionKind, create_transaction, get_transaction},
    };

    use super::update_series_schedule;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();

        let result = create_transaction(
            Transaction::build(
                TransactionKind::Expense,
                4500,
                "UYU",
                datetime!(2025-10-05 15:30 UTC),
            )
            .description("Pizza night"),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert_eq!(transaction.kind, TransactionKind::Expense);
                assert_eq!(transaction.amount_cents, 4500);
                assert_eq!(transaction.currency, "UYU");
                assert_eq!(transaction.occurred_at, datetime!(2025-10-05 15:30 UTC));
                assert!(!transaction.is_recurring);
                assert_eq!(transaction.remaining_occurrences, None);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_fails_on_negative_amount() {
        let conn = get_test_connection();

        let result = create_transaction(
            Transaction::build(
                TransactionKind::Expense,
                -1,
                "UYU",
                datetime!(2025-10-05 15:30 UTC),
            ),
            &conn,
        );

        assert_eq!(result, Err(Error::NegativeAmount(-1)));
    }

    #[test]
    fn create_recurring_seeds_remaining_occurrences() {
        let conn = get_test_connection();

        let transaction = create_transaction(
            Transaction::build(
                TransactionKind::Expense,
                150000,
                "UYU",
                datetime!(2025-10-01 12:00 UTC),
            )
            .description("Rent")
            .recurring(Frequency::Monthly, date!(2025 - 11 - 01), Some(12)),
            &conn,
        )
        .expect("Could not create recurring transaction");

        assert!(transaction.is_recurring);
        assert_eq!(transaction.frequency, Some(Frequency::Monthly));
        assert_eq!(transaction.next_occurrence, Some(date!(2025 - 11 - 01)));
        assert_eq!(transaction.total_occurrences, Some(12));
        assert_eq!(transaction.remaining_occurrences, Some(12));
        assert!(!transaction.is_paid);
    }

    #[test]
    fn get_round_trips_all_fields() {
        let conn = get_test_connection();
        let inserted = create_transaction(
            Transaction::build(
                TransactionKind::Transfer,
                20000,
                "USD",
                datetime!(2025-10-05 09:00 UTC),
            )
            .transfer_id(Some("ab12".to_owned()))
            .description("Savings top-up"),
            &conn,
        )
        .unwrap();

        let selected = get_transaction(inserted.id, &conn).unwrap();

        assert_eq!(inserted, selected);
    }

    #[test]
    fn get_fails_on_unknown_id() {
        let conn = get_test_connection();

        assert_eq!(get_transaction(1337, &conn), Err(Error::NotFound));
    }

    #[test]
    fn update_series_schedule_advances_and_resets_paid_flag() {
        let conn = get_test_connection();
        let series = create_transaction(
            Transaction::build(
                TransactionKind::Expense,
                9900,
                "UYU",
                datetime!(2025-10-01 12:00 UTC),
            )
            .recurring(Frequency::Weekly, date!(2025 - 10 - 08), Some(4)),
            &conn,
        )
        .unwrap();

        update_series_schedule(series.id, date!(2025 - 10 - 15), Some(3), &conn)
            .expect("Could not update series schedule");

        let updated = get_transaction(series.id, &conn).unwrap();
        assert_eq!(updated.next_occurrence, Some(date!(2025 - 10 - 15)));
        assert_eq!(updated.remaining_occurrences, Some(3));
        assert!(!updated.is_paid);
    }

    #[test]
    fn update_series_schedule_fails_on_unknown_id() {
        let conn = get_test_connection();

        let result = update_series_schedule(42, date!(2025 - 10 - 15), None, &conn);

        assert_eq!(result, Err(Error::NotFound));
    }
}
