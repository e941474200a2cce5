//! The recurring-series projector and confirm-payment state transitions.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::{
    Error,
    calendar::days_in_month,
    transaction::{
        Transaction, TransactionId, create_transaction, get_transaction, map_transaction_row,
        update_series_schedule,
    },
};

/// How often a recurring series produces an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// Every calendar month, clamped to the target month's last valid day.
    Monthly,
}

impl Frequency {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// Where a recurring series sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesState {
    /// The current period's occurrence has not been confirmed yet.
    Pending,
    /// The current period's occurrence has been confirmed.
    Paid,
    /// No occurrences remain; the series stops appearing in pending views.
    Exhausted,
}

/// Compute the next occurrence date of a series.
///
/// Deterministic and side-effect free; the caller applies state transitions.
/// A monthly advance from the 29th, 30th, or 31st clamps to the last valid
/// day of the target month rather than spilling into the month after.
pub fn advance(frequency: Frequency, from: Date) -> Date {
    match frequency {
        Frequency::Daily => from + Duration::days(1),
        Frequency::Weekly => from + Duration::days(7),
        Frequency::Monthly => {
            let anchor = from.replace_day(1).unwrap();
            let next_anchor = next_month(anchor);
            let last_day = days_in_month(next_anchor.year(), next_anchor.month());

            next_anchor.replace_day(from.day().min(last_day)).unwrap()
        }
    }
}

fn next_month(anchor: Date) -> Date {
    use time::Month;

    let (year, month) = match anchor.month() {
        Month::December => (anchor.year() + 1, Month::January),
        month => (anchor.year(), month.next()),
    };

    Date::from_calendar_date(year, month, 1).expect("day 1 is valid in every month")
}

/// The lifecycle state of a recurring series row.
pub fn series_state(series: &Transaction) -> SeriesState {
    match series.remaining_occurrences {
        Some(0) => SeriesState::Exhausted,
        _ if series.is_paid => SeriesState::Paid,
        _ => SeriesState::Pending,
    }
}

/// The result of confirming a pending occurrence.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedOccurrence {
    /// The concrete transaction created by the confirmation.
    pub created: Transaction,
    /// The series template with its schedule advanced.
    pub series: Transaction,
    /// The state of the series after confirmation.
    pub state: SeriesState,
}

/// Confirm the pending occurrence of a recurring series.
///
/// Creates a concrete, non-recurring transaction dated `now`, advances the
/// series' `next_occurrence` by one period, decrements
/// `remaining_occurrences` when the series is finite, and resets `is_paid` so
/// the next period's occurrence reappears as pending.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction,
/// - [Error::NotRecurring] if the transaction is not a recurring series,
/// - [Error::SeriesExhausted] if the series has no occurrences left,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn confirm_occurrence(
    id: TransactionId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<ConfirmedOccurrence, Error> {
    let series = get_transaction(id, connection)?;

    let Some(frequency) = series.frequency.filter(|_| series.is_recurring) else {
        return Err(Error::NotRecurring(id));
    };

    if series_state(&series) == SeriesState::Exhausted {
        return Err(Error::SeriesExhausted);
    }

    let created = create_transaction(
        Transaction::build(series.kind, series.amount_cents, &series.currency, now)
            .category_id(series.category_id)
            .description(&series.description),
        connection,
    )?;

    let base = series.next_occurrence.unwrap_or_else(|| now.date());
    let next_occurrence = advance(frequency, base);
    let remaining = series.remaining_occurrences.map(|count| count - 1);

    update_series_schedule(id, next_occurrence, remaining, connection)?;
    let series = get_transaction(id, connection)?;
    let state = series_state(&series);

    Ok(ConfirmedOccurrence {
        created,
        series,
        state,
    })
}

/// Retrieve the recurring series that still have occurrences left, ordered by
/// their next occurrence date.
///
/// Exhausted series are excluded so they stop appearing in pending views.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_pending_series(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, kind, amount_cents, currency, occurred_at, category_id,
                description, transfer_id, is_recurring, frequency,
                next_occurrence, total_occurrences, remaining_occurrences, is_paid
             FROM \"transaction\"
             WHERE is_recurring = 1
               AND (remaining_occurrences IS NULL OR remaining_occurrences > 0)
             ORDER BY next_occurrence",
        )?
        .query_map([], map_transaction_row)?
        .map(|maybe_series| maybe_series.map_err(Error::from))
        .collect()
}


#[cfg(test)]
mod confirmation_tests {
    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        Error,
        db::initialize,
        transaction::{Transaction, TransactionKind, create_transaction},
    };

    use super::{Frequency, SeriesState, confirm_occurrence, list_pending_series, series_state};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_series(total: Option<u32>, conn: &Connection) -> Transaction {
        create_transaction(
            Transaction::build(
                TransactionKind::Expense,
                9900,
                "UYU",
                datetime!(2025-06-01 12:00 UTC),
            )
            .description("Gym membership")
            .recurring(Frequency::Monthly, date!(2025 - 07 - 01), total),
            conn,
        )
        .expect("Could not create recurring series")
    }

    #[test]
    fn confirm_creates_concrete_transaction_dated_now() {
        let conn = get_test_connection();
        let series = create_test_series(None, &conn);
        let now = datetime!(2025-07-01 09:30 UTC);

        let confirmed = confirm_occurrence(series.id, now, &conn).unwrap();

        assert_eq!(confirmed.created.kind, TransactionKind::Expense);
        assert_eq!(confirmed.created.amount_cents, 9900);
        assert_eq!(confirmed.created.occurred_at, now);
        assert_eq!(confirmed.created.description, "Gym membership");
        assert!(!confirmed.created.is_recurring);
    }

    #[test]
    fn confirm_advances_schedule_and_resets_paid_flag() {
        let conn = get_test_connection();
        let series = create_test_series(None, &conn);

        let confirmed =
            confirm_occurrence(series.id, datetime!(2025-07-01 09:30 UTC), &conn).unwrap();

        assert_eq!(confirmed.series.next_occurrence, Some(date!(2025 - 08 - 01)));
        assert_eq!(confirmed.series.remaining_occurrences, None);
        assert!(!confirmed.series.is_paid);
        assert_eq!(confirmed.state, SeriesState::Pending);
    }

    #[test]
    fn three_confirmations_exhaust_a_three_occurrence_series() {
        let conn = get_test_connection();
        let series = create_test_series(Some(3), &conn);
        let now = datetime!(2025-07-01 09:30 UTC);

        let first = confirm_occurrence(series.id, now, &conn).unwrap();
        assert_eq!(first.series.remaining_occurrences, Some(2));
        assert_eq!(first.state, SeriesState::Pending);

        let second = confirm_occurrence(series.id, now, &conn).unwrap();
        assert_eq!(second.series.remaining_occurrences, Some(1));
        assert_eq!(second.state, SeriesState::Pending);

        let third = confirm_occurrence(series.id, now, &conn).unwrap();
        assert_eq!(third.series.remaining_occurrences, Some(0));
        assert_eq!(third.state, SeriesState::Exhausted);

        // A fourth confirmation must be refused.
        let fourth = confirm_occurrence(series.id, now, &conn);
        assert_eq!(fourth, Err(Error::SeriesExhausted));
    }

    #[test]
    fn exhausted_series_disappears_from_pending_views() {
        let conn = get_test_connection();
        let one_shot = create_test_series(Some(1), &conn);
        let indefinite = create_test_series(None, &conn);

        confirm_occurrence(one_shot.id, datetime!(2025-07-01 09:30 UTC), &conn).unwrap();

        let pending = list_pending_series(&conn).unwrap();
        let ids: Vec<i64> = pending.iter().map(|series| series.id).collect();
        assert_eq!(ids, vec![indefinite.id]);
    }

    #[test]
    fn confirm_rejects_non_recurring_transactions() {
        let conn = get_test_connection();
        let plain = create_transaction(
            Transaction::build(
                TransactionKind::Expense,
                100,
                "UYU",
                datetime!(2025-06-01 12:00 UTC),
            ),
            &conn,
        )
        .unwrap();

        let result = confirm_occurrence(plain.id, datetime!(2025-07-01 09:30 UTC), &conn);

        assert_eq!(result, Err(Error::NotRecurring(plain.id)));
    }

    #[test]
    fn confirm_rejects_unknown_id() {
        let conn = get_test_connection();

        let result = confirm_occurrence(1337, datetime!(2025-07-01 09:30 UTC), &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn series_state_reflects_paid_flag() {
        let conn = get_test_connection();
        let series = create_test_series(Some(2), &conn);

        assert_eq!(series_state(&series), SeriesState::Pending);

        conn.execute(
            "UPDATE \"transaction\" SET is_paid = 1 WHERE id = ?1",
            (series.id,),
        )
        .unwrap();
        let paid = crate::transaction::get_transaction(series.id, &conn).unwrap();
        assert_eq!(series_state(&paid), SeriesState::Paid);
    }
}
