//! Category spending limits: the model, database queries, and endpoints.
//!
//! A limit caps a category's spending for one month and carries up to five
//! alert thresholds (percentages of the budget). The GET endpoint reports
//! spent-so-far and which thresholds have been crossed; an external
//! notification dispatcher polls it and owns the actual alert delivery.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    calendar::{Period, month_anchor, period_range},
    category::{CategoryId, list_categories},
    money::convert_to_base,
    profile::get_profile,
    rates::current_rate,
    transaction::{TransactionKind, transactions_in_range},
};

/// The most alert thresholds a limit may carry.
pub const MAX_THRESHOLDS: usize = 5;

/// A cap on one category's spending for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingLimit {
    /// The ID of the limit.
    pub id: i64,
    /// The category the limit applies to.
    pub category_id: CategoryId,
    /// The UTC month anchor (day 1) the limit applies to.
    pub month: Date,
    /// The cap in base-currency cents.
    pub budget_cents: i64,
    /// Percentages of the budget (0 to 100) at which to alert, unique and
    /// sorted ascending.
    pub alert_thresholds: Vec<u8>,
}

/// Sort, deduplicate, and bounds-check alert thresholds.
///
/// # Errors
/// Returns [Error::InvalidThresholds] if any threshold exceeds 100 or more
/// than [MAX_THRESHOLDS] distinct values remain after deduplication.
pub fn normalize_thresholds(mut thresholds: Vec<u8>) -> Result<Vec<u8>, Error> {
    if thresholds.iter().any(|&threshold| threshold > 100) {
        return Err(Error::InvalidThresholds);
    }

    thresholds.sort_unstable();
    thresholds.dedup();

    if thresholds.len() > MAX_THRESHOLDS {
        return Err(Error::InvalidThresholds);
    }

    Ok(thresholds)
}

/// Store a category's spending limit for a month, replacing any previous
/// limit for the same category and month. Limits are only ever created or
/// edited by the user directly, never auto-generated.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if the budget is negative,
/// - [Error::InvalidThresholds] if the thresholds fail validation,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn upsert_limit(
    category_id: CategoryId,
    month: Date,
    budget_cents: i64,
    alert_thresholds: Vec<u8>,
    connection: &Connection,
) -> Result<SpendingLimit, Error> {
    if budget_cents < 0 {
        return Err(Error::NegativeAmount(budget_cents));
    }

    let thresholds = normalize_thresholds(alert_thresholds)?;
    let month = month.replace_day(1).unwrap();
    let encoded = serde_json::to_string(&thresholds).map_err(|_| Error::InvalidThresholds)?;

    let limit = connection
        .prepare(
            "INSERT INTO spending_limit (category_id, month, budget_cents, alert_thresholds)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(category_id, month) DO UPDATE SET
                budget_cents = excluded.budget_cents,
                alert_thresholds = excluded.alert_thresholds
             RETURNING id, category_id, month, budget_cents, alert_thresholds",
        )?
        .query_one((category_id, month, budget_cents, encoded), map_limit_row)?;

    Ok(limit)
}

/// Retrieve all spending limits for the month anchored at `month`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn limits_for_month(month: Date, connection: &Connection) -> Result<Vec<SpendingLimit>, Error> {
    let month = month.replace_day(1).unwrap();

    connection
        .prepare(
            "SELECT id, category_id, month, budget_cents, alert_thresholds
             FROM spending_limit WHERE month = :month ORDER BY category_id",
        )?
        .query_map(&[(":month", &month)], map_limit_row)?
        .map(|maybe_limit| maybe_limit.map_err(Error::from))
        .collect()
}

/// Create the spending limit table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_limit_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS spending_limit (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category_id INTEGER NOT NULL,
                month TEXT NOT NULL,
                budget_cents INTEGER NOT NULL CHECK (budget_cents >= 0),
                alert_thresholds TEXT NOT NULL,
                UNIQUE(category_id, month),
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_limit_row(row: &Row) -> Result<SpendingLimit, rusqlite::Error> {
    let encoded: String = row.get(4)?;
    let alert_thresholds = serde_json::from_str(&encoded).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(SpendingLimit {
        id: row.get(0)?,
        category_id: row.get(1)?,
        month: row.get(2)?,
        budget_cents: row.get(3)?,
        alert_thresholds,
    })
}

/// A limit together with how it is tracking for the month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitStatus {
    /// The limit itself.
    #[serde(flatten)]
    pub limit: SpendingLimit,
    /// Base-currency cents spent against the category so far this month.
    /// Expenses in child categories count toward the parent's limit.
    pub spent_cents: i64,
    /// The thresholds whose percentage of the budget has been reached.
    pub crossed_thresholds: Vec<u8>,
}

/// Compute spent-so-far and crossed thresholds for each of the month's
/// limits. `rate` is the current USD to UYU rate used for conversion into
/// `base_currency`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn limit_statuses(
    month: Date,
    base_currency: &str,
    rate: f64,
    connection: &Connection,
) -> Result<Vec<LimitStatus>, Error> {
    let limits = limits_for_month(month, connection)?;

    if limits.is_empty() {
        return Ok(Vec::new());
    }

    let range = period_range(Period::Month, month.year(), month.month() as u8)?;
    let transactions = transactions_in_range(range, connection)?;
    let parents: HashMap<CategoryId, Option<CategoryId>> = list_categories(connection)?
        .into_iter()
        .map(|category| (category.id, category.parent_id))
        .collect();

    let mut spent_by_category: HashMap<CategoryId, i64> = HashMap::new();
    for transaction in &transactions {
        if transaction.kind != TransactionKind::Expense || transaction.transfer_id.is_some() {
            continue;
        }
        let Some(category_id) = transaction.category_id else {
            continue;
        };
        let amount = convert_to_base(
            transaction.amount_cents,
            &transaction.currency,
            base_currency,
            rate,
        )?;

        // Credit the category and every ancestor so child spending counts
        // toward a parent's limit.
        let mut current = Some(category_id);
        while let Some(id) = current {
            *spent_by_category.entry(id).or_default() += amount;
            current = parents.get(&id).copied().flatten();
        }
    }

    let statuses = limits
        .into_iter()
        .map(|limit| {
            let spent_cents = spent_by_category
                .get(&limit.category_id)
                .copied()
                .unwrap_or(0);
            let crossed_thresholds = limit
                .alert_thresholds
                .iter()
                .copied()
                .filter(|&threshold| {
                    spent_cents.saturating_mul(100) >= limit.budget_cents * i64::from(threshold)
                })
                .collect();

            LimitStatus {
                limit,
                spent_cents,
                crossed_thresholds,
            }
        })
        .collect();

    Ok(statuses)
}

/// The state needed to manage spending limits.
#[derive(Debug, Clone)]
pub struct LimitState {
    /// The database connection for managing limits.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LimitState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for setting a category's spending limit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitRequest {
    /// The category the limit applies to.
    pub category_id: CategoryId,
    /// The year the limit applies to.
    pub year: i32,
    /// The month (1 to 12) the limit applies to.
    pub month: u8,
    /// The cap in base-currency cents.
    pub budget_cents: i64,
    /// Percentages of the budget at which to alert.
    #[serde(default)]
    pub alert_thresholds: Vec<u8>,
}

/// A route handler that sets a category's spending limit for a month.
pub async fn upsert_limit_endpoint(
    State(state): State<LimitState>,
    Json(request): Json<LimitRequest>,
) -> Result<Json<SpendingLimit>, Error> {
    let month = month_anchor(request.year, request.month)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLock)?;

    let limit = upsert_limit(
        request.category_id,
        month,
        request.budget_cents,
        request.alert_thresholds,
        &connection,
    )?;

    Ok(Json(limit))
}

/// The query parameters selecting which month's limits to report.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    /// The year to report on, defaulting to the current UTC year.
    pub year: Option<i32>,
    /// The month to report on, defaulting to the current UTC month.
    pub month: Option<u8>,
}

/// A route handler that reports each limit's spent-so-far and crossed
/// thresholds for a month.
pub async fn list_limits_endpoint(
    State(state): State<LimitState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<LimitStatus>>, Error> {
    let now = OffsetDateTime::now_utc();
    let month = month_anchor(
        query.year.unwrap_or(now.year()),
        query.month.unwrap_or(now.month() as u8),
    )?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLock)?;

    let profile = get_profile(&connection)?;
    let rate = current_rate(&connection)?;
    let statuses = limit_statuses(month, &profile.base_currency, rate, &connection)?;

    Ok(Json(statuses))
}
