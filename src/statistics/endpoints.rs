//! Defines the reporting endpoints backed by the statistics aggregations.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    calendar::{InstantRange, Period, anchor_instant, month_anchor, months_before, period_range},
    category::{Category, list_categories},
    profile::get_profile,
    rates::current_rate,
    statistics::{
        CategoryTotal, FixedCostCandidate, MonthlyTotal, detect_fixed_costs, expenses_by_category,
        monthly_totals,
    },
    transaction::{Transaction, transactions_in_range},
};

/// How many trailing months the fixed-cost detector looks back over.
const FIXED_COST_WINDOW_MONTHS: u8 = 6;

/// The state needed to serve the statistics reports.
#[derive(Debug, Clone)]
pub struct StatisticsState {
    /// The database connection for reading transactions and categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StatisticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters selecting which period to report on.
#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    /// The reporting period, defaulting to a single month.
    pub period: Option<Period>,
    /// The year to report on, defaulting to the current UTC year.
    pub year: Option<i32>,
    /// The month anchoring the period, defaulting to the current UTC month.
    pub month: Option<u8>,
}

impl StatisticsQuery {
    fn range(&self) -> Result<InstantRange, Error> {
        let now = OffsetDateTime::now_utc();

        period_range(
            self.period.unwrap_or(Period::Month),
            self.year.unwrap_or(now.year()),
            self.month.unwrap_or(now.month() as u8),
        )
    }
}

struct ReportInputs {
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    base_currency: String,
    rate: f64,
}

fn gather_inputs(range: InstantRange, connection: &Connection) -> Result<ReportInputs, Error> {
    Ok(ReportInputs {
        transactions: transactions_in_range(range, connection)?,
        categories: list_categories(connection)?,
        base_currency: get_profile(connection)?.base_currency,
        rate: current_rate(connection)?,
    })
}

/// A route handler reporting expense totals per top-level category,
/// descending by amount.
pub async fn expenses_by_category_endpoint(
    State(state): State<StatisticsState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<Vec<CategoryTotal>>, Error> {
    let range = query.range()?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLock)?;
    let inputs = gather_inputs(range, &connection)?;

    let rows = expenses_by_category(
        &inputs.transactions,
        &inputs.categories,
        &inputs.base_currency,
        inputs.rate,
    )?;

    Ok(Json(rows))
}

/// A route handler reporting per-month income, expenses, and savings.
pub async fn savings_endpoint(
    State(state): State<StatisticsState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<Vec<MonthlyTotal>>, Error> {
    let range = query.range()?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLock)?;
    let inputs = gather_inputs(range, &connection)?;

    let rows = monthly_totals(&inputs.transactions, &inputs.base_currency, inputs.rate)?;

    Ok(Json(rows))
}

/// One month's income total.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRow {
    /// The UTC month anchor the row aggregates.
    pub month: Date,
    /// Income in base-currency cents, transfers excluded.
    pub income_cents: i64,
}

/// A route handler reporting per-month income totals.
pub async fn income_endpoint(
    State(state): State<StatisticsState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<Vec<IncomeRow>>, Error> {
    let range = query.range()?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLock)?;
    let inputs = gather_inputs(range, &connection)?;

    let rows = monthly_totals(&inputs.transactions, &inputs.base_currency, inputs.rate)?
        .into_iter()
        .map(|row| IncomeRow {
            month: row.month,
            income_cents: row.income_cents,
        })
        .collect();

    Ok(Json(rows))
}

/// A route handler reporting likely fixed costs over the trailing six
/// months.
pub async fn fixed_costs_endpoint(
    State(state): State<StatisticsState>,
) -> Result<Json<Vec<FixedCostCandidate>>, Error> {
    let now = OffsetDateTime::now_utc();
    let anchor = month_anchor(now.year(), now.month() as u8)?;
    let range = InstantRange {
        start: anchor_instant(months_before(anchor, FIXED_COST_WINDOW_MONTHS - 1)),
        end: period_range(Period::Month, now.year(), now.month() as u8)?.end,
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLock)?;
    let transactions = transactions_in_range(range, &connection)?;
    let categories = list_categories(&connection)?;

    Ok(Json(detect_fixed_costs(&transactions, &categories)))
}
