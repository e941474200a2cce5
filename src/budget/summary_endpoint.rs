//! Defines the endpoint serving the daily budget summary.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, OffsetDateTime, Time};

use crate::{
    AppState, Error,
    budget::{BudgetSummary, compute_summary},
    calendar::{END_OF_DAY, InstantRange, budget_window, local_date, local_to_utc, resolve_timezone},
    goal::get_goal,
    profile::get_profile,
    rates::current_rate,
    transaction::transactions_in_range,
};

/// The state needed to compute a budget summary.
#[derive(Debug, Clone)]
pub struct BudgetSummaryState {
    /// The database connection for reading transactions and settings.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetSummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters selecting which day to summarise.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// The local date to summarise, defaulting to today in the profile's
    /// timezone.
    pub date: Option<Date>,
}

/// A route handler that computes the budget summary for a day.
///
/// The budget window is the profile's cycle (calendar month, or payday to
/// payday when a cycle day is set), resolved in the profile's timezone.
pub async fn budget_summary_endpoint(
    State(state): State<BudgetSummaryState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<BudgetSummary>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLock)?;

    let profile = get_profile(&connection)?;
    let timezone = resolve_timezone(&profile.timezone)?;
    let today = query
        .date
        .unwrap_or_else(|| local_date(OffsetDateTime::now_utc(), timezone));

    let window = budget_window(today, profile.budget_cycle_day)?;
    let range = InstantRange {
        start: local_to_utc(window.start, Time::MIDNIGHT, timezone),
        end: local_to_utc(window.end, END_OF_DAY, timezone),
    };
    let transactions = transactions_in_range(range, &connection)?;

    let goal_cents = get_goal(today, &connection)?
        .map(|goal| goal.saving_goal_cents)
        .unwrap_or(0);
    let rate = current_rate(&connection)?;

    let summary = compute_summary(
        window,
        today,
        &transactions,
        goal_cents,
        &profile.base_currency,
        rate,
        timezone,
    )?;

    Ok(Json(summary))
}
