//! Defines the endpoint listing recurring series that are still pending.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    recurring::{SeriesState, list_pending_series, series_state},
    transaction::Transaction,
};

/// The state needed to list pending recurring series.
#[derive(Debug, Clone)]
pub struct PendingRecurringState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PendingRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A recurring series row plus its computed lifecycle state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSeries {
    /// The series template.
    #[serde(flatten)]
    pub series: Transaction,
    /// Pending or paid; exhausted series are never listed.
    pub state: SeriesState,
}

/// A route handler returning the recurring series that have occurrences
/// left, ordered by next occurrence date.
pub async fn pending_recurring_endpoint(
    State(state): State<PendingRecurringState>,
) -> Result<Json<Vec<PendingSeries>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLock)?;

    let pending = list_pending_series(&connection)?
        .into_iter()
        .map(|series| {
            let state = series_state(&series);
            PendingSeries { series, state }
        })
        .collect();

    Ok(Json(pending))
}
