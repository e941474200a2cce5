//! Defines the endpoint for confirming a pending recurring occurrence.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    recurring::{ConfirmedOccurrence, confirm_occurrence},
    transaction::TransactionId,
};

/// The state needed to confirm a recurring occurrence.
#[derive(Debug, Clone)]
pub struct ConfirmRecurringState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ConfirmRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that confirms the pending occurrence of a recurring
/// series: creates the concrete transaction dated now and advances the
/// series' schedule.
pub async fn confirm_recurring_endpoint(
    State(state): State<ConfirmRecurringState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<ConfirmedOccurrence>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLock)?;

    let confirmed = confirm_occurrence(transaction_id, OffsetDateTime::now_utc(), &connection)?;

    Ok(Json(confirmed))
}
