//! Storage and endpoint for the user-managed USD to UYU exchange rate.
//!
//! There is no market data feed; the user keys the rate in whenever they care
//! to update it, and every conversion uses whatever was last stored.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, Error};

/// The rate assumed before the user has stored one.
pub const DEFAULT_USD_UYU_RATE: f64 = 40.0;

/// Store the USD to UYU exchange rate, replacing the previous one.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidRate] if the rate is not a finite positive number,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_rate(rate: f64, connection: &Connection) -> Result<(), Error> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(Error::InvalidRate(rate));
    }

    connection.execute(
        "INSERT INTO exchange_rate (id, usd_uyu, updated_at) VALUES (1, ?1, ?2)
         ON CONFLICT(id) DO UPDATE SET
            usd_uyu = excluded.usd_uyu,
            updated_at = excluded.updated_at",
        (rate, OffsetDateTime::now_utc()),
    )?;

    Ok(())
}

/// Retrieve the stored USD to UYU rate, falling back to
/// [DEFAULT_USD_UYU_RATE] when none has been stored yet.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn current_rate(connection: &Connection) -> Result<f64, Error> {
    let result = connection
        .prepare("SELECT usd_uyu FROM exchange_rate WHERE id = 1")?
        .query_one([], |row| row.get(0));

    match result {
        Ok(rate) => Ok(rate),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            tracing::warn!(
                "No exchange rate stored, falling back to {}",
                DEFAULT_USD_UYU_RATE
            );
            Ok(DEFAULT_USD_UYU_RATE)
        }
        Err(error) => Err(error.into()),
    }
}

/// Create the exchange rate table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_exchange_rate_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS exchange_rate (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                usd_uyu REAL NOT NULL CHECK (usd_uyu > 0),
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// The state needed to update the exchange rate.
#[derive(Debug, Clone)]
pub struct RateState {
    /// The database connection for storing the rate.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RateState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for updating the exchange rate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    /// How many UYU one USD buys.
    pub usd_uyu: f64,
}

/// The response body confirming the stored exchange rate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    /// The stored rate.
    pub usd_uyu: f64,
}

/// A route handler that updates the USD to UYU exchange rate.
pub async fn set_rate_endpoint(
    State(state): State<RateState>,
    Json(request): Json<RateRequest>,
) -> Result<Json<RateResponse>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLock)?;

    set_rate(request.usd_uyu, &connection)?;

    Ok(Json(RateResponse {
        usd_uyu: request.usd_uyu,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::put};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{Error, db::initialize, endpoints};

    use super::{DEFAULT_USD_UYU_RATE, RateState, current_rate, set_rate, set_rate_endpoint};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn missing_rate_falls_back_to_default() {
        let conn = get_test_connection();

        assert_eq!(current_rate(&conn).unwrap(), DEFAULT_USD_UYU_RATE);
    }

    #[test]
    fn set_then_get_round_trips() {
        let conn = get_test_connection();

        set_rate(42.5, &conn).unwrap();

        assert_eq!(current_rate(&conn).unwrap(), 42.5);
    }

    #[test]
    fn set_replaces_previous_rate() {
        let conn = get_test_connection();
        set_rate(40.0, &conn).unwrap();

        set_rate(41.2, &conn).unwrap();

        assert_eq!(current_rate(&conn).unwrap(), 41.2);
    }

    #[test]
    fn set_rejects_non_positive_rates() {
        let conn = get_test_connection();

        assert_eq!(set_rate(0.0, &conn), Err(Error::InvalidRate(0.0)));
        assert_eq!(set_rate(-1.0, &conn), Err(Error::InvalidRate(-1.0)));
    }

    #[tokio::test]
    async fn endpoint_stores_rate() {
        let connection = get_test_connection();
        let app = Router::new()
            .route(endpoints::RATE, put(set_rate_endpoint))
            .with_state(RateState {
                db_connection: Arc::new(Mutex::new(connection)),
            });
        let server = TestServer::new(app).expect("Could not create test server.");

        let response = server.put(endpoints::RATE).json(&json!({"usdUyu": 41.5})).await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["usdUyu"], 41.5);
    }

    #[tokio::test]
    async fn endpoint_rejects_invalid_rate() {
        let connection = get_test_connection();
        let app = Router::new()
            .route(endpoints::RATE, put(set_rate_endpoint))
            .with_state(RateState {
                db_connection: Arc::new(Mutex::new(connection)),
            });
        let server = TestServer::new(app).expect("Could not create test server.");

        let response = server.put(endpoints::RATE).json(&json!({"usdUyu": -3.0})).await;

        response.assert_status_bad_request();
    }
}
