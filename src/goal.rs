//! Monthly savings goals: the model, database queries, and upsert endpoint.
//!
//! Goals are keyed by UTC month anchors regardless of the user's timezone;
//! only statistics and the engine's day slicing are timezone-aware.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{AppState, Error, calendar::month_anchor};

/// A savings target for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyGoal {
    /// The ID of the goal.
    pub id: i64,
    /// The UTC month anchor (day 1) the goal applies to.
    pub month: Date,
    /// How much of the month's income to reserve, in base-currency cents.
    pub saving_goal_cents: i64,
}

/// Store the savings goal for a month, replacing any previous goal for the
/// same month. Goals are only ever created or edited by the user directly,
/// never auto-generated.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if the goal is negative,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn upsert_goal(
    month: Date,
    saving_goal_cents: i64,
    connection: &Connection,
) -> Result<MonthlyGoal, Error> {
    if saving_goal_cents < 0 {
        return Err(Error::NegativeAmount(saving_goal_cents));
    }

    let month = month.replace_day(1).unwrap();

    let goal = connection
        .prepare(
            "INSERT INTO goal (month, saving_goal_cents) VALUES (?1, ?2)
             ON CONFLICT(month) DO UPDATE SET saving_goal_cents = excluded.saving_goal_cents
             RETURNING id, month, saving_goal_cents",
        )?
        .query_one((month, saving_goal_cents), map_goal_row)?;

    Ok(goal)
}

/// Retrieve the savings goal for the month anchored at `month`, if one has
/// been set.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_goal(month: Date, connection: &Connection) -> Result<Option<MonthlyGoal>, Error> {
    let month = month.replace_day(1).unwrap();

    let result = connection
        .prepare("SELECT id, month, saving_goal_cents FROM goal WHERE month = :month")?
        .query_one(&[(":month", &month)], map_goal_row);

    match result {
        Ok(goal) => Ok(Some(goal)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Create the goal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS goal (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                month TEXT NOT NULL UNIQUE,
                saving_goal_cents INTEGER NOT NULL CHECK (saving_goal_cents >= 0)
                )",
        (),
    )?;

    Ok(())
}

fn map_goal_row(row: &Row) -> Result<MonthlyGoal, rusqlite::Error> {
    Ok(MonthlyGoal {
        id: row.get(0)?,
        month: row.get(1)?,
        saving_goal_cents: row.get(2)?,
    })
}

/// The state needed to upsert a savings goal.
#[derive(Debug, Clone)]
pub struct GoalState {
    /// The database connection for managing goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for setting a month's savings goal.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRequest {
    /// The year the goal applies to.
    pub year: i32,
    /// The month (1 to 12) the goal applies to.
    pub month: u8,
    /// The savings target in base-currency cents.
    pub saving_goal_cents: i64,
}

/// A route handler that sets the savings goal for a month.
pub async fn upsert_goal_endpoint(
    State(state): State<GoalState>,
    Json(request): Json<GoalRequest>,
) -> Result<Json<MonthlyGoal>, Error> {
    let month = month_anchor(request.year, request.month)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLock)?;

    let goal = upsert_goal(month, request.saving_goal_cents, &connection)?;

    Ok(Json(goal))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::put};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::date;

    use crate::{Error, db::initialize, endpoints};

    use super::{GoalState, get_goal, upsert_goal, upsert_goal_endpoint};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn upsert_normalises_to_the_month_anchor() {
        let conn = get_test_connection();

        let goal = upsert_goal(date!(2025 - 06 - 17), 30000, &conn).unwrap();

        assert_eq!(goal.month, date!(2025 - 06 - 01));
        assert_eq!(
            get_goal(date!(2025 - 06 - 30), &conn).unwrap(),
            Some(goal)
        );
    }

    #[test]
    fn upsert_replaces_the_previous_goal_for_the_month() {
        let conn = get_test_connection();
        upsert_goal(date!(2025 - 06 - 01), 30000, &conn).unwrap();

        let updated = upsert_goal(date!(2025 - 06 - 01), 45000, &conn).unwrap();

        assert_eq!(updated.saving_goal_cents, 45000);
        let stored = get_goal(date!(2025 - 06 - 01), &conn).unwrap().unwrap();
        assert_eq!(stored.saving_goal_cents, 45000);
    }

    #[test]
    fn upsert_rejects_negative_goal() {
        let conn = get_test_connection();

        let result = upsert_goal(date!(2025 - 06 - 01), -1, &conn);

        assert_eq!(result, Err(Error::NegativeAmount(-1)));
    }

    #[test]
    fn missing_goal_reads_as_none() {
        let conn = get_test_connection();

        assert_eq!(get_goal(date!(2025 - 06 - 01), &conn).unwrap(), None);
    }

    #[tokio::test]
    async fn endpoint_rejects_invalid_month() {
        let connection = get_test_connection();
        let app = Router::new()
            .route(endpoints::GOAL, put(upsert_goal_endpoint))
            .with_state(GoalState {
                db_connection: Arc::new(Mutex::new(connection)),
            });
        let server = TestServer::new(app).expect("Could not create test server.");

        let response = server
            .put(endpoints::GOAL)
            .json(&json!({"year": 2025, "month": 13, "savingGoalCents": 30000}))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn endpoint_upserts_goal() {
        let connection = get_test_connection();
        let app = Router::new()
            .route(endpoints::GOAL, put(upsert_goal_endpoint))
            .with_state(GoalState {
                db_connection: Arc::new(Mutex::new(connection)),
            });
        let server = TestServer::new(app).expect("Could not create test server.");

        let response = server
            .put(endpoints::GOAL)
            .json(&json!({"year": 2025, "month": 6, "savingGoalCents": 30000}))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["month"], "2025-06-01");
        assert_eq!(body["savingGoalCents"], 30000);
    }
}
