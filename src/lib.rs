//! Platita is a personal budget tracker built around a daily spending
//! allowance.
//!
//! Each month's income, minus a savings goal, becomes an envelope that is
//! spread over the month's remaining days. Underspending today raises every
//! future day's allowance and overspending lowers it; the envelope is
//! continuously rebalanced rather than handed out as a fixed quota.
//!
//! This library provides the budget engine, recurring-transaction
//! projection, and reporting aggregations behind a small JSON REST API.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod budget;
mod calendar;
mod category;
mod db;
mod endpoints;
mod goal;
mod limit;
mod money;
mod profile;
mod rates;
mod recurring;
mod routing;
mod statistics;
mod transaction;

pub use app_state::AppState;
pub use category::{Category, CategoryId, create_category, list_categories};
pub use db::initialize as initialize_db;
pub use profile::{Profile, get_profile, set_profile};
pub use routing::build_router;
pub use transaction::{Transaction, TransactionBuilder, TransactionKind, create_transaction};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down
/// gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A month number outside 1 to 12 was provided.
    #[error("{0} is not a valid month number (1-12)")]
    InvalidMonth(u8),

    /// A budget cycle day outside 1 to 28 was provided.
    ///
    /// Days 29 to 31 are rejected because the cycle day must exist in every
    /// month.
    #[error("{0} is not a valid budget cycle day (1-28)")]
    InvalidCycleDay(u8),

    /// A date could not be used in the requested computation.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// A timezone string did not name a canonical IANA timezone.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// An exchange rate that is zero, negative, or non-finite was provided.
    #[error("{0} is not a usable exchange rate")]
    InvalidRate(f64),

    /// Alert thresholds were out of range or too numerous.
    #[error("alert thresholds must be at most five unique percentages between 0 and 100")]
    InvalidThresholds,

    /// A confirm was attempted on a transaction that is not a recurring
    /// series.
    #[error("transaction {0} is not a recurring series")]
    NotRecurring(i64),

    /// A confirm was attempted on a series with no occurrences left.
    #[error("the recurring series has no occurrences left")]
    SeriesExhausted,

    /// A negative amount was provided where only non-negative amounts are
    /// allowed. The sign of a transaction is implied by its kind, never by
    /// the amount.
    #[error("amounts must be non-negative, got {0}")]
    NegativeAmount(i64),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the
    /// parameters (e.g., ID) are correct and that the resource has been
    /// created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::InvalidMonth(_)
            | Error::InvalidCycleDay(_)
            | Error::InvalidDate(_)
            | Error::InvalidRate(_)
            | Error::InvalidThresholds
            | Error::NotRecurring(_)
            | Error::NegativeAmount(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::SeriesExhausted => StatusCode::CONFLICT,
            Error::InvalidTimezone(_) | Error::DatabaseLock | Error::SqlError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
