//! Recurring transaction series: projection of future occurrences and the
//! confirm-payment flow.
//!
//! A recurring series is a template transaction that generates concrete,
//! dated transactions on a schedule until it is exhausted or indefinitely.
//! This module contains the pure projector (`advance`, `series_state`), the
//! confirmation logic, and the HTTP endpoints for confirming an occurrence
//! and listing pending series.

mod confirm_endpoint;
mod core;
mod pending_endpoint;

pub use confirm_endpoint::confirm_recurring_endpoint;
pub use core::{
    ConfirmedOccurrence, Frequency, SeriesState, advance, confirm_occurrence, list_pending_series,
    series_state,
};
pub use pending_endpoint::pending_recurring_endpoint;
