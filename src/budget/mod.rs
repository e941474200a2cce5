//! The budget allocation engine and its endpoint.
//!
//! The engine spreads the month's spendable envelope over the window's
//! remaining days and carries under- or overspending forward, recomputing
//! every day from what is actually left rather than from a fixed quota.

mod engine;
mod summary_endpoint;

pub use engine::{BudgetSummary, EndOfDay, StartOfDay, compute_summary};
pub use summary_endpoint::{BudgetSummaryState, SummaryQuery, budget_summary_endpoint};
