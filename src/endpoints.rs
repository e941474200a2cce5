//! The API endpoint URIs.

/// The route for the daily budget summary.
pub const BUDGET_SUMMARY: &str = "/api/budget/summary";
/// The route for confirming a recurring series' pending occurrence.
pub const CONFIRM_RECURRING: &str = "/api/recurring/{transaction_id}/confirm";
/// The route listing recurring series with occurrences left.
pub const PENDING_RECURRING: &str = "/api/recurring/pending";
/// The route for the expenses-by-category breakdown.
pub const STATISTICS_EXPENSES: &str = "/api/statistics/expenses-by-category";
/// The route for per-month savings rows.
pub const STATISTICS_SAVINGS: &str = "/api/statistics/savings";
/// The route for per-month income totals.
pub const STATISTICS_INCOME: &str = "/api/statistics/income";
/// The route for likely fixed costs over the trailing six months.
pub const STATISTICS_FIXED_COSTS: &str = "/api/statistics/fixed-costs";
/// The route for setting a month's savings goal.
pub const GOAL: &str = "/api/goal";
/// The route for managing category spending limits.
pub const LIMITS: &str = "/api/limits";
/// The route where the exchange-rate provider pushes the current rate.
pub const RATE: &str = "/api/rate";
