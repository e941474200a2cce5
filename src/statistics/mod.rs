//! Reporting aggregations over converted transactions.

mod aggregation;
mod endpoints;
mod fixed_costs;

pub use aggregation::{CategoryTotal, MonthlyTotal, UNTAGGED_LABEL, expenses_by_category, monthly_totals};
pub use endpoints::{
    StatisticsQuery, StatisticsState, expenses_by_category_endpoint, fixed_costs_endpoint,
    income_endpoint, savings_endpoint,
};
pub use fixed_costs::{FixedCostCandidate, MIN_FIXED_COST_OCCURRENCES, detect_fixed_costs};
