//! Application router configuration.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{
    AppState,
    budget::budget_summary_endpoint,
    endpoints,
    goal::upsert_goal_endpoint,
    limit::{list_limits_endpoint, upsert_limit_endpoint},
    rates::set_rate_endpoint,
    recurring::{confirm_recurring_endpoint, pending_recurring_endpoint},
    statistics::{
        expenses_by_category_endpoint, fixed_costs_endpoint, income_endpoint, savings_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::BUDGET_SUMMARY, get(budget_summary_endpoint))
        .route(
            endpoints::CONFIRM_RECURRING,
            post(confirm_recurring_endpoint),
        )
        .route(endpoints::PENDING_RECURRING, get(pending_recurring_endpoint))
        .route(
            endpoints::STATISTICS_EXPENSES,
            get(expenses_by_category_endpoint),
        )
        .route(endpoints::STATISTICS_SAVINGS, get(savings_endpoint))
        .route(endpoints::STATISTICS_INCOME, get(income_endpoint))
        .route(endpoints::STATISTICS_FIXED_COSTS, get(fixed_costs_endpoint))
        .route(endpoints::GOAL, put(upsert_goal_endpoint))
        .route(
            endpoints::LIMITS,
            put(upsert_limit_endpoint).get(list_limits_endpoint),
        )
        .route(endpoints::RATE, put(set_rate_endpoint))
        .with_state(state)
}
