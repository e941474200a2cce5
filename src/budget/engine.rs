//! The continuously-rebalancing daily envelope computation.

use serde::Serialize;
use time::Date;
use time_tz::Tz;

use crate::{
    Error,
    calendar::{BudgetWindow, local_date},
    money::convert_to_base,
    transaction::{Transaction, TransactionKind},
};

/// The day's allocation as seen at the start of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOfDay {
    /// Today's nominal target: the remaining envelope spread evenly over the
    /// remaining days, today included.
    pub daily_target_cents: i64,
    /// Base-currency cents spent today so far.
    pub spent_today_cents: i64,
    /// What is left of today's target. Negative when today's spending has
    /// already exceeded it; the deficit is a real signal and is never clamped.
    pub remaining_today_cents: i64,
    /// How many days of the window are left, counting today.
    pub remaining_days_including_today: i64,
}

/// The day's allocation as seen at the close of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndOfDay {
    /// The credit (or debit, when negative) today hands to the rest of the
    /// window.
    pub rollover_from_today_cents: i64,
    /// Tomorrow's target after today's spending is folded back into the
    /// envelope. Reported as the sentinel 0 on the window's last day, when
    /// there is no tomorrow to allocate for.
    pub daily_target_tomorrow_cents: i64,
    /// How many days of the window are left after today.
    pub remaining_days_excluding_today: i64,
}

/// The full budget picture for one day of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    /// The first day of the budget window.
    pub window_start: Date,
    /// The last day of the budget window.
    pub window_end: Date,
    /// The day the summary describes.
    pub date: Date,
    /// The window's income in base-currency cents, transfers excluded.
    pub total_income_cents: i64,
    /// Expenses from the window's first day through today, transfers
    /// excluded, in base-currency cents.
    pub total_spent_cents: i64,
    /// The savings goal reserved off the top of income.
    pub goal_cents: i64,
    /// `total_income_cents - goal_cents`. Negative when the goal exceeds
    /// income, which surfaces as a negative daily target rather than being
    /// hidden.
    pub available_for_spending_cents: i64,
    /// The allocation as of the start of today.
    pub start_of_day: StartOfDay,
    /// The rollover into tomorrow as of the close of today.
    pub end_of_day: EndOfDay,
}

/// Compute the budget summary for `today` within `window`.
///
/// `transactions` are the window's concrete transactions; amounts are
/// converted into `base_currency` at `rate` before aggregation, and each
/// transaction is assigned to the day it happened on the wall clock of
/// `timezone`. Expenses dated after `today` are ignored so that a post-dated
/// entry cannot distort the current allocation. Division is always by a
/// day count that was checked beforehand; the last day of the window reports
/// tomorrow's target as the sentinel 0.
///
/// The computation is a pure function of its inputs: re-running it with the
/// same transactions, goal, and date produces the same numbers.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDate] if `today` lies outside `window`,
/// - or [Error::InvalidRate] if a conversion is attempted with an unusable
///   rate.
pub fn compute_summary(
    window: BudgetWindow,
    today: Date,
    transactions: &[Transaction],
    goal_cents: i64,
    base_currency: &str,
    rate: f64,
    timezone: &Tz,
) -> Result<BudgetSummary, Error> {
    if !window.contains(today) {
        return Err(Error::InvalidDate(format!(
            "{today} is outside the budget window {} to {}",
            window.start, window.end
        )));
    }

    let mut total_income_cents = 0;
    let mut spent_before_today_cents = 0;
    let mut spent_today_cents = 0;

    for transaction in transactions {
        if transaction.transfer_id.is_some() || transaction.is_recurring {
            continue;
        }

        let amount_cents = convert_to_base(
            transaction.amount_cents,
            &transaction.currency,
            base_currency,
            rate,
        )?;
        let day = local_date(transaction.occurred_at, timezone);

        match transaction.kind {
            TransactionKind::Income => total_income_cents += amount_cents,
            TransactionKind::Expense if day < today => spent_before_today_cents += amount_cents,
            TransactionKind::Expense if day == today => spent_today_cents += amount_cents,
            TransactionKind::Expense | TransactionKind::Transfer => {}
        }
    }

    let available_for_spending_cents = total_income_cents - goal_cents;
    let remaining_days_including_today = window.remaining_days_including(today);
    let remaining_days_excluding_today = window.remaining_days_excluding(today);

    // Floored division spreads the envelope without ever over-allocating,
    // and keeps a negative envelope negative on every remaining day.
    let unallocated_cents = available_for_spending_cents - spent_before_today_cents;
    let daily_target_cents = unallocated_cents.div_euclid(remaining_days_including_today);
    let remaining_today_cents = daily_target_cents - spent_today_cents;

    let total_spent_cents = spent_before_today_cents + spent_today_cents;
    let daily_target_tomorrow_cents = if remaining_days_excluding_today == 0 {
        0
    } else {
        (available_for_spending_cents - total_spent_cents)
            .div_euclid(remaining_days_excluding_today)
    };

    Ok(BudgetSummary {
        window_start: window.start,
        window_end: window.end,
        date: today,
        total_income_cents,
        total_spent_cents,
        goal_cents,
        available_for_spending_cents,
        start_of_day: StartOfDay {
            daily_target_cents,
            spent_today_cents,
            remaining_today_cents,
            remaining_days_including_today,
        },
        end_of_day: EndOfDay {
            rollover_from_today_cents: remaining_today_cents,
            daily_target_tomorrow_cents,
            remaining_days_excluding_today,
        },
    })
}
