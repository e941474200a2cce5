//! Category and month rollups over converted transaction amounts.

use std::collections::HashMap;

use serde::Serialize;
use time::Date;

use crate::{
    Error,
    category::{Category, CategoryId},
    money::convert_to_base,
    transaction::{Transaction, TransactionKind},
};

/// The label expenses without a category are reported under.
pub const UNTAGGED_LABEL: &str = "Other";

/// One row of the expenses-by-category breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    /// The top-level category the row aggregates, or `None` for untagged
    /// expenses.
    pub category_id: Option<CategoryId>,
    /// The display name of the category.
    pub name: String,
    /// The summed expense amount in base-currency cents.
    pub total_cents: i64,
}

/// Sum expense amounts per top-level category, descending by total.
///
/// Expenses in a child category are rolled up into their root ancestor, so
/// "Eating out" spending reports under "Food". Transfers and recurring
/// templates are excluded; untagged expenses report under
/// [UNTAGGED_LABEL].
///
/// # Errors
/// Returns [Error::InvalidRate] if a conversion is attempted with an
/// unusable rate.
pub fn expenses_by_category(
    transactions: &[Transaction],
    categories: &[Category],
    base_currency: &str,
    rate: f64,
) -> Result<Vec<CategoryTotal>, Error> {
    let by_id: HashMap<CategoryId, &Category> = categories
        .iter()
        .map(|category| (category.id, category))
        .collect();

    let mut totals: HashMap<Option<CategoryId>, i64> = HashMap::new();
    for transaction in transactions {
        if transaction.kind != TransactionKind::Expense
            || transaction.transfer_id.is_some()
            || transaction.is_recurring
        {
            continue;
        }

        let amount = convert_to_base(
            transaction.amount_cents,
            &transaction.currency,
            base_currency,
            rate,
        )?;
        let root = transaction
            .category_id
            .map(|id| root_category(id, &by_id));

        *totals.entry(root.flatten()).or_default() += amount;
    }

    let mut rows: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category_id, total_cents)| CategoryTotal {
            category_id,
            name: category_id
                .and_then(|id| by_id.get(&id))
                .map_or_else(|| UNTAGGED_LABEL.to_owned(), |category| category.name.clone()),
            total_cents,
        })
        .collect();
    rows.sort_by(|a, b| b.total_cents.cmp(&a.total_cents));

    Ok(rows)
}

// A category referencing a parent missing from the store falls back to
// itself rather than dropping the row.
fn root_category(
    id: CategoryId,
    by_id: &HashMap<CategoryId, &Category>,
) -> Option<CategoryId> {
    let mut current = id;

    while let Some(category) = by_id.get(&current) {
        match category.parent_id {
            Some(parent) if by_id.contains_key(&parent) => current = parent,
            _ => return Some(current),
        }
    }

    Some(current)
}

/// One month's income, expenses, and the savings left between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    /// The UTC month anchor the row aggregates.
    pub month: Date,
    /// Income in base-currency cents, transfers excluded.
    pub income_cents: i64,
    /// Expenses in base-currency cents, transfers excluded.
    pub expense_cents: i64,
    /// `income_cents - expense_cents`. Negative in months that spent more
    /// than they earned.
    pub savings_cents: i64,
}

/// Sum income and expenses per UTC month, ascending by month.
///
/// # Errors
/// Returns [Error::InvalidRate] if a conversion is attempted with an
/// unusable rate.
pub fn monthly_totals(
    transactions: &[Transaction],
    base_currency: &str,
    rate: f64,
) -> Result<Vec<MonthlyTotal>, Error> {
    let mut by_month: HashMap<Date, (i64, i64)> = HashMap::new();

    for transaction in transactions {
        if transaction.transfer_id.is_some() || transaction.is_recurring {
            continue;
        }

        let amount = convert_to_base(
            transaction.amount_cents,
            &transaction.currency,
            base_currency,
            rate,
        )?;
        let month = transaction.occurred_at.date().replace_day(1).unwrap();
        let entry = by_month.entry(month).or_default();

        match transaction.kind {
            TransactionKind::Income => entry.0 += amount,
            TransactionKind::Expense => entry.1 += amount,
            TransactionKind::Transfer => {}
        }
    }

    let mut rows: Vec<MonthlyTotal> = by_month
        .into_iter()
        .map(|(month, (income_cents, expense_cents))| MonthlyTotal {
            month,
            income_cents,
            expense_cents,
            savings_cents: income_cents - expense_cents,
        })
        .collect();
    rows.sort_by_key(|row| row.month);

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        category::Category,
        recurring::Frequency,
        transaction::{Transaction, TransactionKind},
    };

    use super::{UNTAGGED_LABEL, expenses_by_category, monthly_totals};

    fn transaction(
        kind: TransactionKind,
        amount_cents: i64,
        currency: &str,
        occurred_at: OffsetDateTime,
        category_id: Option<i64>,
    ) -> Transaction {
        Transaction {
            id: 0,
            kind,
            amount_cents,
            currency: currency.to_owned(),
            occurred_at,
            category_id,
            description: String::new(),
            transfer_id: None,
            is_recurring: false,
            frequency: None,
            next_occurrence: None,
            total_occurrences: None,
            remaining_occurrences: None,
            is_paid: false,
        }
    }

    fn category(id: i64, name: &str, parent_id: Option<i64>) -> Category {
        Category {
            id,
            name: name.to_owned(),
            parent_id,
        }
    }

    #[test]
    fn expenses_roll_up_to_the_root_category() {
        let categories = vec![
            category(1, "Food", None),
            category(2, "Eating out", Some(1)),
            category(3, "Transport", None),
        ];
        let transactions = vec![
            transaction(
                TransactionKind::Expense,
                4000,
                "UYU",
                datetime!(2025-06-05 12:00 UTC),
                Some(2),
            ),
            transaction(
                TransactionKind::Expense,
                6000,
                "UYU",
                datetime!(2025-06-06 12:00 UTC),
                Some(1),
            ),
            transaction(
                TransactionKind::Expense,
                3000,
                "UYU",
                datetime!(2025-06-07 12:00 UTC),
                Some(3),
            ),
            transaction(
                TransactionKind::Income,
                100000,
                "UYU",
                datetime!(2025-06-01 12:00 UTC),
                None,
            ),
        ];

        let rows = expenses_by_category(&transactions, &categories, "UYU", 40.0).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Food");
        assert_eq!(rows[0].total_cents, 10000);
        assert_eq!(rows[1].name, "Transport");
        assert_eq!(rows[1].total_cents, 3000);
    }

    #[test]
    fn untagged_expenses_report_under_the_other_label() {
        let transactions = vec![transaction(
            TransactionKind::Expense,
            2500,
            "UYU",
            datetime!(2025-06-05 12:00 UTC),
            None,
        )];

        let rows = expenses_by_category(&transactions, &[], "UYU", 40.0).unwrap();

        assert_eq!(rows[0].name, UNTAGGED_LABEL);
        assert_eq!(rows[0].category_id, None);
        assert_eq!(rows[0].total_cents, 2500);
    }

    #[test]
    fn foreign_amounts_are_converted_before_summing() {
        let categories = vec![category(1, "Rent", None)];
        let transactions = vec![
            transaction(
                TransactionKind::Expense,
                500,
                "USD",
                datetime!(2025-06-05 12:00 UTC),
                Some(1),
            ),
            transaction(
                TransactionKind::Expense,
                10000,
                "UYU",
                datetime!(2025-06-06 12:00 UTC),
                Some(1),
            ),
        ];

        let rows = expenses_by_category(&transactions, &categories, "UYU", 40.0).unwrap();

        // 500 USD cents at 40 UYU per USD plus 10000 UYU cents.
        assert_eq!(rows[0].total_cents, 30000);
    }

    #[test]
    fn monthly_totals_group_by_utc_month_and_compute_savings() {
        let transactions = vec![
            transaction(
                TransactionKind::Income,
                300000,
                "UYU",
                datetime!(2025-05-01 12:00 UTC),
                None,
            ),
            transaction(
                TransactionKind::Expense,
                120000,
                "UYU",
                datetime!(2025-05-20 12:00 UTC),
                None,
            ),
            transaction(
                TransactionKind::Income,
                300000,
                "UYU",
                datetime!(2025-06-01 12:00 UTC),
                None,
            ),
            transaction(
                TransactionKind::Expense,
                310000,
                "UYU",
                datetime!(2025-06-25 12:00 UTC),
                None,
            ),
        ];

        let rows = monthly_totals(&transactions, "UYU", 40.0).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, time::macros::date!(2025 - 05 - 01));
        assert_eq!(rows[0].savings_cents, 180000);
        assert_eq!(rows[1].savings_cents, -10000);
    }

    #[test]
    fn transfers_and_templates_are_excluded_from_both_rollups() {
        let mut transfer = transaction(
            TransactionKind::Expense,
            50000,
            "UYU",
            datetime!(2025-06-05 12:00 UTC),
            None,
        );
        transfer.transfer_id = Some("pair-1".to_owned());
        let mut template = transaction(
            TransactionKind::Expense,
            70000,
            "UYU",
            datetime!(2025-06-05 12:00 UTC),
            None,
        );
        template.is_recurring = true;
        template.frequency = Some(Frequency::Monthly);
        let transactions = vec![transfer, template];

        assert!(expenses_by_category(&transactions, &[], "UYU", 40.0)
            .unwrap()
            .is_empty());
        assert!(monthly_totals(&transactions, "UYU", 40.0).unwrap().is_empty());
    }
}
