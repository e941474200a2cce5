//! Repeated-pattern detection for likely fixed costs.

use std::collections::HashMap;

use serde::Serialize;
use time::Date;

use crate::{
    category::{Category, CategoryId},
    statistics::UNTAGGED_LABEL,
    transaction::{Transaction, TransactionKind},
};

/// How many repeats of the same (category, amount) an expense needs before
/// it is flagged as a likely fixed cost.
pub const MIN_FIXED_COST_OCCURRENCES: u32 = 3;

/// An expense pattern that looks like a recurring fixed cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedCostCandidate {
    /// The category the repeated expense is filed under.
    pub category_id: Option<CategoryId>,
    /// The display name of the category.
    pub category_name: String,
    /// The exact repeated amount in its original currency's minor units.
    pub amount_cents: i64,
    /// The ISO 4217 code of the currency the amount is denominated in.
    pub currency: String,
    /// How many times the pattern occurred in the window.
    pub occurrences: u32,
    /// The most recent date the pattern occurred.
    pub last_seen: Date,
}

/// Flag expenses repeating the exact same (category, amount, currency) at
/// least [MIN_FIXED_COST_OCCURRENCES] times across `transactions`.
///
/// This is a heuristic, not a guarantee: a coincidentally repeated price
/// shows up as a false positive, and a fixed cost whose price changed
/// mid-window is missed. Results are sorted by occurrence count descending,
/// then amount descending.
pub fn detect_fixed_costs(
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<FixedCostCandidate> {
    let names: HashMap<CategoryId, &str> = categories
        .iter()
        .map(|category| (category.id, category.name.as_str()))
        .collect();

    let mut groups: HashMap<(Option<CategoryId>, i64, &str), (u32, Date)> = HashMap::new();
    for transaction in transactions {
        if transaction.kind != TransactionKind::Expense
            || transaction.transfer_id.is_some()
            || transaction.is_recurring
        {
            continue;
        }

        let key = (
            transaction.category_id,
            transaction.amount_cents,
            transaction.currency.as_str(),
        );
        let day = transaction.occurred_at.date();
        let entry = groups.entry(key).or_insert((0, day));
        entry.0 += 1;
        entry.1 = entry.1.max(day);
    }

    let mut candidates: Vec<FixedCostCandidate> = groups
        .into_iter()
        .filter(|(_, (occurrences, _))| *occurrences >= MIN_FIXED_COST_OCCURRENCES)
        .map(
            |((category_id, amount_cents, currency), (occurrences, last_seen))| {
                FixedCostCandidate {
                    category_id,
                    category_name: category_id
                        .and_then(|id| names.get(&id))
                        .map_or_else(|| UNTAGGED_LABEL.to_owned(), |name| (*name).to_owned()),
                    amount_cents,
                    currency: currency.to_owned(),
                    occurrences,
                    last_seen,
                }
            },
        )
        .collect();
    candidates.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then(b.amount_cents.cmp(&a.amount_cents))
    });

    candidates
}

#[cfg(test)]
mod tests {
    use time::{Date, macros::date};

    use crate::{
        category::Category,
        transaction::{Transaction, TransactionKind},
    };

    use super::{MIN_FIXED_COST_OCCURRENCES, detect_fixed_costs};

    fn expense(amount_cents: i64, day: Date, category_id: Option<i64>) -> Transaction {
        Transaction {
            id: 0,
            kind: TransactionKind::Expense,
            amount_cents,
            currency: "UYU".to_owned(),
            occurred_at: time::OffsetDateTime::new_utc(day, time::macros::time!(12:00)),
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

    #[test]
    fn repeated_rent_is_flagged_with_its_occurrence_count() {
        let categories = vec![Category {
            id: 1,
            name: "Rent".to_owned(),
            parent_id: None,
        }];
        let transactions = vec![
            expense(1500, date!(2025 - 01 - 01), Some(1)),
            expense(1500, date!(2025 - 02 - 01), Some(1)),
            expense(1500, date!(2025 - 04 - 01), Some(1)),
            expense(1500, date!(2025 - 06 - 01), Some(1)),
            // Same amount twice in another category: below the threshold.
            expense(1500, date!(2025 - 03 - 10), None),
            expense(1500, date!(2025 - 05 - 10), None),
        ];

        let candidates = detect_fixed_costs(&transactions, &categories);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].category_name, "Rent");
        assert_eq!(candidates[0].amount_cents, 1500);
        assert_eq!(candidates[0].occurrences, 4);
        assert_eq!(candidates[0].last_seen, date!(2025 - 06 - 01));
    }

    #[test]
    fn differing_amounts_do_not_group_together() {
        let transactions = vec![
            expense(1500, date!(2025 - 01 - 01), Some(1)),
            expense(1501, date!(2025 - 02 - 01), Some(1)),
            expense(1502, date!(2025 - 03 - 01), Some(1)),
        ];

        assert!(detect_fixed_costs(&transactions, &[]).is_empty());
    }

    #[test]
    fn threshold_is_exactly_three() {
        let mut transactions = vec![
            expense(9900, date!(2025 - 01 - 05), Some(1)),
            expense(9900, date!(2025 - 02 - 05), Some(1)),
        ];
        assert!(detect_fixed_costs(&transactions, &[]).is_empty());

        transactions.push(expense(9900, date!(2025 - 03 - 05), Some(1)));
        let candidates = detect_fixed_costs(&transactions, &[]);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].occurrences, MIN_FIXED_COST_OCCURRENCES);
    }
}
