use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{Bucket, Cents, Kind, PeriodFilter, Transaction};

/// Income, expense and their difference over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub income: Cents,
    pub expense: Cents,
    pub balance: Cents,
}

/// Field used to group transactions in `group_sum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Category,
    Subcategory,
}

impl Dimension {
    fn key<'a>(&self, transaction: &'a Transaction) -> &'a str {
        match self {
            Dimension::Category => &transaction.category,
            Dimension::Subcategory => &transaction.subcategory,
        }
    }
}

/// Totals for one `(year, month)` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    pub year: i32,
    pub month: u32,
    pub income: Cents,
    pub expense: Cents,
    pub balance: Cents,
}

/// Sum amounts by kind. Balance = income - expense.
/// Sums saturate at the `Cents` range instead of overflowing.
pub fn compute_totals<'a, I>(transactions: I) -> Totals
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let (income, expense) = transactions.into_iter().fold(
        (0 as Cents, 0 as Cents),
        |(income, expense), t| match t.kind {
            Kind::Income => (income.saturating_add(t.amount_cents), expense),
            Kind::Expense => (income, expense.saturating_add(t.amount_cents)),
        },
    );

    Totals {
        income,
        expense,
        balance: income.saturating_sub(expense),
    }
}

/// Sum amounts of one kind grouped by category or subcategory.
/// Every key with at least one transaction is present, even when its sum is 0.
pub fn group_sum(
    transactions: &[Transaction],
    kind: Kind,
    dimension: Dimension,
) -> BTreeMap<String, Cents> {
    let mut sums: BTreeMap<String, Cents> = BTreeMap::new();

    for transaction in transactions.iter().filter(|t| t.kind == kind) {
        let sum = sums
            .entry(dimension.key(transaction).to_string())
            .or_insert(0);
        *sum = sum.saturating_add(transaction.amount_cents);
    }

    sums
}

/// Order grouped sums for display: largest first, ties by name.
pub fn rank_desc(sums: BTreeMap<String, Cents>) -> Vec<(String, Cents)> {
    let mut ranked: Vec<(String, Cents)> = sums.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Keep the transactions whose date falls in the selected year and/or month.
pub fn filter_by_period(transactions: &[Transaction], filter: &PeriodFilter) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| filter.matches(t.date))
        .cloned()
        .collect()
}

/// Per-month totals in ascending `(year, month)` order. Months without
/// transactions are not emitted.
pub fn monthly_series(transactions: &[Transaction]) -> Vec<MonthlyTotals> {
    let mut buckets: BTreeMap<Bucket, Vec<&Transaction>> = BTreeMap::new();

    for transaction in transactions {
        buckets
            .entry(Bucket::of(transaction.date))
            .or_default()
            .push(transaction);
    }

    buckets
        .into_iter()
        .map(|(bucket, members)| {
            let totals = compute_totals(members);
            MonthlyTotals {
                year: bucket.year,
                month: bucket.month,
                income: totals.income,
                expense: totals.expense,
                balance: totals.balance,
            }
        })
        .collect()
}

/// Distinct years present, most recent first.
pub fn available_years(transactions: &[Transaction]) -> Vec<i32> {
    let years: BTreeSet<i32> = transactions
        .iter()
        .map(|t| Bucket::of(t.date).year)
        .collect();
    years.into_iter().rev().collect()
}
