use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    Cents, DataQuality, Dimension, Kind, MonthlyTotals, PeriodFilter, Snapshot, Totals,
    available_years, compute_totals, filter_by_period, group_sum, monthly_series, rank_desc,
};

/// One bar of a category/subcategory chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub name: String,
    pub total: Cents,
    pub percentage: f64,
}

/// Everything the dashboard shows for one period selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub filter: PeriodFilter,
    pub transaction_count: usize,
    pub totals: Totals,
    pub expense_by_category: Vec<CategoryShare>,
    pub expense_by_subcategory: Vec<CategoryShare>,
    pub income_by_category: Vec<CategoryShare>,
    pub income_by_subcategory: Vec<CategoryShare>,
    pub monthly: Vec<MonthlyTotals>,
    /// Years present in the whole snapshot, for the year selector.
    pub available_years: Vec<i32>,
    pub quality: DataQuality,
}

impl Dashboard {
    /// Summarize a snapshot. An empty filter summarizes everything.
    pub fn build(snapshot: &Snapshot, filter: PeriodFilter) -> Self {
        let selected = if filter.is_empty() {
            snapshot.transactions.clone()
        } else {
            filter_by_period(&snapshot.transactions, &filter)
        };
        let totals = compute_totals(&selected);

        let shares = |kind: Kind, dimension: Dimension| {
            let kind_total = match kind {
                Kind::Income => totals.income,
                Kind::Expense => totals.expense,
            };
            to_shares(group_sum(&selected, kind, dimension), kind_total)
        };

        Self {
            filter,
            transaction_count: selected.len(),
            totals,
            expense_by_category: shares(Kind::Expense, Dimension::Category),
            expense_by_subcategory: shares(Kind::Expense, Dimension::Subcategory),
            income_by_category: shares(Kind::Income, Dimension::Category),
            income_by_subcategory: shares(Kind::Income, Dimension::Subcategory),
            monthly: monthly_series(&selected),
            available_years: available_years(&snapshot.transactions),
            quality: snapshot.quality,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }
}

fn to_shares(sums: BTreeMap<String, Cents>, kind_total: Cents) -> Vec<CategoryShare> {
    rank_desc(sums)
        .into_iter()
        .map(|(name, total)| CategoryShare {
            name,
            total,
            percentage: if kind_total > 0 {
                (total as f64 / kind_total as f64) * 100.0
            } else {
                0.0
            },
        })
        .collect()
}
