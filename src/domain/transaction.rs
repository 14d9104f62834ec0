use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{AmountPolicy, Cents};

/// Transaction polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }

    /// Label written to the sheet, matching the household spreadsheet.
    pub fn sheet_label(&self) -> &'static str {
        match self {
            Kind::Income => "Receita",
            Kind::Expense => "Despesa",
        }
    }

    /// Accepts the English names and the spreadsheet's Portuguese labels.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "receita" => Some(Kind::Income),
            "expense" | "despesa" => Some(Kind::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated, immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub kind: Kind,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub amount_cents: Cents,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        kind: Kind,
        category: impl Into<String>,
        subcategory: impl Into<String>,
        description: impl Into<String>,
        amount_cents: Cents,
    ) -> Self {
        Self {
            date,
            kind,
            category: category.into(),
            subcategory: subcategory.into(),
            description: description.into(),
            amount_cents,
        }
    }

    /// Render back into the untyped row shape stores persist.
    pub fn to_raw(&self) -> RawTransaction {
        RawTransaction {
            date: self.date.format(DATE_FORMAT).to_string(),
            kind: self.kind.sheet_label().to_string(),
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            description: self.description.clone(),
            amount: super::format_cents(self.amount_cents),
        }
    }
}

/// Canonical on-disk date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a stored date. Besides ISO dates, the spreadsheet renders dates as
/// `dd/mm/yyyy`, and some rows carry full RFC 3339 timestamps.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(input, "%d/%m/%Y"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// A row as handed over by a transaction source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub date: String,
    pub kind: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub amount: String,
}

/// Counts of rows excluded (or patched) while building a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    pub malformed_dates: usize,
    pub unknown_kinds: usize,
    pub invalid_amounts: usize,
    pub coerced_amounts: usize,
    pub missing_fields: usize,
}

impl DataQuality {
    /// Rows that did not make it into the snapshot.
    pub fn excluded(&self) -> usize {
        self.malformed_dates + self.unknown_kinds + self.invalid_amounts + self.missing_fields
    }

    pub fn is_clean(&self) -> bool {
        self.excluded() == 0 && self.coerced_amounts == 0
    }
}

/// An immutable point-in-time copy of the transaction store.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub quality: DataQuality,
}

impl Snapshot {
    /// Validate raw rows. Problems are counted in `quality`, never raised;
    /// the first failing check decides which counter a row lands in.
    pub fn from_raw(rows: impl IntoIterator<Item = RawTransaction>, policy: AmountPolicy) -> Self {
        let mut quality = DataQuality::default();
        let mut transactions = Vec::new();

        for row in rows {
            let Some(date) = parse_date(&row.date) else {
                quality.malformed_dates += 1;
                continue;
            };
            let Some(kind) = Kind::from_str(&row.kind) else {
                quality.unknown_kinds += 1;
                continue;
            };
            let category = row.category.trim();
            let subcategory = row.subcategory.trim();
            if category.is_empty() || subcategory.is_empty() {
                quality.missing_fields += 1;
                continue;
            }
            let Some((amount_cents, coerced)) = policy.apply(&row.amount) else {
                quality.invalid_amounts += 1;
                continue;
            };
            if coerced {
                quality.coerced_amounts += 1;
            }

            transactions.push(Transaction {
                date,
                kind,
                category: category.to_string(),
                subcategory: subcategory.to_string(),
                description: row.description.trim().to_string(),
                amount_cents,
            });
        }

        Self {
            transactions,
            quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, kind: &str, amount: &str) -> RawTransaction {
        RawTransaction {
            date: date.into(),
            kind: kind.into(),
            category: "Food".into(),
            subcategory: "Groceries".into(),
            description: "milk".into(),
            amount: amount.into(),
        }
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in [Kind::Income, Kind::Expense] {
            assert_eq!(Kind::from_str(kind.as_str()), Some(kind));
            assert_eq!(Kind::from_str(kind.sheet_label()), Some(kind));
        }
        assert_eq!(Kind::from_str(" DESPESA "), Some(Kind::Expense));
        assert_eq!(Kind::from_str("transfer"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(parse_date("2024-01-05"), expected);
        assert_eq!(parse_date("05/01/2024"), expected);
        assert_eq!(parse_date("2024-01-05T10:30:00-03:00"), expected);
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_snapshot_counts_problems() {
        let rows = vec![
            raw("2024-01-05", "Despesa", "10.00"),
            raw("not a date", "Despesa", "10.00"),
            raw("2024-01-05", "Transfer", "10.00"),
            raw("2024-01-05", "Receita", "ten"),
            RawTransaction {
                category: " ".into(),
                ..raw("2024-01-05", "Receita", "1")
            },
        ];

        let snapshot = Snapshot::from_raw(rows, AmountPolicy::Reject);

        assert_eq!(snapshot.transactions.len(), 1);
        assert_eq!(snapshot.quality.malformed_dates, 1);
        assert_eq!(snapshot.quality.unknown_kinds, 1);
        assert_eq!(snapshot.quality.invalid_amounts, 1);
        assert_eq!(snapshot.quality.missing_fields, 1);
        assert_eq!(snapshot.quality.excluded(), 4);
    }

    #[test]
    fn test_snapshot_coerce_policy_keeps_row() {
        let rows = vec![raw("2024-01-05", "Receita", ""), raw("2024-01-06", "Receita", "-3")];

        let snapshot = Snapshot::from_raw(rows, AmountPolicy::Coerce);

        assert_eq!(snapshot.transactions.len(), 2);
        assert!(snapshot.transactions.iter().all(|t| t.amount_cents == 0));
        assert_eq!(snapshot.quality.coerced_amounts, 2);
        assert_eq!(snapshot.quality.excluded(), 0);
        assert!(!snapshot.quality.is_clean());
    }

    #[test]
    fn test_to_raw_is_readable_again() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let tx = Transaction::new(date, Kind::Expense, "Food", "Restaurant", "dinner", 5000);

        let snapshot = Snapshot::from_raw(vec![tx.to_raw()], AmountPolicy::Reject);

        assert_eq!(snapshot.transactions, vec![tx]);
        assert!(snapshot.quality.is_clean());
    }
}
