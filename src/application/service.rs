use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::{
    AmountPolicy, Cents, Kind, MAX_AMOUNT_CENTS, PeriodFilter, Snapshot, Taxonomy, TaxonomyEntry,
    Transaction, default_entries, filter_by_period, format_cents, is_duplicate_category,
    is_duplicate_subcategory, resolve,
};
use crate::storage::LedgerStore;

use super::{AppError, Dashboard};

/// Application service providing the household ledger's operations.
/// This is the primary interface for any client (CLI, import, tests).
pub struct LedgerService {
    store: Box<dyn LedgerStore>,
    amount_policy: AmountPolicy,
}

/// Input of the "record a transaction" form.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub kind: Kind,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub amount_cents: Cents,
}

/// Filter for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub period: PeriodFilter,
    pub kind: Option<Kind>,
    pub category: Option<String>,
}

impl LedgerService {
    /// Create a new service over the given store.
    pub fn new(store: impl LedgerStore + 'static, amount_policy: AmountPolicy) -> Self {
        Self {
            store: Box::new(store),
            amount_policy,
        }
    }

    // ========================
    // Transactions
    // ========================

    /// Validate and append a transaction.
    pub async fn record_transaction(&self, input: NewTransaction) -> Result<Transaction, AppError> {
        let taxonomy = self.categories(input.kind).await?;
        let transaction = validate_transaction(&input, Some(&taxonomy))?;
        self.store.append_transaction(&transaction).await?;

        info!(
            kind = %transaction.kind,
            category = %transaction.category,
            amount_cents = transaction.amount_cents,
            "transaction recorded"
        );
        Ok(transaction)
    }

    /// Load every stored transaction and validate it.
    /// Rows that fail validation are counted, logged and left out.
    pub async fn snapshot(&self) -> Result<Snapshot, AppError> {
        let rows = self.store.load_all_transactions().await?;
        let total_rows = rows.len();
        let snapshot = Snapshot::from_raw(rows, self.amount_policy);

        let quality = &snapshot.quality;
        if quality.excluded() > 0 {
            warn!(
                excluded = quality.excluded(),
                malformed_dates = quality.malformed_dates,
                unknown_kinds = quality.unknown_kinds,
                invalid_amounts = quality.invalid_amounts,
                missing_fields = quality.missing_fields,
                "rows excluded from snapshot"
            );
        }
        if quality.coerced_amounts > 0 {
            warn!(
                coerced = quality.coerced_amounts,
                "unreadable amounts counted as zero"
            );
        }
        debug!(
            rows = total_rows,
            kept = snapshot.transactions.len(),
            policy = %self.amount_policy,
            "snapshot loaded"
        );

        Ok(snapshot)
    }

    /// Transactions matching `filter`, ordered by date (stable for equal dates).
    pub async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        let snapshot = self.snapshot().await?;
        let mut transactions: Vec<Transaction> =
            filter_by_period(&snapshot.transactions, &filter.period)
                .into_iter()
                .filter(|t| filter.kind.is_none_or(|k| t.kind == k))
                .filter(|t| filter.category.as_ref().is_none_or(|c| &t.category == c))
                .collect();
        transactions.sort_by_key(|t| t.date);
        Ok(transactions)
    }

    /// Summaries for the selected period.
    pub async fn dashboard(&self, filter: PeriodFilter) -> Result<Dashboard, AppError> {
        let snapshot = self.snapshot().await?;
        let dashboard = Dashboard::build(&snapshot, filter);
        debug!(
            period = %filter,
            transactions = dashboard.transaction_count,
            "dashboard built"
        );
        Ok(dashboard)
    }

    // ========================
    // Taxonomy
    // ========================

    /// Categories and subcategories available for `kind`.
    pub async fn categories(&self, kind: Kind) -> Result<Taxonomy, AppError> {
        let entries = self.store.load_all_taxonomy().await?;
        Ok(resolve(&entries, kind))
    }

    /// Register a new category with no subcategories.
    pub async fn add_category(&self, kind: Kind, name: &str) -> Result<TaxonomyEntry, AppError> {
        let name = required(name, "category")?;
        let taxonomy = self.categories(kind).await?;

        if is_duplicate_category(&taxonomy, name) {
            return Err(AppError::DuplicateEntry {
                entity: "Category",
                name: name.to_string(),
            });
        }

        let entry = TaxonomyEntry::category(kind, name);
        self.store.append_taxonomy_entry(&entry).await?;
        info!(kind = %kind, category = name, "category added");
        Ok(entry)
    }

    /// Register a subcategory under an existing category.
    pub async fn add_subcategory(
        &self,
        kind: Kind,
        category: &str,
        name: &str,
    ) -> Result<TaxonomyEntry, AppError> {
        let category = required(category, "category")?;
        let name = required(name, "subcategory")?;
        let taxonomy = self.categories(kind).await?;

        if !taxonomy.contains_category(category) {
            return Err(AppError::CategoryNotFound {
                kind,
                category: category.to_string(),
            });
        }
        if is_duplicate_subcategory(&taxonomy, category, name) {
            return Err(AppError::DuplicateEntry {
                entity: "Subcategory",
                name: format!("{} / {}", category, name),
            });
        }

        let entry = TaxonomyEntry::subcategory(kind, category, name);
        self.store.append_taxonomy_entry(&entry).await?;
        info!(kind = %kind, category, subcategory = name, "subcategory added");
        Ok(entry)
    }

    /// Write the starter categories into an empty taxonomy.
    /// Returns the number of entries written (0 when one already exists).
    pub async fn seed_default_taxonomy(&self) -> Result<usize, AppError> {
        if !self.store.load_all_taxonomy().await?.is_empty() {
            debug!("taxonomy already present, skipping seed");
            return Ok(0);
        }

        let entries = default_entries();
        for entry in &entries {
            self.store.append_taxonomy_entry(entry).await?;
        }
        info!(entries = entries.len(), "default taxonomy seeded");
        Ok(entries.len())
    }
}

/// Check a form submission: category, subcategory and description are
/// required and the amount must be positive. When a taxonomy is given the
/// category and subcategory must be registered in it.
pub fn validate_transaction(
    input: &NewTransaction,
    taxonomy: Option<&Taxonomy>,
) -> Result<Transaction, AppError> {
    let category = required(&input.category, "category")?;
    let subcategory = required(&input.subcategory, "subcategory")?;
    let description = required(&input.description, "description")?;

    if input.amount_cents <= 0 {
        return Err(AppError::InvalidAmount(
            "Amount must be greater than zero".to_string(),
        ));
    }
    if input.amount_cents > MAX_AMOUNT_CENTS {
        return Err(AppError::InvalidAmount(format!(
            "Amount must not exceed {}",
            format_cents(MAX_AMOUNT_CENTS)
        )));
    }

    if let Some(taxonomy) = taxonomy {
        let known_subs =
            taxonomy
                .subcategories(category)
                .ok_or_else(|| AppError::CategoryNotFound {
                    kind: input.kind,
                    category: category.to_string(),
                })?;
        if !known_subs.iter().any(|s| s == subcategory) {
            return Err(AppError::SubcategoryNotFound {
                category: category.to_string(),
                subcategory: subcategory.to_string(),
            });
        }
    }

    Ok(Transaction::new(
        input.date,
        input.kind,
        category,
        subcategory,
        description,
        input.amount_cents,
    ))
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AppError::MissingField(field))
    } else {
        Ok(value)
    }
}
