use std::collections::HashSet;
use std::io::Read;

use anyhow::Result;
use tracing::{info, warn};

use crate::application::{LedgerService, NewTransaction, validate_transaction};
use crate::domain::{Kind, Taxonomy, Transaction, parse_amount, parse_date};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Validate and count without writing anything.
    pub dry_run: bool,
    /// Skip rows identical to a transaction already stored.
    pub skip_duplicates: bool,
    /// Register unknown categories/subcategories instead of rejecting the row.
    pub create_categories: bool,
}

/// Importer for loading sheet-layout CSV files into the ledger.
pub struct Importer<'a> {
    service: &'a LedgerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Import transactions from CSV with columns
    /// `Data, Tipo, Categoria, Subcategoria, Descrição, Valor` (header required).
    pub async fn import_transactions_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut result = ImportResult::default();

        let mut existing: HashSet<Transaction> = if options.skip_duplicates {
            self.service
                .snapshot()
                .await?
                .transactions
                .into_iter()
                .collect()
        } else {
            HashSet::new()
        };

        let mut income = self.service.categories(Kind::Income).await?;
        let mut expense = self.service.categories(Kind::Expense).await?;

        for (line_num, record) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let input = match parse_record(&record) {
                Ok(input) => input,
                Err((field, error)) => {
                    result.errors.push(ImportError {
                        line,
                        field: Some(field.to_string()),
                        error,
                    });
                    continue;
                }
            };

            let taxonomy = match input.kind {
                Kind::Income => &mut income,
                Kind::Expense => &mut expense,
            };
            let check = if options.create_categories {
                None
            } else {
                Some(&*taxonomy)
            };
            let transaction = match validate_transaction(&input, check) {
                Ok(t) => t,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: None,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            if options.skip_duplicates && existing.contains(&transaction) {
                result.skipped += 1;
                continue;
            }

            if !options.dry_run {
                if options.create_categories {
                    self.ensure_category(taxonomy, &transaction).await?;
                }
                self.service.record_transaction(input).await?;
            }
            if options.skip_duplicates {
                existing.insert(transaction);
            }
            result.imported += 1;
        }

        if result.errors.is_empty() {
            info!(
                imported = result.imported,
                skipped = result.skipped,
                dry_run = options.dry_run,
                "import finished"
            );
        } else {
            warn!(
                imported = result.imported,
                skipped = result.skipped,
                errors = result.errors.len(),
                "import finished with errors"
            );
        }
        Ok(result)
    }

    async fn ensure_category(
        &self,
        taxonomy: &mut Taxonomy,
        transaction: &Transaction,
    ) -> Result<()> {
        let kind = transaction.kind;
        if !taxonomy.contains_category(&transaction.category) {
            self.service.add_category(kind, &transaction.category).await?;
        }
        let known = taxonomy
            .subcategories(&transaction.category)
            .is_some_and(|subs| subs.iter().any(|s| s == &transaction.subcategory));
        if !known {
            self.service
                .add_subcategory(kind, &transaction.category, &transaction.subcategory)
                .await?;
        }
        *taxonomy = self.service.categories(kind).await?;
        Ok(())
    }
}

fn parse_record(record: &csv::StringRecord) -> Result<NewTransaction, (&'static str, String)> {
    let get = move |index: usize| record.get(index).unwrap_or("");

    let date =
        parse_date(get(0)).ok_or_else(|| ("date", format!("Invalid date: '{}'", get(0))))?;
    let kind =
        Kind::from_str(get(1)).ok_or_else(|| ("kind", format!("Invalid kind: '{}'", get(1))))?;
    let amount_cents =
        parse_amount(get(5)).map_err(|e| ("amount", format!("Invalid amount: {}", e)))?;

    Ok(NewTransaction {
        date,
        kind,
        category: get(2).to_string(),
        subcategory: get(3).to_string(),
        description: get(4).to_string(),
        amount_cents,
    })
}
