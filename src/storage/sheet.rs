use std::fs::{self, File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info, warn};

use crate::domain::{Kind, RawTransaction, TaxonomyEntry, Transaction};

use super::LedgerStore;

/// Column layout of the household spreadsheet's transactions tab.
pub const TRANSACTION_HEADER: [&str; 6] = [
    "Data",
    "Tipo",
    "Categoria",
    "Subcategoria",
    "Descrição",
    "Valor",
];

/// Column layout of the categories tab.
pub const CATEGORY_HEADER: [&str; 3] = ["Categoria", "Subcategoria", "Tipo"];

const TRANSACTIONS_FILE: &str = "transactions.csv";
const CATEGORIES_FILE: &str = "categories.csv";

/// Spreadsheet-style store: a directory with one CSV file per tab.
/// Rows are only ever appended; reads scan the whole file.
///
/// File access is blocking `std::fs` I/O run inline on the caller's task.
/// Each call touches one small file, which suits the one-shot CLI; a
/// long-running server should wrap calls in `tokio::task::spawn_blocking`.
pub struct SheetStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl SheetStore {
    /// Open the sheet directory, creating it and both tabs if missing.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create sheet directory {}", dir.display()))?;

        let store = Self {
            dir,
            write_lock: Mutex::new(()),
        };
        store.ensure_tab(TRANSACTIONS_FILE, &TRANSACTION_HEADER)?;
        store.ensure_tab(CATEGORIES_FILE, &CATEGORY_HEADER)?;
        info!(dir = %store.dir.display(), "sheet store opened");
        Ok(store)
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.dir.join(TRANSACTIONS_FILE)
    }

    pub fn categories_path(&self) -> PathBuf {
        self.dir.join(CATEGORIES_FILE)
    }

    fn ensure_tab(&self, file: &str, header: &[&str]) -> Result<()> {
        let path = self.dir.join(file);
        let is_empty = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        if is_empty {
            let mut writer = csv::Writer::from_path(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            writer.write_record(header)?;
            writer.flush()?;
        }
        Ok(())
    }

    fn append_row(&self, file: &str, row: &[&str]) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Sheet write lock poisoned"))?;

        let path = self.dir.join(file);
        let handle = OpenOptions::new()
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {} for append", path.display()))?;

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(handle));
        writer.write_record(row)?;
        writer.flush()?;
        Ok(())
    }

    fn read_rows(&self, file: &str) -> Result<Vec<StringRecord>> {
        let path = self.dir.join(file);
        let handle =
            File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(handle);

        let mut rows = Vec::new();
        for result in reader.records() {
            rows.push(result.with_context(|| format!("Failed to read {}", path.display()))?);
        }
        Ok(rows)
    }
}

fn field(record: &StringRecord, index: usize) -> String {
    record.get(index).unwrap_or("").to_string()
}

#[async_trait]
impl LedgerStore for SheetStore {
    async fn append_transaction(&self, transaction: &Transaction) -> Result<()> {
        let raw = transaction.to_raw();
        self.append_row(
            TRANSACTIONS_FILE,
            &[
                raw.date.as_str(),
                raw.kind.as_str(),
                raw.category.as_str(),
                raw.subcategory.as_str(),
                raw.description.as_str(),
                raw.amount.as_str(),
            ],
        )?;
        debug!(date = %raw.date, category = %raw.category, "row appended to sheet");
        Ok(())
    }

    async fn append_taxonomy_entry(&self, entry: &TaxonomyEntry) -> Result<()> {
        self.append_row(
            CATEGORIES_FILE,
            &[
                entry.category.as_str(),
                entry.subcategory.as_deref().unwrap_or(""),
                entry.kind.sheet_label(),
            ],
        )
    }

    async fn load_all_transactions(&self) -> Result<Vec<RawTransaction>> {
        Ok(self
            .read_rows(TRANSACTIONS_FILE)?
            .iter()
            .map(|record| RawTransaction {
                date: field(record, 0),
                kind: field(record, 1),
                category: field(record, 2),
                subcategory: field(record, 3),
                description: field(record, 4),
                amount: field(record, 5),
            })
            .collect())
    }

    async fn load_all_taxonomy(&self) -> Result<Vec<TaxonomyEntry>> {
        let mut entries = Vec::new();
        for (index, record) in self.read_rows(CATEGORIES_FILE)?.iter().enumerate() {
            let category = field(record, 0);
            let kind_str = field(record, 2);
            if category.is_empty() {
                continue;
            }
            let Some(kind) = Kind::from_str(&kind_str) else {
                warn!(
                    line = index + 2,
                    kind = %kind_str,
                    file = CATEGORIES_FILE,
                    "skipping taxonomy row with unknown kind"
                );
                continue;
            };

            let subcategory = Some(field(record, 1)).filter(|s| !s.is_empty());
            entries.push(TaxonomyEntry {
                category,
                subcategory,
                kind,
            });
        }
        Ok(entries)
    }
}
