use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::domain::{Kind, RawTransaction, TaxonomyEntry, Transaction};

use super::{LedgerStore, MIGRATION_001_INITIAL};

/// SQLite-backed store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Open the database file at `path`, creating it when `create` is set.
    pub async fn open(path: &str, create: bool) -> Result<Self> {
        if create {
            Self::init(&format!("sqlite:{}?mode=rwc", path)).await
        } else {
            Self::connect(&format!("sqlite:{}", path)).await
        }
    }

    fn row_to_taxonomy_entry(row: &sqlx::sqlite::SqliteRow) -> Result<TaxonomyEntry> {
        let kind_str: String = row.get("kind");
        Ok(TaxonomyEntry {
            category: row.get("category"),
            subcategory: row.get("subcategory"),
            kind: Kind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid taxonomy kind: {}", kind_str))?,
        })
    }

    fn row_to_raw_transaction(row: &sqlx::sqlite::SqliteRow) -> RawTransaction {
        RawTransaction {
            date: row.get("date"),
            kind: row.get("kind"),
            category: row.get("category"),
            subcategory: row.get("subcategory"),
            description: row.get("description"),
            amount: row.get("amount"),
        }
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn append_transaction(&self, transaction: &Transaction) -> Result<()> {
        let raw = transaction.to_raw();
        sqlx::query(
            r#"
            INSERT INTO transactions (date, kind, category, subcategory, description, amount, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&raw.date)
        .bind(transaction.kind.as_str())
        .bind(&raw.category)
        .bind(&raw.subcategory)
        .bind(&raw.description)
        .bind(&raw.amount)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save transaction")?;

        debug!(date = %raw.date, category = %raw.category, "transaction appended");
        Ok(())
    }

    async fn append_taxonomy_entry(&self, entry: &TaxonomyEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO taxonomy (category, subcategory, kind, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&entry.category)
        .bind(&entry.subcategory)
        .bind(entry.kind.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save taxonomy entry")?;
        Ok(())
    }

    async fn load_all_transactions(&self) -> Result<Vec<RawTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT date, kind, category, subcategory, description, amount
            FROM transactions
            ORDER BY sequence
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;

        Ok(rows.iter().map(Self::row_to_raw_transaction).collect())
    }

    async fn load_all_taxonomy(&self) -> Result<Vec<TaxonomyEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT category, subcategory, kind
            FROM taxonomy
            ORDER BY sequence
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list taxonomy")?;

        rows.iter().map(Self::row_to_taxonomy_entry).collect()
    }
}
