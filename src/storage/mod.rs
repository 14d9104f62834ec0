//! Storage backends for transactions and the category taxonomy.
//!
//! Every backend is an append-only record store with full-scan reads; the
//! aggregation layer never sees which one is in use.

mod cache;
mod repository;
mod sheet;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{RawTransaction, TaxonomyEntry, Transaction};

pub use cache::CachedStore;
pub use repository::SqliteStore;
pub use sheet::{CATEGORY_HEADER, SheetStore, TRANSACTION_HEADER};

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Durable append-only store for transactions and taxonomy entries.
///
/// Loads return untyped rows: validation happens when a snapshot is built,
/// so a store never refuses to hand back what it holds.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append one transaction.
    async fn append_transaction(&self, transaction: &Transaction) -> Result<()>;

    /// Append one taxonomy entry.
    async fn append_taxonomy_entry(&self, entry: &TaxonomyEntry) -> Result<()>;

    /// Every stored transaction row, in insertion order.
    async fn load_all_transactions(&self) -> Result<Vec<RawTransaction>>;

    /// Every taxonomy entry, in insertion order.
    async fn load_all_taxonomy(&self) -> Result<Vec<TaxonomyEntry>>;
}

#[async_trait]
impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    async fn append_transaction(&self, transaction: &Transaction) -> Result<()> {
        (**self).append_transaction(transaction).await
    }

    async fn append_taxonomy_entry(&self, entry: &TaxonomyEntry) -> Result<()> {
        (**self).append_taxonomy_entry(entry).await
    }

    async fn load_all_transactions(&self) -> Result<Vec<RawTransaction>> {
        (**self).load_all_transactions().await
    }

    async fn load_all_taxonomy(&self) -> Result<Vec<TaxonomyEntry>> {
        (**self).load_all_taxonomy().await
    }
}
