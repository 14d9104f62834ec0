use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::domain::{RawTransaction, TaxonomyEntry, Transaction};

use super::LedgerStore;

/// Read-through cache for the taxonomy in front of any store.
///
/// The taxonomy changes rarely and is read on every form submission, so the
/// last successful load is kept for `ttl`. Appending an entry through the
/// cache drops the cached copy. Transactions always go to the inner store.
pub struct CachedStore<S> {
    inner: S,
    ttl: Duration,
    taxonomy: Mutex<Option<(Instant, Vec<TaxonomyEntry>)>>,
}

impl<S: LedgerStore> CachedStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            taxonomy: Mutex::new(None),
        }
    }

    /// Drop the cached taxonomy so the next read hits the inner store.
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.taxonomy.lock() {
            *slot = None;
        }
    }

    fn cached(&self) -> Option<Vec<TaxonomyEntry>> {
        let slot = self.taxonomy.lock().ok()?;
        match slot.as_ref() {
            Some((loaded_at, entries)) if loaded_at.elapsed() < self.ttl => Some(entries.clone()),
            _ => None,
        }
    }

    fn store(&self, entries: &[TaxonomyEntry]) {
        if let Ok(mut slot) = self.taxonomy.lock() {
            *slot = Some((Instant::now(), entries.to_vec()));
        }
    }
}

#[async_trait]
impl<S: LedgerStore> LedgerStore for CachedStore<S> {
    async fn append_transaction(&self, transaction: &Transaction) -> Result<()> {
        self.inner.append_transaction(transaction).await
    }

    async fn append_taxonomy_entry(&self, entry: &TaxonomyEntry) -> Result<()> {
        let result = self.inner.append_taxonomy_entry(entry).await;
        self.invalidate();
        result
    }

    async fn load_all_transactions(&self) -> Result<Vec<RawTransaction>> {
        self.inner.load_all_transactions().await
    }

    async fn load_all_taxonomy(&self) -> Result<Vec<TaxonomyEntry>> {
        if let Some(entries) = self.cached() {
            debug!(entries = entries.len(), "taxonomy served from cache");
            return Ok(entries);
        }

        let entries = self.inner.load_all_taxonomy().await?;
        self.store(&entries);
        debug!(entries = entries.len(), "taxonomy loaded from store");
        Ok(entries)
    }
}
