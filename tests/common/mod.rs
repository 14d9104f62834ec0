// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use household_ledger::application::{LedgerService, NewTransaction};
use household_ledger::domain::{AmountPolicy, Cents, Kind};
use household_ledger::storage::{CachedStore, SheetStore, SqliteStore};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteStore::open(db_path.to_str().unwrap(), true).await?;
    let service = LedgerService::new(store, AmountPolicy::Reject);
    Ok((service, temp_dir))
}

/// Helper to create a test service over a CSV sheet directory
pub fn sheet_service(dir: &TempDir, policy: AmountPolicy) -> Result<LedgerService> {
    let store = SheetStore::open(dir.path().join("sheet"))?;
    let cached = CachedStore::new(store, Duration::from_secs(600));
    Ok(LedgerService::new(cached, policy))
}

/// Helper to parse a date string into NaiveDate
pub fn date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

pub fn new_tx(
    date_str: &str,
    kind: Kind,
    category: &str,
    subcategory: &str,
    amount_cents: Cents,
) -> NewTransaction {
    NewTransaction {
        date: date(date_str),
        kind,
        category: category.to_string(),
        subcategory: subcategory.to_string(),
        description: format!("{} {}", subcategory, date_str),
        amount_cents,
    }
}

/// Test fixture: a small household taxonomy
pub struct StandardTaxonomy;

impl StandardTaxonomy {
    /// Food (Groceries, Restaurant), Transport (Fuel) and Salary (Monthly)
    pub async fn create(service: &LedgerService) -> Result<()> {
        service.add_category(Kind::Expense, "Food").await?;
        service
            .add_subcategory(Kind::Expense, "Food", "Groceries")
            .await?;
        service
            .add_subcategory(Kind::Expense, "Food", "Restaurant")
            .await?;
        service.add_category(Kind::Expense, "Transport").await?;
        service
            .add_subcategory(Kind::Expense, "Transport", "Fuel")
            .await?;
        service.add_category(Kind::Income, "Salary").await?;
        service
            .add_subcategory(Kind::Income, "Salary", "Monthly")
            .await?;
        Ok(())
    }
}
