mod common;

use std::fs::OpenOptions;
use std::io::Write;

use anyhow::Result;
use common::{StandardTaxonomy, new_tx, sheet_service, test_service};
use household_ledger::application::AppError;
use household_ledger::domain::{AmountPolicy, Kind, MAX_AMOUNT_CENTS, PeriodFilter, parse_amount};
use household_ledger::io::{Exporter, ImportOptions, Importer};
use tempfile::TempDir;

const HEADER: &str = "Data,Tipo,Categoria,Subcategoria,Descrição,Valor\n";

fn append_sheet_rows(dir: &TempDir, rows: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(dir.path().join("sheet").join("transactions.csv"))?;
    file.write_all(rows.as_bytes())?;
    Ok(())
}

#[tokio::test]
async fn test_sheet_store_records_and_reads_back() -> Result<()> {
    let temp = TempDir::new()?;
    let service = sheet_service(&temp, AmountPolicy::Reject)?;
    StandardTaxonomy::create(&service).await?;

    service
        .record_transaction(new_tx("2024-01-05", Kind::Expense, "Food", "Groceries", 1000))
        .await?;
    service
        .record_transaction(new_tx("2024-01-20", Kind::Income, "Salary", "Monthly", 100000))
        .await?;

    // A fresh service over the same directory sees the same data
    let reopened = sheet_service(&temp, AmountPolicy::Reject)?;
    let dashboard = reopened.dashboard(PeriodFilter::all()).await?;
    assert_eq!(dashboard.totals.balance, 99000);
    assert!(reopened.categories(Kind::Expense).await?.contains_category("Food"));

    let content = std::fs::read_to_string(temp.path().join("sheet").join("transactions.csv"))?;
    assert!(content.starts_with("Data,Tipo,Categoria"));
    assert!(content.contains("2024-01-05,Despesa,Food,Groceries"));
    Ok(())
}

#[tokio::test]
async fn test_hand_edited_rows_are_excluded_and_counted() -> Result<()> {
    let temp = TempDir::new()?;
    let service = sheet_service(&temp, AmountPolicy::Reject)?;
    append_sheet_rows(
        &temp,
        "2024-01-05,Despesa,Food,Groceries,milk,\"10,00\"\n\
         05/01/2024,Receita,Salary,Monthly,pay,1000\n\
         someday,Despesa,Food,Groceries,bread,5.00\n\
         2024-01-06,Transfer,Food,Groceries,move,5.00\n\
         2024-01-07,Despesa,Food,Groceries,eggs,abc\n\
         2024-01-08,Despesa,,Groceries,oops,5.00\n",
    )?;

    let dashboard = service.dashboard(PeriodFilter::all()).await?;

    assert_eq!(dashboard.transaction_count, 2);
    assert_eq!(dashboard.totals.income, 100000);
    assert_eq!(dashboard.totals.expense, 1000);
    assert_eq!(dashboard.quality.malformed_dates, 1);
    assert_eq!(dashboard.quality.unknown_kinds, 1);
    assert_eq!(dashboard.quality.invalid_amounts, 1);
    assert_eq!(dashboard.quality.missing_fields, 1);
    Ok(())
}

#[tokio::test]
async fn test_oversized_amounts_never_reach_the_totals() -> Result<()> {
    let temp = TempDir::new()?;
    let service = sheet_service(&temp, AmountPolicy::Reject)?;
    StandardTaxonomy::create(&service).await?;

    assert!(parse_amount("90000000000000000").is_err());
    let result = service
        .record_transaction(new_tx(
            "2024-01-20",
            Kind::Income,
            "Salary",
            "Monthly",
            MAX_AMOUNT_CENTS + 1,
        ))
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    service
        .record_transaction(new_tx("2024-01-20", Kind::Income, "Salary", "Monthly", MAX_AMOUNT_CENTS))
        .await?;
    service
        .record_transaction(new_tx("2024-01-21", Kind::Income, "Salary", "Monthly", MAX_AMOUNT_CENTS))
        .await?;
    append_sheet_rows(
        &temp,
        "2024-01-22,Receita,Salary,Monthly,typo,90000000000000000\n\
         2024-01-23,Receita,Salary,Monthly,typo,90000000000000000\n",
    )?;

    let dashboard = service.dashboard(PeriodFilter::all()).await?;
    assert_eq!(dashboard.transaction_count, 2);
    assert_eq!(dashboard.totals.income, 2 * MAX_AMOUNT_CENTS);
    assert_eq!(dashboard.quality.invalid_amounts, 2);
    Ok(())
}

#[tokio::test]
async fn test_bad_category_row_does_not_break_the_sheet() -> Result<()> {
    let temp = TempDir::new()?;
    let service = sheet_service(&temp, AmountPolicy::Reject)?;
    StandardTaxonomy::create(&service).await?;

    let mut file = OpenOptions::new()
        .append(true)
        .open(temp.path().join("sheet").join("categories.csv"))?;
    file.write_all(b"Pets,Vet,Transferencia\n")?;

    let reopened = sheet_service(&temp, AmountPolicy::Reject)?;
    reopened
        .record_transaction(new_tx("2024-01-05", Kind::Expense, "Food", "Groceries", 1000))
        .await?;
    assert!(!reopened.categories(Kind::Expense).await?.contains_category("Pets"));
    reopened.add_category(Kind::Expense, "Pets").await?;
    assert_eq!(reopened.snapshot().await?.transactions.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_coerce_policy_counts_unreadable_amounts_as_zero() -> Result<()> {
    let temp = TempDir::new()?;
    let service = sheet_service(&temp, AmountPolicy::Coerce)?;
    append_sheet_rows(
        &temp,
        "2024-01-05,Despesa,Food,Groceries,milk,10.00\n\
         2024-01-07,Despesa,Food,Groceries,eggs,\n",
    )?;

    let dashboard = service.dashboard(PeriodFilter::all()).await?;

    assert_eq!(dashboard.transaction_count, 2);
    assert_eq!(dashboard.totals.expense, 1000);
    assert_eq!(dashboard.quality.coerced_amounts, 1);
    assert_eq!(dashboard.quality.excluded(), 0);
    Ok(())
}

#[tokio::test]
async fn test_import_reports_line_errors() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardTaxonomy::create(&service).await?;

    let csv = format!(
        "{}2024-01-05,Despesa,Food,Groceries,milk,10.00\n\
         2024-01-06,Despesa,Food,Groceries,bread,-2\n\
         bad-date,Despesa,Food,Groceries,eggs,3.00\n\
         2024-01-07,Despesa,Pets,Vet,checkup,80.00\n\
         2024-01-20,income,Salary,Monthly,pay,\"1000,50\"\n",
        HEADER
    );

    let importer = Importer::new(&service);
    let result = importer
        .import_transactions_csv(csv.as_bytes(), ImportOptions::default())
        .await?;

    assert_eq!(result.imported, 2);
    assert_eq!(result.errors.len(), 3);
    let lines: Vec<usize> = result.errors.iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![3, 4, 5]);
    assert_eq!(result.errors[0].field.as_deref(), Some("amount"));
    assert_eq!(result.errors[1].field.as_deref(), Some("date"));

    let totals = service.dashboard(PeriodFilter::all()).await?.totals;
    assert_eq!(totals.expense, 1000);
    Ok(())
}

#[tokio::test]
async fn test_import_dry_run_writes_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardTaxonomy::create(&service).await?;

    let csv = format!("{}2024-01-05,Despesa,Food,Groceries,milk,10.00\n", HEADER);
    let result = Importer::new(&service)
        .import_transactions_csv(
            csv.as_bytes(),
            ImportOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .await?;

    assert_eq!(result.imported, 1);
    assert!(service.snapshot().await?.transactions.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_import_skip_duplicates_and_create_categories() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardTaxonomy::create(&service).await?;
    service
        .record_transaction(new_tx("2024-01-05", Kind::Expense, "Food", "Groceries", 1000))
        .await?;

    let csv = format!(
        "{}2024-01-05,Despesa,Food,Groceries,Groceries 2024-01-05,10.00\n\
         2024-02-01,Despesa,Pets,Vet,checkup,80.00\n\
         2024-02-01,Despesa,Pets,Vet,checkup,80.00\n",
        HEADER
    );
    let result = Importer::new(&service)
        .import_transactions_csv(
            csv.as_bytes(),
            ImportOptions {
                skip_duplicates: true,
                create_categories: true,
                ..Default::default()
            },
        )
        .await?;

    assert_eq!(result.imported, 1);
    assert_eq!(result.skipped, 2);
    assert!(result.errors.is_empty());

    let expense = service.categories(Kind::Expense).await?;
    assert_eq!(expense.subcategories("Pets"), Some(&["Vet".to_string()][..]));
    assert_eq!(service.snapshot().await?.transactions.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_export_then_import_into_fresh_ledger() -> Result<()> {
    let (source, _source_temp) = test_service().await?;
    StandardTaxonomy::create(&source).await?;
    source
        .record_transaction(new_tx("2024-01-05", Kind::Expense, "Food", "Groceries", 1050))
        .await?;
    source
        .record_transaction(new_tx("2024-02-01", Kind::Income, "Salary", "Monthly", 250000))
        .await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&source)
        .export_transactions_csv(&mut buffer, PeriodFilter::all())
        .await?;
    assert_eq!(count, 2);

    let (target, _target_temp) = test_service().await?;
    StandardTaxonomy::create(&target).await?;
    let result = Importer::new(&target)
        .import_transactions_csv(buffer.as_slice(), ImportOptions::default())
        .await?;
    assert_eq!(result.imported, 2);

    assert_eq!(
        source.snapshot().await?.transactions,
        target.snapshot().await?.transactions
    );
    Ok(())
}

#[tokio::test]
async fn test_export_dashboard_json() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardTaxonomy::create(&service).await?;
    service
        .record_transaction(new_tx("2024-01-05", Kind::Expense, "Food", "Groceries", 1000))
        .await?;

    let mut buffer = Vec::new();
    let dashboard = Exporter::new(&service)
        .export_dashboard_json(&mut buffer, PeriodFilter::new(Some(2024), Some(1)))
        .await?;

    let parsed: serde_json::Value = serde_json::from_slice(&buffer)?;
    assert_eq!(parsed["totals"]["expense"], 1000);
    assert_eq!(parsed["transaction_count"], dashboard.transaction_count);
    Ok(())
}
