use std::io::Write;

use anyhow::Result;

use crate::application::{Dashboard, LedgerService, TransactionFilter};
use crate::domain::{PeriodFilter, format_cents};
use crate::storage::TRANSACTION_HEADER;

/// Exporter for converting ledger data to CSV or JSON.
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export transactions in the sheet's column layout, oldest first.
    /// The output can be fed back through the importer.
    pub async fn export_transactions_csv<W: Write>(
        &self,
        writer: W,
        period: PeriodFilter,
    ) -> Result<usize> {
        let filter = TransactionFilter {
            period,
            ..Default::default()
        };
        let transactions = self.service.list_transactions(&filter).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(TRANSACTION_HEADER)?;
        for transaction in &transactions {
            csv_writer.write_record([
                transaction.date.format("%Y-%m-%d").to_string(),
                transaction.kind.sheet_label().to_string(),
                transaction.category.clone(),
                transaction.subcategory.clone(),
                transaction.description.clone(),
                format_cents(transaction.amount_cents),
            ])?;
        }

        csv_writer.flush()?;
        Ok(transactions.len())
    }

    /// Export the dashboard for `period` as pretty-printed JSON.
    pub async fn export_dashboard_json<W: Write>(
        &self,
        mut writer: W,
        period: PeriodFilter,
    ) -> Result<Dashboard> {
        let dashboard = self.service.dashboard(period).await?;
        serde_json::to_writer_pretty(&mut writer, &dashboard)?;
        writeln!(writer)?;
        Ok(dashboard)
    }
}
