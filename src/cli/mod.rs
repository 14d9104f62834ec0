use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};

use crate::application::{
    AppError, CategoryShare, Dashboard, LedgerService, NewTransaction, TransactionFilter,
};
use crate::domain::{AmountPolicy, Kind, PeriodFilter, format_grouped, parse_amount, parse_date};
use crate::io::{Exporter, ImportOptions, Importer};
use crate::storage::{CachedStore, LedgerStore, SheetStore, SqliteStore};

const CURRENCY: &str = "R$";
const MONTH_NAMES: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Household ledger - income/expense tracking with category and monthly summaries
#[derive(Parser)]
#[command(name = "household")]
#[command(about = "Record household income and expenses and summarize them")]
#[command(version)]
pub struct Cli {
    /// SQLite database file path
    #[arg(long, env = "HOUSEHOLD_DB", default_value = "household.db", global = true)]
    pub database: String,

    /// Use a directory of CSV sheets instead of SQLite (takes precedence over --database)
    #[arg(long, env = "HOUSEHOLD_SHEET", global = true)]
    pub sheet: Option<PathBuf>,

    /// What to do with stored amounts that cannot be read: reject, coerce
    #[arg(long, env = "HOUSEHOLD_AMOUNT_POLICY", default_value = "reject", global = true)]
    pub amount_policy: String,

    /// Seconds the category list is cached between reads
    #[arg(long, env = "HOUSEHOLD_CACHE_TTL", default_value_t = 600, global = true)]
    pub cache_ttl: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the store and seed the default categories
    Init,

    /// Record a transaction
    Add {
        /// Amount (e.g., "50.00", "50,00" or "50")
        amount: String,

        /// Kind: income/receita or expense/despesa
        #[arg(short, long)]
        kind: String,

        /// Category
        #[arg(short, long)]
        category: String,

        /// Subcategory
        #[arg(short, long)]
        subcategory: String,

        /// Description
        #[arg(short, long)]
        description: String,

        /// Date (YYYY-MM-DD or DD/MM/YYYY, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Show totals, category breakdowns and the monthly series
    Dashboard {
        #[command(flatten)]
        period: PeriodArgs,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// List transactions
    List {
        #[command(flatten)]
        period: PeriodArgs,

        /// Filter by kind
        #[arg(short, long)]
        kind: Option<String>,

        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Show only the most recent N transactions
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Import transactions from a CSV file in the sheet layout
    Import {
        /// Input file (stdin if omitted)
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,

        /// Skip rows identical to stored transactions
        #[arg(long)]
        skip_duplicates: bool,

        /// Create categories and subcategories that don't exist
        #[arg(long)]
        create_categories: bool,
    },

    /// Export data: transactions (CSV) or dashboard (JSON)
    Export {
        /// What to export: transactions, dashboard
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        period: PeriodArgs,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a category
    Add {
        /// Category name
        name: String,

        /// Kind: income or expense
        #[arg(short, long)]
        kind: String,
    },

    /// Add a subcategory to an existing category
    AddSub {
        /// Category name
        category: String,

        /// Subcategory name
        name: String,

        /// Kind: income or expense
        #[arg(short, long)]
        kind: String,
    },

    /// List categories and their subcategories
    List {
        /// Only one kind (both if omitted)
        #[arg(short, long)]
        kind: Option<String>,
    },
}

/// Year/month selection shared by the reporting commands.
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct PeriodArgs {
    /// Only this year
    #[arg(long)]
    pub year: Option<i32>,

    /// Only this month (1-12)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

impl From<PeriodArgs> for PeriodFilter {
    fn from(args: PeriodArgs) -> Self {
        PeriodFilter::new(args.year, args.month)
    }
}

impl Cli {
    fn amount_policy(&self) -> Result<AmountPolicy> {
        AmountPolicy::from_str(&self.amount_policy).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid amount policy '{}'. Valid: reject, coerce",
                self.amount_policy
            )
        })
    }

    async fn open_service(&self, create: bool) -> Result<LedgerService> {
        let store: Box<dyn LedgerStore> = match &self.sheet {
            Some(dir) => Box::new(SheetStore::open(dir)?),
            None => Box::new(SqliteStore::open(&self.database, create).await?),
        };
        let cached = CachedStore::new(store, Duration::from_secs(self.cache_ttl));
        Ok(LedgerService::new(cached, self.amount_policy()?))
    }

    fn location(&self) -> String {
        match &self.sheet {
            Some(dir) => format!("sheet {}", dir.display()),
            None => format!("database {}", self.database),
        }
    }

    pub async fn run(self) -> Result<()> {
        let create = matches!(self.command, Commands::Init);
        let service = self.open_service(create).await?;
        let location = self.location();

        match self.command {
            Commands::Init => {
                let seeded = service.seed_default_taxonomy().await?;
                println!("Initialized {}", location);
                if seeded > 0 {
                    println!("Seeded {} default category entries", seeded);
                }
            }

            Commands::Add {
                amount,
                kind,
                category,
                subcategory,
                description,
                date,
            } => {
                let amount_cents =
                    parse_amount(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let date = match date {
                    Some(date_str) => parse_date(&date_str)
                        .ok_or_else(|| AppError::InvalidDate(date_str.clone()))?,
                    None => Local::now().date_naive(),
                };

                let transaction = service
                    .record_transaction(NewTransaction {
                        date,
                        kind: parse_kind(&kind)?,
                        category,
                        subcategory,
                        description,
                        amount_cents,
                    })
                    .await?;

                println!(
                    "Recorded {}: {} {} ({} / {}) on {}",
                    transaction.kind,
                    CURRENCY,
                    format_grouped(transaction.amount_cents),
                    transaction.category,
                    transaction.subcategory,
                    transaction.date
                );
            }

            Commands::Category(cmd) => run_category_command(&service, cmd).await?,

            Commands::Dashboard { period, format } => {
                let dashboard = service.dashboard(period.into()).await?;
                match format.as_str() {
                    "table" => print_dashboard(&dashboard),
                    "json" => println!("{}", serde_json::to_string_pretty(&dashboard)?),
                    other => anyhow::bail!("Unknown format '{}'. Valid: table, json", other),
                }
            }

            Commands::List {
                period,
                kind,
                category,
                limit,
            } => {
                let filter = TransactionFilter {
                    period: period.into(),
                    kind: kind.as_deref().map(parse_kind).transpose()?,
                    category,
                };
                run_list_command(&service, &filter, limit).await?;
            }

            Commands::Import {
                input,
                dry_run,
                skip_duplicates,
                create_categories,
            } => {
                let options = ImportOptions {
                    dry_run,
                    skip_duplicates,
                    create_categories,
                };
                run_import_command(&service, input, options).await?;
            }

            Commands::Export {
                export_type,
                output,
                period,
            } => {
                run_export_command(&service, &export_type, output, period.into()).await?;
            }
        }

        Ok(())
    }
}

fn parse_kind(s: &str) -> Result<Kind, AppError> {
    Kind::from_str(s).ok_or_else(|| AppError::InvalidKind(s.to_string()))
}

async fn run_category_command(service: &LedgerService, cmd: CategoryCommands) -> Result<()> {
    match cmd {
        CategoryCommands::Add { name, kind } => {
            let entry = service.add_category(parse_kind(&kind)?, &name).await?;
            println!("Added {} category: {}", entry.kind, entry.category);
        }

        CategoryCommands::AddSub {
            category,
            name,
            kind,
        } => {
            let entry = service
                .add_subcategory(parse_kind(&kind)?, &category, &name)
                .await?;
            println!(
                "Added subcategory {} to {}",
                entry.subcategory.unwrap_or_default(),
                entry.category
            );
        }

        CategoryCommands::List { kind } => {
            let kinds = match kind {
                Some(k) => vec![parse_kind(&k)?],
                None => vec![Kind::Income, Kind::Expense],
            };
            for kind in kinds {
                let taxonomy = service.categories(kind).await?;
                println!("{} categories:", kind.sheet_label());
                if taxonomy.is_empty() {
                    println!("  (none)");
                }
                for (category, subs) in taxonomy.iter() {
                    if subs.is_empty() {
                        println!("  {}", category);
                    } else {
                        println!("  {}: {}", category, subs.join(", "));
                    }
                }
            }
        }
    }
    Ok(())
}

async fn run_list_command(
    service: &LedgerService,
    filter: &TransactionFilter,
    limit: Option<usize>,
) -> Result<()> {
    let transactions = service.list_transactions(filter).await?;
    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let skip = limit.map_or(0, |n| transactions.len().saturating_sub(n));

    println!(
        "{:<10}  {:<8}  {:<16} {:<16} {:<24} {:>14}",
        "DATE", "KIND", "CATEGORY", "SUBCATEGORY", "DESCRIPTION", "AMOUNT"
    );
    println!("{}", "-".repeat(95));
    for t in transactions.iter().skip(skip) {
        let signed = match t.kind {
            Kind::Income => format_grouped(t.amount_cents),
            Kind::Expense => format_grouped(-t.amount_cents),
        };
        println!(
            "{:<10}  {:<8}  {:<16} {:<16} {:<24} {:>14}",
            t.date.format("%Y-%m-%d"),
            t.kind.sheet_label(),
            truncate(&t.category, 16),
            truncate(&t.subcategory, 16),
            truncate(&t.description, 24),
            signed
        );
    }
    Ok(())
}

async fn run_import_command(
    service: &LedgerService,
    input: Option<String>,
    options: ImportOptions,
) -> Result<()> {
    let importer = Importer::new(service);
    let dry_run = options.dry_run;

    let result = match input {
        Some(path) => {
            let file = std::fs::File::open(&path)
                .with_context(|| format!("Failed to open input file: {}", path))?;
            importer.import_transactions_csv(file, options).await?
        }
        None => {
            importer
                .import_transactions_csv(std::io::stdin(), options)
                .await?
        }
    };

    let verb = if dry_run { "Would import" } else { "Imported" };
    println!("{} {} transaction(s)", verb, result.imported);
    if result.skipped > 0 {
        println!("Skipped {} duplicate(s)", result.skipped);
    }
    if !result.errors.is_empty() {
        eprintln!("{} error(s):", result.errors.len());
        for error in &result.errors {
            match &error.field {
                Some(field) => eprintln!("  line {} ({}): {}", error.line, field, error.error),
                None => eprintln!("  line {}: {}", error.line, error.error),
            }
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    export_type: &str,
    output: Option<String>,
    period: PeriodFilter,
) -> Result<()> {
    let exporter = Exporter::new(service);
    let writer: Box<dyn std::io::Write> = match &output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    match export_type {
        "transactions" => {
            let count = exporter.export_transactions_csv(writer, period).await?;
            if output.is_some() {
                eprintln!("Exported {} transaction(s)", count);
            }
        }
        "dashboard" => {
            exporter.export_dashboard_json(writer, period).await?;
        }
        other => anyhow::bail!(
            "Unknown export type '{}'. Valid: transactions, dashboard",
            other
        ),
    }
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    println!("Household Dashboard ({})", dashboard.filter);
    if !dashboard.available_years.is_empty() {
        let years: Vec<String> = dashboard
            .available_years
            .iter()
            .map(|y| y.to_string())
            .collect();
        println!("Years with data: {}", years.join(", "));
    }
    println!();

    if dashboard.is_empty() {
        println!("No transactions recorded for this period.");
    } else {
        let money = |cents| format!("{} {}", CURRENCY, format_grouped(cents));
        println!("Total income:   {:>18}", money(dashboard.totals.income));
        println!("Total expense:  {:>18}", money(dashboard.totals.expense));
        println!("{}", "-".repeat(34));
        println!("Balance:        {:>18}", money(dashboard.totals.balance));

        print_shares("Expenses by category", &dashboard.expense_by_category);
        print_shares("Expenses by subcategory", &dashboard.expense_by_subcategory);
        print_shares("Income by category", &dashboard.income_by_category);

        println!();
        println!("Monthly:");
        println!(
            "  {:<12} {:>14} {:>14} {:>14}",
            "MONTH", "INCOME", "EXPENSE", "BALANCE"
        );
        for m in &dashboard.monthly {
            let month = MONTH_NAMES[(m.month as usize).saturating_sub(1) % 12];
            let label = format!("{} {}", month, m.year);
            println!(
                "  {:<12} {:>14} {:>14} {:>14}",
                label,
                format_grouped(m.income),
                format_grouped(m.expense),
                format_grouped(m.balance)
            );
        }
    }

    let quality = &dashboard.quality;
    if quality.excluded() > 0 || quality.coerced_amounts > 0 {
        println!();
        println!(
            "Note: {} stored row(s) excluded, {} amount(s) counted as zero (run with -v for details)",
            quality.excluded(),
            quality.coerced_amounts
        );
    }
}

fn print_shares(title: &str, shares: &[CategoryShare]) {
    if shares.is_empty() {
        return;
    }
    println!();
    println!("{}:", title);
    for (i, share) in shares.iter().enumerate() {
        let bar_len = (share.percentage / 5.0).round() as usize;
        println!(
            "  {:>2}. {:<20} {:>14} {:>6.1}%  {}",
            i + 1,
            truncate(&share.name, 20),
            format_grouped(share.total),
            share.percentage,
            "#".repeat(bar_len.min(20))
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
