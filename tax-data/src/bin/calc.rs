use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tax_core::{PersonalTaxInput, TaxResult};
use tax_data::{DatasetSource, DatasetStore, DirectorySource, EmbeddedSource, shared_store};
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Canadian personal income tax calculator.
///
/// Loads the dataset for a tax year, either bundled with the binary or from
/// a data directory, and validates it or runs a calculation against it.
#[derive(Debug, Parser)]
#[command(name = "tax-calc", version, about)]
struct Cli {
    /// Directory holding `<year>/{federal,provinces,payroll,dividends}.json`.
    /// The bundled datasets are used when omitted.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and validate the dataset for a year, then summarize it.
    Validate {
        /// Tax year to validate.
        #[arg(long, default_value_t = EmbeddedSource::LATEST_YEAR)]
        year: i32,
    },

    /// Compute tax for one person.
    Compute(ComputeArgs),
}

#[derive(Debug, Args)]
struct ComputeArgs {
    /// Tax year.
    #[arg(long, default_value_t = EmbeddedSource::LATEST_YEAR)]
    year: i32,

    /// Province or territory: code ("ON") or name ("Québec").
    #[arg(long)]
    province: String,

    #[arg(long, default_value_t = Decimal::ZERO)]
    employment_income: Decimal,

    #[arg(long, default_value_t = Decimal::ZERO)]
    self_employment_income: Decimal,

    #[arg(long, default_value_t = Decimal::ZERO)]
    other_income: Decimal,

    /// Cash amount of eligible dividends.
    #[arg(long, default_value_t = Decimal::ZERO)]
    eligible_dividends: Decimal,

    /// Cash amount of non-eligible dividends.
    #[arg(long, default_value_t = Decimal::ZERO)]
    non_eligible_dividends: Decimal,

    /// Full capital gain, before the inclusion rate.
    #[arg(long, default_value_t = Decimal::ZERO)]
    capital_gains: Decimal,

    #[arg(long, default_value_t = Decimal::ZERO)]
    rrsp_deduction: Decimal,

    #[arg(long, default_value_t = Decimal::ZERO)]
    fhsa_deduction: Decimal,

    #[arg(long, default_value_t = Decimal::ZERO)]
    estimated_deductions: Decimal,

    /// Income tax already withheld or paid.
    #[arg(long, default_value_t = Decimal::ZERO)]
    tax_paid: Decimal,

    /// Print the full result as JSON instead of a summary.
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl From<&ComputeArgs> for PersonalTaxInput {
    fn from(args: &ComputeArgs) -> Self {
        PersonalTaxInput {
            year: args.year,
            province: args.province.clone(),
            employment_income: args.employment_income,
            self_employment_income: args.self_employment_income,
            other_income: args.other_income,
            eligible_dividends: args.eligible_dividends,
            non_eligible_dividends: args.non_eligible_dividends,
            capital_gains: args.capital_gains,
            rrsp_deduction: args.rrsp_deduction,
            fhsa_deduction: args.fhsa_deduction,
            estimated_deductions: args.estimated_deductions,
            tax_paid: args.tax_paid,
        }
    }
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Honours `RUST_LOG`; otherwise only warnings reach stderr so the printed
/// result stays readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let source: Box<dyn DatasetSource> = match &cli.data_dir {
        Some(dir) => Box::new(DirectorySource::new(dir)),
        None => Box::new(EmbeddedSource),
    };
    debug!(source = %source.name(), "dataset source selected");

    let store = shared_store();

    match &cli.command {
        Command::Validate { year } => validate(store, source.as_ref(), *year).await,
        Command::Compute(args) => compute(store, source.as_ref(), args).await,
    }
}

async fn validate(
    store: &DatasetStore,
    source: &dyn DatasetSource,
    year: i32,
) -> Result<()> {
    let info = store
        .load(year, source)
        .await
        .with_context(|| format!("Failed to load the {year} dataset from {}", source.name()))?;

    let jurisdictions: Vec<String> = info.jurisdictions.iter().map(ToString::to_string).collect();
    println!("Dataset {} is valid ({}).", info.year, info.source);
    println!(
        "{} jurisdictions: {}",
        jurisdictions.len(),
        jurisdictions.join(", ")
    );

    Ok(())
}

async fn compute(
    store: &DatasetStore,
    source: &dyn DatasetSource,
    args: &ComputeArgs,
) -> Result<()> {
    store
        .load(args.year, source)
        .await
        .with_context(|| format!("Failed to load the {} dataset from {}", args.year, source.name()))?;

    let input = PersonalTaxInput::from(args);
    let result = store
        .calculate(&input, None)
        .with_context(|| format!("Failed to compute tax for {}", input.province))?;

    if args.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        println!("{json}");
    } else {
        print_summary(&input, &result);
    }

    Ok(())
}

fn print_summary(
    input: &PersonalTaxInput,
    result: &TaxResult,
) {
    let totals = &result.totals;
    let percent = |rate: Decimal| (rate * Decimal::ONE_HUNDRED).round_dp(2);

    println!(
        "{} {} ({:?} provincial rules)",
        input.year, result.breakdown.provincial.jurisdiction, result.breakdown.provincial.strategy
    );
    println!("  Total income        {:>14}", totals.total_income);
    println!("  Taxable income      {:>14}", totals.taxable_income);
    println!("  Federal tax         {:>14}", totals.federal_tax);
    println!("  Provincial tax      {:>14}", totals.provincial_tax);
    println!("  Income tax          {:>14}", totals.income_tax);
    println!("  CPP / CPP2 / EI     {:>14}", totals.payroll_levies);
    println!("  Total burden        {:>14}", totals.total_burden);
    println!("  After-tax income    {:>14}", totals.after_tax_income);
    println!("  Average rate        {:>13}%", percent(totals.average_rate));
    println!(
        "  Marginal rate       {:>13}%  ({:?})",
        percent(totals.marginal_rate),
        result.breakdown.marginal.combined_source
    );

    let label = if totals.refund_or_owing >= Decimal::ZERO {
        "Refund"
    } else {
        "Balance owing"
    };
    println!("  {label:<20}{:>14}", totals.refund_or_owing.abs());
}
