//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads settings and initializes logging
//! - parses CLI arguments
//! - resolves rates and runs the calculator
//! - prints text or JSON reports

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::calendar::{effective_date_for_invoice, effective_date_for_now, local_today};
use crate::cli::{CalcArgs, Command, EffectiveDateArgs, RateArgs};
use crate::config::Settings;
use crate::domain::{HolidaySet, InvoiceRequest, WithholdingConfig};
use crate::error::AppError;
use crate::report::RateSummary;

pub mod pipeline;

/// Entry point for the `bcv` binary.
pub async fn run() -> Result<(), AppError> {
    // `bcv` alone shows the rate; `bcv --amount 1000 ...` means `bcv calc ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let mut settings = Settings::from_env()?;
    init_tracing();

    if let Some(path) = &cli.holidays_file {
        settings.holidays = HolidaySet::from_json_file(path)?;
    }

    match cli.command {
        Command::Calc(args) => handle_calc(&settings, args).await,
        Command::Rate(args) => handle_rate(&settings, args).await,
        Command::EffectiveDate(args) => handle_effective_date(&settings, args),
    }
}

/// Logs go to stderr so report output on stdout stays machine-readable.
fn init_tracing() {
    let filter = std::env::var("BCV_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    // A second init (tests, embedding) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn handle_calc(settings: &Settings, args: CalcArgs) -> Result<(), AppError> {
    let calculator = pipeline::build_calculator(settings)?;

    let request = InvoiceRequest {
        base_amount: args.amount,
        invoice_date: Some(args.date.unwrap_or_else(|| local_today(Utc::now()))),
        taxable_base: args.taxable_base,
        withholding: WithholdingConfig {
            iva_retention: args.iva,
            islr_rate: args.islr,
        },
    };

    let result = calculator.calculate(&request).await?;

    if args.json {
        println!("{}", crate::report::to_json(&result)?);
    } else {
        println!("{}", crate::report::format_invoice_result(&request, &result));
    }
    Ok(())
}

async fn handle_rate(settings: &Settings, args: RateArgs) -> Result<(), AppError> {
    let calculator = pipeline::build_calculator(settings)?;
    let now = Utc::now();
    let effective_date = effective_date_for_now(now, &settings.holidays)?;

    let (snapshot, in_force) = tokio::join!(
        calculator.lookup().current_snapshot(local_today(now)),
        calculator.current_rate_at(now)
    );
    // The snapshot is informational; only the rate in force is required.
    let snapshot = snapshot.ok();
    let in_force = in_force?;

    if args.json {
        let summary = RateSummary {
            snapshot,
            effective_date,
            in_force,
        };
        println!("{}", crate::report::to_json(&summary)?);
    } else {
        print!(
            "{}",
            crate::report::format_rate_summary(snapshot.as_ref(), &in_force, effective_date)
        );
    }
    Ok(())
}

fn handle_effective_date(settings: &Settings, args: EffectiveDateArgs) -> Result<(), AppError> {
    let date = match args.invoice_date {
        Some(invoice_date) => effective_date_for_invoice(invoice_date, &settings.holidays)?,
        None => effective_date_for_now(args.at.unwrap_or_else(Utc::now), &settings.holidays)?,
    };
    println!("{date}");
    Ok(())
}

/// Rewrite argv so bare invocations pick a sensible subcommand.
///
/// Rules:
/// - `bcv`                      -> `bcv rate`
/// - `bcv --amount 1000 ...`    -> `bcv calc --amount 1000 ...`
/// - `bcv --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("rate".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "calc" | "rate" | "effective-date");
    if is_subcommand {
        return argv;
    }

    // Any flag that only `calc` understands.
    let is_calc_flag = matches!(arg1.as_str(), "-a" | "--amount" | "-d" | "--date")
        || arg1.starts_with("--amount=")
        || arg1.starts_with("--date=");
    if is_calc_flag {
        argv.insert(1, "calc".to_string());
        return argv;
    }

    argv
}
