//! Command-line parsing for the BCV invoice calculator.
//!
//! Argument parsing and command dispatch stay here; the calculator and the
//! rate resolvers know nothing about flags.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::domain::{IslrRate, IvaRetention};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bcv", version, about = "IVA/ISLR invoice calculator priced at the official BCV rate")]
pub struct Cli {
    /// JSON file with an array of ISO holiday dates (overrides BCV_HOLIDAYS*).
    #[arg(long, global = true, value_name = "JSON")]
    pub holidays_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute IVA, withholdings and the net amount for an invoice.
    Calc(CalcArgs),
    /// Show the current BCV rate and the rate legally in force now.
    Rate(RateArgs),
    /// Print the date whose published rate applies (now, at an instant, or for an invoice).
    EffectiveDate(EffectiveDateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct CalcArgs {
    /// Base imponible (Bs.).
    #[arg(short = 'a', long)]
    pub amount: Decimal,

    /// Invoice date (YYYY-MM-DD). Defaults to today in Caracas.
    #[arg(short = 'd', long)]
    pub date: Option<NaiveDate>,

    /// Separate taxable base for ISLR withholding (Bs.).
    #[arg(long)]
    pub taxable_base: Option<Decimal>,

    /// IVA retention percentage.
    #[arg(long, value_enum, default_value_t = IvaRetention::SeventyFive)]
    pub iva: IvaRetention,

    /// ISLR withholding rate (percent).
    #[arg(long, value_enum, default_value_t = IslrRate::None)]
    pub islr: IslrRate,

    /// Print the full-precision result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RateArgs {
    /// Print as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct EffectiveDateArgs {
    /// Instant to resolve (RFC 3339). Defaults to now.
    #[arg(long, conflicts_with = "invoice_date")]
    pub at: Option<DateTime<Utc>>,

    /// Resolve for an invoice date instead of an instant.
    #[arg(long)]
    pub invoice_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_calc_flags() {
        let cli = Cli::parse_from([
            "bcv", "calc", "--amount", "1000", "--date", "2025-01-13", "--taxable-base", "500",
            "--iva", "100", "--islr", "2",
        ]);
        let Command::Calc(args) = cli.command else {
            panic!("expected calc");
        };
        assert_eq!(args.amount, dec!(1000));
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2025, 1, 13));
        assert_eq!(args.taxable_base, Some(dec!(500)));
        assert_eq!(args.iva, IvaRetention::Full);
        assert_eq!(args.islr, IslrRate::TwoPercent);
        assert!(!args.json);
    }

    #[test]
    fn rejects_unlisted_withholding() {
        let res = Cli::try_parse_from(["bcv", "calc", "--amount", "10", "--iva", "50"]);
        assert!(res.is_err());
    }

    #[test]
    fn effective_date_modes_conflict() {
        let res = Cli::try_parse_from([
            "bcv",
            "effective-date",
            "--at",
            "2025-01-09T20:00:00Z",
            "--invoice-date",
            "2025-01-09",
        ]);
        assert!(res.is_err());
    }
}
