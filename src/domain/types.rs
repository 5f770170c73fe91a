//! Shared domain types.
//!
//! Calendar dates are plain `chrono::NaiveDate` values: they carry no time of day
//! and no offset, so stepping a date back one day can never be shifted by a
//! timezone or daylight-saving conversion.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use clap::ValueEnum;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Statutory IVA (VAT) rate applied to the base amount.
pub const VAT_RATE: Decimal = dec!(0.16);

/// Dates treated as bank holidays, in addition to weekends.
///
/// Loaded once from configuration and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidaySet {
    dates: HashSet<NaiveDate>,
}

impl HolidaySet {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Parse a comma-separated list of ISO dates (`2025-01-01,2025-12-25`).
    ///
    /// Blank entries are ignored so trailing commas are harmless.
    pub fn parse_list(raw: &str) -> Result<Self, AppError> {
        let mut dates = HashSet::new();
        for part in raw.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map_err(|e| AppError::new(2, format!("Invalid holiday date '{trimmed}': {e}")))?;
            dates.insert(date);
        }
        Ok(Self { dates })
    }

    /// Read a JSON file containing an array of ISO dates.
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let file = std::fs::File::open(path).map_err(|e| {
            AppError::new(2, format!("Failed to open holidays file '{}': {e}", path.display()))
        })?;
        let dates: Vec<NaiveDate> = serde_json::from_reader(file).map_err(|e| {
            AppError::new(2, format!("Invalid holidays file '{}': {e}", path.display()))
        })?;
        Ok(Self::new(dates))
    }

    /// Union of two sets.
    pub fn merged(mut self, other: HolidaySet) -> Self {
        self.dates.extend(other.dates);
        self
    }
}

/// A published BCV rate (Bs. per USD) and the date it was published for.
///
/// Only the rate lookup produces these; the fields are private so callers
/// cannot fabricate one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateQuote {
    rate: Decimal,
    publication_date: NaiveDate,
}

impl RateQuote {
    pub(crate) fn new(rate: Decimal, publication_date: NaiveDate) -> Self {
        Self {
            rate,
            publication_date,
        }
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn publication_date(&self) -> NaiveDate {
        self.publication_date
    }
}

/// Share of the IVA amount the withholding agent retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum IvaRetention {
    #[serde(rename = "0")]
    #[value(name = "0")]
    None,
    /// Ordinary special taxpayers.
    #[serde(rename = "75")]
    #[value(name = "75")]
    SeventyFive,
    /// Invoices with irregularities, or suppliers without a valid RIF.
    #[serde(rename = "100")]
    #[value(name = "100")]
    Full,
}

impl IvaRetention {
    /// Retention as a percentage (0, 75 or 100).
    pub fn percent(self) -> Decimal {
        match self {
            IvaRetention::None => Decimal::ZERO,
            IvaRetention::SeventyFive => dec!(75),
            IvaRetention::Full => dec!(100),
        }
    }
}

/// ISLR withholding rate applied to the taxable base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum IslrRate {
    #[serde(rename = "0")]
    #[value(name = "0")]
    None,
    #[serde(rename = "1")]
    #[value(name = "1")]
    OnePercent,
    #[serde(rename = "2")]
    #[value(name = "2")]
    TwoPercent,
    #[serde(rename = "3")]
    #[value(name = "3")]
    ThreePercent,
    #[serde(rename = "5")]
    #[value(name = "5")]
    FivePercent,
}

impl IslrRate {
    /// Rate as a fraction (`0.02` for 2%).
    pub fn fraction(self) -> Decimal {
        match self {
            IslrRate::None => Decimal::ZERO,
            IslrRate::OnePercent => dec!(0.01),
            IslrRate::TwoPercent => dec!(0.02),
            IslrRate::ThreePercent => dec!(0.03),
            IslrRate::FivePercent => dec!(0.05),
        }
    }
}

/// Withholding choices for one calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithholdingConfig {
    pub iva_retention: IvaRetention,
    pub islr_rate: IslrRate,
}

impl Default for WithholdingConfig {
    fn default() -> Self {
        Self {
            iva_retention: IvaRetention::SeventyFive,
            islr_rate: IslrRate::None,
        }
    }
}

/// Raw calculator input, validated by the calculator before any network call.
#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    /// Base imponible in Bs.
    pub base_amount: Decimal,
    pub invoice_date: Option<NaiveDate>,
    /// Separate base for ISLR withholding; ignored unless positive.
    pub taxable_base: Option<Decimal>,
    pub withholding: WithholdingConfig,
}

/// Every figure the calculator displays. Amounts are unrounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceResult {
    pub vat_amount: Decimal,
    pub gross_total: Decimal,
    pub usd_equivalent: Decimal,
    pub vat_withheld: Decimal,
    pub islr_withheld: Decimal,
    pub total_withheld: Decimal,
    pub net_at_invoice_rate: Decimal,
    pub net_at_current_rate: Decimal,
    /// Rate used to convert the invoice, with its publication date.
    pub invoice_rate: RateQuote,
    /// Rate in force now, used to re-price the net amount.
    pub current_rate: RateQuote,
}
