//! Formatted terminal output.
//!
//! Amounts are computed at full precision and only rounded here, to two
//! decimals, half away from zero.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::{InvoiceRequest, InvoiceResult, RateQuote};
use crate::error::AppError;

/// Round for display (2 dp).
pub fn money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

fn rate(quote: &RateQuote) -> String {
    format!("{} Bs./USD", money(quote.rate()))
}

/// The result table shown after `bcv calc`.
pub fn format_invoice_result(request: &InvoiceRequest, result: &InvoiceResult) -> String {
    let mut out = String::new();

    out.push_str("=== bcv - Invoice breakdown ===\n");
    if let Some(date) = request.invoice_date {
        out.push_str(&format!("Invoice date: {date}\n"));
    }
    out.push_str(&format!("Base amount:  {} Bs.\n", money(request.base_amount)));
    out.push('\n');

    let rows: [(&str, String); 11] = [
        ("Invoice total (Bs.)", money(result.gross_total)),
        ("Invoice rate", rate(&result.invoice_rate)),
        ("Rate published", result.invoice_rate.publication_date().to_string()),
        ("Amount in USD", money(result.usd_equivalent)),
        ("IVA amount (Bs.)", money(result.vat_amount)),
        ("IVA withheld (Bs.)", money(result.vat_withheld)),
        ("ISLR withheld (Bs.)", money(result.islr_withheld)),
        ("Total withheld (Bs.)", money(result.total_withheld)),
        ("Net payable (Bs.)", money(result.net_at_invoice_rate)),
        ("Current rate", rate(&result.current_rate)),
        ("Net at current rate (Bs.)", money(result.net_at_current_rate)),
    ];
    for (label, value) in rows {
        out.push_str(&format!("{label:<27} {value:>18}\n"));
    }

    out
}

/// Output of `bcv rate`.
pub fn format_rate_summary(snapshot: Option<&RateQuote>, in_force: &RateQuote, effective_date: NaiveDate) -> String {
    let mut out = String::new();
    match snapshot {
        Some(quote) => out.push_str(&format!(
            "BCV rate (today): {} (published {})\n",
            rate(quote),
            quote.publication_date()
        )),
        None => out.push_str("BCV rate (today): unavailable\n"),
    }
    out.push_str(&format!(
        "Rate in force:    {} (effective date {effective_date}, published {})\n",
        rate(in_force),
        in_force.publication_date()
    ));
    out
}

#[derive(Debug, Serialize)]
pub struct RateSummary {
    pub snapshot: Option<RateQuote>,
    pub effective_date: NaiveDate,
    pub in_force: RateQuote,
}

/// Pretty JSON for `--json` outputs.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::new(4, format!("Failed to serialize output: {e}")))
}
