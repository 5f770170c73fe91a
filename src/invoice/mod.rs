//! Invoice calculator: IVA, ISLR withholding and bolívar/USD conversion.
//!
//! Two rates are needed per calculation:
//! - the historical rate that prices the invoice (business day before the invoice date)
//! - the rate in force now, used to re-price the net amount in today's bolívares
//!
//! Both are resolved concurrently; the arithmetic only runs once both arrived.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::calendar::{effective_date_for_invoice, effective_date_for_now};
use crate::data::{CurrentRateCache, RateLookup, RateSource};
use crate::domain::{HolidaySet, InvoiceRequest, InvoiceResult, RateQuote, VAT_RATE, WithholdingConfig};
use crate::error::CalcError;

pub struct InvoiceCalculator<S> {
    lookup: RateLookup<S>,
    holidays: HolidaySet,
    current: CurrentRateCache,
}

impl<S: RateSource> InvoiceCalculator<S> {
    pub fn new(lookup: RateLookup<S>, holidays: HolidaySet, current: CurrentRateCache) -> Self {
        Self {
            lookup,
            holidays,
            current,
        }
    }

    pub fn lookup(&self) -> &RateLookup<S> {
        &self.lookup
    }

    pub fn holidays(&self) -> &HolidaySet {
        &self.holidays
    }

    pub async fn calculate(&self, request: &InvoiceRequest) -> Result<InvoiceResult, CalcError> {
        self.calculate_at(request, Utc::now()).await
    }

    /// Same as `calculate`, with "now" supplied by the caller.
    pub async fn calculate_at(
        &self,
        request: &InvoiceRequest,
        now: DateTime<Utc>,
    ) -> Result<InvoiceResult, CalcError> {
        let (base_amount, invoice_date) = validate(request)?;

        let (invoice_rate, current_rate) =
            tokio::try_join!(self.invoice_rate(invoice_date), self.current_rate_at(now))?;

        compute_breakdown(
            base_amount,
            request.taxable_base,
            request.withholding,
            invoice_rate,
            current_rate,
        )
    }

    /// Rate that prices an invoice dated `invoice_date`.
    pub async fn invoice_rate(&self, invoice_date: NaiveDate) -> Result<RateQuote, CalcError> {
        let effective = effective_date_for_invoice(invoice_date, &self.holidays)?;
        debug!(%invoice_date, %effective, "invoice effective date");
        self.lookup.lookup(effective).await
    }

    /// Rate in force at `now`, served from the current-rate cache while fresh.
    pub async fn current_rate_at(&self, now: DateTime<Utc>) -> Result<RateQuote, CalcError> {
        let effective = effective_date_for_now(now, &self.holidays)?;
        if let Some(quote) = self.current.get(effective) {
            debug!(%effective, "current rate served from cache");
            return Ok(quote);
        }

        let quote = self.lookup.lookup(effective).await?;
        self.current.put(effective, quote);
        Ok(quote)
    }
}

fn validate(request: &InvoiceRequest) -> Result<(Decimal, NaiveDate), CalcError> {
    if request.base_amount <= Decimal::ZERO {
        return Err(CalcError::invalid_input("the base amount must be a positive number"));
    }
    let invoice_date = request
        .invoice_date
        .ok_or_else(|| CalcError::invalid_input("an invoice date is required"))?;
    Ok((request.base_amount, invoice_date))
}

/// Pure arithmetic once both rates are known. Nothing is rounded here.
///
/// Every step is checked; an amount large enough to overflow `Decimal` is
/// reported as invalid input.
pub fn compute_breakdown(
    base_amount: Decimal,
    taxable_base: Option<Decimal>,
    withholding: WithholdingConfig,
    invoice_rate: RateQuote,
    current_rate: RateQuote,
) -> Result<InvoiceResult, CalcError> {
    let too_large = || CalcError::invalid_input("amount too large");

    let vat_amount = base_amount.checked_mul(VAT_RATE).ok_or_else(too_large)?;
    let gross_total = base_amount.checked_add(vat_amount).ok_or_else(too_large)?;
    let usd_equivalent = gross_total
        .checked_div(invoice_rate.rate())
        .ok_or_else(too_large)?;

    let vat_withheld = vat_amount
        .checked_mul(withholding.iva_retention.percent() / dec!(100))
        .ok_or_else(too_large)?;

    let islr_fraction = withholding.islr_rate.fraction();
    let islr_withheld = match taxable_base {
        Some(base) if islr_fraction > Decimal::ZERO && base > Decimal::ZERO => {
            base.checked_mul(islr_fraction).ok_or_else(too_large)?
        }
        _ => Decimal::ZERO,
    };

    let total_withheld = vat_withheld.checked_add(islr_withheld).ok_or_else(too_large)?;
    let net_at_invoice_rate = gross_total.checked_sub(total_withheld).ok_or_else(too_large)?;
    let net_at_current_rate = usd_equivalent
        .checked_mul(current_rate.rate())
        .and_then(|repriced| repriced.checked_sub(total_withheld))
        .ok_or_else(too_large)?;

    Ok(InvoiceResult {
        vat_amount,
        gross_total,
        usd_equivalent,
        vat_withheld,
        islr_withheld,
        total_withheld,
        net_at_invoice_rate,
        net_at_current_rate,
        invoice_rate,
        current_rate,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;
    use crate::calendar::caracas_offset;
    use crate::data::lookup::testing::FakeSource;
    use crate::domain::{IslrRate, IvaRetention};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn caracas(y: i32, m: u32, day: u32, h: u32) -> DateTime<Utc> {
        caracas_offset()
            .with_ymd_and_hms(y, m, day, h, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn withholding() -> WithholdingConfig {
        WithholdingConfig {
            iva_retention: IvaRetention::SeventyFive,
            islr_rate: IslrRate::TwoPercent,
        }
    }

    fn calculator(source: FakeSource) -> InvoiceCalculator<FakeSource> {
        InvoiceCalculator::new(
            RateLookup::new(source),
            HolidaySet::default(),
            CurrentRateCache::new(Duration::from_secs(600)),
        )
    }

    fn request(invoice_date: Option<NaiveDate>) -> InvoiceRequest {
        InvoiceRequest {
            base_amount: dec!(1000),
            invoice_date,
            taxable_base: Some(dec!(500)),
            withholding: withholding(),
        }
    }

    #[test]
    fn worked_example() {
        let result = compute_breakdown(
            dec!(1000),
            Some(dec!(500)),
            withholding(),
            RateQuote::new(dec!(40.00), d(2025, 1, 10)),
            RateQuote::new(dec!(42.00), d(2025, 1, 16)),
        )
        .unwrap();

        assert_eq!(result.vat_amount, dec!(160));
        assert_eq!(result.gross_total, dec!(1160));
        assert_eq!(result.usd_equivalent, dec!(29));
        assert_eq!(result.vat_withheld, dec!(120));
        assert_eq!(result.islr_withheld, dec!(10));
        assert_eq!(result.total_withheld, dec!(130));
        assert_eq!(result.net_at_invoice_rate, dec!(1030));
        assert_eq!(result.net_at_current_rate, dec!(1088));
    }

    #[test]
    fn oversized_amount_is_invalid_input() {
        let no_islr = WithholdingConfig {
            iva_retention: IvaRetention::SeventyFive,
            islr_rate: IslrRate::None,
        };
        let err = compute_breakdown(
            dec!(70000000000000000000000000000),
            None,
            no_islr,
            RateQuote::new(dec!(40), d(2025, 1, 10)),
            RateQuote::new(dec!(42), d(2025, 1, 16)),
        )
        .unwrap_err();
        assert_eq!(err, CalcError::invalid_input("amount too large"));

        // Fits through the gross total, overflows when re-priced at the current rate.
        let err = compute_breakdown(
            dec!(50000000000000000000000000000),
            None,
            no_islr,
            RateQuote::new(dec!(1), d(2025, 1, 10)),
            RateQuote::new(dec!(2), d(2025, 1, 16)),
        )
        .unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn oversized_amount_fails_without_panicking() {
        let source = FakeSource::default()
            .with_rate(d(2025, 1, 10), dec!(40.00))
            .with_rate(d(2025, 1, 16), dec!(42.00));
        let calc = calculator(source);
        let mut huge = request(Some(d(2025, 1, 13)));
        huge.base_amount = dec!(70000000000000000000000000000);

        let err = calc.calculate_at(&huge, caracas(2025, 1, 16, 17)).await.unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput(_)));
    }

    #[test]
    fn islr_needs_positive_rate_and_base() {
        let invoice = RateQuote::new(dec!(40), d(2025, 1, 10));

        let no_base = compute_breakdown(dec!(1000), None, withholding(), invoice, invoice).unwrap();
        assert_eq!(no_base.islr_withheld, Decimal::ZERO);

        let negative = compute_breakdown(dec!(1000), Some(dec!(-5)), withholding(), invoice, invoice).unwrap();
        assert_eq!(negative.islr_withheld, Decimal::ZERO);

        let no_rate = WithholdingConfig {
            iva_retention: IvaRetention::Full,
            islr_rate: IslrRate::None,
        };
        let result = compute_breakdown(dec!(1000), Some(dec!(500)), no_rate, invoice, invoice).unwrap();
        assert_eq!(result.islr_withheld, Decimal::ZERO);
        assert_eq!(result.vat_withheld, dec!(160));
    }

    #[tokio::test]
    async fn calculates_with_both_rates() {
        let source = FakeSource::default()
            .with_rate(d(2025, 1, 10), dec!(40.00))
            .with_rate(d(2025, 1, 16), dec!(42.00));
        let calc = calculator(source);

        // Monday invoice -> Friday's rate; Thursday 17:00 -> Thursday's rate.
        let result = calc
            .calculate_at(&request(Some(d(2025, 1, 13))), caracas(2025, 1, 16, 17))
            .await
            .unwrap();

        assert_eq!(result.invoice_rate.publication_date(), d(2025, 1, 10));
        assert_eq!(result.current_rate.publication_date(), d(2025, 1, 16));
        assert_eq!(result.net_at_current_rate, dec!(1088));
    }

    #[tokio::test]
    async fn invalid_input_makes_no_calls() {
        let calc = calculator(FakeSource::default());

        let err = calc
            .calculate_at(&request(None), caracas(2025, 1, 16, 17))
            .await
            .unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput(_)));

        let mut zero = request(Some(d(2025, 1, 13)));
        zero.base_amount = Decimal::ZERO;
        let err = calc.calculate_at(&zero, caracas(2025, 1, 16, 17)).await.unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput(_)));

        assert!(calc.lookup().source().calls().is_empty());
    }

    #[tokio::test]
    async fn missing_current_rate_aborts_calculation() {
        let calc = calculator(FakeSource::default().with_rate(d(2025, 1, 10), dec!(40.00)));

        let err = calc
            .calculate_at(&request(Some(d(2025, 1, 13))), caracas(2025, 2, 20, 17))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CalcError::RateUnavailable {
                requested: d(2025, 2, 20),
                attempts: 7
            }
        );
    }

    #[tokio::test]
    async fn current_rate_is_reused_while_fresh() {
        let source = FakeSource::default()
            .with_rate(d(2025, 1, 10), dec!(40.00))
            .with_rate(d(2025, 1, 16), dec!(42.00));
        let calc = calculator(source);
        let now = caracas(2025, 1, 16, 17);

        calc.calculate_at(&request(Some(d(2025, 1, 13))), now).await.unwrap();
        calc.calculate_at(&request(Some(d(2025, 1, 13))), now).await.unwrap();

        let calls = calc.lookup().source().calls();
        assert_eq!(calls.iter().filter(|c| **c == d(2025, 1, 16)).count(), 1);
        assert_eq!(calls.iter().filter(|c| **c == d(2025, 1, 10)).count(), 2);
    }
}
