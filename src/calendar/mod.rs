//! Business days and effective-rate dates.
//!
//! The BCV publishes a rate every business day, but a rate only takes legal
//! effect from 16:00 Caracas time. Before that hour, and on any non-business
//! day, the rate of the previous business day still governs. Invoices have no
//! hour, so they always use the rate published the business day before.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc, Weekday};

use crate::domain::HolidaySet;
use crate::error::CalcError;

/// Hour (local) from which the day's published rate is in force.
pub const PUBLICATION_CUTOFF_HOUR: u32 = 16;

/// Upper bound on the backward business-day walk.
pub const MAX_BUSINESS_DAY_WALK: u32 = 30;

/// Venezuela has been on a fixed UTC-04:00 since 2016, no DST.
const CARACAS_OFFSET: FixedOffset = match FixedOffset::west_opt(4 * 3600) {
    Some(offset) => offset,
    None => panic!("UTC-04:00 is within FixedOffset range"),
};

/// Caracas fixed offset.
pub fn caracas_offset() -> FixedOffset {
    CARACAS_OFFSET
}

/// `false` on Saturdays, Sundays and configured holidays.
pub fn is_business_day(date: NaiveDate, holidays: &HolidaySet) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.contains(date)
}

/// The closest business day strictly before `date`.
pub fn previous_business_day(date: NaiveDate, holidays: &HolidaySet) -> Result<NaiveDate, CalcError> {
    let exhausted = || CalcError::NoBusinessDayFound {
        from: date,
        max_days: MAX_BUSINESS_DAY_WALK,
    };

    let mut current = date;
    for _ in 0..MAX_BUSINESS_DAY_WALK {
        current = current.pred_opt().ok_or_else(exhausted)?;
        if is_business_day(current, holidays) {
            return Ok(current);
        }
    }
    Err(exhausted())
}

/// Calendar date in Caracas at instant `now`.
pub fn local_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&caracas_offset()).date_naive()
}

/// Date whose published rate is in force at instant `now`.
pub fn effective_date_for_now(now: DateTime<Utc>, holidays: &HolidaySet) -> Result<NaiveDate, CalcError> {
    let local = now.with_timezone(&caracas_offset());
    let today = local.date_naive();

    if !is_business_day(today, holidays) || local.hour() < PUBLICATION_CUTOFF_HOUR {
        previous_business_day(today, holidays)
    } else {
        Ok(today)
    }
}

/// Date whose published rate prices an invoice dated `invoice_date`.
pub fn effective_date_for_invoice(invoice_date: NaiveDate, holidays: &HolidaySet) -> Result<NaiveDate, CalcError> {
    previous_business_day(invoice_date, holidays)
}
