//! Domain types used throughout the calculator.
//!
//! This module defines:
//!
//! - the holiday calendar input (`HolidaySet`)
//! - rates as returned by the lookup (`RateQuote`)
//! - withholding choices (`IvaRetention`, `IslrRate`, `WithholdingConfig`)
//! - calculator inputs/outputs (`InvoiceRequest`, `InvoiceResult`)

pub mod types;

pub use types::*;
