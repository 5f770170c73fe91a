//! Error types.
//!
//! - `CalcError`: domain failures surfaced to the caller of the calculator/resolvers.
//! - `AppError`: what the binary prints, paired with a process exit code.

use chrono::NaiveDate;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures of a rate resolution or invoice calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    /// Missing or non-positive base amount, or missing invoice date.
    InvalidInput(String),
    /// No published rate within the backward lookup window.
    RateUnavailable { requested: NaiveDate, attempts: u32 },
    /// The business-day walk ran past its bound (degenerate holiday set).
    NoBusinessDayFound { from: NaiveDate, max_days: u32 },
}

impl CalcError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CalcError::InvalidInput(message.into())
    }

    /// Exit code used when the error reaches the binary.
    ///
    /// 2 = bad input or configuration, 4 = upstream data unavailable.
    pub fn exit_code(&self) -> u8 {
        match self {
            CalcError::InvalidInput(_) | CalcError::NoBusinessDayFound { .. } => 2,
            CalcError::RateUnavailable { .. } => 4,
        }
    }
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcError::InvalidInput(message) => write!(f, "Invalid input: {message}"),
            CalcError::RateUnavailable { requested, attempts } => write!(
                f,
                "No BCV rate found for {requested} or the {} days before it ({attempts} attempts).",
                attempts.saturating_sub(1)
            ),
            CalcError::NoBusinessDayFound { from, max_days } => write!(
                f,
                "No business day found within {max_days} days before {from}; check the holiday configuration."
            ),
        }
    }
}

impl std::error::Error for CalcError {}

impl From<CalcError> for AppError {
    fn from(err: CalcError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}
