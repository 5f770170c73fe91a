//! Reporting: terminal text and JSON rendering of results.

pub mod format;

pub use format::*;
