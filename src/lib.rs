//! `bcv-calc` library crate.
//!
//! The binary (`bcv`) is a thin wrapper around this library so that:
//!
//! - the rate resolution and invoice arithmetic are testable without spawning processes
//! - other front-ends (a web page, a bot) can reuse the same calculator
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod invoice;
pub mod report;
