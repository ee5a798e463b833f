//! dbfixture CLI
//!
//! Command-line front end for exporting, loading, checking and listing
//! database fixtures outside of a test run.

pub mod commands;
pub mod output;
