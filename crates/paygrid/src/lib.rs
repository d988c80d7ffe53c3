//! Salary estimation for AI job postings.
//!
//! The [`estimation`] module holds the scoring core and the two enumerations
//! built on it (inverse search and variant grids). The remaining modules are
//! the service plumbing shared with the `paygrid-api` binary.

pub mod config;
pub mod error;
pub mod estimation;
pub mod telemetry;
