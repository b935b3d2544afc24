//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: snowflake identifiers
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod ids;
