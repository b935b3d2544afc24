//! Configuration value objects for the domain layer

pub mod validation;

pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
