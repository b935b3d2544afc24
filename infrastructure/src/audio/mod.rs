//! Track resolution adapters.

mod catalog;

pub use catalog::{CatalogEntry, CatalogError, CatalogFile, CatalogResolver};
