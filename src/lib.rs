//! Controlled Unclassified Information (CUI) category registry.
//!
//! The crate ships the NARA CUI category list as an embedded database and
//! exposes it through [`CategoryRegistry`]: lookups by code, marking, or
//! organization; structured validation of identifier sets; and canonical
//! banner formatting (`CUI//SP-PRIV//NOFORN`). Registries are explicitly
//! constructed values with no global state, so tests and callers can load
//! alternate documents side by side.

pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod marking;
pub mod organizations;
mod schema_loader;
pub mod validation;

pub use catalog::{
    CategoryCode, CategoryRecord, CategoryRegistry, ControlCode, Designation,
    DisseminationControl, OrganizationCode, RegistryDocument, SourceRef,
};
pub use config::{DATABASE_ENV, RegistrySource};
pub use error::CuiError;
pub use filters::{BasicCategories, CategoryFilter, SpecifiedCategories};
pub use marking::{Marking, MarkingRequest};
pub use organizations::Organizations;
pub use validation::ValidationReport;

/// Split comma-delimited command-line lists into trimmed tokens.
///
/// Only commas separate entries; dissemination controls such as `FED ONLY`
/// contain spaces and must survive intact.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
