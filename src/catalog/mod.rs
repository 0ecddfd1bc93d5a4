//! CUI category catalog wiring.
//!
//! This module wraps the registry database (embedded from
//! `data/cui_registry.json` or read from disk) so callers get a validated,
//! indexed snapshot. Types here mirror the document fields; `CategoryRegistry`
//! is the entry point for lookups.

pub mod identity;
pub mod index;
pub mod model;

pub use identity::{
    CategoryCode, ControlCode, Designation, OrganizationCode, control_key, lookup_key,
};
pub use index::{BUILTIN_REGISTRY, CategoryRegistry, SPECIFIED_PREFIX};
pub use model::{
    CategoryEntry, CategoryRecord, DisseminationControl, RegistryDocument, SourceRef,
    load_document_from_path, parse_document,
};
