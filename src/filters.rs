//! Filtered views over a registry (CUI Basic vs. CUI Specified).

use crate::catalog::{CategoryRecord, CategoryRegistry};

/// A read-only subset of a registry selected by [`matches`](Self::matches).
///
/// Implementors supply the predicate; the provided methods mirror the
/// registry's own accessors restricted to matching records.
pub trait CategoryFilter<'a> {
    fn registry(&self) -> &'a CategoryRegistry;

    fn matches(&self, record: &CategoryRecord) -> bool;

    /// Matching records in document order.
    fn all(&self) -> Vec<&'a CategoryRecord> {
        self.registry()
            .iter()
            .filter(|record| self.matches(record))
            .collect()
    }

    /// Matching records in an organization, ignoring case.
    fn by_organization(&self, organization: &str) -> Vec<&'a CategoryRecord> {
        self.registry()
            .get_by_organization(organization)
            .into_iter()
            .filter(|record| self.matches(record))
            .collect()
    }

    fn get_by_marking(&self, marking: &str) -> Option<&'a CategoryRecord> {
        self.registry()
            .get_by_marking(marking)
            .filter(|record| self.matches(record))
    }
}

#[derive(Clone, Copy, Debug)]
/// Categories without a specified handling authority.
pub struct BasicCategories<'a> {
    registry: &'a CategoryRegistry,
}

impl<'a> BasicCategories<'a> {
    pub fn new(registry: &'a CategoryRegistry) -> Self {
        Self { registry }
    }
}

impl<'a> CategoryFilter<'a> for BasicCategories<'a> {
    fn registry(&self) -> &'a CategoryRegistry {
        self.registry
    }

    fn matches(&self, record: &CategoryRecord) -> bool {
        !record.is_specified()
    }
}

#[derive(Clone, Copy, Debug)]
/// Categories carrying the `SP-` marking.
pub struct SpecifiedCategories<'a> {
    registry: &'a CategoryRegistry,
}

impl<'a> SpecifiedCategories<'a> {
    pub fn new(registry: &'a CategoryRegistry) -> Self {
        Self { registry }
    }
}

impl<'a> CategoryFilter<'a> for SpecifiedCategories<'a> {
    fn registry(&self) -> &'a CategoryRegistry {
        self.registry
    }

    fn matches(&self, record: &CategoryRecord) -> bool {
        record.is_specified()
    }
}
