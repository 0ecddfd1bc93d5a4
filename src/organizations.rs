//! Organization (NARA index group) view derived from a registry.

use crate::catalog::{CategoryRecord, CategoryRegistry, OrganizationCode};
use std::collections::BTreeSet;

#[derive(Clone, Debug)]
/// Organization codes that have at least one category, sorted.
pub struct Organizations<'a> {
    registry: &'a CategoryRegistry,
    codes: Vec<OrganizationCode>,
}

impl<'a> Organizations<'a> {
    pub fn new(registry: &'a CategoryRegistry) -> Self {
        let codes: BTreeSet<OrganizationCode> = registry
            .iter()
            .map(|record| record.organization().clone())
            .collect();
        Self {
            registry,
            codes: codes.into_iter().collect(),
        }
    }

    pub fn all(&self) -> &[OrganizationCode] {
        &self.codes
    }

    /// Categories filed under `organization`, ignoring case.
    pub fn categories(&self, organization: &str) -> Vec<&'a CategoryRecord> {
        self.registry.get_by_organization(organization)
    }

    /// Display name declared for the organization, if any.
    pub fn name(&self, organization: &str) -> Option<&'a str> {
        self.registry.organization_name(organization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_sorted_and_unique() {
        let registry = CategoryRegistry::builtin().unwrap();
        let organizations = Organizations::new(&registry);
        let codes: Vec<&str> = organizations.all().iter().map(|c| c.0.as_str()).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(codes, sorted);
        assert!(codes.contains(&"PRIVACY"));
    }

    #[test]
    fn categories_and_names_resolve_case_insensitively() {
        let registry = CategoryRegistry::builtin().unwrap();
        let organizations = Organizations::new(&registry);
        assert_eq!(organizations.name("tax"), Some("Tax"));
        assert_eq!(organizations.categories("Tax").len(), 1);
        assert!(organizations.categories("NOWHERE").is_empty());
        assert_eq!(organizations.name(""), None);
    }
}
