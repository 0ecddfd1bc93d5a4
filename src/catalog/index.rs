//! Indexed, read-only view of a CUI registry document.
//!
//! The registry enforces the expected schema version and the cross-reference
//! rules the JSON Schema cannot express (unique codes, declared organizations
//! and controls, `SP-` prefixes), then builds the lookup indexes once. Nothing
//! mutates after construction, so a registry can be shared freely.

use crate::catalog::identity::{
    CategoryCode, ControlCode, Designation, OrganizationCode, control_key, lookup_key,
};
use crate::catalog::model::{
    CategoryRecord, DisseminationControl, RegistryDocument, SourceRef, load_document_from_path,
};
use crate::error::CuiError;
use crate::schema_loader::{load_registry_schema, validate_document_value};
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Registry database compiled into the crate.
pub const BUILTIN_REGISTRY: &str = include_str!("../../data/cui_registry.json");

// Only one document layout exists; refuse anything else rather than guess at
// field meanings.
const REGISTRY_SCHEMA_VERSION: &str = "cui_registry_v1";

/// Marking prefix carried by every CUI Specified category.
pub const SPECIFIED_PREFIX: &str = "SP-";

#[derive(Debug)]
/// CUI categories and dissemination controls plus derived lookup indexes.
pub struct CategoryRegistry {
    schema_version: String,
    source: SourceRef,
    organizations: BTreeMap<OrganizationCode, String>,
    records: Vec<CategoryRecord>,
    alphabetical: Vec<usize>,
    by_identifier: BTreeMap<String, usize>,
    by_marking: BTreeMap<String, usize>,
    by_organization: BTreeMap<String, Vec<usize>>,
    controls: Vec<DisseminationControl>,
    controls_by_key: BTreeMap<String, usize>,
}

impl CategoryRegistry {
    /// Build the registry from the database compiled into the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_REGISTRY).context("loading built-in CUI registry")
    }

    /// Load and validate a registry document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let data =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json_str(&data).with_context(|| format!("loading {}", path.display()))
    }

    /// Validate raw JSON against the registry schema, then build the indexes.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(data).context("parsing CUI registry document")?;

        let allowed = allowed_schema_versions();
        let schema = load_registry_schema(&allowed)?;
        if schema.schema_version != REGISTRY_SCHEMA_VERSION {
            bail!(
                "registry schema pins '{}' but the index reads '{}'",
                schema.schema_version,
                REGISTRY_SCHEMA_VERSION
            );
        }
        validate_document_value(&schema, &value)?;

        let document: RegistryDocument =
            serde_json::from_value(value).context("decoding CUI registry document")?;
        Self::from_document(document)
    }

    /// Build the indexes from an already-parsed document.
    ///
    /// Skips JSON Schema validation but still applies every cross-reference
    /// rule, so hand-built documents cannot produce an inconsistent registry.
    pub fn from_document(document: RegistryDocument) -> Result<Self> {
        validate_schema_version(&document.schema_version)?;

        let RegistryDocument {
            schema_version,
            source,
            organizations,
            controls,
            categories,
        } = document;

        let controls = build_controls(controls)?;
        let controls_by_key = index_controls(&controls)?;
        let all_controls: BTreeSet<ControlCode> =
            controls.iter().map(|control| control.code.clone()).collect();

        let records: Vec<CategoryRecord> = categories
            .into_iter()
            .map(|entry| CategoryRecord::from_entry(entry, &all_controls))
            .collect();
        let indexes = build_category_indexes(&records, &organizations, &all_controls)?;

        tracing::debug!(
            schema_version = %schema_version,
            source = %source.title,
            categories = records.len(),
            controls = controls.len(),
            organizations = organizations.len(),
            "CUI registry loaded"
        );

        Ok(Self {
            schema_version,
            source,
            organizations,
            records,
            alphabetical: indexes.alphabetical,
            by_identifier: indexes.by_identifier,
            by_marking: indexes.by_marking,
            by_organization: indexes.by_organization,
            controls,
            controls_by_key,
        })
    }

    /// Read a document from disk without JSON Schema validation.
    ///
    /// Useful for tooling that wants the raw model, e.g. to diff two registry
    /// snapshots.
    pub fn read_document(path: &Path) -> Result<RegistryDocument> {
        load_document_from_path(path)
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve a category by code or marking token, ignoring case.
    ///
    /// Returns `None` for unknown or blank identifiers; use [`lookup`](Self::lookup)
    /// when the caller wants an error to propagate.
    pub fn find(&self, identifier: &str) -> Option<&CategoryRecord> {
        let key = lookup_key(identifier)?;
        self.by_identifier.get(&key).map(|&idx| &self.records[idx])
    }

    /// Resolve a category, failing with [`CuiError::UnknownCategory`] when absent.
    pub fn lookup(&self, identifier: &str) -> Result<&CategoryRecord, CuiError> {
        self.find(identifier)
            .ok_or_else(|| CuiError::unknown_category(identifier.trim()))
    }

    /// Every category sorted by code. Each call yields the same order.
    pub fn list_categories(&self) -> Vec<&CategoryRecord> {
        self.alphabetical
            .iter()
            .map(|&idx| &self.records[idx])
            .collect()
    }

    /// Every category in document order.
    pub fn all(&self) -> Vec<&CategoryRecord> {
        self.records.iter().collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CategoryRecord> {
        self.records.iter()
    }

    /// Resolve a category by its banner token only (e.g., `sp-priv`).
    pub fn get_by_marking(&self, marking: &str) -> Option<&CategoryRecord> {
        let key = lookup_key(marking)?;
        self.by_marking.get(&key).map(|&idx| &self.records[idx])
    }

    /// Categories filed under an organization, in document order.
    ///
    /// Unknown or blank organization codes yield an empty list.
    pub fn get_by_organization(&self, organization: &str) -> Vec<&CategoryRecord> {
        lookup_key(organization)
            .and_then(|key| self.by_organization.get(&key))
            .map(|indexes| indexes.iter().map(|&idx| &self.records[idx]).collect())
            .unwrap_or_default()
    }

    /// Display name for an organization code, ignoring case.
    pub fn organization_name(&self, organization: &str) -> Option<&str> {
        let key = lookup_key(organization)?;
        self.organizations
            .iter()
            .find(|(code, _)| code.0.to_lowercase() == key)
            .map(|(_, name)| name.as_str())
    }

    /// Dissemination controls in document order, which is also banner order.
    pub fn controls(&self) -> &[DisseminationControl] {
        &self.controls
    }

    pub fn find_control(&self, identifier: &str) -> Option<&DisseminationControl> {
        let key = control_key(identifier)?;
        self.controls_by_key
            .get(&key)
            .map(|&idx| &self.controls[idx])
    }

    /// Resolve a control, failing with [`CuiError::UnknownControl`] when absent.
    pub fn control(&self, identifier: &str) -> Result<&DisseminationControl, CuiError> {
        self.find_control(identifier)
            .ok_or_else(|| CuiError::unknown_control(identifier.trim()))
    }

    /// Position of a control in banner order.
    pub(crate) fn control_position(&self, code: &ControlCode) -> usize {
        self.controls
            .iter()
            .position(|control| &control.code == code)
            .unwrap_or(usize::MAX)
    }
}

impl<'a> IntoIterator for &'a CategoryRegistry {
    type Item = &'a CategoryRecord;
    type IntoIter = std::slice::Iter<'a, CategoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn allowed_schema_versions() -> BTreeSet<String> {
    BTreeSet::from([REGISTRY_SCHEMA_VERSION.to_string()])
}

fn validate_schema_version(schema_version: &str) -> Result<()> {
    if schema_version.is_empty() {
        bail!("schema_version must not be empty");
    }

    let allowed = allowed_schema_versions();
    if !allowed.contains(schema_version) {
        bail!(
            "schema_version '{}' not in allowed set {:?}",
            schema_version,
            allowed
        );
    }

    Ok(())
}

/// Check control declarations and make `excludes` symmetric.
fn build_controls(mut controls: Vec<DisseminationControl>) -> Result<Vec<DisseminationControl>> {
    let declared: BTreeSet<ControlCode> = controls.iter().map(|c| c.code.clone()).collect();

    let mut implied: Vec<(ControlCode, ControlCode)> = Vec::new();
    for control in &controls {
        for excluded in &control.excludes {
            if excluded == &control.code {
                bail!("control {} excludes itself", control.code);
            }
            if !declared.contains(excluded) {
                bail!(
                    "control {} excludes unknown control '{}'",
                    control.code,
                    excluded
                );
            }
            implied.push((excluded.clone(), control.code.clone()));
        }
    }

    for (target, excluded) in implied {
        if let Some(control) = controls.iter_mut().find(|c| c.code == target) {
            control.excludes.insert(excluded);
        }
    }

    Ok(controls)
}

fn index_controls(controls: &[DisseminationControl]) -> Result<BTreeMap<String, usize>> {
    let mut map = BTreeMap::new();
    for (idx, control) in controls.iter().enumerate() {
        let Some(key) = control_key(&control.code.0) else {
            bail!("encountered dissemination control with no code");
        };
        if map.insert(key, idx).is_some() {
            bail!("duplicate dissemination control {}", control.code);
        }
    }
    Ok(map)
}

struct CategoryIndexes {
    alphabetical: Vec<usize>,
    by_identifier: BTreeMap<String, usize>,
    by_marking: BTreeMap<String, usize>,
    by_organization: BTreeMap<String, Vec<usize>>,
}

fn build_category_indexes(
    records: &[CategoryRecord],
    organizations: &BTreeMap<OrganizationCode, String>,
    controls: &BTreeSet<ControlCode>,
) -> Result<CategoryIndexes> {
    let declared_orgs: BTreeSet<&OrganizationCode> = organizations.keys().collect();

    let mut by_code: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_marking: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_organization: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for (idx, record) in records.iter().enumerate() {
        let code = record.code();
        let Some(code_key) = lookup_key(&code.0) else {
            bail!("encountered category with no code");
        };
        if by_code.insert(code_key, idx).is_some() {
            bail!("duplicate category code {}", code);
        }

        let Some(marking_key) = lookup_key(record.marking()) else {
            bail!("category {} has an empty marking", code);
        };
        validate_marking_prefix(code, record.marking(), record.designation())?;
        if let Some(&other) = by_marking.get(&marking_key) {
            bail!(
                "categories {} and {} share marking '{}'",
                records[other].code(),
                code,
                record.marking()
            );
        }
        by_marking.insert(marking_key, idx);

        if !declared_orgs.contains(record.organization()) {
            bail!(
                "category {} references unknown organization {}",
                code,
                record.organization()
            );
        }
        let Some(org_key) = lookup_key(&record.organization().0) else {
            bail!("category {} has an empty organization", code);
        };
        by_organization.entry(org_key).or_default().push(idx);

        for control in record.dissemination_controls() {
            if !controls.contains(control) {
                bail!(
                    "category {} references unknown dissemination control '{}'",
                    code,
                    control
                );
            }
        }
    }

    // Codes and markings share one namespace for `find`; a code that spells
    // another category's marking would make resolution ambiguous.
    let mut by_identifier = by_code.clone();
    for (marking_key, &idx) in &by_marking {
        match by_identifier.get(marking_key) {
            Some(&existing) if existing != idx => bail!(
                "marking '{}' of category {} collides with category code {}",
                records[idx].marking(),
                records[idx].code(),
                records[existing].code()
            ),
            Some(_) => {}
            None => {
                by_identifier.insert(marking_key.clone(), idx);
            }
        }
    }

    let mut alphabetical: Vec<usize> = (0..records.len()).collect();
    alphabetical.sort_by(|&a, &b| records[a].code().cmp(records[b].code()));

    Ok(CategoryIndexes {
        alphabetical,
        by_identifier,
        by_marking,
        by_organization,
    })
}

fn validate_marking_prefix(code: &CategoryCode, marking: &str, designation: Designation) -> Result<()> {
    let has_prefix = marking.starts_with(SPECIFIED_PREFIX);
    match designation {
        Designation::Specified if !has_prefix => bail!(
            "specified category {} must use a marking starting with {}, got '{}'",
            code,
            SPECIFIED_PREFIX,
            marking
        ),
        Designation::Basic if has_prefix => bail!(
            "basic category {} must not use the {} marking prefix, got '{}'",
            code,
            SPECIFIED_PREFIX,
            marking
        ),
        _ => Ok(()),
    }
}
