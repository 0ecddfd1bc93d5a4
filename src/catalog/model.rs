//! Deserializable representation of the CUI registry database.
//!
//! `RegistryDocument` mirrors `schema/cui_registry.schema.json` field for
//! field. `CategoryRecord` is the resolved, immutable form handed out by
//! [`CategoryRegistry`](crate::catalog::CategoryRegistry) once the document has
//! passed load-time validation.

use crate::catalog::identity::{CategoryCode, ControlCode, Designation, OrganizationCode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
/// Full registry database as stored on disk or embedded in the crate.
pub struct RegistryDocument {
    pub schema_version: String,
    pub source: SourceRef,
    pub organizations: BTreeMap<OrganizationCode, String>,
    #[serde(default)]
    pub controls: Vec<DisseminationControl>,
    pub categories: Vec<CategoryEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
/// Where the registry content was taken from.
pub struct SourceRef {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
/// One category as written in the database document.
pub struct CategoryEntry {
    pub code: CategoryCode,
    pub marking: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "specified")]
    pub designation: Designation,
    pub organization: OrganizationCode,
    #[serde(default)]
    pub authorities: Vec<String>,
    /// Controls this category may carry. `None` permits every declared control.
    #[serde(default)]
    pub dissemination_controls: Option<Vec<ControlCode>>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
/// Limited dissemination control declared by the registry.
pub struct DisseminationControl {
    pub code: ControlCode,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Controls that may not appear in the same banner as this one.
    #[serde(default)]
    pub excludes: BTreeSet<ControlCode>,
}

impl DisseminationControl {
    pub fn excludes(&self, other: &ControlCode) -> bool {
        self.excludes.contains(other)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
/// Canonical metadata for one CUI category.
pub struct CategoryRecord {
    code: CategoryCode,
    marking: String,
    name: String,
    description: String,
    #[serde(rename = "specified")]
    designation: Designation,
    organization: OrganizationCode,
    authorities: Vec<String>,
    dissemination_controls: BTreeSet<ControlCode>,
}

impl CategoryRecord {
    /// Resolve a document entry, expanding an absent control list to `all_controls`.
    pub(crate) fn from_entry(entry: CategoryEntry, all_controls: &BTreeSet<ControlCode>) -> Self {
        let dissemination_controls = match entry.dissemination_controls {
            Some(listed) => listed.into_iter().collect(),
            None => all_controls.clone(),
        };
        Self {
            code: entry.code,
            marking: entry.marking,
            name: entry.name,
            description: entry.description,
            designation: entry.designation,
            organization: entry.organization,
            authorities: entry.authorities,
            dissemination_controls,
        }
    }

    pub fn code(&self) -> &CategoryCode {
        &self.code
    }

    /// Token this category contributes to a banner (e.g., `SP-PRIV`).
    pub fn marking(&self) -> &str {
        &self.marking
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn designation(&self) -> Designation {
        self.designation
    }

    pub fn is_specified(&self) -> bool {
        self.designation.is_specified()
    }

    pub fn organization(&self) -> &OrganizationCode {
        &self.organization
    }

    /// Statute, regulation, or policy citations that make this information CUI.
    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }

    pub fn dissemination_controls(&self) -> &BTreeSet<ControlCode> {
        &self.dissemination_controls
    }

    pub fn permits(&self, control: &ControlCode) -> bool {
        self.dissemination_controls.contains(control)
    }
}

/// Parse a registry document without additional validation.
pub fn parse_document(data: &str) -> Result<RegistryDocument> {
    let document: RegistryDocument =
        serde_json::from_str(data).context("parsing CUI registry document")?;
    Ok(document)
}

/// Read and parse a registry document from disk without additional validation.
pub fn load_document_from_path(path: &Path) -> Result<RegistryDocument> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_document(&data).with_context(|| format!("loading {}", path.display()))
}
