//! Structured validation of category identifier sets.
//!
//! Unlike [`CategoryRegistry::lookup`], validation never fails fast: every
//! identifier is checked and the report lists all of the unknown ones so a
//! caller can surface them together.

use crate::catalog::{CategoryCode, CategoryRegistry};
use crate::error::CuiError;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
/// Outcome of [`CategoryRegistry::validate`].
pub struct ValidationReport {
    /// Codes of the categories that resolved, in input order without repeats.
    pub known: Vec<CategoryCode>,
    /// Identifiers that matched nothing, exactly as supplied.
    pub unknown: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.unknown.is_empty()
    }

    /// Convert into the error form used by the formatting API.
    pub fn into_result(self) -> Result<Vec<CategoryCode>, CuiError> {
        if self.unknown.is_empty() {
            Ok(self.known)
        } else {
            Err(CuiError::UnknownCategory {
                identifiers: self.unknown,
            })
        }
    }
}

impl CategoryRegistry {
    /// Check that every identifier names a category (by code or marking).
    pub fn validate<I, S>(&self, identifiers: I) -> ValidationReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = ValidationReport::default();
        let mut seen_known = BTreeSet::new();
        let mut seen_unknown = BTreeSet::new();

        for identifier in identifiers {
            let identifier = identifier.as_ref();
            match self.find(identifier) {
                Some(record) => {
                    // Aliases (code vs. marking, casing) collapse to one entry.
                    if seen_known.insert(record.code().clone()) {
                        report.known.push(record.code().clone());
                    }
                }
                None => {
                    if seen_unknown.insert(identifier.to_string()) {
                        report.unknown.push(identifier.to_string());
                    }
                }
            }
        }

        if !report.is_valid() {
            tracing::debug!(unknown = ?report.unknown, "category validation failed");
        }
        report
    }
}
