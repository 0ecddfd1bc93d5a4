//! Banner marking construction and parsing.
//!
//! A banner reads `CUI//<categories>//<controls>`. Specified categories come
//! first, then basic ones, each group sorted by marking token; controls follow
//! registry order. Empty segments are dropped, so a request with only basic
//! categories and `include_basic = false` renders as plain `CUI`.

use crate::catalog::{CategoryRecord, CategoryRegistry, DisseminationControl};
use crate::error::CuiError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

pub const BANNER_PREFIX: &str = "CUI";
pub const SEGMENT_SEPARATOR: &str = "//";
pub const TOKEN_SEPARATOR: &str = "/";

#[derive(Clone, Debug, Eq, PartialEq)]
/// Categories and controls to render into one banner.
pub struct MarkingRequest {
    pub categories: Vec<String>,
    pub controls: Vec<String>,
    /// Basic categories are optional in banners; when false they are checked
    /// but left out of the rendered text.
    pub include_basic: bool,
}

impl Default for MarkingRequest {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            controls: Vec::new(),
            include_basic: true,
        }
    }
}

impl MarkingRequest {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_controls<I, S>(mut self, controls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.controls = controls.into_iter().map(Into::into).collect();
        self
    }

    pub fn include_basic(mut self, include: bool) -> Self {
        self.include_basic = include;
        self
    }
}

#[derive(Clone, Debug, Serialize)]
/// A validated marking with its parts in canonical order.
pub struct Marking<'a> {
    categories: Vec<&'a CategoryRecord>,
    controls: Vec<&'a DisseminationControl>,
    include_basic: bool,
}

impl<'a> Marking<'a> {
    /// Every resolved category, including basic ones omitted from the banner.
    pub fn categories(&self) -> &[&'a CategoryRecord] {
        &self.categories
    }

    pub fn controls(&self) -> &[&'a DisseminationControl] {
        &self.controls
    }

    /// Tokens that appear in the category segment of the banner.
    pub fn category_tokens(&self) -> Vec<&'a str> {
        self.categories
            .iter()
            .filter(|record| self.include_basic || record.is_specified())
            .map(|record| record.marking())
            .collect()
    }

    pub fn banner(&self) -> String {
        let mut banner = String::from(BANNER_PREFIX);
        let tokens = self.category_tokens();
        if !tokens.is_empty() {
            banner.push_str(SEGMENT_SEPARATOR);
            banner.push_str(&tokens.join(TOKEN_SEPARATOR));
        }
        if !self.controls.is_empty() {
            let controls: Vec<&str> = self.controls.iter().map(|c| c.code.0.as_str()).collect();
            banner.push_str(SEGMENT_SEPARATOR);
            banner.push_str(&controls.join(TOKEN_SEPARATOR));
        }
        banner
    }
}

impl fmt::Display for Marking<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.banner())
    }
}

impl CategoryRegistry {
    /// Render the canonical banner for a set of categories and controls.
    ///
    /// Fails when an identifier or control is unknown, when no category is
    /// given, or when the controls conflict with each other or with a
    /// category's permitted set.
    pub fn format_marking<I, S, J, T>(&self, identifiers: I, controls: J) -> Result<String, CuiError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let request = MarkingRequest::new(identifiers).with_controls(controls);
        self.format_request(&request)
    }

    pub fn format_request(&self, request: &MarkingRequest) -> Result<String, CuiError> {
        Ok(self.resolve_marking(request)?.banner())
    }

    /// Validate a request and return its parts in canonical order.
    pub fn resolve_marking(&self, request: &MarkingRequest) -> Result<Marking<'_>, CuiError> {
        let codes = self.validate(&request.categories).into_result()?;
        if codes.is_empty() {
            return Err(CuiError::InvalidCombination(
                "a marking requires at least one CUI category".to_string(),
            ));
        }
        let mut categories = Vec::with_capacity(codes.len());
        for code in &codes {
            categories.push(self.lookup(&code.0)?);
        }
        categories.sort_by(|a, b| {
            a.designation()
                .cmp(&b.designation())
                .then_with(|| a.marking().cmp(b.marking()))
        });

        let controls = self.resolve_controls(&request.controls)?;
        check_exclusions(&controls)?;
        check_permitted(&categories, &controls)?;

        Ok(Marking {
            categories,
            controls,
            include_basic: request.include_basic,
        })
    }

    /// Parse a banner such as `CUI//SP-PRIV/PRVCY//NOFORN` back into its parts.
    ///
    /// The banner must be well formed; the result is re-validated with the
    /// same rules as [`resolve_marking`](Self::resolve_marking), so comparing
    /// `banner()` with the input tells whether the input was canonical.
    ///
    /// A banner needs at least one category token. Formatting a request with
    /// `include_basic = false` can drop every category (`CUI//FEDCON`); such
    /// output does not parse back and fails with
    /// [`CuiError::InvalidCombination`].
    pub fn parse_marking(&self, banner: &str) -> Result<Marking<'_>, CuiError> {
        let trimmed = banner.trim();
        let mut segments = trimmed.split(SEGMENT_SEPARATOR);
        let prefix = segments.next().unwrap_or_default().trim();
        if !prefix.eq_ignore_ascii_case(BANNER_PREFIX) {
            return Err(CuiError::MalformedMarking(format!(
                "banner must start with {BANNER_PREFIX}, got '{trimmed}'"
            )));
        }

        let segments: Vec<Vec<&str>> = segments
            .map(|segment| segment.split(TOKEN_SEPARATOR).map(str::trim).collect())
            .collect();
        if segments.iter().flatten().any(|token| token.is_empty()) {
            return Err(CuiError::MalformedMarking(format!(
                "banner contains an empty token: '{trimmed}'"
            )));
        }

        let (categories, controls) = match segments.as_slice() {
            [] => (Vec::new(), Vec::new()),
            [only] if self.is_control_segment(only) => (Vec::new(), only.clone()),
            [only] => (only.clone(), Vec::new()),
            [categories, controls] => (categories.clone(), controls.clone()),
            _ => {
                return Err(CuiError::MalformedMarking(format!(
                    "banner has more than two segments after {BANNER_PREFIX}: '{trimmed}'"
                )));
            }
        };

        let request = MarkingRequest::new(categories).with_controls(controls);
        self.resolve_marking(&request)
    }

    fn is_control_segment(&self, tokens: &[&str]) -> bool {
        tokens
            .iter()
            .all(|token| self.find(token).is_none() && self.find_control(token).is_some())
    }

    fn resolve_controls(&self, identifiers: &[String]) -> Result<Vec<&DisseminationControl>, CuiError> {
        let mut resolved: Vec<&DisseminationControl> = Vec::new();
        let mut unknown: Vec<String> = Vec::new();
        for identifier in identifiers {
            match self.find_control(identifier) {
                Some(control) => {
                    if !resolved.iter().any(|c| c.code == control.code) {
                        resolved.push(control);
                    }
                }
                None => {
                    if !unknown.contains(identifier) {
                        unknown.push(identifier.clone());
                    }
                }
            }
        }
        if !unknown.is_empty() {
            return Err(CuiError::UnknownControl {
                identifiers: unknown,
            });
        }
        resolved.sort_by_key(|control| self.control_position(&control.code));
        Ok(resolved)
    }
}

fn check_exclusions(controls: &[&DisseminationControl]) -> Result<(), CuiError> {
    for (idx, control) in controls.iter().enumerate() {
        for other in &controls[idx + 1..] {
            if control.excludes(&other.code) {
                return Err(CuiError::InvalidCombination(format!(
                    "{} cannot be combined with {}",
                    control.code, other.code
                )));
            }
        }
    }
    Ok(())
}

fn check_permitted(
    categories: &[&CategoryRecord],
    controls: &[&DisseminationControl],
) -> Result<(), CuiError> {
    for control in controls {
        let refusing: BTreeSet<String> = categories
            .iter()
            .filter(|record| !record.permits(&control.code))
            .map(|record| record.code().0.clone())
            .collect();
        if !refusing.is_empty() {
            let refusing: Vec<String> = refusing.into_iter().collect();
            return Err(CuiError::InvalidCombination(format!(
                "dissemination control {} is not permitted for {}",
                control.code,
                refusing.join(", ")
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CategoryRegistry {
        CategoryRegistry::builtin().unwrap()
    }

    const NONE: [&str; 0] = [];

    #[test]
    fn single_specified_category() {
        assert_eq!(registry().format_marking(["SP-PRIV"], NONE).unwrap(), "CUI//SP-PRIV");
    }

    #[test]
    fn code_and_marking_render_the_same() {
        let registry = registry();
        assert_eq!(
            registry.format_marking(["priv"], NONE).unwrap(),
            registry.format_marking(["SP-PRIV"], NONE).unwrap()
        );
    }

    #[test]
    fn specified_before_basic_then_alphabetical() {
        let banner = registry()
            .format_marking(["PRVCY", "SP-TAX", "HLTH", "CTI"], ["NOFORN"])
            .unwrap();
        assert_eq!(banner, "CUI//SP-CTI/SP-TAX/HLTH/PRVCY//NOFORN");
    }

    #[test]
    fn controls_follow_registry_order_and_dedupe() {
        let banner = registry()
            .format_marking(["SP-PRIV"], ["DL_ONLY", "noforn", "NOFORN"])
            .unwrap();
        assert_eq!(banner, "CUI//SP-PRIV//NOFORN/DL ONLY");
    }

    #[test]
    fn basic_categories_can_be_omitted() {
        let registry = registry();
        let request = MarkingRequest::new(["PRVCY", "SP-PRIV"]).include_basic(false);
        assert_eq!(registry.format_request(&request).unwrap(), "CUI//SP-PRIV");

        let request = MarkingRequest::new(["PRVCY"])
            .with_controls(["FEDCON"])
            .include_basic(false);
        assert_eq!(registry.format_request(&request).unwrap(), "CUI//FEDCON");
    }

    #[test]
    fn unknown_categories_reported_before_controls() {
        let err = registry()
            .format_marking(["SP-PRIV", "NOPE", "ALSO"], ["BOGUS"])
            .unwrap_err();
        assert_eq!(
            err,
            CuiError::UnknownCategory {
                identifiers: vec!["NOPE".into(), "ALSO".into()]
            }
        );
    }

    #[test]
    fn unknown_controls_are_listed() {
        let err = registry()
            .format_marking(["SP-PRIV"], ["REL TO", "NOFORN", "XYZ"])
            .unwrap_err();
        assert_eq!(
            err,
            CuiError::UnknownControl {
                identifiers: vec!["REL TO".into(), "XYZ".into()]
            }
        );
    }

    #[test]
    fn empty_category_set_is_invalid() {
        let err = registry().format_marking(NONE, ["NOFORN"]).unwrap_err();
        assert!(matches!(err, CuiError::InvalidCombination(_)));
    }

    #[test]
    fn exclusive_controls_are_rejected() {
        let err = registry()
            .format_marking(["SP-PRIV"], ["FEDCON", "FED ONLY"])
            .unwrap_err();
        assert_eq!(
            err,
            CuiError::InvalidCombination("FED ONLY cannot be combined with FEDCON".into())
        );
    }

    #[test]
    fn control_must_be_permitted_by_every_category() {
        let err = registry()
            .format_marking(["SP-TAX", "SP-CENS", "SP-PRIV"], ["FEDCON"])
            .unwrap_err();
        assert_eq!(
            err,
            CuiError::InvalidCombination(
                "dissemination control FEDCON is not permitted for CENS, TAX".into()
            )
        );
    }

    #[test]
    fn attorney_controls_only_on_legal_category() {
        let registry = registry();
        assert_eq!(
            registry
                .format_marking(["PRIVILEGE"], ["ATTORNEY-CLIENT"])
                .unwrap(),
            "CUI//PRIVILEGE//ATTORNEY-CLIENT"
        );
        for category in ["SP-PRIV", "HLTH", "SP-CTI", "PROPIN", "SP-EXPT"] {
            for control in ["attorney-client", "ATTORNEY-WP"] {
                let err = registry.format_marking([category], [control]).unwrap_err();
                assert!(matches!(err, CuiError::InvalidCombination(_)), "{category} {control}");
            }
        }
    }

    #[test]
    fn only_privilege_category_permits_attorney_controls() {
        let registry = registry();
        let attorney = registry.control("ATTORNEY-CLIENT").unwrap();
        let permitting: Vec<&str> = registry
            .iter()
            .filter(|record| record.permits(&attorney.code))
            .map(|record| record.code().0.as_str())
            .collect();
        assert_eq!(permitting, vec!["PRIVILEGE"]);
    }

    #[test]
    fn parse_round_trips_canonical_banner() {
        let registry = registry();
        let banner = "CUI//SP-CTI/SP-TAX/HLTH//NOFORN/DL ONLY";
        let marking = registry.parse_marking(banner).unwrap();
        assert_eq!(marking.banner(), banner);
        assert_eq!(marking.categories().len(), 3);
        assert_eq!(marking.controls().len(), 2);
    }

    #[test]
    fn parse_canonicalizes_order_and_case() {
        let registry = registry();
        let marking = registry.parse_marking("cui//hlth/sp-cti").unwrap();
        assert_eq!(marking.to_string(), "CUI//SP-CTI/HLTH");

        let marking = registry.parse_marking(" cui // SP-PRIV ").unwrap();
        assert_eq!(marking.banner(), "CUI//SP-PRIV");
    }

    #[test]
    fn parse_recognizes_control_only_segment() {
        let err = registry().parse_marking("CUI//NOFORN").unwrap_err();
        assert!(matches!(err, CuiError::InvalidCombination(_)));
    }

    #[test]
    fn banner_without_category_tokens_does_not_parse_back() {
        let registry = registry();
        let request = MarkingRequest::new(["PRVCY"])
            .with_controls(["FEDCON"])
            .include_basic(false);
        let banner = registry.format_request(&request).unwrap();
        assert_eq!(banner, "CUI//FEDCON");
        let err = registry.parse_marking(&banner).unwrap_err();
        assert_eq!(
            err,
            CuiError::InvalidCombination("a marking requires at least one CUI category".into())
        );
    }

    #[test]
    fn parse_rejects_malformed_banners() {
        let registry = registry();
        for banner in ["SECRET//NOFORN", "CUI//SP-PRIV//NOFORN//FEDCON", "CUI//SP-PRIV//", "CUI//SP-PRIV/"] {
            let err = registry.parse_marking(banner).unwrap_err();
            assert!(matches!(err, CuiError::MalformedMarking(_)), "{banner}: {err}");
        }
    }
}
