use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Registry code for a CUI category (e.g., `PRIV`, `CTI`).
///
/// Codes are stored exactly as the database spells them; lookups normalize
/// through [`lookup_key`] so callers can pass any casing.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCode(pub String);

/// Limited dissemination control code (e.g., `NOFORN`, `FED ONLY`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlCode(pub String);

/// NARA index group a category belongs to (e.g., `PRIVACY`, `DEFENSE`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationCode(pub String);

/// Whether a category is CUI Basic or CUI Specified.
///
/// The database stores this as the boolean `specified`; the enum keeps call
/// sites readable and drives banner ordering (specified tokens come first).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Designation {
    Specified,
    Basic,
}

impl Designation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Designation::Specified => "specified",
            Designation::Basic => "basic",
        }
    }

    pub fn is_specified(&self) -> bool {
        matches!(self, Designation::Specified)
    }

    fn from_flag(specified: bool) -> Self {
        if specified {
            Designation::Specified
        } else {
            Designation::Basic
        }
    }
}

impl Serialize for Designation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bool(self.is_specified())
    }
}

impl<'de> Deserialize<'de> for Designation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let flag = bool::deserialize(deserializer)?;
        Ok(Self::from_flag(flag))
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ControlCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OrganizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized key for case-insensitive category, marking, and organization
/// lookups. Blank input yields `None` so it can never match an entry.
pub fn lookup_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Normalized key for dissemination controls.
///
/// Controls contain spaces (`FED ONLY`, `DL ONLY`), which are awkward on a
/// command line, so `_` is accepted in their place and runs of whitespace
/// collapse to one space.
pub fn control_key(raw: &str) -> Option<String> {
    let spaced = raw.replace('_', " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() {
        return None;
    }
    Some(joined.to_uppercase())
}
