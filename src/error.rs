//! Domain errors raised by registry lookups and marking formatting.
//!
//! Loading problems stay in `anyhow` with context chains; these variants are
//! the ones callers are expected to match on.

use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum CuiError {
    #[error("unknown CUI category: {}", .identifiers.join(", "))]
    UnknownCategory { identifiers: Vec<String> },

    #[error("unknown dissemination control: {}", .identifiers.join(", "))]
    UnknownControl { identifiers: Vec<String> },

    #[error("invalid marking combination: {0}")]
    InvalidCombination(String),

    #[error("malformed marking: {0}")]
    MalformedMarking(String),
}

impl CuiError {
    pub(crate) fn unknown_category(identifier: &str) -> Self {
        CuiError::UnknownCategory {
            identifiers: vec![identifier.to_string()],
        }
    }

    pub(crate) fn unknown_control(identifier: &str) -> Self {
        CuiError::UnknownControl {
            identifiers: vec![identifier.to_string()],
        }
    }

    /// Short machine-readable kind, used by the CLI's JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            CuiError::UnknownCategory { .. } => "unknown_category",
            CuiError::UnknownControl { .. } => "unknown_control",
            CuiError::InvalidCombination(_) => "invalid_combination",
            CuiError::MalformedMarking(_) => "malformed_marking",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_list_every_identifier() {
        let err = CuiError::UnknownCategory {
            identifiers: vec!["NOPE".into(), "ALSO-NOPE".into()],
        };
        assert_eq!(err.to_string(), "unknown CUI category: NOPE, ALSO-NOPE");
        assert_eq!(err.kind(), "unknown_category");

        let err = CuiError::unknown_control("REL TO");
        assert_eq!(err.to_string(), "unknown dissemination control: REL TO");
    }
}
