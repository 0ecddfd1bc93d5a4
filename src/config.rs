//! Selects which registry document a process should load.
//!
//! Precedence: an explicit path (the CLI's `--database`), then the
//! `CUI_DATABASE` environment variable, then the built-in database. Empty
//! values are treated as unset.

use crate::catalog::CategoryRegistry;
use anyhow::Result;
use std::env;
use std::fmt;
use std::path::PathBuf;

pub const DATABASE_ENV: &str = "CUI_DATABASE";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RegistrySource {
    Builtin,
    Path(PathBuf),
}

impl RegistrySource {
    /// Resolve the source from an optional explicit path and the environment.
    pub fn from_env(explicit: Option<PathBuf>) -> Self {
        Self::resolve(explicit, env::var(DATABASE_ENV).ok())
    }

    pub fn resolve(explicit: Option<PathBuf>, env_value: Option<String>) -> Self {
        if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
            return RegistrySource::Path(path);
        }
        match env_value {
            Some(value) if !value.trim().is_empty() => RegistrySource::Path(PathBuf::from(value)),
            _ => RegistrySource::Builtin,
        }
    }

    pub fn load(&self) -> Result<CategoryRegistry> {
        tracing::debug!(source = %self, "loading CUI registry");
        match self {
            RegistrySource::Builtin => CategoryRegistry::builtin(),
            RegistrySource::Path(path) => CategoryRegistry::load(path),
        }
    }
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrySource::Builtin => write!(f, "[built-in]"),
            RegistrySource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}
