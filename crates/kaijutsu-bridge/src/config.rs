//! Bridge configuration.
//!
//! ```ron
//! (
//!     wrapper_kinds: ["InvocationTargetException", "UndeclaredThrowableException"],
//!     server_error_kind: Some("ServerError"),
//!     warn_on_unmatched: true,
//! )
//! ```
//!
//! Every field is optional. Kind names are resolved in the system scope when
//! a [`ProxyFactory`](crate::ProxyFactory) is built from the config.

use std::path::Path;

use kaijutsu_reflect::{ResolutionScope, TypeRef};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SERVER_ERROR_KIND, DEFAULT_WARN_ON_UNMATCHED, DEFAULT_WRAPPER_KINDS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Failure kinds stripped by the unwrapper (exact-kind match).
    pub wrapper_kinds: Vec<String>,
    /// Transport server-side wrapper kind; `None` disables that rethrow step.
    pub server_error_kind: Option<String>,
    /// Warn when resolving a method map leaves interface methods unmatched.
    pub warn_on_unmatched: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            wrapper_kinds: DEFAULT_WRAPPER_KINDS.iter().map(|k| k.to_string()).collect(),
            server_error_kind: Some(DEFAULT_SERVER_ERROR_KIND.to_string()),
            warn_on_unmatched: DEFAULT_WARN_ON_UNMATCHED,
        }
    }
}

impl BridgeConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    pub(crate) fn resolve_wrapper_kinds(&self) -> Result<Vec<TypeRef>, ConfigError> {
        self.wrapper_kinds.iter().map(|name| resolve_kind(name)).collect()
    }

    pub(crate) fn resolve_server_error_kind(&self) -> Result<Option<TypeRef>, ConfigError> {
        self.server_error_kind.as_deref().map(resolve_kind).transpose()
    }
}

fn resolve_kind(name: &str) -> Result<TypeRef, ConfigError> {
    ResolutionScope::system()
        .resolve(name)
        .ok_or_else(|| ConfigError::UnknownKind(name.to_string()))
}

/// Errors loading or applying a [`BridgeConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("unknown failure kind '{0}'")]
    UnknownKind(String),
}
