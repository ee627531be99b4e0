//! Error types for `herald-core`.

use thiserror::Error;

use crate::subject::SubjectKind;

#[derive(Debug, Error)]
pub enum Error {
  /// Every resolution strategy was exhausted without producing a subject.
  #[error("no {0} found")]
  NotFound(SubjectKind),

  /// A configured lookup expression failed for a reason other than its
  /// target being undefined on the context.
  #[error("lookup of {kind} via `{expression}` failed: {source}")]
  Lookup {
    kind:       SubjectKind,
    expression: String,
    #[source]
    source:     Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("configuration error: {0}")]
  Config(#[from] ConfigError),
}

/// Raised eagerly while building a [`crate::config::LookupConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("{key} must be {expected}, found {found}")]
  InvalidType {
    key:      String,
    expected: &'static str,
    found:    &'static str,
  },

  #[error("invalid lookup expression {expression:?}: {reason}")]
  InvalidExpression { expression: String, reason: &'static str },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
