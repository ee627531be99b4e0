//! Resolution contexts — what a request exposes for finding its subjects.
//!
//! A context advertises capabilities explicitly: each trait method has a
//! default meaning "this context cannot do that". Which capabilities exist
//! is decided by whoever writes the adapter, never by probing at runtime.

use std::{collections::HashMap, fmt, str::FromStr};

use thiserror::Error;

use crate::{
  error::ConfigError,
  subject::{Record, Subject, SubjectKind},
};

// ─── Lookup expression ───────────────────────────────────────────────────────

/// A host-supplied path naming where a subject lives, e.g. `account.owner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupExpression {
  source:   String,
  segments: Vec<String>,
}

impl LookupExpression {
  pub fn parse(input: &str) -> Result<Self, ConfigError> {
    let invalid = |reason| ConfigError::InvalidExpression {
      expression: input.to_owned(),
      reason,
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
      return Err(invalid("expression is empty"));
    }

    let segments = trimmed
      .split('.')
      .map(|segment| {
        if segment.is_empty() {
          return Err(invalid("empty path segment"));
        }
        let mut chars = segment.chars();
        let leading_ok = chars
          .next()
          .is_some_and(|c| c == '_' || c == '@' || c.is_ascii_alphabetic());
        if !leading_ok || !chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        {
          return Err(invalid("segments must be identifiers"));
        }
        Ok(segment.to_owned())
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self {
      source: trimmed.to_owned(),
      segments,
    })
  }

  /// The first segment; the symbol that must exist on the context.
  pub fn root(&self) -> &str { &self.segments[0] }

  pub fn segments(&self) -> &[String] { &self.segments }

  pub fn as_str(&self) -> &str { &self.source }
}

impl FromStr for LookupExpression {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl fmt::Display for LookupExpression {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.source)
  }
}

// ─── Evaluation errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EvalError {
  /// The symbol the expression refers to does not exist on the context.
  #[error("`{0}` is not defined on this context")]
  Undefined(String),

  /// Anything else; never swallowed by the resolver.
  #[error(transparent)]
  Failed(Box<dyn std::error::Error + Send + Sync>),
}

impl EvalError {
  pub fn failed(message: impl Into<String>) -> Self {
    let message: String = message.into();
    Self::Failed(message.into())
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// The capabilities a request context offers for locating subjects.
pub trait ResolutionContext {
  type Subject: Subject;

  /// Evaluate a configured lookup expression against this context.
  fn evaluate(
    &self,
    expression: &LookupExpression,
  ) -> Result<Option<Self::Subject>, EvalError> {
    Err(EvalError::Undefined(expression.root().to_owned()))
  }

  /// The value of the conventional accessor, e.g. `current_user`.
  fn conventional_accessor(&self, _kind: SubjectKind) -> Option<Self::Subject> {
    None
  }

  /// The value of the conventional field, e.g. `@user`.
  fn conventional_field(&self, _kind: SubjectKind) -> Option<Self::Subject> {
    None
  }

  /// A secondary source of custom data the host attaches to the request.
  fn extra_custom_data(&self, _kind: SubjectKind) -> Option<Record> { None }
}

impl<C: ResolutionContext + ?Sized> ResolutionContext for &C {
  type Subject = C::Subject;

  fn evaluate(
    &self,
    expression: &LookupExpression,
  ) -> Result<Option<Self::Subject>, EvalError> {
    (**self).evaluate(expression)
  }

  fn conventional_accessor(&self, kind: SubjectKind) -> Option<Self::Subject> {
    (**self).conventional_accessor(kind)
  }

  fn conventional_field(&self, kind: SubjectKind) -> Option<Self::Subject> {
    (**self).conventional_field(kind)
  }

  fn extra_custom_data(&self, kind: SubjectKind) -> Option<Record> {
    (**self).extra_custom_data(kind)
  }
}

// ─── CapturedContext ─────────────────────────────────────────────────────────

/// An in-memory context whose capabilities are declared up front.
///
/// Lookups are keyed by the expression's root symbol; only single-segment
/// expressions can be answered because captured subjects are opaque.
#[derive(Debug, Clone)]
pub struct CapturedContext<S> {
  accessors: HashMap<SubjectKind, S>,
  fields:    HashMap<SubjectKind, S>,
  lookups:   HashMap<String, Option<S>>,
  failing:   HashMap<String, String>,
  extra:     HashMap<SubjectKind, Record>,
}

impl<S> Default for CapturedContext<S> {
  fn default() -> Self {
    Self {
      accessors: HashMap::new(),
      fields:    HashMap::new(),
      lookups:   HashMap::new(),
      failing:   HashMap::new(),
      extra:     HashMap::new(),
    }
  }
}

impl<S> CapturedContext<S> {
  pub fn new() -> Self { Self::default() }

  pub fn with_accessor(mut self, kind: SubjectKind, subject: S) -> Self {
    self.accessors.insert(kind, subject);
    self
  }

  pub fn with_field(mut self, kind: SubjectKind, subject: S) -> Self {
    self.fields.insert(kind, subject);
    self
  }

  /// Define `symbol` on the context. `None` defines it with no value.
  pub fn with_lookup(mut self, symbol: impl Into<String>, subject: Option<S>) -> Self {
    self.lookups.insert(symbol.into(), subject);
    self
  }

  /// Define `symbol` such that evaluating it fails with `message`.
  pub fn with_failing_lookup(
    mut self,
    symbol: impl Into<String>,
    message: impl Into<String>,
  ) -> Self {
    self.failing.insert(symbol.into(), message.into());
    self
  }

  pub fn with_extra_custom_data(mut self, kind: SubjectKind, data: Record) -> Self {
    self.extra.insert(kind, data);
    self
  }
}

impl<S: Subject + Clone> ResolutionContext for CapturedContext<S> {
  type Subject = S;

  fn evaluate(
    &self,
    expression: &LookupExpression,
  ) -> Result<Option<S>, EvalError> {
    let root = expression.root();
    if let Some(message) = self.failing.get(root) {
      return Err(EvalError::failed(message.clone()));
    }
    let Some(found) = self.lookups.get(root) else {
      return Err(EvalError::Undefined(root.to_owned()));
    };
    if expression.segments().len() > 1 {
      return Err(EvalError::failed(format!(
        "cannot traverse into captured value `{root}`"
      )));
    }
    Ok(found.clone())
  }

  fn conventional_accessor(&self, kind: SubjectKind) -> Option<S> {
    self.accessors.get(&kind).cloned()
  }

  fn conventional_field(&self, kind: SubjectKind) -> Option<S> {
    self.fields.get(&kind).cloned()
  }

  fn extra_custom_data(&self, kind: SubjectKind) -> Option<Record> {
    self.extra.get(&kind).cloned()
  }
}
