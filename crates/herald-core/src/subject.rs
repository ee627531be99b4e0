//! Subjects — the user or company record being reported.
//!
//! Hosts hand Herald their own types. Anything that can answer "what is the
//! value of field `name`?" is a [`Subject`]; map-backed data can use
//! [`Record`] directly.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::FieldValue;

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Which of the two reported identities a subject stands for.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
  User,
  Company,
}

impl SubjectKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Company => "company",
    }
  }

  /// Name of the accessor a request context conventionally exposes.
  pub fn conventional_accessor(self) -> &'static str {
    match self {
      Self::User => "current_user",
      Self::Company => "current_company",
    }
  }

  /// Name of the field a request context conventionally stores.
  pub fn conventional_field(self) -> &'static str {
    match self {
      Self::User => "@user",
      Self::Company => "@company",
    }
  }
}

impl fmt::Display for SubjectKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Probing ─────────────────────────────────────────────────────────────────

/// A probe of a subject that did not merely find the field absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
  #[error("value is not a record")]
  NotARecord,

  #[error("field {field} does not hold a scalar")]
  Unsupported { field: String },

  #[error("reading {field} failed: {reason}")]
  Failed { field: String, reason: String },
}

/// The contract every reported record satisfies.
pub trait Subject {
  /// Read `name`. `Ok(None)` means the subject has no such value; `Err`
  /// means asking the question itself failed.
  fn field(&self, name: &str) -> Result<Option<FieldValue>, ProbeError>;

  /// Whether the record has not been persisted yet. Subjects without a
  /// notion of persistence keep the default.
  fn is_new_record(&self) -> Result<bool, ProbeError> { Ok(false) }
}

impl<S: Subject + ?Sized> Subject for &S {
  fn field(&self, name: &str) -> Result<Option<FieldValue>, ProbeError> {
    (**self).field(name)
  }

  fn is_new_record(&self) -> Result<bool, ProbeError> {
    (**self).is_new_record()
  }
}

impl<S: Subject + ?Sized> Subject for Box<S> {
  fn field(&self, name: &str) -> Result<Option<FieldValue>, ProbeError> {
    (**self).field(name)
  }

  fn is_new_record(&self) -> Result<bool, ProbeError> {
    (**self).is_new_record()
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A map-backed subject with fields kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
  fields:     IndexMap<String, FieldValue>,
  new_record: bool,
}

impl Record {
  pub fn new() -> Self { Self::default() }

  /// Builder-style insert.
  pub fn with(
    mut self,
    name: impl Into<String>,
    value: impl Into<FieldValue>,
  ) -> Self {
    self.insert(name, value);
    self
  }

  /// Mark the record as not yet persisted.
  pub fn unsaved(mut self) -> Self {
    self.new_record = true;
    self
  }

  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
    self.fields.insert(name.into(), value.into());
  }

  pub fn get(&self, name: &str) -> Option<&FieldValue> { self.fields.get(name) }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
    self.fields.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize { self.fields.len() }

  pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut record = Self::new();
    for (k, v) in iter {
      record.insert(k, v);
    }
    record
  }
}

impl Subject for Record {
  fn field(&self, name: &str) -> Result<Option<FieldValue>, ProbeError> {
    Ok(self.fields.get(name).filter(|v| !v.is_null()).cloned())
  }

  fn is_new_record(&self) -> Result<bool, ProbeError> { Ok(self.new_record) }
}
