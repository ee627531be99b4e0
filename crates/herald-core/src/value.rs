//! Field values read from subjects and the scalars they serialize to.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// ─── FieldValue ──────────────────────────────────────────────────────────────

/// A value produced by probing a subject or evaluating an accessor, before
/// the payload transform is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  /// A point in time; serialized as epoch seconds.
  Time(DateTime<Utc>),
  /// A calendar date; serialized as epoch seconds at midnight UTC.
  Date(NaiveDate),
}

impl FieldValue {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  /// Present means non-null and, for strings, not blank.
  pub fn is_present(&self) -> bool {
    match self {
      Self::Null => false,
      Self::Str(s) => !s.trim().is_empty(),
      _ => true,
    }
  }

  /// Apply the payload transform. `Null` has no scalar form and is omitted.
  pub fn into_scalar(self) -> Option<Scalar> {
    match self {
      Self::Null => None,
      Self::Bool(b) => Some(Scalar::Bool(b)),
      Self::Int(i) => Some(Scalar::Int(i)),
      Self::Float(f) => Some(Scalar::Float(f)),
      Self::Str(s) => Some(Scalar::Str(s)),
      Self::Time(t) => Some(Scalar::Int(t.timestamp())),
      Self::Date(d) => {
        Some(Scalar::Int(d.and_time(NaiveTime::MIN).and_utc().timestamp()))
      }
    }
  }
}

impl From<&str> for FieldValue {
  fn from(s: &str) -> Self { Self::Str(s.to_owned()) }
}

impl From<String> for FieldValue {
  fn from(s: String) -> Self { Self::Str(s) }
}

impl From<bool> for FieldValue {
  fn from(b: bool) -> Self { Self::Bool(b) }
}

impl From<i32> for FieldValue {
  fn from(i: i32) -> Self { Self::Int(i64::from(i)) }
}

impl From<i64> for FieldValue {
  fn from(i: i64) -> Self { Self::Int(i) }
}

impl From<u32> for FieldValue {
  fn from(i: u32) -> Self { Self::Int(i64::from(i)) }
}

impl From<f64> for FieldValue {
  fn from(f: f64) -> Self { Self::Float(f) }
}

impl From<DateTime<Utc>> for FieldValue {
  fn from(t: DateTime<Utc>) -> Self { Self::Time(t) }
}

impl From<DateTime<FixedOffset>> for FieldValue {
  fn from(t: DateTime<FixedOffset>) -> Self { Self::Time(t.with_timezone(&Utc)) }
}

impl From<NaiveDate> for FieldValue {
  fn from(d: NaiveDate) -> Self { Self::Date(d) }
}

impl From<Scalar> for FieldValue {
  fn from(s: Scalar) -> Self {
    match s {
      Scalar::Bool(b) => Self::Bool(b),
      Scalar::Int(i) => Self::Int(i),
      Scalar::Float(f) => Self::Float(f),
      Scalar::Str(s) => Self::Str(s),
    }
  }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

// ─── Scalar ──────────────────────────────────────────────────────────────────

/// A value as it appears in a [`crate::payload::Payload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
}

impl Scalar {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Int(i) => Some(*i),
      _ => None,
    }
  }
}

impl From<&str> for Scalar {
  fn from(s: &str) -> Self { Self::Str(s.to_owned()) }
}

impl From<String> for Scalar {
  fn from(s: String) -> Self { Self::Str(s) }
}

impl From<i64> for Scalar {
  fn from(i: i64) -> Self { Self::Int(i) }
}

impl From<bool> for Scalar {
  fn from(b: bool) -> Self { Self::Bool(b) }
}
