//! The resolved payload and the serializer that builds it.

use indexmap::IndexMap;
use serde::Serialize;

use crate::{
  config::{Accessor, LeadAttributes, LookupConfig},
  subject::{ProbeError, Record, Subject, SubjectKind},
  value::{FieldValue, Scalar},
};

// ─── Payload ─────────────────────────────────────────────────────────────────

/// An ordered field name → scalar mapping, ready for delivery.
///
/// Serializes as a JSON object with keys in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Payload(IndexMap<String, Scalar>);

impl Payload {
  pub fn new() -> Self { Self::default() }

  /// Insert or replace `key`. A replaced key keeps its original position.
  pub fn insert(&mut self, key: impl Into<String>, value: Scalar) {
    self.0.insert(key.into(), value);
  }

  pub fn get(&self, key: &str) -> Option<&Scalar> { self.0.get(key) }

  pub fn contains_key(&self, key: &str) -> bool { self.0.contains_key(key) }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// Only the entries an anonymous visitor may report.
  pub fn for_lead(&self, attributes: &LeadAttributes) -> Payload {
    Payload(
      self
        .0
        .iter()
        .filter(|(k, _)| attributes.contains(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect(),
    )
  }
}

impl IntoIterator for Payload {
  type IntoIter = indexmap::map::IntoIter<String, Scalar>;
  type Item = (String, Scalar);

  fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

// ─── Serializer ──────────────────────────────────────────────────────────────

/// Well-known output fields as `(output name, subject field)` pairs.
pub fn standard_fields(kind: SubjectKind) -> &'static [(&'static str, &'static str)] {
  match kind {
    SubjectKind::User => &[
      ("user_id", "id"),
      ("email", "email"),
      ("name", "name"),
      ("created_at", "created_at"),
    ],
    SubjectKind::Company => {
      &[("id", "id"), ("name", "name"), ("created_at", "created_at")]
    }
  }
}

/// Build the payload for a (validated) subject.
///
/// Entries are added in this order: well-known fields, configured company
/// delegates, custom data, static fields, then the `extra` custom data
/// record. A later entry for an existing key replaces its value. Null
/// values and failed probes are left out.
pub fn serialize(
  kind: SubjectKind,
  subject: &dyn Subject,
  extra: Option<&Record>,
  config: &LookupConfig,
) -> Payload {
  let mut payload = Payload::new();

  for (output, field) in standard_fields(kind) {
    let value = subject.field(field).map(Option::unwrap_or_default);
    put(&mut payload, kind, output, value);
  }

  for (output, accessor) in config.delegated(kind) {
    put(&mut payload, kind, output, accessor.evaluate(subject));
  }

  let subject_config = config.subject(kind);
  for (output, accessor) in subject_config.custom_data.iter() {
    let value = match (accessor.evaluate(subject), accessor, extra) {
      (Ok(FieldValue::Null) | Err(_), Accessor::Field(name), Some(extra))
        if extra.get(name).is_some() =>
      {
        Ok(extra.get(name).cloned().unwrap_or_default())
      }
      (value, ..) => value,
    };
    put(&mut payload, kind, output, value);
  }

  for (name, value) in &subject_config.static_fields {
    payload.insert(name.clone(), value.clone());
  }

  if let Some(extra) = extra {
    for (name, value) in extra.iter() {
      put(&mut payload, kind, name, Ok(value.clone()));
    }
  }

  payload
}

fn put(
  payload: &mut Payload,
  kind: SubjectKind,
  key: &str,
  value: Result<FieldValue, ProbeError>,
) {
  match value {
    Ok(value) => {
      if let Some(scalar) = value.into_scalar() {
        payload.insert(key, scalar);
      }
    }
    Err(e) => tracing::debug!(%kind, key, error = %e, "omitting field"),
  }
}
