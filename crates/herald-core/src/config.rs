//! Lookup configuration — the rules that steer resolution and serialization.
//!
//! A [`LookupConfig`] is built once, validated eagerly, and then only read.
//! Resolver and serializer receive it by reference; nothing in this crate
//! keeps a global copy.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::{
  context::LookupExpression,
  error::ConfigError,
  subject::{ProbeError, Subject, SubjectKind},
  value::{FieldValue, Scalar},
};

// ─── Accessors ───────────────────────────────────────────────────────────────

/// Anything that can derive a value from a subject.
pub trait ComputeValue: Send + Sync {
  fn compute(&self, subject: &dyn Subject) -> FieldValue;
}

impl<F> ComputeValue for F
where
  F: Fn(&dyn Subject) -> FieldValue + Send + Sync,
{
  fn compute(&self, subject: &dyn Subject) -> FieldValue { self(subject) }
}

/// How a configured output field obtains its value.
#[derive(Clone)]
pub enum Accessor {
  /// Read a named field from the subject.
  Field(String),
  /// Run host code against the subject.
  Computed(Arc<dyn ComputeValue>),
  /// Always the same value.
  Static(FieldValue),
}

impl Accessor {
  pub fn field(name: impl Into<String>) -> Self { Self::Field(name.into()) }

  pub fn computed<F>(f: F) -> Self
  where
    F: Fn(&dyn Subject) -> FieldValue + Send + Sync + 'static,
  {
    Self::Computed(Arc::new(f))
  }

  pub fn source(source: impl ComputeValue + 'static) -> Self {
    Self::Computed(Arc::new(source))
  }

  pub fn constant(value: impl Into<FieldValue>) -> Self {
    Self::Static(value.into())
  }

  pub fn evaluate(&self, subject: &dyn Subject) -> Result<FieldValue, ProbeError> {
    match self {
      Self::Field(name) => Ok(subject.field(name)?.unwrap_or(FieldValue::Null)),
      Self::Computed(c) => Ok(c.compute(subject)),
      Self::Static(v) => Ok(v.clone()),
    }
  }
}

impl fmt::Debug for Accessor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Field(name) => f.debug_tuple("Field").field(name).finish(),
      Self::Computed(_) => f.write_str("Computed(..)"),
      Self::Static(v) => f.debug_tuple("Static").field(v).finish(),
    }
  }
}

/// Output field name → accessor, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CustomData(IndexMap<String, Accessor>);

impl CustomData {
  pub fn insert(&mut self, name: impl Into<String>, accessor: Accessor) {
    self.0.insert(name.into(), accessor);
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Accessor)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

// ─── Lead attributes ─────────────────────────────────────────────────────────

/// Custom-data keys that may be reported for anonymous visitors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeadAttributes(Vec<String>);

impl LeadAttributes {
  pub fn new<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(names.into_iter().map(Into::into).collect())
  }

  pub fn as_slice(&self) -> &[String] { &self.0 }

  pub fn contains(&self, name: &str) -> bool { self.0.iter().any(|n| n == name) }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// Accept only an array of strings.
  pub fn from_value(key: &str, value: &Value) -> Result<Self, ConfigError> {
    let expected = "an array of strings";
    let Value::Array(items) = value else {
      return Err(invalid_type(key, expected, value));
    };
    items
      .iter()
      .map(|item| match item {
        Value::String(s) => Ok(s.clone()),
        other => Err(invalid_type(key, expected, other)),
      })
      .collect::<Result<Vec<_>, _>>()
      .map(Self)
  }
}

impl TryFrom<Value> for LeadAttributes {
  type Error = ConfigError;

  fn try_from(value: Value) -> Result<Self, Self::Error> {
    Self::from_value("user.lead_attributes", &value)
  }
}

// ─── Avatar ──────────────────────────────────────────────────────────────────

/// Static avatar descriptor attached to user configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Avatar {
  #[serde(rename = "type")]
  pub kind:      String,
  pub image_url: String,
}

impl Avatar {
  pub fn new(image_url: impl Into<String>) -> Self {
    Self {
      kind:      "avatar".to_owned(),
      image_url: image_url.into(),
    }
  }

  pub fn to_map(&self) -> IndexMap<&'static str, String> {
    IndexMap::from([
      ("type", self.kind.clone()),
      ("image_url", self.image_url.clone()),
    ])
  }

  pub fn from_value(key: &str, value: &Value) -> Result<Self, ConfigError> {
    let Value::Object(map) = value else {
      return Err(invalid_type(key, "a table", value));
    };
    let image_url = match map.get("image_url") {
      Some(Value::String(s)) => s.clone(),
      Some(other) => {
        return Err(invalid_type(&format!("{key}.image_url"), "a string", other));
      }
      None => {
        return Err(invalid_type(
          &format!("{key}.image_url"),
          "a string",
          &Value::Null,
        ));
      }
    };
    let kind = match map.get("type") {
      None => "avatar".to_owned(),
      Some(Value::String(s)) => s.clone(),
      Some(other) => {
        return Err(invalid_type(&format!("{key}.type"), "a string", other));
      }
    };
    Ok(Self { kind, image_url })
  }
}

impl TryFrom<Value> for Avatar {
  type Error = ConfigError;

  fn try_from(value: Value) -> Result<Self, Self::Error> {
    Self::from_value("user.avatar", &value)
  }
}

// ─── Per-subject configuration ───────────────────────────────────────────────

/// Settings shared by both subject kinds.
#[derive(Debug, Clone, Default)]
pub struct SubjectConfig {
  /// Where to look first for the subject.
  pub current:       Option<LookupExpression>,
  pub custom_data:   CustomData,
  pub static_fields: IndexMap<String, Scalar>,
}

#[derive(Debug, Clone, Default)]
pub struct UserConfig {
  pub subject:         SubjectConfig,
  pub lead_attributes: LeadAttributes,
  pub avatar:          Option<Avatar>,
}

#[derive(Debug, Clone, Default)]
pub struct CompanyConfig {
  pub subject:       SubjectConfig,
  pub plan:          Option<Accessor>,
  pub monthly_spend: Option<Accessor>,
}

/// The complete, immutable lookup configuration.
#[derive(Debug, Clone, Default)]
pub struct LookupConfig {
  user:    UserConfig,
  company: CompanyConfig,
}

impl LookupConfig {
  pub fn builder() -> LookupConfigBuilder { LookupConfigBuilder::default() }

  pub fn new(user: UserConfig, company: CompanyConfig) -> Self {
    Self { user, company }
  }

  pub fn user(&self) -> &UserConfig { &self.user }

  pub fn company(&self) -> &CompanyConfig { &self.company }

  pub fn subject(&self, kind: SubjectKind) -> &SubjectConfig {
    match kind {
      SubjectKind::User => &self.user.subject,
      SubjectKind::Company => &self.company.subject,
    }
  }

  /// Kind-specific output fields whose accessors come from configuration.
  pub fn delegated(&self, kind: SubjectKind) -> Vec<(&'static str, &Accessor)> {
    match kind {
      SubjectKind::User => Vec::new(),
      SubjectKind::Company => [
        ("plan", self.company.plan.as_ref()),
        ("monthly_spend", self.company.monthly_spend.as_ref()),
      ]
      .into_iter()
      .filter_map(|(name, accessor)| accessor.map(|a| (name, a)))
      .collect(),
    }
  }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Collects configuration; expressions are validated in [`Self::build`].
#[derive(Debug, Default)]
pub struct LookupConfigBuilder {
  user_current:    Option<String>,
  company_current: Option<String>,
  user:            UserConfig,
  company:         CompanyConfig,
}

impl LookupConfigBuilder {
  fn subject_mut(&mut self, kind: SubjectKind) -> &mut SubjectConfig {
    match kind {
      SubjectKind::User => &mut self.user.subject,
      SubjectKind::Company => &mut self.company.subject,
    }
  }

  /// Lookup expression tried before the conventional accessor and field.
  pub fn current(mut self, kind: SubjectKind, expression: impl Into<String>) -> Self {
    let expression = Some(expression.into());
    match kind {
      SubjectKind::User => self.user_current = expression,
      SubjectKind::Company => self.company_current = expression,
    }
    self
  }

  pub fn custom_data(
    mut self,
    kind: SubjectKind,
    name: impl Into<String>,
    accessor: Accessor,
  ) -> Self {
    self.subject_mut(kind).custom_data.insert(name, accessor);
    self
  }

  pub fn static_field(
    mut self,
    kind: SubjectKind,
    name: impl Into<String>,
    value: impl Into<Scalar>,
  ) -> Self {
    self
      .subject_mut(kind)
      .static_fields
      .insert(name.into(), value.into());
    self
  }

  pub fn lead_attributes<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.user.lead_attributes = LeadAttributes::new(names);
    self
  }

  pub fn avatar(mut self, avatar: Avatar) -> Self {
    self.user.avatar = Some(avatar);
    self
  }

  pub fn company_plan(mut self, accessor: Accessor) -> Self {
    self.company.plan = Some(accessor);
    self
  }

  pub fn company_monthly_spend(mut self, accessor: Accessor) -> Self {
    self.company.monthly_spend = Some(accessor);
    self
  }

  pub fn build(self) -> Result<LookupConfig, ConfigError> {
    let Self {
      user_current,
      company_current,
      mut user,
      mut company,
    } = self;

    if let Some(expr) = user_current {
      user.subject.current = Some(LookupExpression::parse(&expr)?);
    }
    if let Some(expr) = company_current {
      company.subject.current = Some(LookupExpression::parse(&expr)?);
    }

    Ok(LookupConfig { user, company })
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

pub(crate) fn json_type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "a table",
  }
}

pub(crate) fn invalid_type(
  key: &str,
  expected: &'static str,
  found: &Value,
) -> ConfigError {
  ConfigError::InvalidType {
    key: key.to_owned(),
    expected,
    found: json_type_name(found),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::subject::Record;

  #[test]
  fn lead_attributes_accept_string_arrays() {
    let attrs =
      LeadAttributes::try_from(json!(["utm_source", "ref_data"])).unwrap();
    assert_eq!(attrs.as_slice(), ["utm_source", "ref_data"]);
  }

  #[test]
  fn lead_attributes_reject_bare_string() {
    let err = LeadAttributes::try_from(json!("utm_source")).unwrap_err();
    assert_eq!(err, ConfigError::InvalidType {
      key:      "user.lead_attributes".into(),
      expected: "an array of strings",
      found:    "a string",
    });
  }

  #[test]
  fn lead_attributes_reject_mixed_arrays() {
    assert!(LeadAttributes::try_from(json!(["ok", 3])).is_err());
  }

  #[test]
  fn avatar_exposes_type_and_url() {
    let avatar = Avatar::try_from(json!({
      "type": "avatar",
      "image_url": "https://example.org/128Wash.jpg",
    }))
    .unwrap();
    let map = avatar.to_map();
    assert_eq!(map["type"], "avatar");
    assert_eq!(map["image_url"], "https://example.org/128Wash.jpg");
  }

  #[test]
  fn avatar_requires_image_url() {
    assert!(Avatar::try_from(json!({ "type": "avatar" })).is_err());
    assert!(Avatar::try_from(json!("https://example.org/a.jpg")).is_err());
  }

  #[test]
  fn build_rejects_bad_expressions() {
    let err = LookupConfig::builder()
      .current(SubjectKind::User, "not a path")
      .build()
      .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidExpression { .. }));
  }

  #[test]
  fn delegated_lists_only_configured_company_fields() {
    let config = LookupConfig::builder()
      .company_plan(Accessor::field("plan_name"))
      .build()
      .unwrap();
    let names: Vec<_> = config
      .delegated(SubjectKind::Company)
      .into_iter()
      .map(|(name, _)| name)
      .collect();
    assert_eq!(names, ["plan"]);
    assert!(config.delegated(SubjectKind::User).is_empty());
  }

  #[test]
  fn accessors_evaluate_against_subjects() {
    let record = Record::new().with("plan", "pro");
    let upper = Accessor::computed(|s| match s.field("plan") {
      Ok(Some(FieldValue::Str(p))) => FieldValue::Str(p.to_uppercase()),
      _ => FieldValue::Null,
    });
    assert_eq!(
      Accessor::field("plan").evaluate(&record),
      Ok(FieldValue::from("pro"))
    );
    assert_eq!(upper.evaluate(&record), Ok(FieldValue::from("PRO")));
    assert_eq!(
      Accessor::constant(3).evaluate(&record),
      Ok(FieldValue::Int(3))
    );
    assert_eq!(
      Accessor::field("missing").evaluate(&record),
      Ok(FieldValue::Null)
    );
  }
}
